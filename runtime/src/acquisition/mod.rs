// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Everything fetched over plain HTTP, without a browser.

pub mod http_client;
pub mod sitemap;
