// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommand implementations for the cookiecrawler binary.

pub mod crawl_cmd;
pub mod doctor;
pub mod output;
