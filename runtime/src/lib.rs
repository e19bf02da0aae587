// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cookiecrawler runtime: the Chromium page session, HTTP sitemap source,
//! file-backed metadata and reports, and the CLI built on top of them.
//!
//! This library crate exposes the modules for integration testing.

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod load_monitor;
pub mod metadata;
pub mod renderer;
pub mod report_file;
