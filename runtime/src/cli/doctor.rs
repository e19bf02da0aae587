// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Environment readiness check.

use anyhow::Result;

use crate::config::{self, CrawlOverrides};
use crate::load_monitor::LoadMonitor;
use crate::renderer::find_chromium;

/// Check Chromium availability, CPU sampling and configuration.
pub async fn run() -> Result<()> {
    println!("Cookiecrawler Doctor");
    println!("====================");
    println!();

    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    let chromium_path = find_chromium();
    match &chromium_path {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome or set COOKIECRAWLER_CHROMIUM_PATH."
        ),
    }

    let monitor = LoadMonitor::new();
    tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
    println!("[OK] CPU load: {:.0}%", monitor.sample() * 100.0);

    let config_ok = match config::resolve(&CrawlOverrides::default()) {
        Ok(settings) => {
            println!("[OK] Configuration valid");
            println!("     results dir: {}", settings.results_dir.display());
            match &settings.metadata_path {
                Some(path) => println!("     metadata:    {}", path.display()),
                None => println!("[??] No metadata file; reports will carry no translations"),
            }
            true
        }
        Err(e) => {
            println!("[!!] Configuration invalid: {e:#}");
            false
        }
    };

    println!();
    if chromium_path.is_some() && config_ok {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }

    Ok(())
}
