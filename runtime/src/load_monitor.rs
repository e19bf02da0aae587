// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host CPU load, sampled during page visits.

use std::sync::Mutex;
use sysinfo::System;

/// Reads global CPU utilisation as a fraction in `[0, 1]`.
pub struct LoadMonitor {
    sys: Mutex<System>,
}

impl LoadMonitor {
    pub fn new() -> Self {
        let mut sys = System::new();
        // The first refresh only establishes a baseline.
        sys.refresh_cpu_all();
        Self {
            sys: Mutex::new(sys),
        }
    }

    /// Utilisation since the previous sample.
    ///
    /// A poisoned lock yields `NaN`, which the sampler discards.
    pub fn sample(&self) -> f64 {
        match self.sys.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu_all();
                normalize(sys.global_cpu_usage())
            }
            Err(_) => f64::NAN,
        }
    }
}

impl Default for LoadMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(percent: f32) -> f64 {
    (f64::from(percent) / 100.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(0.0), 0.0);
        assert_eq!(normalize(45.0), 0.45);
        assert_eq!(normalize(100.0), 1.0);
        assert_eq!(normalize(130.0), 1.0);
    }

    #[test]
    fn test_sample_is_a_fraction() {
        let monitor = LoadMonitor::new();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        let load = monitor.sample();
        assert!((0.0..=1.0).contains(&load), "load = {load}");
    }
}
