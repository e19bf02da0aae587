// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Load-based admission control: how many URLs go into the next wave.

use crate::config::SchedulerConfig;
use crate::sampler::LoadSampler;

#[derive(Debug, Clone)]
pub struct ChunkScheduler {
    config: SchedulerConfig,
}

impl ChunkScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Size of the first wave, never below 1.
    pub fn initial_chunk_size(&self) -> usize {
        self.config.initial_chunk_size.max(1)
    }

    /// Apply the load policy to the current chunk size.
    ///
    /// Grows fast under light load, slowly under moderate load and shrinks
    /// once the load exceeds `max_load_threshold`. A NaN load leaves the
    /// size unchanged. The result is never below 1.
    pub fn next_chunk_size(&self, current: usize, average_load: f64) -> usize {
        let cfg = &self.config;
        let next = if average_load.is_nan() {
            current
        } else if average_load <= cfg.grow_fast_threshold {
            current.saturating_add(cfg.grow_fast_step)
        } else if average_load <= cfg.max_load_threshold {
            current.saturating_add(cfg.grow_slow_step)
        } else {
            current.saturating_sub(cfg.shrink_step)
        };
        next.max(1)
    }

    /// Decide the next wave size from the samples of the previous wave and
    /// reset the sampler. With no samples the size is kept as is.
    pub fn decide(&self, current: usize, sampler: &mut LoadSampler) -> usize {
        let next = match sampler.average() {
            Some(load) => self.next_chunk_size(current, load),
            None => current.max(1),
        };
        sampler.reset();
        next
    }
}

impl Default for ChunkScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_load_grows_fast() {
        let scheduler = ChunkScheduler::default();
        assert_eq!(scheduler.next_chunk_size(10, 0.55), 25);
        assert_eq!(scheduler.next_chunk_size(10, 0.9), 25);
    }

    #[test]
    fn test_moderate_load_grows_slow() {
        let scheduler = ChunkScheduler::new(SchedulerConfig {
            grow_fast_threshold: 0.5,
            max_load_threshold: 0.8,
            ..SchedulerConfig::default()
        });
        assert_eq!(scheduler.next_chunk_size(10, 0.3), 25);
        assert_eq!(scheduler.next_chunk_size(10, 0.7), 15);
        assert_eq!(scheduler.next_chunk_size(10, 0.95), 9);
    }

    #[test]
    fn test_heavy_load_shrinks() {
        let scheduler = ChunkScheduler::default();
        assert_eq!(scheduler.next_chunk_size(10, 0.95), 9);
    }

    #[test]
    fn test_never_below_one() {
        let scheduler = ChunkScheduler::new(SchedulerConfig {
            shrink_step: 7,
            ..SchedulerConfig::default()
        });
        for current in 0..10 {
            for load in [0.0, 0.5, 0.9, 0.91, 1.0, 5.0] {
                assert!(scheduler.next_chunk_size(current, load) >= 1);
            }
        }
        assert_eq!(scheduler.next_chunk_size(1, 1.0), 1);
    }

    #[test]
    fn test_nan_keeps_size() {
        let scheduler = ChunkScheduler::default();
        assert_eq!(scheduler.next_chunk_size(12, f64::NAN), 12);
    }

    #[test]
    fn test_decide_cold_start_keeps_size_and_resets() {
        let scheduler = ChunkScheduler::default();
        let mut sampler = LoadSampler::default();
        assert_eq!(scheduler.decide(10, &mut sampler), 10);

        sampler.extend([0.5, 0.6]);
        assert_eq!(scheduler.decide(10, &mut sampler), 25);
        assert!(sampler.is_empty());
    }

    #[test]
    fn test_initial_chunk_size_floor() {
        let scheduler = ChunkScheduler::new(SchedulerConfig {
            initial_chunk_size: 0,
            ..SchedulerConfig::default()
        });
        assert_eq!(scheduler.initial_chunk_size(), 1);
    }
}
