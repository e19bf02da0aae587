// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Rolling buffer of system load samples.

use std::collections::VecDeque;

/// Default number of samples retained between scheduling decisions.
pub const DEFAULT_CAPACITY: usize = 256;

/// Collects load samples in `[0, 1]` taken while a wave runs.
#[derive(Debug, Clone)]
pub struct LoadSampler {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl LoadSampler {
    /// A sampler keeping at most `capacity` samples (oldest dropped first).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Record one sample. Out-of-range values are clamped, NaN is ignored.
    pub fn record(&mut self, sample: f64) {
        if sample.is_nan() {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample.clamp(0.0, 1.0));
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = f64>) {
        for sample in samples {
            self.record(sample);
        }
    }

    /// Mean of the buffered samples, `None` when nothing was recorded.
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for LoadSampler {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_average_is_none() {
        let sampler = LoadSampler::default();
        assert_eq!(sampler.average(), None);
    }

    #[test]
    fn test_average() {
        let mut sampler = LoadSampler::default();
        sampler.extend([0.5, 0.6]);
        let avg = sampler.average().unwrap();
        assert!((avg - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_reset_clears() {
        let mut sampler = LoadSampler::default();
        sampler.record(0.3);
        sampler.reset();
        assert!(sampler.is_empty());
        assert_eq!(sampler.average(), None);
    }

    #[test]
    fn test_bounded() {
        let mut sampler = LoadSampler::new(3);
        sampler.extend([1.0, 0.0, 0.0, 0.0]);
        assert_eq!(sampler.len(), 3);
        assert_eq!(sampler.average(), Some(0.0));
    }

    #[test]
    fn test_clamps_and_ignores_nan() {
        let mut sampler = LoadSampler::default();
        sampler.extend([f64::NAN, 2.0, -1.0]);
        assert_eq!(sampler.len(), 2);
        assert_eq!(sampler.average(), Some(0.5));
    }
}
