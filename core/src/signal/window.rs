use crate::prelude::ConfigError;
use crate::signal::samples::AccelerationSample;
use std::collections::VecDeque;

/// Result of a single push into the window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowState {
    pub is_full: bool,
    /// Samples ordered oldest to newest.
    pub snapshot: Vec<f32>,
}

/// Bounded FIFO of the most recent acceleration samples.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SlidingWindow {
    pub fn with_capacity(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::Invalid(
                "window capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Appends `sample`, evicting the oldest one first when at capacity.
    pub fn push(&mut self, sample: AccelerationSample) -> WindowState {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample.value);

        WindowState {
            is_full: self.is_full(),
            snapshot: self.samples.iter().copied().collect(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
