// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Startup options.
//!
//! A bad option never stops the engine from starting.  `sanitized`
//! reports every problem as a warning and puts the default back in its
//! place.

use errors::ConfigError;
use transforms::{self, Transform, DEFAULT_TRANSFORM};

/// Default grid width.
pub const DEFAULT_WIDTH: usize = 852;
/// Default grid height.
pub const DEFAULT_HEIGHT: usize = 480;
/// Default worker count.
pub const DEFAULT_THREADS: usize = 4;
/// Default scheduler rate.
pub const DEFAULT_TICKS_PER_SECOND: u32 = 30;

/// Everything the engine is configured with at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Workers per tick; 1 runs the tick on the calling thread
    pub threads: usize,
    /// Scheduler rate in automatic mode
    pub ticks_per_second: u32,
    /// Cap on automatic iterations, 0 for none
    pub max_iterations: usize,
    /// Start in automatic mode
    pub automatic: bool,
    /// Name of the transform to iterate
    pub transform: String,
    /// Renderer hint: color cells by status
    pub status_colors: bool,
    /// Renderer hint: color cells by trip length
    pub trip_length_colors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            threads: DEFAULT_THREADS,
            ticks_per_second: DEFAULT_TICKS_PER_SECOND,
            max_iterations: 0,
            automatic: false,
            transform: DEFAULT_TRANSFORM.to_string(),
            status_colors: false,
            trip_length_colors: false,
        }
    }
}

impl Config {
    /// Every problem with this configuration.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = vec![];
        if self.width == 0 || self.height == 0 {
            errors.push(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.threads == 0 {
            errors.push(ConfigError::InvalidThreadCount(self.threads));
        }
        if self.ticks_per_second == 0 {
            errors.push(ConfigError::InvalidTickRate(self.ticks_per_second));
        }
        if transforms::lookup(&self.transform).is_none() {
            errors.push(ConfigError::UnknownTransform(self.transform.clone()));
        }
        errors
    }

    /// This configuration with every invalid option replaced by its
    /// default.
    pub fn sanitized(mut self) -> Self {
        for error in self.validate() {
            warn!("{}; using the default", error);
            match error {
                ConfigError::InvalidDimensions { .. } => {
                    self.width = DEFAULT_WIDTH;
                    self.height = DEFAULT_HEIGHT;
                }
                ConfigError::InvalidThreadCount(_) => self.threads = DEFAULT_THREADS,
                ConfigError::InvalidTickRate(_) => self.ticks_per_second = DEFAULT_TICKS_PER_SECOND,
                ConfigError::UnknownTransform(_) => self.transform = DEFAULT_TRANSFORM.to_string(),
            }
        }
        self
    }

    /// The selected transform, or the default if the name is unknown.
    pub fn resolve_transform(&self) -> &'static Transform {
        transforms::lookup(&self.transform).unwrap_or_else(transforms::default_transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.clone().sanitized(), config);
        assert_eq!(config.resolve_transform().name, "collatz");
    }

    #[test]
    fn every_bad_option_falls_back() {
        let config = Config {
            width: 0,
            height: 12,
            threads: 0,
            ticks_per_second: 0,
            max_iterations: 7,
            automatic: true,
            transform: "nope".to_string(),
            status_colors: true,
            trip_length_colors: false,
        };
        assert_eq!(config.validate().len(), 4);
        assert_eq!(config.resolve_transform().name, "collatz");
        let fixed = config.sanitized();
        assert_eq!((fixed.width, fixed.height), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert_eq!(fixed.threads, DEFAULT_THREADS);
        assert_eq!(fixed.ticks_per_second, DEFAULT_TICKS_PER_SECOND);
        assert_eq!(fixed.transform, "collatz");
        assert_eq!(fixed.max_iterations, 7);
        assert!(fixed.automatic);
        assert!(fixed.status_colors);
    }

    #[test]
    fn known_transform_is_kept() {
        let config = Config {
            transform: "iwanski".to_string(),
            ..Config::default()
        };
        assert_eq!(config.sanitized().resolve_transform().label, "Iwanski's Problem");
    }
}
