// ABOUTME: Image visibility settings: fixed delay or bounded polling.
// ABOUTME: Durations use humantime syntax ("2s", "250ms").

use serde::Deserialize;
use std::time::Duration;

use crate::deploy::{DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL, ImageVisibility};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityStrategy {
    #[default]
    Fixed,
    Poll,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VisibilityConfig {
    #[serde(default)]
    pub strategy: VisibilityStrategy,

    #[serde(default = "default_max_wait", with = "humantime_serde")]
    pub max_wait: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

fn default_max_wait() -> Duration {
    DEFAULT_MAX_WAIT
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            strategy: VisibilityStrategy::default(),
            max_wait: default_max_wait(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl VisibilityConfig {
    pub fn to_visibility(&self) -> ImageVisibility {
        match self.strategy {
            VisibilityStrategy::Fixed => ImageVisibility::FixedDelay {
                max_wait: self.max_wait,
            },
            VisibilityStrategy::Poll => ImageVisibility::Poll {
                interval: self.poll_interval,
                max_wait: self.max_wait,
            },
        }
    }
}
