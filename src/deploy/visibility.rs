// ABOUTME: Strategy for waiting until a freshly built image can be used by the cluster.
// ABOUTME: Fixed delay by default; optional bounded polling with the same worst case.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::provider::ImageBuilder;

pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(2000);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageVisibility {
    /// Sleep for `max_wait` and assume the image is visible afterwards.
    FixedDelay { max_wait: Duration },
    /// Probe the image builder every `interval` until the image resolves
    /// or `max_wait` has elapsed, then proceed either way.
    Poll { interval: Duration, max_wait: Duration },
}

impl Default for ImageVisibility {
    fn default() -> Self {
        ImageVisibility::FixedDelay {
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl ImageVisibility {
    pub fn max_wait(&self) -> Duration {
        match self {
            ImageVisibility::FixedDelay { max_wait } | ImageVisibility::Poll { max_wait, .. } => {
                *max_wait
            }
        }
    }

    /// Returns whether the image was confirmed visible. A fixed delay never confirms.
    pub async fn await_visible<I>(&self, images: &I, image: &str) -> bool
    where
        I: ImageBuilder + ?Sized,
    {
        match *self {
            ImageVisibility::FixedDelay { max_wait } => {
                debug!(image, wait_ms = max_wait.as_millis() as u64, "waiting for image");
                tokio::time::sleep(max_wait).await;
                false
            }
            ImageVisibility::Poll { interval, max_wait } => {
                let deadline = Instant::now() + max_wait;
                loop {
                    match images.image_exists(image).await {
                        Ok(true) => {
                            debug!(image, "image visible");
                            return true;
                        }
                        Ok(false) => {}
                        Err(e) => debug!(image, error = %e, "image probe failed"),
                    }

                    let now = Instant::now();
                    if now >= deadline {
                        warn!(
                            image,
                            wait_ms = max_wait.as_millis() as u64,
                            "image not confirmed visible, proceeding"
                        );
                        return false;
                    }
                    tokio::time::sleep(interval.min(deadline - now)).await;
                }
            }
        }
    }
}
