//! Optional device location.
//!
//! Not part of the signal bundle. [`collect_geolocation`] always resolves:
//! denial, a missing API and timeouts all become `None`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Reduce to a geohash of `precision` characters.
    ///
    /// Returns `None` for out-of-range coordinates.
    pub fn to_geohash(&self, precision: usize) -> Option<String> {
        geohash::encode(
            geohash::Coord {
                x: self.lon,
                y: self.lat,
            },
            precision,
        )
        .ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub timeout: Duration,
    pub high_accuracy: bool,
    /// Oldest cached position accepted
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            high_accuracy: false,
            maximum_age: Duration::ZERO,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("geolocation API unavailable")]
    Unavailable,

    #[error("permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("timed out")]
    Timeout,
}

/// Platform geolocation. Implementations pass `options` to the platform API.
#[async_trait(?Send)]
pub trait GeolocationSource {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Coordinates, GeolocationError>;
}

/// Fetch the current position, swallowing every failure.
#[instrument(level = "debug", skip(source), fields(timeout_ms = options.timeout.as_millis() as u64))]
pub async fn collect_geolocation<S: GeolocationSource + ?Sized>(
    source: &S,
    options: &GeolocationOptions,
) -> Option<Coordinates> {
    match guarded(source, options).await {
        Ok(coords) => Some(coords),
        Err(e) => {
            debug!(error = %e, "Geolocation unavailable");
            None
        }
    }
}

#[cfg(feature = "runtime")]
async fn guarded<S: GeolocationSource + ?Sized>(
    source: &S,
    options: &GeolocationOptions,
) -> Result<Coordinates, GeolocationError> {
    // Backstop for sources that ignore the timeout option. The tokio timer
    // panics outside a runtime, so other executors get the bare call.
    if tokio::runtime::Handle::try_current().is_err() {
        return source.current_position(options).await;
    }
    tokio::time::timeout(options.timeout, source.current_position(options))
        .await
        .unwrap_or(Err(GeolocationError::Timeout))
}

#[cfg(not(feature = "runtime"))]
async fn guarded<S: GeolocationSource + ?Sized>(
    source: &S,
    options: &GeolocationOptions,
) -> Result<Coordinates, GeolocationError> {
    source.current_position(options).await
}

/// Fixed-answer source for tests and recorded sessions.
#[derive(Debug, Clone)]
pub struct StaticGeolocation {
    answer: Result<Coordinates, GeolocationError>,
    delay: Option<Duration>,
}

impl StaticGeolocation {
    pub fn at(lat: f64, lon: f64) -> Self {
        Self {
            answer: Ok(Coordinates { lat, lon }),
            delay: None,
        }
    }

    pub fn failing(error: GeolocationError) -> Self {
        Self {
            answer: Err(error),
            delay: None,
        }
    }

    /// Delay the answer; only honoured with the `runtime` feature.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait(?Send)]
impl GeolocationSource for StaticGeolocation {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Coordinates, GeolocationError> {
        #[cfg(feature = "runtime")]
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_to_coordinates() {
        let source = StaticGeolocation::at(48.8566, 2.3522);
        let coords = collect_geolocation(&source, &GeolocationOptions::default()).await;
        assert_eq!(
            coords,
            Some(Coordinates {
                lat: 48.8566,
                lon: 2.3522
            })
        );
    }

    #[tokio::test]
    async fn test_denied_resolves_to_none() {
        let source = StaticGeolocation::failing(GeolocationError::PermissionDenied);
        assert_eq!(
            collect_geolocation(&source, &GeolocationOptions::default()).await,
            None
        );
    }

    #[tokio::test]
    async fn test_missing_api_resolves_to_none() {
        let source = StaticGeolocation::failing(GeolocationError::Unavailable);
        assert_eq!(
            collect_geolocation(&source, &GeolocationOptions::default()).await,
            None
        );
    }

    #[cfg(feature = "runtime")]
    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out() {
        let source = StaticGeolocation::at(0.0, 0.0).with_delay(Duration::from_secs(30));
        assert_eq!(
            collect_geolocation(&source, &GeolocationOptions::default()).await,
            None
        );
    }

    /// Poll once on the calling thread, with no tokio runtime around.
    fn poll_outside_runtime<F: std::future::Future>(future: F) -> std::task::Poll<F::Output> {
        use std::sync::Arc;
        use std::task::{Context, Wake, Waker};

        struct Noop;
        impl Wake for Noop {
            fn wake(self: Arc<Self>) {}
        }

        let waker = Waker::from(Arc::new(Noop));
        let mut cx = Context::from_waker(&waker);
        std::pin::pin!(future).as_mut().poll(&mut cx)
    }

    #[test]
    fn test_collect_without_runtime() {
        let options = GeolocationOptions::default();

        let denied = StaticGeolocation::failing(GeolocationError::PermissionDenied);
        let result = std::panic::catch_unwind(|| {
            poll_outside_runtime(collect_geolocation(&denied, &options))
        });
        assert!(matches!(result, Ok(std::task::Poll::Ready(None))));

        let fixed = StaticGeolocation::at(1.0, 2.0);
        assert_eq!(
            poll_outside_runtime(collect_geolocation(&fixed, &options)),
            std::task::Poll::Ready(Some(Coordinates { lat: 1.0, lon: 2.0 }))
        );
    }

    #[test]
    fn test_default_options() {
        let options = GeolocationOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert!(!options.high_accuracy);
    }

    #[test]
    fn test_geohash_precision() {
        let coords = Coordinates {
            lat: 57.64911,
            lon: 10.40744,
        };
        assert_eq!(coords.to_geohash(6).as_deref(), Some("u4pruy"));
    }
}
