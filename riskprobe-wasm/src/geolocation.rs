//! `navigator.geolocation` as a `GeolocationSource`.

use async_trait::async_trait;
use js_sys::Promise;
use riskprobe_core::{Coordinates, GeolocationError, GeolocationOptions, GeolocationSource};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{GeolocationPosition, GeolocationPositionError, PositionOptions, Window};

use crate::browser::describe;

#[derive(Default)]
pub struct BrowserGeolocation {
    window: Option<Window>,
}

impl BrowserGeolocation {
    pub fn new() -> Self {
        Self {
            window: web_sys::window(),
        }
    }
}

fn millis_u32(duration: std::time::Duration) -> u32 {
    duration.as_millis().min(u32::MAX as u128) as u32
}

fn position_error(value: JsValue) -> GeolocationError {
    match value.dyn_ref::<GeolocationPositionError>() {
        Some(err) => match err.code() {
            GeolocationPositionError::PERMISSION_DENIED => GeolocationError::PermissionDenied,
            GeolocationPositionError::TIMEOUT => GeolocationError::Timeout,
            _ => GeolocationError::PositionUnavailable(err.message()),
        },
        None => GeolocationError::PositionUnavailable(describe(&value)),
    }
}

#[async_trait(?Send)]
impl GeolocationSource for BrowserGeolocation {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Coordinates, GeolocationError> {
        let geolocation = self
            .window
            .as_ref()
            .and_then(|w| w.navigator().geolocation().ok())
            .ok_or(GeolocationError::Unavailable)?;

        let js_options = PositionOptions::new();
        js_options.set_enable_high_accuracy(options.high_accuracy);
        js_options.set_timeout(millis_u32(options.timeout));
        js_options.set_maximum_age(millis_u32(options.maximum_age));

        // The promise's own resolve/reject are the success and error callbacks.
        let promise = Promise::new(&mut |resolve, reject| {
            if let Err(e) = geolocation.get_current_position_with_error_callback_and_options(
                &resolve,
                Some(&reject),
                &js_options,
            ) {
                let _ = reject.call1(&JsValue::NULL, &e);
            }
        });

        let position = JsFuture::from(promise)
            .await
            .map_err(position_error)?
            .dyn_into::<GeolocationPosition>()
            .map_err(|v| GeolocationError::PositionUnavailable(describe(&v)))?;

        let coords = position.coords();
        Ok(Coordinates {
            lat: coords.latitude(),
            lon: coords.longitude(),
        })
    }
}
