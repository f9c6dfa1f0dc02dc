//! DOM listener lifecycle around `BiometricsTracker`.

use std::cell::RefCell;
use std::rc::Rc;

use riskprobe_core::BiometricsTracker;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, MouseEvent};

type Listener = Closure<dyn FnMut(Event)>;

/// Keystroke and mouse rhythm for one authentication form.
///
/// `start` attaches `keydown` and `mousemove` listeners to the document and
/// `stop` removes them. Dropping the session also removes them.
#[wasm_bindgen]
pub struct BiometricsSession {
    tracker: Rc<RefCell<BiometricsTracker>>,
    attached: Option<(EventTarget, Listener, Listener)>,
}

impl Default for BiometricsSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl BiometricsSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            tracker: Rc::new(RefCell::new(BiometricsTracker::new())),
            attached: None,
        }
    }

    /// Attach listeners. Returns false if already tracking.
    pub fn start(&mut self) -> Result<bool, JsValue> {
        if self.tracker.borrow().is_tracking() {
            return Ok(false);
        }

        let target: EventTarget = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("document unavailable"))?
            .into();

        let tracker = Rc::clone(&self.tracker);
        let keydown = Listener::new(move |event: Event| {
            tracker.borrow_mut().record_keystroke(event.time_stamp());
        });

        let tracker = Rc::clone(&self.tracker);
        let mousemove = Listener::new(move |event: Event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                tracker.borrow_mut().record_mouse_move(
                    mouse.client_x() as f64,
                    mouse.client_y() as f64,
                    event.time_stamp(),
                );
            }
        });

        target.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        if let Err(e) =
            target.add_event_listener_with_callback("mousemove", mousemove.as_ref().unchecked_ref())
        {
            let _ = target
                .remove_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref());
            return Err(e);
        }

        self.attached = Some((target, keydown, mousemove));
        Ok(self.tracker.borrow_mut().start())
    }

    /// Detach listeners. Returns false if not tracking.
    pub fn stop(&mut self) -> bool {
        self.detach();
        self.tracker.borrow_mut().stop()
    }

    #[wasm_bindgen(js_name = isTracking)]
    pub fn is_tracking(&self) -> bool {
        self.tracker.borrow().is_tracking()
    }

    /// JSON `{ avg_typing_speed, mouse_variance }`.
    pub fn summarize(&self) -> String {
        let summary = self.tracker.borrow().summarize();
        serde_json::to_string(&summary).unwrap_or_else(|_| {
            r#"{"avg_typing_speed":0,"mouse_variance":0}"#.to_string()
        })
    }

    fn detach(&mut self) {
        if let Some((target, keydown, mousemove)) = self.attached.take() {
            let _ = target
                .remove_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref());
            let _ = target.remove_event_listener_with_callback(
                "mousemove",
                mousemove.as_ref().unchecked_ref(),
            );
        }
    }
}

impl Drop for BiometricsSession {
    fn drop(&mut self) {
        self.detach();
    }
}
