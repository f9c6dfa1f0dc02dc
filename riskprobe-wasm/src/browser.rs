//! `DeviceProbe` on top of the browser DOM.

use std::cell::Cell;
use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Array, Object, Reflect};
use riskprobe_core::collector::AUTOMATION_GLOBALS;
use riskprobe_core::{CanvasRecipe, DeviceProbe, EnvironmentSnapshot, ProbeError, WebGlDebugInfo};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, WebGlRenderingContext, Window,
};

/// `WEBGL_debug_renderer_info.UNMASKED_VENDOR_WEBGL`
const UNMASKED_VENDOR_WEBGL: u32 = 0x9245;
/// `WEBGL_debug_renderer_info.UNMASKED_RENDERER_WEBGL`
const UNMASKED_RENDERER_WEBGL: u32 = 0x9246;

pub struct BrowserProbe {
    window: Window,
}

impl BrowserProbe {
    pub fn new() -> Result<Self, ProbeError> {
        web_sys::window()
            .map(|window| Self { window })
            .ok_or_else(|| ProbeError::Unavailable("no window object".into()))
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    fn document(&self) -> Result<Document, ProbeError> {
        self.window
            .document()
            .ok_or_else(|| ProbeError::Unavailable("no document".into()))
    }

    /// A detached canvas; never attached to the page.
    fn create_canvas(&self) -> Result<HtmlCanvasElement, ProbeError> {
        self.document()?
            .create_element("canvas")
            .map_err(|e| js_error("createElement(canvas)", &e))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| ProbeError::Unavailable("canvas element not supported".into()))
    }

    fn has_global(&self, name: &str) -> bool {
        Reflect::has(&self.window, &JsValue::from_str(name)).unwrap_or(false)
    }
}

pub(crate) fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

fn js_error(context: &str, value: &JsValue) -> ProbeError {
    ProbeError::Failed(format!("{context}: {}", describe(value)))
}

fn dimension(value: Result<JsValue, JsValue>) -> u32 {
    value
        .ok()
        .and_then(|v| v.as_f64())
        .map(|v| v.max(0.0) as u32)
        .unwrap_or(0)
}

/// `Intl.DateTimeFormat().resolvedOptions().timeZone`
fn resolved_timezone() -> String {
    let format = js_sys::Intl::DateTimeFormat::new(&Array::new(), &Object::new());
    Reflect::get(&format.resolved_options(), &JsValue::from_str("timeZone"))
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_default()
}

#[async_trait(?Send)]
impl DeviceProbe for BrowserProbe {
    fn snapshot(&self) -> Result<EnvironmentSnapshot, ProbeError> {
        let navigator = self.window.navigator();
        let user_agent = navigator
            .user_agent()
            .map_err(|e| js_error("navigator.userAgent", &e))?;

        let languages = Reflect::get(&navigator, &JsValue::from_str("languages"))
            .ok()
            .filter(|v| !v.is_undefined() && !v.is_null())
            .map(|v| {
                Array::from(&v)
                    .iter()
                    .filter_map(|lang| lang.as_string())
                    .collect()
            });

        let (screen_width, screen_height) = match self.window.screen() {
            Ok(screen) => (
                screen.width().unwrap_or(0).max(0) as u32,
                screen.height().unwrap_or(0).max(0) as u32,
            ),
            Err(_) => (0, 0),
        };

        let hardware_concurrency = Some(navigator.hardware_concurrency())
            .filter(|cores| *cores > 0.0)
            .map(|cores| cores as u32);

        Ok(EnvironmentSnapshot {
            user_agent,
            platform: navigator.platform().unwrap_or_default(),
            language: navigator.language().unwrap_or_default(),
            languages,
            timezone: resolved_timezone(),
            screen_width,
            screen_height,
            outer_width: dimension(self.window.outer_width()),
            outer_height: dimension(self.window.outer_height()),
            inner_width: dimension(self.window.inner_width()),
            inner_height: dimension(self.window.inner_height()),
            webdriver: navigator
                .unchecked_ref::<web_sys::NavigatorAutomationInformation>()
                .webdriver(),
            automation_globals: AUTOMATION_GLOBALS
                .iter()
                .filter(|name| self.has_global(name))
                .map(|name| name.to_string())
                .collect(),
            hardware_concurrency,
            max_touch_points: navigator.max_touch_points().max(0) as u32,
            touch_events: self.has_global("ontouchstart"),
        })
    }

    async fn render_canvas(&self, recipe: &CanvasRecipe) -> Result<String, ProbeError> {
        let canvas = self.create_canvas()?;
        canvas.set_width(recipe.width);
        canvas.set_height(recipe.height);

        let ctx = canvas
            .get_context("2d")
            .map_err(|e| js_error("getContext(2d)", &e))?
            .ok_or_else(|| ProbeError::Unavailable("no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| ProbeError::Failed("unexpected 2d context type".into()))?;

        ctx.set_text_baseline(&recipe.text_baseline);
        ctx.set_font(&recipe.font);

        let (x, y, w, h) = recipe.rect;
        ctx.set_fill_style_str(&recipe.rect_color);
        ctx.fill_rect(x as f64, y as f64, w as f64, h as f64);

        let (tx, ty) = recipe.text_origin;
        ctx.set_fill_style_str(&recipe.fill_color);
        ctx.fill_text(&recipe.text, tx as f64, ty as f64)
            .map_err(|e| js_error("fillText", &e))?;

        canvas
            .to_data_url()
            .map_err(|e| js_error("toDataURL", &e))
    }

    async fn webgl_debug_info(&self) -> Result<WebGlDebugInfo, ProbeError> {
        let canvas = self.create_canvas()?;
        let Some(context) = canvas.get_context("webgl").ok().flatten() else {
            return Ok(WebGlDebugInfo::Unsupported);
        };
        let gl = context
            .dyn_into::<WebGlRenderingContext>()
            .map_err(|_| ProbeError::Failed("unexpected webgl context type".into()))?;

        if !matches!(gl.get_extension("WEBGL_debug_renderer_info"), Ok(Some(_))) {
            return Ok(WebGlDebugInfo::NoDebugInfo);
        }

        let read = |pname: u32| -> Result<String, ProbeError> {
            Ok(gl
                .get_parameter(pname)
                .map_err(|e| js_error("getParameter", &e))?
                .as_string()
                .unwrap_or_default())
        };

        Ok(WebGlDebugInfo::Available {
            vendor: read(UNMASKED_VENDOR_WEBGL)?,
            renderer: read(UNMASKED_RENDERER_WEBGL)?,
        })
    }

    /// Log a detached element whose `id` getter only runs when an open
    /// inspector formats it for display.
    ///
    /// Browser dependent: Chromium reads `id` eagerly when previewing a DOM
    /// node, while other engines may show the node without touching the
    /// getter. The result is only ever a positive signal.
    fn console_getter_trap(&self) -> Result<bool, ProbeError> {
        let fired = Rc::new(Cell::new(false));
        let bait = getter_bait(&self.document()?, Rc::clone(&fired))?;
        web_sys::console::log_1(&bait);
        Ok(fired.get())
    }
}

/// Detached `<div>` whose `id` read sets `fired`.
fn getter_bait(document: &Document, fired: Rc<Cell<bool>>) -> Result<Element, ProbeError> {
    let getter = Closure::<dyn FnMut() -> JsValue>::new(move || {
        fired.set(true);
        JsValue::from_str("")
    });

    let descriptor = Object::new();
    Reflect::set(&descriptor, &JsValue::from_str("get"), &getter.into_js_value())
        .map_err(|e| js_error("getter descriptor", &e))?;

    let bait = document
        .create_element("div")
        .map_err(|e| js_error("createElement(div)", &e))?;
    Object::define_property(bait.unchecked_ref::<Object>(), &JsValue::from_str("id"), &descriptor);
    Ok(bait)
}
