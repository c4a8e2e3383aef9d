extern crate async_trait;
extern crate console_error_panic_hook;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate thiserror;

pub mod action;
pub mod config;
pub mod controller;
pub mod dom;
pub mod logging;
pub mod post;
pub mod request;
pub mod view;

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::config::ControllerConfig;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(contents: &str);
}

/// Attaches a controller to every post on the page using the default
/// markup and routes.
#[wasm_bindgen]
pub fn bootstrap() -> Result<(), JsValue> {
    start(ControllerConfig::default())
}

/// Same as [`bootstrap`] with a JSON object overriding parts of the
/// default [`ControllerConfig`].
#[wasm_bindgen]
pub fn bootstrap_with_config(config_json: &str) -> Result<(), JsValue> {
    let config = ControllerConfig::from_json(config_json)
        .map_err(|err| JsValue::from_str(&format!("invalid controller config: {}", err)))?;

    start(config)
}

fn start(config: ControllerConfig) -> Result<(), JsValue> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    logging::init_logger(config.log_level_filter());

    let (_window, document) = dom::window_and_document()?;
    let config = Rc::new(config);

    // posts only exist once the markup is parsed
    if document.ready_state() == "loading" {
        let document0 = document.clone();
        let on_ready = Closure::<dyn FnMut()>::new(move || {
            if let Err(err) = attach_page(&document0, config.clone()) {
                log::warn!("could not attach posts: {}", err);
            }
        });
        document.add_event_listener_with_callback(
            "DOMContentLoaded",
            on_ready.as_ref().unchecked_ref(),
        )?;
        on_ready.forget();
        return Ok(());
    }

    attach_page(&document, config)?;
    Ok(())
}

fn attach_page(document: &web_sys::Document, config: Rc<ControllerConfig>) -> Result<(), dom::DomError> {
    let requests = Rc::new(dom::page_request_helper(document, &config));
    let root = document
        .document_element()
        .ok_or_else(|| dom::DomError::MissingElement("document element".into()))?;
    let controllers = dom::attach_all(&root, config, requests)?;
    log::info!("attached {} post controllers", controllers.len());

    Ok(())
}
