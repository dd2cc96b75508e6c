//! Browser download sink.
//!
//! Wraps the PNG bytes in a `Blob`, points a temporary `<a download>` at an
//! object URL for it, clicks the anchor and revokes the URL again.

use visioncut_core::DownloadSink;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, Document, HtmlAnchorElement, Url};

use crate::errors::describe_js_error;

const PNG_MIME_TYPE: &str = "image/png";

/// Delivers exports as a file download in the current document.
#[derive(Debug, Default)]
pub(crate) struct BrowserDownload;

impl DownloadSink for BrowserDownload {
    type Error = String;

    fn deliver(&mut self, filename: &str, png: &[u8]) -> Result<(), String> {
        trigger_download(filename, png).map_err(|e| describe_js_error(&e))
    }
}

fn trigger_download(filename: &str, png: &[u8]) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("No document available"))?;

    let bytes = js_sys::Uint8Array::from(png);
    let parts = js_sys::Array::of1(&bytes);
    let options = BlobPropertyBag::new();
    options.set_type(PNG_MIME_TYPE);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;

    let url = Url::create_object_url_with_blob(&blob)?;
    let clicked = click_anchor(&document, &url, filename);
    // Revoke even if the click failed so the blob is not leaked.
    Url::revoke_object_url(&url)?;
    clicked
}

fn click_anchor(document: &Document, url: &str, filename: &str) -> Result<(), JsValue> {
    let anchor: HtmlAnchorElement = document
        .create_element("a")?
        .dyn_into()
        .map_err(|_| JsValue::from_str("Created element is not an anchor"))?;
    anchor.set_href(url);
    anchor.set_download(filename);

    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("Document has no body"))?;
    body.append_child(&anchor)?;
    anchor.click();
    body.remove_child(&anchor)?;
    Ok(())
}
