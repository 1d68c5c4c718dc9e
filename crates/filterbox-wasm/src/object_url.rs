//! Object URLs for the preview `<img>`.
//!
//! The session records which URL belongs to the current image and hands the
//! previous one back when it is replaced; this module creates and revokes them.

use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, Url};

/// Wrap `bytes` in a Blob of type `mime` and return an object URL for it.
pub fn create(bytes: &[u8], mime: &str) -> Result<String, JsValue> {
    let parts = Array::new();
    parts.push(&Uint8Array::from(bytes));

    let options = BlobPropertyBag::new();
    options.set_type(mime);

    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    Url::create_object_url_with_blob(&blob)
}

/// Release a URL returned by [`create`]. Failures are logged, not raised.
pub fn revoke(url: &str) {
    if let Err(e) = Url::revoke_object_url(url) {
        log::warn!("Failed to revoke object URL {url}: {e:?}");
    }
}

/// Revoke `url` if there is one.
pub fn release(url: Option<String>) {
    if let Some(url) = url {
        revoke(&url);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_create_and_revoke() {
        let url = create(&[1, 2, 3], "image/png").unwrap();
        assert!(url.starts_with("blob:"));
        revoke(&url);
    }
}
