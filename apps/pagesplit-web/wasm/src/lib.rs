//! WASM bindings for PDF page splitting
//!
//! State lives in Rust via `PdfSplitSession`; JavaScript only handles DOM
//! events and file I/O.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { PdfSplitSession } from './pkg/pagesplit_wasm.js';
//!
//! await init();
//!
//! const session = new PdfSplitSession();
//! session.setProgressCallback((processed, total, percent) => updateUI(percent));
//! const info = session.addDocument("scan.pdf", bytes); // ranges prefilled with "1-N"
//! session.setPageRanges("1-3, 5");
//! session.setExtended(true);
//! const result = session.execute();
//! downloadBlob(result, "scan_split.pdf");
//! ```

pub mod page_info;
pub mod session;
pub mod validation;

#[cfg(test)]
mod test_support;

use wasm_bindgen::prelude::*;

pub use page_info::{PageInfo, PageOrientation, SplitPreview};
pub use session::PdfSplitSession;
pub use validation::PdfInfo;

/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Cheap header/trailer check before the file is parsed
#[wasm_bindgen]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    validation::quick_validate(bytes).map_err(|e| JsValue::from_str(&e))
}

/// Get PDF info without creating a session
#[wasm_bindgen]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = validation::validate_pdf(bytes).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[wasm_bindgen]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    pagesplit_core::get_page_count(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Format bytes as human-readable string
#[wasm_bindgen]
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
