//! Stateful split session
//!
//! Holds the uploaded document and the user's split choices in Rust, so
//! JavaScript only forwards form events and downloads the result.

use crate::page_info::{PageInfo, SplitPreview};
use crate::validation::{validate_pdf, PdfInfo};
use pagesplit_core::{
    select_pages, split_pages_with_progress, LopdfCanvas, RangeMode, Rotation, SplitMode,
    SplitOptions, SplitPolicy, SplitProgress, SplitReport,
};
use wasm_bindgen::prelude::*;

/// Document entry with metadata
struct DocumentEntry {
    name: String,
    bytes: Vec<u8>,
    info: PdfInfo,
    pages: Vec<PageInfo>,
}

/// Stateful split session that holds one document in Rust memory
#[wasm_bindgen]
pub struct PdfSplitSession {
    document: Option<DocumentEntry>,
    options: SplitOptions,
    last_report: Option<SplitReport>,
    progress_callback: Option<js_sys::Function>,
}

impl Default for PdfSplitSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl PdfSplitSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            document: None,
            options: SplitOptions::default(),
            last_report: None,
            progress_callback: None,
        }
    }

    /// Set a progress callback function
    /// Callback signature: (processed: number, total: number, percent: number) => void
    #[wasm_bindgen(js_name = setProgressCallback)]
    pub fn set_progress_callback(&mut self, callback: js_sys::Function) {
        self.progress_callback = Some(callback);
    }

    /// Load the document to split, replacing any previous one.
    /// Prefills the page ranges with every page.
    #[wasm_bindgen(js_name = addDocument)]
    pub fn add_document(&mut self, name: &str, bytes: &[u8]) -> Result<JsValue, JsValue> {
        let info = self
            .add_document_internal(name, bytes)
            .map_err(|e| JsValue::from_str(&e))?;
        to_js(&info)
    }

    #[wasm_bindgen(js_name = removeDocument)]
    pub fn remove_document(&mut self) {
        self.document = None;
        self.options.ranges.clear();
        self.last_report = None;
    }

    #[wasm_bindgen(js_name = hasDocument)]
    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    #[wasm_bindgen(js_name = getDocumentName)]
    pub fn get_document_name(&self) -> Option<String> {
        self.document.as_ref().map(|d| d.name.clone())
    }

    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> u32 {
        self.document.as_ref().map_or(0, |d| d.info.page_count)
    }

    /// Input: "1-3, 5, 8-10" format
    #[wasm_bindgen(js_name = setPageRanges)]
    pub fn set_page_ranges(&mut self, ranges: &str) -> Result<(), JsValue> {
        self.set_page_ranges_internal(ranges)
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = getPageRanges)]
    pub fn get_page_ranges(&self) -> String {
        self.options.ranges.clone()
    }

    #[wasm_bindgen(js_name = setExtended)]
    pub fn set_extended(&mut self, extended: bool) {
        self.options.mode = SplitMode::from_extended(extended);
    }

    #[wasm_bindgen(js_name = isExtended)]
    pub fn is_extended(&self) -> bool {
        self.options.mode == SplitMode::Extended
    }

    /// Replace the split policy from its JSON form; missing fields take defaults
    #[wasm_bindgen(js_name = setPolicyJson)]
    pub fn set_policy_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.set_policy_json_internal(json)
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = getPolicyJson)]
    pub fn get_policy_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.options.policy)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Counter-clockwise turn in degrees, a multiple of 90
    #[wasm_bindgen(js_name = setRotation)]
    pub fn set_rotation(&mut self, degrees: i32) -> Result<(), JsValue> {
        self.set_rotation_internal(degrees)
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = setStrict)]
    pub fn set_strict(&mut self, strict: bool) {
        self.options.range_mode = if strict {
            RangeMode::Strict
        } else {
            RangeMode::Permissive
        };
    }

    #[wasm_bindgen(js_name = getSelectedPages)]
    pub fn get_selected_pages(&self) -> Result<Vec<u32>, JsValue> {
        self.selected_pages_internal()
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = getPageInfos)]
    pub fn get_page_infos(&self) -> Result<JsValue, JsValue> {
        let doc = self
            .document
            .as_ref()
            .ok_or_else(|| JsValue::from_str("No document loaded"))?;
        to_js(&doc.pages)
    }

    /// Half-page sizes for every selected page under the current settings
    #[wasm_bindgen(js_name = getSplitPreview)]
    pub fn get_split_preview(&self) -> Result<JsValue, JsValue> {
        let previews = self.previews_internal().map_err(|e| JsValue::from_str(&e))?;
        to_js(&previews)
    }

    #[wasm_bindgen(js_name = canExecute)]
    pub fn can_execute(&self) -> bool {
        self.document.is_some()
            && self
                .selected_pages_internal()
                .map(|pages| !pages.is_empty())
                .unwrap_or(false)
    }

    /// Run the split and return the output PDF as a Uint8Array
    pub fn execute(&mut self) -> Result<js_sys::Uint8Array, JsValue> {
        if !self.can_execute() {
            return Err(JsValue::from_str("Session not ready for execution"));
        }

        let callback = self.progress_callback.clone();
        let bytes = self
            .execute_internal(|progress| report_progress(callback.as_ref(), progress))
            .map_err(|e| JsValue::from_str(&e))?;

        let array = js_sys::Uint8Array::new_with_length(bytes.len() as u32);
        array.copy_from(&bytes);
        Ok(array)
    }

    /// Page counts of the last successful execute
    #[wasm_bindgen(js_name = getLastReport)]
    pub fn get_last_report(&self) -> Result<JsValue, JsValue> {
        match &self.last_report {
            Some(report) => to_js(report),
            None => Ok(JsValue::NULL),
        }
    }
}

impl PdfSplitSession {
    fn add_document_internal(&mut self, name: &str, bytes: &[u8]) -> Result<PdfInfo, String> {
        let info = validate_pdf(bytes)?;
        let canvas = LopdfCanvas::load(bytes).map_err(|e| e.to_string())?;
        let pages = PageInfo::all_from_canvas(&canvas)?;

        // Same default the upload form always had: every page selected
        self.options.ranges = format!("1-{}", info.page_count);
        self.last_report = None;
        self.document = Some(DocumentEntry {
            name: name.to_string(),
            bytes: bytes.to_vec(),
            info: info.clone(),
            pages,
        });

        Ok(info)
    }

    fn set_page_ranges_internal(&mut self, ranges: &str) -> Result<(), String> {
        // Strict mode reports bad input as soon as it is typed
        if self.options.range_mode == RangeMode::Strict {
            select_pages(ranges, self.get_page_count(), RangeMode::Strict)
                .map_err(|e| e.to_string())?;
        }
        self.options.ranges = ranges.to_string();
        Ok(())
    }

    fn set_policy_json_internal(&mut self, json: &str) -> Result<(), String> {
        let policy: SplitPolicy =
            serde_json::from_str(json).map_err(|e| format!("Invalid policy: {}", e))?;
        policy.validate().map_err(|e| e.to_string())?;
        self.options.policy = policy;
        Ok(())
    }

    fn set_rotation_internal(&mut self, degrees: i32) -> Result<(), String> {
        self.options.rotation = Rotation::from_degrees(i64::from(degrees)).ok_or_else(|| {
            format!("Rotation must be a multiple of 90 degrees, got {}", degrees)
        })?;
        Ok(())
    }

    fn selected_pages_internal(&self) -> Result<Vec<u32>, String> {
        select_pages(
            &self.options.ranges,
            self.get_page_count(),
            self.options.range_mode,
        )
        .map_err(|e| e.to_string())
    }

    fn previews_internal(&self) -> Result<Vec<SplitPreview>, String> {
        let doc = self.document.as_ref().ok_or("No document loaded")?;
        let selected = self.selected_pages_internal()?;
        Ok(doc
            .pages
            .iter()
            .filter(|page| selected.binary_search(&page.page_num).is_ok())
            .map(|page| {
                page.preview(
                    self.options.mode,
                    &self.options.policy,
                    self.options.rotation,
                )
            })
            .collect())
    }

    fn execute_internal<F>(&mut self, progress: F) -> Result<Vec<u8>, String>
    where
        F: FnMut(SplitProgress),
    {
        let doc = self.document.as_ref().ok_or("Please supply a PDF file")?;
        let outcome = split_pages_with_progress(&doc.bytes, &self.options, progress)
            .map_err(|e| format!("Split failed: {}", e))?;
        self.last_report = Some(outcome.report);
        Ok(outcome.bytes)
    }
}

fn report_progress(callback: Option<&js_sys::Function>, progress: SplitProgress) {
    if let Some(callback) = callback {
        let _ = callback.call3(
            &JsValue::null(),
            &JsValue::from(progress.processed),
            &JsValue::from(progress.total),
            &JsValue::from(progress.percent()),
        );
    }
}

fn to_js<T: serde::Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
