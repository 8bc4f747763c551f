//! PDF validation and info extraction
//!
//! Checks an upload before it is handed to the split engine.

use lopdf::Document;
use serde::Serialize;

/// PDF file information extracted during validation
#[derive(Debug, Clone, Serialize, Default)]
pub struct PdfInfo {
    /// Number of pages in the document
    pub page_count: u32,
    /// PDF version string (e.g., "1.7")
    pub version: String,
    /// File size in bytes
    pub size_bytes: usize,
    /// Document title from metadata (if available)
    pub title: Option<String>,
}

/// Validate a PDF file and extract basic info
pub fn validate_pdf(bytes: &[u8]) -> Result<PdfInfo, String> {
    check_header(bytes)?;

    let document = Document::load_mem(bytes).map_err(|e| format!("Failed to parse PDF: {}", e))?;

    // The split engine cannot read encrypted content streams
    if document.is_encrypted() {
        return Err("Encrypted PDFs are not supported".to_string());
    }

    let page_count = document.get_pages().len() as u32;
    if page_count == 0 {
        return Err("PDF has no pages".to_string());
    }

    Ok(PdfInfo {
        page_count,
        version: extract_version(bytes),
        size_bytes: bytes.len(),
        title: extract_title(&document),
    })
}

/// Quick validation without full parsing (for large files)
pub fn quick_validate(bytes: &[u8]) -> Result<(), String> {
    check_header(bytes)?;

    let tail = &bytes[bytes.len().saturating_sub(1024)..];
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err("PDF appears truncated (missing %%EOF marker)".to_string());
    }

    Ok(())
}

fn check_header(bytes: &[u8]) -> Result<(), String> {
    if bytes.is_empty() {
        return Err("Please supply a PDF file".to_string());
    }
    if bytes.len() < 8 {
        return Err("File too small to be a valid PDF".to_string());
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err("Not a valid PDF file (missing %PDF- header)".to_string());
    }
    Ok(())
}

/// Header format: %PDF-1.7
fn extract_version(bytes: &[u8]) -> String {
    bytes
        .get(5..8)
        .and_then(|v| std::str::from_utf8(v).ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "1.4".to_string())
}

fn extract_title(document: &Document) -> Option<String> {
    let info_id = document.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let title = document
        .get_dictionary(info_id)
        .ok()?
        .get(b"Title")
        .ok()?
        .as_str()
        .ok()?;
    let decoded = String::from_utf8_lossy(title);
    (!decoded.is_empty()).then(|| decoded.into_owned())
}
