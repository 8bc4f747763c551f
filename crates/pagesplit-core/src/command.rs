use crate::pipeline::{split_pages, SplitOptions};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum PdfCommand {
    Split {
        /// Base64-encoded source PDF
        file: String,
        #[serde(default)]
        options: SplitOptions,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    /// Base64-encoded PDF data
    pub data: Option<String>,
    pub error: Option<String>,
    pub metrics: Option<ProcessMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: u32,
    pub processing_time_ms: u64,
}

impl ProcessResult {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            metrics: None,
        }
    }
}

/// Run a command; failures are reported in the result rather than returned
pub fn process_command(command: &PdfCommand) -> ProcessResult {
    match command {
        PdfCommand::Split { file, options } => {
            let bytes = match STANDARD.decode(file) {
                Ok(bytes) => bytes,
                Err(e) => return ProcessResult::failure(format!("Invalid base64 input: {}", e)),
            };

            let started = Instant::now();
            match split_pages(&bytes, options) {
                Ok(outcome) => ProcessResult {
                    success: true,
                    metrics: Some(ProcessMetrics {
                        input_size_bytes: bytes.len(),
                        output_size_bytes: outcome.bytes.len(),
                        page_count: outcome.report.output_pages,
                        processing_time_ms: started.elapsed().as_millis() as u64,
                    }),
                    data: Some(STANDARD.encode(&outcome.bytes)),
                    error: None,
                },
                Err(e) => ProcessResult::failure(e.to_string()),
            }
        }
    }
}

/// Parse a JSON command and run it
pub fn process_json(json: &str) -> ProcessResult {
    match serde_json::from_str::<PdfCommand>(json) {
        Ok(command) => process_command(&command),
        Err(e) => ProcessResult::failure(format!("Invalid command: {}", e)),
    }
}
