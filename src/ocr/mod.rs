//! OCR Collaborator
//!
//! Turns uploaded document bytes into ordered text segments with page/line
//! provenance. The trait is the seam; the remote implementation speaks the
//! submit-then-poll document-analysis REST shape, and the sample engine
//! backs demo mode with a fixed report so the rest of the pipeline can run
//! without credentials.

mod remote;
mod sample;

pub use remote::RemoteOcrClient;
pub use sample::SampleOcr;

use async_trait::async_trait;

use crate::types::{ExtractedText, FinsightError, RawDocument, Result};

/// Text extraction backend
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Extract ordered text segments from a document.
    ///
    /// Fails with `UnsupportedFormat` for media types outside the supported
    /// set, or `ExtractionFailed` when the service cannot produce text.
    async fn extract(&self, document: &RawDocument) -> Result<ExtractedText>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Media-type gate shared by engines; runs before any network call
pub(crate) fn check_supported(document: &RawDocument) -> Result<()> {
    if document.is_empty() {
        return Err(FinsightError::ExtractionFailed(
            "document is empty".to_string(),
        ));
    }
    if !document.is_supported() {
        return Err(FinsightError::UnsupportedFormat(
            document.media_type().to_string(),
        ));
    }
    Ok(())
}
