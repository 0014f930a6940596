//! Document Data Model
//!
//! Types flowing through the extraction half of the pipeline:
//! raw uploaded bytes, OCR output with provenance, and normalized text.
//! All of them are immutable once constructed.

use serde::{Deserialize, Serialize};

/// Media types the OCR collaborator accepts
pub const SUPPORTED_MEDIA_TYPES: &[&str] = &[
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/tiff",
];

// =============================================================================
// Raw Document
// =============================================================================

/// Uploaded document content with its declared media type.
///
/// Created once per session and destroyed with it; fields are private so the
/// bytes cannot be swapped after upload.
#[derive(Debug, Clone)]
pub struct RawDocument {
    bytes: Vec<u8>,
    media_type: String,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Guess the media type from a file extension, defaulting to PDF
    pub fn from_file_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Self {
        let media_type = match extension.map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("tif") | Some("tiff") => "image/tiff",
            _ => "application/pdf",
        };
        Self::new(bytes, media_type)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check the declared media type against the supported set
    pub fn is_supported(&self) -> bool {
        SUPPORTED_MEDIA_TYPES.contains(&self.media_type.as_str())
    }
}

// =============================================================================
// Extracted Text
// =============================================================================

/// One OCR line with page/line provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    /// 1-based page number
    pub page: u32,
    /// 1-based line number within the page
    pub line: u32,
    pub content: String,
}

impl TextSegment {
    pub fn new(page: u32, line: u32, content: impl Into<String>) -> Self {
        Self {
            page,
            line,
            content: content.into(),
        }
    }
}

/// Ordered OCR output, consumed once by the normalizer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub segments: Vec<TextSegment>,
}

impl ExtractedText {
    pub fn new(segments: Vec<TextSegment>) -> Self {
        Self { segments }
    }

    /// Build from per-page line lists (page order preserved)
    pub fn from_pages(pages: Vec<Vec<String>>) -> Self {
        let segments = pages
            .into_iter()
            .enumerate()
            .flat_map(|(page_idx, lines)| {
                lines
                    .into_iter()
                    .enumerate()
                    .map(move |(line_idx, content)| {
                        TextSegment::new(page_idx as u32 + 1, line_idx as u32 + 1, content)
                    })
            })
            .collect();
        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.content.trim().is_empty())
    }

    pub fn page_count(&self) -> u32 {
        self.segments.iter().map(|s| s.page).max().unwrap_or(0)
    }

    /// Raw text with one line per segment (debugging view)
    pub fn raw_text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push_str(&segment.content);
            out.push('\n');
        }
        out
    }
}

// =============================================================================
// Cleaned Text
// =============================================================================

/// Normalized document text, owned by the session for its lifetime.
///
/// Invariants (upheld by the normalizer): no mid-word line breaks, single
/// spaces between currency/number tokens and letter runs, no page-number or
/// repeated-header artifacts. `degraded` flags a best-effort result where
/// the heuristics could not fully normalize; the text is still usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedText {
    text: String,
    degraded: bool,
}

impl CleanedText {
    pub fn new(text: String, degraded: bool) -> Self {
        Self { text, degraded }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }
}

impl std::fmt::Display for CleanedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(
            RawDocument::from_file_bytes(vec![1], Some("png")).media_type(),
            "image/png"
        );
        assert_eq!(
            RawDocument::from_file_bytes(vec![1], Some("JPG")).media_type(),
            "image/jpeg"
        );
        assert_eq!(
            RawDocument::from_file_bytes(vec![1], Some("pdf")).media_type(),
            "application/pdf"
        );
        assert_eq!(
            RawDocument::from_file_bytes(vec![1], None).media_type(),
            "application/pdf"
        );
    }

    #[test]
    fn test_supported_media_types() {
        assert!(RawDocument::new(vec![1], "application/pdf").is_supported());
        assert!(!RawDocument::new(vec![1], "text/csv").is_supported());
    }

    #[test]
    fn test_extracted_text_from_pages() {
        let text = ExtractedText::from_pages(vec![
            vec!["Revenue grew".to_string(), "Page 1".to_string()],
            vec!["Costs fell".to_string()],
        ]);

        assert_eq!(text.segments.len(), 3);
        assert_eq!(text.page_count(), 2);
        assert_eq!(text.segments[0], TextSegment::new(1, 1, "Revenue grew"));
        assert_eq!(text.segments[2], TextSegment::new(2, 1, "Costs fell"));
    }

    #[test]
    fn test_extracted_text_empty() {
        assert!(ExtractedText::default().is_empty());
        let blank = ExtractedText::from_pages(vec![vec!["   ".to_string()]]);
        assert!(blank.is_empty());
    }

    #[test]
    fn test_raw_text_view() {
        let text = ExtractedText::from_pages(vec![vec!["a".to_string(), "b".to_string()]]);
        assert_eq!(text.raw_text(), "a\nb\n");
    }
}
