pub mod analysis;
pub mod document;
pub mod error;

pub use analysis::{
    AnalysisKind, AnalysisRequest, AnalysisResult, Fingerprint, Parameters, TokenUsage,
};
pub use document::{
    CleanedText, ExtractedText, RawDocument, SUPPORTED_MEDIA_TYPES, TextSegment,
};
pub use error::{
    ErrorClassifier, FinsightError, GatewayError, GatewayErrorKind, Result,
};
