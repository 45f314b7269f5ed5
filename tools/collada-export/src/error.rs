//! Conversion error taxonomy
//!
//! Every extractor and writer reports failures through [`ConvertError`]. All
//! variants are fatal for the current conversion; the pipeline never falls
//! back to partial output.

/// Errors raised while extracting or emitting a COLLADA scene
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The input could not be parsed as XML at all
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A required element or attribute is absent
    #[error("missing <{element}> in {context}")]
    MissingElement { element: String, context: String },

    /// A `#id`/`sid` cross-reference points at nothing
    #[error("unresolved {kind} reference '{id}'")]
    UnresolvedReference { kind: &'static str, id: String },

    /// A material slot declares zero or several of texture/color/float
    #[error("parameter '{param}' in effect '{effect}' has {found} value kinds (expected exactly 1)")]
    AmbiguousParameter {
        effect: String,
        param: String,
        found: usize,
    },

    /// The effect does not declare `profile_COMMON`
    #[error("effect '{effect}' has no profile_COMMON")]
    UnsupportedProfile { effect: String },

    /// A declared count disagrees with the actual content or stride
    #[error("malformed count in {context}: {detail}")]
    MalformedCount { context: String, detail: String },

    /// A token in a numeric stream is not a number
    #[error("invalid number '{token}' in {context}")]
    InvalidNumber { context: String, token: String },

    /// An index stream entry points past the end of its buffer
    #[error("index {index} out of range in {context} (len {len})")]
    IndexOutOfRange {
        context: String,
        index: i64,
        len: usize,
    },

    /// A material parameter has no output key and is not skip-listed
    #[error("material '{material}' has unknown parameter '{param}'")]
    UnknownParameter { material: String, param: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub(crate) fn missing(element: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingElement {
            element: element.into(),
            context: context.into(),
        }
    }

    pub(crate) fn unresolved(kind: &'static str, id: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn count(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedCount {
            context: context.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
