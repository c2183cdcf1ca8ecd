use thiserror::Error;

/// Errors that can occur while building, signing or submitting a document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CpeError {
    /// One or more validation rules failed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Credential loading, canonicalization or signing failed.
    #[error("signing error: {0}")]
    Signing(String),

    /// The HTTP exchange with SUNAT did not complete.
    #[error("transport error ({kind}): {message}")]
    Transport {
        kind: TransportKind,
        message: String,
    },

    /// SUNAT answered with a SOAP fault.
    #[error("SOAP fault {code}: {message}")]
    ProtocolFault { code: String, message: String },

    /// SUNAT processed the document and rejected it in the CDR.
    #[error("rejected by SUNAT ({code}): {message}")]
    Rejection { code: String, message: String },

    /// The requested operation is not available yet.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// XML generation or parsing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// ZIP archive error.
    #[error("package error: {0}")]
    Package(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CpeError {
    pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// True for failures where the request may never have reached SUNAT.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                kind: TransportKind::Timeout | TransportKind::Connect,
                ..
            }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                kind: TransportKind::Timeout,
                ..
            }
        )
    }

    /// Join a list of validation errors into a single `Validation` error.
    pub fn from_validation(errors: &[ValidationError]) -> Self {
        let msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Self::Validation(msg)
    }
}

/// Classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    /// Non-2xx response without a SOAP fault in the body.
    HttpStatus(u16),
    Other,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::Connect => f.write_str("connect"),
            Self::HttpStatus(code) => write!(f, "HTTP {code}"),
            Self::Other => f.write_str("other"),
        }
    }
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "lines[0].quantity").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
    /// SUNAT error code if applicable (e.g. "2335").
    pub rule: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "[{}] {}: {}", rule, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl ValidationError {
    /// Create a validation error without a rule ID.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Create a validation error carrying a SUNAT error code.
    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}
