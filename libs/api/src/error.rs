// ═══════════════════════════════════════════════════════════════
//  Error kind
// ═══════════════════════════════════════════════════════════════

/// Category of a capability error. Lets callers decide what a failure
/// means for the surrounding pipeline: the dispatch pool skips bad
/// records and shrugs off transport failures, while the enrichment
/// stage treats every category as fatal for the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration — permanent, fail at startup.
    Config,
    /// I/O or network failure — transient.
    Io,
    /// Serialization or parse failure — bad payload.
    Format,
    /// The remote side answered with a non-success status.
    Status,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Io => f.write_str("io"),
            ErrorKind::Format => f.write_str("format"),
            ErrorKind::Status => f.write_str("status"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Capability error
// ═══════════════════════════════════════════════════════════════

/// Unified error type for sink and lookup implementations.
///
/// Carries an `ErrorKind` for categorization and a human-readable message.
/// `From` impls assign the appropriate kind automatically and allow
/// ergonomic `?` inside capability implementations.
#[derive(Clone)]
pub struct CapabilityError {
    kind: ErrorKind,
    message: String,
}

impl CapabilityError {
    /// Configuration error — permanent, fail at startup.
    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    /// I/O error — transient.
    pub fn io(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Io, message: msg.into() }
    }

    /// Format/parse error — bad payload.
    pub fn format_err(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Format, message: msg.into() }
    }

    /// Non-success response status from a remote capability.
    pub fn status(code: u16) -> Self {
        Self {
            kind: ErrorKind::Status,
            message: format!("unexpected status code: {code}"),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Debug for CapabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CapabilityError {}

impl From<serde_json::Error> for CapabilityError {
    fn from(e: serde_json::Error) -> Self {
        Self { kind: ErrorKind::Format, message: e.to_string() }
    }
}

impl From<std::io::Error> for CapabilityError {
    fn from(e: std::io::Error) -> Self {
        Self { kind: ErrorKind::Io, message: e.to_string() }
    }
}

impl From<std::str::Utf8Error> for CapabilityError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self { kind: ErrorKind::Format, message: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_carries_code_and_kind() {
        let e = CapabilityError::status(503);
        assert_eq!(e.kind(), ErrorKind::Status);
        assert_eq!(e.message(), "unexpected status code: 503");
        assert_eq!(format!("{e:?}"), "[status] unexpected status code: 503");
    }

    #[test]
    fn from_impls_assign_kinds() {
        let json_err = serde_json::from_str::<i64>("not json").unwrap_err();
        assert_eq!(CapabilityError::from(json_err).kind(), ErrorKind::Format);

        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        assert_eq!(CapabilityError::from(io_err).kind(), ErrorKind::Io);

        let utf8_err = std::str::from_utf8(&[0xFF]).unwrap_err();
        assert_eq!(CapabilityError::from(utf8_err).kind(), ErrorKind::Format);
    }
}
