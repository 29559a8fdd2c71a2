use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The category of an [`Error`], for callers that only need to branch on what went wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrKind {
    NullArgument,
    IllegalArgument,
    TypeMismatch,
    UnsupportedContainer,
    InsertTooDangerous,
    Corrupted,
    NotFound,
    InternalError,
    JsonParseError,
    MallocError,
    CleanupError,
}

#[derive(Debug)]
pub enum Error {
    /// A required argument was empty where a value had to be supplied.
    NullArgument(&'static str),
    /// An argument was present but not acceptable, like a malformed dot path or a key of the
    /// wrong type for the document.
    IllegalArgument(String),
    /// A tag byte did not belong to the family the operation expected, or a column's element
    /// type disagrees with the value being inserted.
    TypeMismatch {
        step: &'static str,
        expected: &'static str,
        actual: u8,
    },
    /// The operation isn't legal inside the kind of container the cursor is bound to.
    UnsupportedContainer {
        op: &'static str,
        container: &'static str,
    },
    /// The operation would let a per-call integer width leak into a fixed-width column.
    InsertTooDangerous(&'static str),
    /// An unknown tag byte was found while decoding.
    Corrupted { offset: usize, tag: u8 },
    /// A string or key held invalid UTF-8.
    BadUtf8 { offset: usize },
    /// A read or write would have gone past the end of the buffer.
    OutOfBounds {
        step: &'static str,
        offset: usize,
        len: usize,
    },
    /// A lookup found nothing.
    NotFound(String),
    /// An invariant of the encoder was violated. This is always a bug.
    Internal(String),
    /// The JSON input failed to parse.
    JsonParse {
        msg: String,
        token: String,
        line: usize,
        column: usize,
    },
    /// Nesting went past the configured depth limit.
    ParseLimit(String),
    /// Reserving buffer space failed.
    Malloc(usize),
    /// Releasing a resource failed.
    Cleanup(String),
    /// Occurs when serde serialization or deserialization fails
    SerdeFail(String),
}

impl Error {
    /// Build an internal error. These are logged immediately, and abort debug builds.
    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(%msg, "internal invariant violated");
        debug_assert!(false, "internal invariant violated: {}", msg);
        Error::Internal(msg)
    }

    pub fn kind(&self) -> ErrKind {
        match *self {
            Error::NullArgument(_) => ErrKind::NullArgument,
            Error::IllegalArgument(_) => ErrKind::IllegalArgument,
            Error::TypeMismatch { .. } => ErrKind::TypeMismatch,
            Error::UnsupportedContainer { .. } => ErrKind::UnsupportedContainer,
            Error::InsertTooDangerous(_) => ErrKind::InsertTooDangerous,
            Error::Corrupted { .. } | Error::BadUtf8 { .. } | Error::OutOfBounds { .. } => {
                ErrKind::Corrupted
            }
            Error::NotFound(_) => ErrKind::NotFound,
            Error::Internal(_) => ErrKind::InternalError,
            Error::JsonParse { .. } => ErrKind::JsonParseError,
            Error::ParseLimit(_) | Error::SerdeFail(_) => ErrKind::IllegalArgument,
            Error::Malloc(_) => ErrKind::MallocError,
            Error::Cleanup(_) => ErrKind::CleanupError,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::NullArgument(what) => write!(f, "Missing required argument: {}", what),
            Error::IllegalArgument(ref err) => write!(f, "Illegal argument: {}", err),
            Error::TypeMismatch {
                step,
                expected,
                actual,
            } => write!(
                f,
                "Type mismatch on step [{}]: expected {}, got tag 0x{:02x}",
                step, expected, actual
            ),
            Error::UnsupportedContainer { op, container } => {
                write!(f, "Operation {} is not supported inside {}", op, container)
            }
            Error::InsertTooDangerous(err) => write!(f, "Insert too dangerous: {}", err),
            Error::Corrupted { offset, tag } => write!(
                f,
                "Corrupted document: unknown tag 0x{:02x} at offset {}",
                tag, offset
            ),
            Error::BadUtf8 { offset } => write!(f, "Invalid UTF-8 in string at offset {}", offset),
            Error::OutOfBounds { step, offset, len } => write!(
                f,
                "Needed {} bytes at offset {} on step [{}], but the buffer ended",
                len, offset, step
            ),
            Error::NotFound(ref err) => write!(f, "Not found: {}", err),
            Error::Internal(ref err) => write!(f, "Internal error: {}", err),
            Error::JsonParse {
                ref msg,
                ref token,
                line,
                column,
            } => write!(
                f,
                "JSON parse error at line {}, column {} (near '{}'): {}",
                line, column, token, msg
            ),
            Error::ParseLimit(ref err) => write!(f, "Hit parsing limit: {}", err),
            Error::Malloc(len) => write!(f, "Failed to reserve {} bytes", len),
            Error::Cleanup(ref err) => write!(f, "Cleanup failed: {}", err),
            Error::SerdeFail(ref msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerdeFail(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kinds() {
        let err = Error::OutOfBounds {
            step: "read u8",
            offset: 3,
            len: 1,
        };
        assert_eq!(err.kind(), ErrKind::Corrupted);
        let err = Error::InsertTooDangerous("auto width in column");
        assert_eq!(err.kind(), ErrKind::InsertTooDangerous);
        assert!(format!("{}", err).contains("auto width"));
    }

    #[test]
    fn json_display() {
        let err = Error::JsonParse {
            msg: "expected value".into(),
            token: "tru".into(),
            line: 2,
            column: 5,
        };
        let text = err.to_string();
        assert!(text.contains("line 2"));
        assert!(text.contains("'tru'"));
    }
}
