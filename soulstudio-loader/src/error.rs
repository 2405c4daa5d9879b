use soulstudio_base::ResourceKind;

/// Failure classes of the loading pipeline. `NotFound`, `Format` and
/// `Container` are recoverable: workers log them and drop the offending
/// request. `ResourceExhausted` is recoverable unless strict resource
/// checking is on. `KindMismatch` and `RefCountUnderflow` are contract
/// violations and always panic at the detection site.
#[derive(Debug, Clone)]
pub enum LoadError {
    NotFound(String),
    Format(String),
    Container(String),
    ResourceExhausted(String),
    KindMismatch {
        path: String,
        expected: ResourceKind,
        actual: ResourceKind,
    },
    RefCountUnderflow(String),
}

impl std::error::Error for LoadError {}

impl core::fmt::Display for LoadError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        match self {
            LoadError::NotFound(path) => write!(fmt, "resource not found: {}", path),
            LoadError::Format(detail) => write!(fmt, "malformed resource data: {}", detail),
            LoadError::Container(detail) => write!(fmt, "unreadable container: {}", detail),
            LoadError::ResourceExhausted(path) => {
                write!(fmt, "descriptor pool exhausted while loading {}", path)
            }
            LoadError::KindMismatch {
                path,
                expected,
                actual,
            } => write!(
                fmt,
                "handle for {} already exists as {} but {} was requested",
                path, actual, expected
            ),
            LoadError::RefCountUnderflow(path) => {
                write!(fmt, "reference count underflow on {}", path)
            }
        }
    }
}

impl From<&str> for LoadError {
    fn from(detail: &str) -> Self {
        LoadError::Format(detail.to_string())
    }
}

impl From<String> for LoadError {
    fn from(detail: String) -> Self {
        LoadError::Format(detail)
    }
}
