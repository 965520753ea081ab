use std::convert::Into;
use std::error::Error as StdError;
use std::fmt;

/// The kind of an error (non-exhaustive)
#[non_exhaustive]
#[derive(Debug)]
pub enum ErrorKind {
    /// Generic error raised while evaluating a template
    Msg(String),
    /// The tokenizer or the parser rejected the template source
    Syntax {
        /// What went wrong
        message: String,
        /// 1-based line of the offending token
        line: usize,
        /// Byte offset of the offending token in the source
        position: usize,
    },
    /// A filter was used in a template but was never registered
    FilterNotFound(String),
    /// An error happened while calling a filter
    CallFilter(String),
    /// `#each` was given something that is neither an array nor an object
    NotIterable(String),
    /// `#set` tried to walk a property chain through a value that is not an object
    InvalidSetTarget(String),
    /// The path of an `#include` did not evaluate to a string
    InvalidIncludePath(String),
    /// A template file could not be found
    TemplateNotFound(String),
    /// An error happened while rendering an included template
    Include(String),
    /// Includes nested deeper than the configured limit, most likely a cycle
    IncludeDepth(String),
    /// A resolved template path escapes the configured root
    PathTraversal(String),
    /// An IO error occurred
    Io(std::io::ErrorKind),
    /// An error while converting data to or from JSON values
    Json(serde_json::Error),
}

/// The family an [`ErrorKind`] belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Tokenizer and parser errors
    Syntax,
    /// Errors raised while evaluating the AST
    Evaluation,
    /// Template files that can't be found or read
    File,
    /// Paths escaping the configured root
    PathSecurity,
}

/// The Error type
#[derive(Debug)]
pub struct Error {
    /// Kind of error
    pub kind: ErrorKind,
    source: Option<Box<dyn StdError + Sync + Send>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Msg(ref message) => write!(f, "{}", message),
            ErrorKind::Syntax { ref message, line, position } => {
                write!(f, "Syntax error at line {} (position {}): {}", line, position, message)
            }
            ErrorKind::FilterNotFound(ref name) => write!(f, "Filter '{}' not found", name),
            ErrorKind::CallFilter(ref name) => write!(f, "Filter call '{}' failed", name),
            ErrorKind::NotIterable(ref what) => {
                write!(f, "Tried to iterate on `{}` which is neither an array nor an object", what)
            }
            ErrorKind::InvalidSetTarget(ref what) => {
                write!(f, "Cannot assign through `{}`: it is not an object", what)
            }
            ErrorKind::InvalidIncludePath(ref got) => {
                write!(f, "Include path must evaluate to a string, got `{}`", got)
            }
            ErrorKind::TemplateNotFound(ref name) => write!(f, "Template '{}' not found", name),
            ErrorKind::Include(ref path) => write!(f, "Failed to render included template '{}'", path),
            ErrorKind::IncludeDepth(ref path) => write!(
                f,
                "Include depth limit reached while including '{}' (is a template including itself?)",
                path
            ),
            ErrorKind::PathTraversal(ref path) => {
                write!(f, "Template path '{}' resolves outside of the configured root", path)
            }
            ErrorKind::Io(ref io_error) => {
                write!(f, "Io error while reading a template: {:?}", io_error)
            }
            ErrorKind::Json(ref e) => write!(f, "{}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|c| &**c as &(dyn StdError + 'static))
    }
}

impl Error {
    /// Creates generic error
    pub fn msg(value: impl ToString) -> Self {
        Self { kind: ErrorKind::Msg(value.to_string()), source: None }
    }

    /// Creates generic error with a source
    pub fn chain(value: impl ToString, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { kind: ErrorKind::Msg(value.to_string()), source: Some(source.into()) }
    }

    /// Creates a syntax error pointing at a place in the template source
    pub fn syntax(message: impl ToString, line: usize, position: usize) -> Self {
        Self { kind: ErrorKind::Syntax { message: message.to_string(), line, position }, source: None }
    }

    /// Creates an error for a filter that isn't registered
    pub fn filter_not_found(name: impl ToString) -> Self {
        Self { kind: ErrorKind::FilterNotFound(name.to_string()), source: None }
    }

    /// Creates an error wrapping a failed filter call
    pub fn call_filter(name: impl ToString, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { kind: ErrorKind::CallFilter(name.to_string()), source: Some(source.into()) }
    }

    /// Creates an error for a non-iterable `#each` target
    pub fn not_iterable(what: impl ToString) -> Self {
        Self { kind: ErrorKind::NotIterable(what.to_string()), source: None }
    }

    /// Creates an error for a `#set` property chain going through a non-object
    pub fn invalid_set_target(what: impl ToString) -> Self {
        Self { kind: ErrorKind::InvalidSetTarget(what.to_string()), source: None }
    }

    /// Creates an error for an `#include` whose path isn't a string
    pub fn invalid_include_path(got: impl ToString) -> Self {
        Self { kind: ErrorKind::InvalidIncludePath(got.to_string()), source: None }
    }

    /// Creates an error for includes nested deeper than allowed
    pub fn include_depth(path: impl ToString) -> Self {
        Self { kind: ErrorKind::IncludeDepth(path.to_string()), source: None }
    }

    /// Creates an error wrapping anything that failed while rendering an include
    pub fn include(path: impl ToString, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { kind: ErrorKind::Include(path.to_string()), source: Some(source.into()) }
    }

    /// Creates a template not found error
    pub fn template_not_found(name: impl ToString) -> Self {
        Self { kind: ErrorKind::TemplateNotFound(name.to_string()), source: None }
    }

    /// Creates an error for a path resolving outside of the root
    pub fn path_traversal(path: impl ToString) -> Self {
        Self { kind: ErrorKind::PathTraversal(path.to_string()), source: None }
    }

    /// Creates JSON error
    pub fn json(value: serde_json::Error) -> Self {
        Self { kind: ErrorKind::Json(value), source: None }
    }

    /// Walks the chain of wrapped stencil errors (includes, filter calls) and
    /// returns the innermost one
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Some(inner) = current.source.as_ref().and_then(|s| s.downcast_ref::<Error>()) {
            current = inner;
        }
        current
    }

    /// Which family of errors this one belongs to
    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            ErrorKind::Syntax { .. } => ErrorCategory::Syntax,
            ErrorKind::TemplateNotFound(_)
            | ErrorKind::Io(_)
            | ErrorKind::Include(_)
            | ErrorKind::IncludeDepth(_) => ErrorCategory::File,
            ErrorKind::PathTraversal(_) => ErrorCategory::PathSecurity,
            ErrorKind::Msg(_)
            | ErrorKind::FilterNotFound(_)
            | ErrorKind::CallFilter(_)
            | ErrorKind::NotIterable(_)
            | ErrorKind::InvalidSetTarget(_)
            | ErrorKind::InvalidIncludePath(_)
            | ErrorKind::Json(_) => ErrorCategory::Evaluation,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => {
                Self { kind: ErrorKind::TemplateNotFound(error.to_string()), source: None }
            }
            kind => Self { kind: ErrorKind::Io(kind), source: Some(Box::new(error)) },
        }
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Self::msg(e)
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Self::msg(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::json(e)
    }
}

/// Convenient wrapper around std::Result.
pub type Result<T> = ::std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_send_and_sync() {
        fn test_send_sync<T: Send + Sync>() {}

        test_send_sync::<super::Error>();
    }

    #[test]
    fn root_cause_walks_through_include_wrappers() {
        let inner = Error::path_traversal("../secret.html");
        let wrapped = Error::include("a.html", Error::include("b.html", inner));

        assert!(matches!(wrapped.kind, ErrorKind::Include(_)));
        assert!(matches!(wrapped.root_cause().kind, ErrorKind::PathTraversal(_)));
        assert_eq!(wrapped.root_cause().category(), ErrorCategory::PathSecurity);
        assert_eq!(wrapped.category(), ErrorCategory::File);
    }

    #[test]
    fn io_not_found_maps_to_template_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "nope.html");
        let err = Error::from(io);
        assert!(matches!(err.kind, ErrorKind::TemplateNotFound(_)));
    }

    #[test]
    fn syntax_error_mentions_position() {
        let err = Error::syntax("Unterminated string", 2, 14);
        assert_eq!(err.to_string(), "Syntax error at line 2 (position 14): Unterminated string");
        assert_eq!(err.category(), ErrorCategory::Syntax);
    }
}
