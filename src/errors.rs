use thiserror::Error;

pub type IplResult<T, E = IplError> = Result<T, E>;

/// A syntax error reported by the lexer or parser. These are per-file and
/// recoverable at the driver level: the offending file is logged and skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum IplError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Msg(String),
}

impl From<&str> for IplError {
    fn from(s: &str) -> Self {
        IplError::Msg(s.to_owned())
    }
}

impl From<String> for IplError {
    fn from(s: String) -> Self {
        IplError::Msg(s)
    }
}

#[test]
fn io_conversion_retains_message() {
    let e = std::io::Error::other("boom!");
    let n: IplError = e.into();
    assert!(matches!(n, IplError::Io(_)));
    assert!(n.to_string().contains("boom"));
}

#[test]
fn parse_error_carries_line() {
    let e = ParseError::new(7, "unexpected token");
    let n: IplError = e.into();
    assert_eq!(n.to_string(), "syntax error: line 7: unexpected token");
}

#[test]
fn simple_string_into_msg() {
    let n: IplError = "plain msg".into();
    assert!(matches!(n, IplError::Msg(s) if s == "plain msg"));
}
