//! Error taxonomy for template validation, layout and encoding.
//!
//! Malformed markup is never an error: the parser degrades to plain
//! paragraphs. An overlong token is a warning recorded on the line and in
//! [`GeneratedDocument::warnings`](crate::model::GeneratedDocument).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Placeholders that are neither system nor custom variables.
    #[error("unresolved template variables: {}", .0.join(", "))]
    UnresolvedVariables(Vec<String>),

    /// Layout could not be completed for the given configuration.
    #[error("layout failed: {0}")]
    InvalidLayout(String),

    #[error("encoding failed: {0}")]
    Encoding(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Names carried by an [`Error::UnresolvedVariables`], empty otherwise.
    pub fn unresolved_names(&self) -> &[String] {
        match self {
            Error::UnresolvedVariables(names) => names,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_lists_every_name() {
        let err = Error::UnresolvedVariables(vec!["foo".into(), "bar".into()]);
        assert_eq!(err.to_string(), "unresolved template variables: foo, bar");
        assert_eq!(err.unresolved_names(), ["foo", "bar"]);
    }

    #[test]
    fn other_errors_carry_no_names() {
        let err = Error::InvalidLayout("content width is zero".into());
        assert!(err.unresolved_names().is_empty());
    }
}
