//! Error types for result parsing.

use crate::types::OperationKind;

/// Result type alias for parsing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Longest fragment of a malformed document kept in an error.
pub const MAX_FRAGMENT_LEN: usize = 512;

/// Errors produced while interpreting provider output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The document did not match the expected shape.
    #[error("malformed result document: {message} (in: {fragment})")]
    Malformed {
        /// What was wrong
        message: String,
        /// The offending part of the document
        fragment: String,
    },

    /// A group result was asked for a single value that only leaves have.
    #[error("{operation} results are not aggregated across group members ({resource_type} '{name}')")]
    UnsupportedGroupAggregation {
        /// Operation whose result was queried
        operation: OperationKind,
        /// Instance name of the group
        name: String,
        /// Resource type of the group
        resource_type: String,
    },
}

impl Error {
    /// Create a malformed-document error, truncating the fragment.
    pub fn malformed(message: impl Into<String>, fragment: impl AsRef<str>) -> Self {
        Self::Malformed {
            message: message.into(),
            fragment: truncate(fragment.as_ref()),
        }
    }

    /// Whether this is a malformed-document error.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_FRAGMENT_LEN {
        return text.to_string();
    }
    let mut end = MAX_FRAGMENT_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_keeps_short_fragment() {
        let err = Error::malformed("missing field `name`", r#"{"type":"x"}"#);
        assert!(err.is_malformed());
        assert!(err.to_string().contains(r#"{"type":"x"}"#));
    }

    #[test]
    fn test_malformed_truncates_long_fragment() {
        let long = "é".repeat(MAX_FRAGMENT_LEN);
        match Error::malformed("bad", &long) {
            Error::Malformed { fragment, .. } => {
                assert!(fragment.ends_with("..."));
                assert!(fragment.len() <= MAX_FRAGMENT_LEN + 3);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_group_aggregation_display() {
        let err = Error::UnsupportedGroupAggregation {
            operation: OperationKind::Get,
            name: "web".to_string(),
            resource_type: "Microsoft.DSC/Group".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("get"));
        assert!(display.contains("Microsoft.DSC/Group"));
        assert!(!err.is_malformed());
    }
}
