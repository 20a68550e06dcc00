//! Environment variable shaping for child processes.
//!
//! Each variable carries a value policy: it either replaces the inherited
//! value, is prepended to it, or is appended to it. Prepend and append join
//! the two values with a separator, which defaults to the platform's
//! path-list separator.

use std::fmt;

/// Separator used between entries of `PATH`-like variables.
pub const PATH_LIST_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// How a variable's value is combined with the inherited value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValuePolicy {
    /// Replace the inherited value
    #[default]
    Override,
    /// New value, separator, inherited value
    Prepend,
    /// Inherited value, separator, new value
    Append,
}

impl fmt::Display for ValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Override => "override",
            Self::Prepend => "prepend",
            Self::Append => "append",
        };
        write!(f, "{name}")
    }
}

/// A named environment variable applied to a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentVariable {
    /// Variable name
    pub name: String,
    /// Value to apply
    pub value: String,
    /// How the value combines with the inherited one
    pub policy: ValuePolicy,
    /// Separator for prepend/append
    pub separator: String,
}

impl EnvironmentVariable {
    /// Create a variable with an explicit policy and the default separator.
    pub fn new(name: impl Into<String>, value: impl Into<String>, policy: ValuePolicy) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            policy,
            separator: PATH_LIST_SEPARATOR.to_string(),
        }
    }

    /// Variable that replaces any inherited value.
    pub fn overriding(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, value, ValuePolicy::Override)
    }

    /// Variable placed in front of the inherited value.
    pub fn prepending(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, value, ValuePolicy::Prepend)
    }

    /// Variable placed after the inherited value.
    pub fn appending(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, value, ValuePolicy::Append)
    }

    /// Use a custom separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Compute the value the child should see given the inherited value.
    pub fn resolve(&self, inherited: Option<&str>) -> String {
        let inherited = inherited.unwrap_or_default();
        match self.policy {
            ValuePolicy::Override => self.value.clone(),
            ValuePolicy::Prepend => merge_with_separator(&self.value, inherited, &self.separator),
            ValuePolicy::Append => merge_with_separator(inherited, &self.value, &self.separator),
        }
    }
}

/// Join two strings with a separator without doubling it at the seam.
pub fn merge_with_separator(first: &str, second: &str, separator: &str) -> String {
    if separator.is_empty() {
        return format!("{first}{second}");
    }

    let first_ends = first.ends_with(separator);
    let second_starts = second.starts_with(separator);

    if first_ends && second_starts {
        format!("{first}{}", &second[separator.len()..])
    } else if first_ends || second_starts {
        format!("{first}{second}")
    } else {
        format!("{first}{separator}{second}")
    }
}
