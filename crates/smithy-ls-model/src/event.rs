//! Validation events surfaced by assembly and config loading.

use std::fmt;

use crate::id::ShapeId;

/// Event severity, ordered weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Danger,
    Error,
}

impl Severity {
    pub fn parse(value: &str) -> Option<Severity> {
        match value.to_ascii_uppercase().as_str() {
            "NOTE" => Some(Severity::Note),
            "WARNING" => Some(Severity::Warning),
            "DANGER" => Some(Severity::Danger),
            "ERROR" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Severity::Note => "NOTE",
            Severity::Warning => "WARNING",
            Severity::Danger => "DANGER",
            Severity::Error => "ERROR",
        };
        f.write_str(text)
    }
}

/// Where something was defined: filename plus 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            filename: filename.into(),
            line,
            column,
        }
    }

    /// A location pinned to the top of `filename`.
    pub fn top_of(filename: impl Into<String>) -> Self {
        Self::new(filename, 1, 1)
    }
}

/// A validation event attached to a shape or a source location.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationEvent {
    /// Validator id, also used as the diagnostic code.
    pub id: String,
    pub severity: Severity,
    pub shape_id: Option<ShapeId>,
    pub message: String,
    pub location: SourceLocation,
}

impl ValidationEvent {
    pub fn error(id: &str, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            id: id.to_string(),
            severity: Severity::Error,
            shape_id: None,
            message: message.into(),
            location,
        }
    }

    pub fn warning(id: &str, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            id: id.to_string(),
            severity: Severity::Warning,
            shape_id: None,
            message: message.into(),
            location,
        }
    }

    pub fn for_shape(mut self, shape_id: ShapeId) -> Self {
        self.shape_id = Some(shape_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Note < Severity::Warning);
        assert!(Severity::Warning < Severity::Danger);
        assert!(Severity::Danger < Severity::Error);
    }

    #[test]
    fn severity_round_trips_through_text() {
        for severity in [
            Severity::Note,
            Severity::Warning,
            Severity::Danger,
            Severity::Error,
        ] {
            assert_eq!(Severity::parse(&severity.to_string()), Some(severity));
        }
    }
}
