//! Structured, non-fatal load errors.

use serde::Serialize;
use serde_json::Value;

/// Category of a record-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The record's tag matches no known variant.
    UnknownDiscriminator,
    /// Missing field, bad enum value, type mismatch or duplicate id.
    ValidationFailure,
    /// A referenced id is not in the graph.
    UnresolvedReference,
    /// Both ends exist but violate the relationship's rules.
    ConstraintViolation,
    /// A declared variant the loader cannot build yet. Informational.
    UnsupportedVariant,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownDiscriminator => "UnknownDiscriminator",
            ErrorKind::ValidationFailure => "ValidationFailure",
            ErrorKind::UnresolvedReference => "UnresolvedReference",
            ErrorKind::ConstraintViolation => "ConstraintViolation",
            ErrorKind::UnsupportedVariant => "UnsupportedVariant",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged failure, pointing back at the record that caused it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadError {
    pub kind: ErrorKind,
    /// Tag the record was dispatched on, if one was found.
    pub discriminator: Option<String>,
    pub section: String,
    /// Position of the record within its section.
    pub index: usize,
    pub message: String,
    /// Copy of the offending record, when the load keeps raw records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_record: Option<Value>,
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}[{}]", self.kind, self.section, self.index)?;
        if let Some(tag) = &self.discriminator {
            write!(f, " ({tag})")?;
        }
        write!(f, ": {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = LoadError {
            kind: ErrorKind::ValidationFailure,
            discriminator: Some("XmiStructuralMaterial".into()),
            section: "StructuralMaterial".into(),
            index: 3,
            message: "Missing attribute: MaterialType".into(),
            raw_record: None,
        };
        assert_eq!(
            err.to_string(),
            "[ValidationFailure] StructuralMaterial[3] (XmiStructuralMaterial): Missing attribute: MaterialType"
        );
    }
}
