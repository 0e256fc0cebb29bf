//! # xmi-graph: Structural Interchange Loader
//!
//! Turns a decoded XMI-style document (nested sections of flat records) into a
//! strongly-typed entity-relationship graph of structural data: materials,
//! cross-sections, nodes, analytical members and their derived segments,
//! geometry, and the physical elements they idealize.
//!
//! ## Design Principles
//!
//! 1. **Closed variants**: every discriminator maps onto a closed enum
//!    (`EntityType`, `RelationshipType`) matched exhaustively
//! 2. **Dependency order**: referenced sections load before referencing ones
//! 3. **Partial failure**: a bad record is logged on the graph, never fatal
//! 4. **Explicit context**: the point cache and id index live in one load call
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use xmi_graph::{load, EntityType};
//!
//! # fn example() -> xmi_graph::Result<()> {
//! let raw = json!({
//!     "Name": "Demo",
//!     "StructuralMaterial": [
//!         { "ID": "mat-1", "MaterialType": "Concrete", "Grade": 30.0 }
//!     ],
//! });
//!
//! let graph = load(&raw)?;
//! assert_eq!(graph.entities_by_type(EntityType::Material).count(), 1);
//! assert!(graph.is_complete());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Sections
//!
//! | Section | Loaded as |
//! |---------|-----------|
//! | `StructuralMaterial`, `XmiStructuralMaterial`, ... | typed entity section |
//! | `Entities` | mixed section, records carry `EntityType` |
//! | `Relationships`, `XmiHasGeometry`, ... | relationship section (second pass) |
//! | `Name`, `XmiVersion`, ... | document metadata |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod registry;
pub mod dedup;
pub mod graph;
pub mod loader;
pub mod export;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Entity, EntityId, EntityKind, Relationship, RelId, RelationshipKind, EndFlags,
    Point3D, Line3D, Arc3D, Domain, SegmentType, Unit,
};

// ============================================================================
// Re-exports: Registry, Graph, Loader
// ============================================================================

pub use registry::{EntityType, RelationshipType, Discriminator};
pub use dedup::{PointCache, DEFAULT_TOLERANCE};
pub use graph::{Graph, DocumentInfo, LoadError, ErrorKind};
pub use loader::{load, load_with, Loader, LoadOptions};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid load options: {0}")]
    InvalidOptions(String),

    #[error("Unknown discriminator '{0}'")]
    UnknownDiscriminator(String),

    #[error("Missing attribute: {0}")]
    MissingField(String),

    #[error("Type error in '{field}': expected {expected}, got {got}")]
    TypeError { field: String, expected: String, got: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Duplicate entity id '{0}'")]
    DuplicateId(String),

    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Unsupported variant: {0}")]
    UnsupportedVariant(String),

    #[error("Cannot convert between {from} and {to}")]
    IncompatibleUnits { from: String, to: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Error-log category for record-level failures.
    ///
    /// `None` means the error is not attributable to a single record and
    /// must be surfaced to the caller instead of being logged.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::UnknownDiscriminator(_) => Some(ErrorKind::UnknownDiscriminator),
            Error::MissingField(_)
            | Error::TypeError { .. }
            | Error::InvalidValue { .. }
            | Error::DuplicateId(_) => Some(ErrorKind::ValidationFailure),
            Error::UnresolvedReference(_) => Some(ErrorKind::UnresolvedReference),
            Error::ConstraintViolation(_) => Some(ErrorKind::ConstraintViolation),
            Error::UnsupportedVariant(_) => Some(ErrorKind::UnsupportedVariant),
            Error::MalformedInput(_)
            | Error::InvalidOptions(_)
            | Error::IncompatibleUnits { .. }
            | Error::Json(_) => None,
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidValue { field: field.into(), message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
