//! Loading engine.
//!
//! ```text
//! raw document
//!   │  order::plan_sections      dependency-ordered sections + metadata
//!   ▼
//! entity pass                    factory::load_entity, per record
//!   │                            (segments::synthesize for members)
//!   ▼
//! inline references              resolver::resolve_inline, deferred links
//!   ▼
//! relationship pass              resolver::load_relationship, per record
//!   ▼
//! Graph (entities, relationships, errors)
//! ```
//!
//! Record-level failures are logged on the graph and the pass moves on. Only
//! a malformed document or invalid options abort a load.

pub mod order;
mod factory;
mod resolver;
mod segments;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::dedup::{PointCache, DEFAULT_TOLERANCE};
use crate::graph::{DocumentInfo, ErrorKind, Graph, LoadError};
use crate::model::{EntityId, RelationshipKind};
use crate::{Error, Result};

pub use order::{plan_sections, PlannedSection, SectionKind, SectionPlan};

// ============================================================================
// Options
// ============================================================================

/// Load configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadOptions {
    /// Absolute coordinate tolerance for point deduplication.
    pub tolerance: f64,
    /// Attach a copy of the offending record to each logged error.
    pub keep_raw_records: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            keep_raw_records: true,
        }
    }
}

impl LoadOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(Error::InvalidOptions(format!(
                "tolerance must be finite and positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Parse options from JSON text. Absent keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let options: LoadOptions = serde_json::from_str(text)
            .map_err(|e| Error::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Load a document with default options.
pub fn load(raw: &Value) -> Result<Graph> {
    Loader::default().load(raw)
}

pub fn load_with(raw: &Value, options: &LoadOptions) -> Result<Graph> {
    Loader::new(options.clone()).load(raw)
}

#[derive(Debug, Clone, Default)]
pub struct Loader {
    options: LoadOptions,
}

impl Loader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Run one load. Every call starts from an empty graph and point cache.
    pub fn load(&self, raw: &Value) -> Result<Graph> {
        self.options.validate()?;
        let plan = plan_sections(raw)?;
        let mut ctx = LoadContext::new(plan.info, &self.options)?;

        for section in &plan.entity_sections {
            debug!(section = section.name, records = section.records.len(), "loading entity section");
            for &(index, record) in &section.records {
                let site = RecordSite::new(section.name, index, record);
                factory::load_entity(&mut ctx, section.kind, site);
            }
        }

        resolver::resolve_inline(&mut ctx);

        for section in &plan.relationship_sections {
            debug!(section = section.name, records = section.records.len(), "loading relationship section");
            for &(index, record) in &section.records {
                let site = RecordSite::new(section.name, index, record);
                resolver::load_relationship(&mut ctx, section.kind, site);
            }
        }

        let graph = ctx.graph;
        info!(
            entities = graph.entity_count(),
            relationships = graph.relationship_count(),
            errors = graph.error_count(),
            points = ctx.points.len(),
            "load complete"
        );
        Ok(graph)
    }
}

// ============================================================================
// Per-load state
// ============================================================================

/// Mutable state owned by one load call.
pub(crate) struct LoadContext<'a> {
    pub graph: Graph,
    pub points: PointCache,
    /// Inline references, linked once every entity section is loaded.
    pub pending: Vec<PendingLink<'a>>,
    options: &'a LoadOptions,
}

/// An id field on an entity record that implies a relationship.
pub(crate) struct PendingLink<'a> {
    pub site: RecordSite<'a>,
    pub source: EntityId,
    pub target: EntityId,
    pub kind: RelationshipKind,
}

impl<'a> LoadContext<'a> {
    fn new(info: DocumentInfo, options: &'a LoadOptions) -> Result<Self> {
        Ok(Self {
            graph: Graph::new(info),
            points: PointCache::with_tolerance(options.tolerance)?,
            pending: Vec::new(),
            options,
        })
    }

    /// Log `error` against the record at `site`.
    pub fn fail(&mut self, site: &RecordSite<'_>, error: Error) {
        let kind = error.kind().unwrap_or(ErrorKind::ValidationFailure);
        self.log(site, kind, error.to_string());
    }

    pub fn log(&mut self, site: &RecordSite<'_>, kind: ErrorKind, message: String) {
        warn!(
            kind = kind.as_str(),
            section = site.section,
            index = site.index,
            discriminator = site.discriminator.unwrap_or("-"),
            "{message}"
        );
        let raw_record = self.options.keep_raw_records.then(|| site.raw.clone());
        self.graph.log_error(LoadError {
            kind,
            discriminator: site.discriminator.map(str::to_string),
            section: site.section.to_string(),
            index: site.index,
            message,
            raw_record,
        });
    }
}

/// Where a record came from, for error reporting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecordSite<'a> {
    pub section: &'a str,
    pub index: usize,
    pub discriminator: Option<&'static str>,
    pub raw: &'a Value,
}

impl<'a> RecordSite<'a> {
    fn new(section: &'a str, index: usize, raw: &'a Value) -> Self {
        Self { section, index, discriminator: None, raw }
    }

    pub fn tagged(self, discriminator: &'static str) -> Self {
        Self { discriminator: Some(discriminator), ..self }
    }
}
