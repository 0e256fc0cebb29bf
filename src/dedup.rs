//! Coordinate deduplication.
//!
//! `PointCache` hands out one shared `Arc<Point3D>` per coordinate cluster:
//! any two triples whose components all differ by strictly less than the
//! tolerance resolve to the same instance. Coordinates are snapped onto a grid
//! of `tolerance`-sized cells and the 27 neighbouring cells are searched, so a
//! cell boundary never splits two near-identical points.
//!
//! One cache lives for exactly one load call.

use std::sync::Arc;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::model::geometry::Point3D;
use crate::{Error, Result};

/// Absolute coordinate tolerance used when none is configured.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

type CellKey = (i64, i64, i64);

/// Cache hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

#[derive(Debug)]
pub struct PointCache {
    tolerance: f64,
    cells: HashMap<CellKey, SmallVec<[Arc<Point3D>; 2]>>,
    len: usize,
    stats: CacheStats,
}

impl Default for PointCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PointCache {
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            cells: HashMap::new(),
            len: 0,
            stats: CacheStats::default(),
        }
    }

    /// Cache with a custom tolerance. Must be finite and strictly positive.
    pub fn with_tolerance(tolerance: f64) -> Result<Self> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(Error::InvalidOptions(format!(
                "tolerance must be finite and positive, got {tolerance}"
            )));
        }
        Ok(Self { tolerance, ..Self::new() })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Canonical point for `(x, y, z)`, creating and caching it on a miss.
    ///
    /// Non-finite components are rejected before they reach the cache.
    pub fn get_or_create(&mut self, x: f64, y: f64, z: f64) -> Result<Arc<Point3D>> {
        let candidate = Point3D::new(x, y, z);
        if !candidate.is_finite() {
            return Err(Error::invalid("Point", format!("non-finite coordinate {candidate}")));
        }

        if let Some(existing) = self.nearest(&candidate) {
            self.stats.hits += 1;
            return Ok(existing);
        }

        let point = Arc::new(candidate);
        self.cells
            .entry(self.cell_of(&candidate))
            .or_default()
            .push(Arc::clone(&point));
        self.len += 1;
        self.stats.misses += 1;
        Ok(point)
    }

    pub fn get_or_create_point(&mut self, point: Point3D) -> Result<Arc<Point3D>> {
        self.get_or_create(point.x, point.y, point.z)
    }

    /// Existing canonical point for `(x, y, z)`, without inserting.
    pub fn get(&self, x: f64, y: f64, z: f64) -> Option<Arc<Point3D>> {
        self.nearest(&Point3D::new(x, y, z))
    }

    /// Number of distinct points cached.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn cell_of(&self, p: &Point3D) -> CellKey {
        // `as` saturates, so far-out coordinates share edge cells instead of wrapping.
        (
            (p.x / self.tolerance).floor() as i64,
            (p.y / self.tolerance).floor() as i64,
            (p.z / self.tolerance).floor() as i64,
        )
    }

    fn nearest(&self, p: &Point3D) -> Option<Arc<Point3D>> {
        let (cx, cy, cz) = self.cell_of(p);
        let mut best: Option<(&Arc<Point3D>, f64)> = None;
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                for dz in -1i64..=1 {
                    let key = (cx.saturating_add(dx), cy.saturating_add(dy), cz.saturating_add(dz));
                    let Some(bucket) = self.cells.get(&key) else { continue };
                    for cached in bucket {
                        if !cached.within_tolerance(p, self.tolerance) {
                            continue;
                        }
                        let d = cached.distance_to(p);
                        if best.is_none_or(|(_, best_d)| d < best_d) {
                            best = Some((cached, d));
                        }
                    }
                }
            }
        }
        best.map(|(point, _)| Arc::clone(point))
    }
}
