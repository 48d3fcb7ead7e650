//! Field projections: restrict which paths participate in an unmarshal call.
//!
//! A projection is either inclusive (only named paths and their prefixes
//! survive) or exclusive (named paths and their descendants are dropped).
//! The mode is decided once, up front, from the markers present; mixing the
//! two is rejected before any pass runs.

use crate::path::Path;
use indexmap::IndexMap;
use std::collections::HashSet;

use super::error::UnmarshalError;

/// Author-facing projection: ordered path markers plus global pass switches.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    fields: IndexMap<String, bool>,
    suppress_defaults: bool,
    suppress_required: bool,
}

impl Projection {
    pub fn new() -> Self {
        Projection::default()
    }

    /// A projection keeping only the named paths.
    pub fn include<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut projection = Projection::new();
        for path in paths {
            projection.fields.insert(path.to_string(), true);
        }
        projection
    }

    /// A projection dropping the named paths and their descendants.
    pub fn exclude<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut projection = Projection::new();
        for path in paths {
            projection.fields.insert(path.to_string(), false);
        }
        projection
    }

    /// Adds a single marker: `true` includes, `false` excludes.
    pub fn mark(mut self, path: impl Into<String>, include: bool) -> Self {
        self.fields.insert(path.into(), include);
        self
    }

    /// Suppresses the defaulting pass for this call.
    pub fn without_defaults(mut self) -> Self {
        self.suppress_defaults = true;
        self
    }

    /// Suppresses the required-checking pass for this call.
    pub fn without_required(mut self) -> Self {
        self.suppress_required = true;
        self
    }
}

/// Which way the marker set cuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProjectionMode {
    Inclusive,
    Exclusive,
}

/// Projection after up-front validation, ready for per-path queries.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedProjection {
    mode: ProjectionMode,
    marked: HashSet<Path>,
    pub suppress_defaults: bool,
    pub suppress_required: bool,
}

impl ResolvedProjection {
    /// Validates markers and fixes the mode. No projection (or an empty
    /// one) resolves to an exclusive projection that skips nothing.
    pub fn resolve(projection: Option<&Projection>) -> Result<Self, UnmarshalError> {
        let Some(projection) = projection else {
            return Ok(ResolvedProjection {
                mode: ProjectionMode::Exclusive,
                marked: HashSet::new(),
                suppress_defaults: false,
                suppress_required: false,
            });
        };

        let mut mode = None;
        for (_, &include) in &projection.fields {
            let marker = if include {
                ProjectionMode::Inclusive
            } else {
                ProjectionMode::Exclusive
            };
            match mode {
                None => mode = Some(marker),
                Some(m) if m != marker => return Err(UnmarshalError::MixedProjection),
                Some(_) => {}
            }
        }
        let mode = mode.unwrap_or(ProjectionMode::Exclusive);

        let mut marked = HashSet::new();
        for (path, _) in &projection.fields {
            let path = Path::parse(path);
            if mode == ProjectionMode::Inclusive {
                // Prefixes of an included path survive so the walk can
                // reach it.
                for len in 1..path.len() {
                    marked.insert(Path::from_segments(path.segments()[..len].to_vec()));
                }
            }
            marked.insert(path);
        }

        Ok(ResolvedProjection {
            mode,
            marked,
            suppress_defaults: projection.suppress_defaults,
            suppress_required: projection.suppress_required,
        })
    }

    /// True if `path` sits outside this projection.
    pub fn skips(&self, path: &Path) -> bool {
        match self.mode {
            ProjectionMode::Inclusive => !self.marked.contains(path),
            ProjectionMode::Exclusive => {
                // Named paths and their descendants are dropped.
                (1..=path.len()).any(|len| {
                    self.marked
                        .contains(&Path::from_segments(path.segments()[..len].to_vec()))
                })
            }
        }
    }
}
