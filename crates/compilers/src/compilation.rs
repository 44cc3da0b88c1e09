//! The result of one run: every compilation unit plus the files they touched.

use crate::{naming::Filename, unit::CompilationUnit};
use solnorm_core::error::{BuildError, Result};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::Arc,
};

/// All compilation units of a project, in the order their artifacts were discovered.
#[derive(Clone, Debug, Default)]
pub struct Compilation {
    target: PathBuf,
    units: BTreeMap<String, CompilationUnit>,
    order: Vec<String>,
    filenames: BTreeSet<Arc<Filename>>,
}

impl Compilation {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self { target: target.into(), ..Default::default() }
    }

    /// Adds a unit and merges its files into the global set.
    ///
    /// Fails with [`BuildError::DuplicateUnitId`] if a unit with the same id exists.
    pub fn register(&mut self, unit: CompilationUnit) -> Result<()> {
        if self.units.contains_key(unit.id()) {
            return Err(BuildError::DuplicateUnitId(unit.id().to_string()));
        }
        self.filenames.extend(unit.filenames().iter().cloned());
        self.order.push(unit.id().to_string());
        self.units.insert(unit.id().to_string(), unit);
        Ok(())
    }

    /// The path the run was started on.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Units in discovery order (oldest artifact first).
    pub fn units(&self) -> impl Iterator<Item = &CompilationUnit> + '_ {
        self.order.iter().filter_map(|id| self.units.get(id))
    }

    pub fn unit(&self, id: &str) -> Option<&CompilationUnit> {
        self.units.get(id)
    }

    pub fn units_by_id(&self) -> &BTreeMap<String, CompilationUnit> {
        &self.units
    }

    /// Every file referenced by any unit.
    pub fn filenames(&self) -> &BTreeSet<Arc<Filename>> {
        &self.filenames
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Every unit declaring a contract called `name`, with the declaring file, in discovery
    /// order.
    pub fn find_contract<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (&'a CompilationUnit, &'a Arc<Filename>)> + 'a {
        self.units().filter_map(move |unit| unit.filename_of_contract(name).map(|f| (unit, f)))
    }
}
