//! Migration pipeline.
//!
//! A run moves through a fixed sequence of states, each entered exactly once:
//!
//! ```text
//! Loaded -> Rewritten -> Persisted -> Diagnosed -> Repaired -> RepairsPersisted -> Verified
//! ```
//!
//! Every step checks the state it starts from, so calling steps out of order
//! is an error rather than a silent re-run.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::checker::{Diagnostic, TypeChecker};
use crate::project::Project;
use crate::repair::{DiagnosticRepairPass, RepairSummary};
use crate::tracer::{FileTracer, TraceEvent};
use crate::{MigrateConfig, MigrateError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    Loaded,
    Rewritten,
    Persisted,
    Diagnosed,
    Repaired,
    RepairsPersisted,
    Verified,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationState::Loaded => "loaded",
            MigrationState::Rewritten => "rewritten",
            MigrationState::Persisted => "persisted",
            MigrationState::Diagnosed => "diagnosed",
            MigrationState::Repaired => "repaired",
            MigrationState::RepairsPersisted => "repairs persisted",
            MigrationState::Verified => "verified",
        };
        f.write_str(name)
    }
}

/// What a run did, for the log summary and the JSON report
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub files_loaded: usize,
    pub files_skipped: u64,
    pub files_rewritten: u64,
    pub events: Vec<TraceEvent>,
    pub diagnostics_after_rewrite: Option<usize>,
    pub repair: Option<RepairSummary>,
    pub diagnostics_after_repair: Option<usize>,
    pub dry_run: bool,
}

impl MigrationReport {
    /// Diagnostics still reported after the repair pass
    pub fn residual(&self) -> usize {
        self.diagnostics_after_repair.unwrap_or(0)
    }
}

/// One migration run over a project
pub struct Migration<C: TypeChecker> {
    config: MigrateConfig,
    project: Project,
    checker: C,
    state: MigrationState,
    diagnostics: Vec<Diagnostic>,
    report: MigrationReport,
}

impl<C: TypeChecker> Migration<C> {
    /// Load the project and make sure the checker can run before anything is
    /// rewritten
    pub fn load(config: MigrateConfig, mut checker: C) -> Result<Self> {
        let project = Project::load(&config)?;
        checker.ensure_available(&project)?;
        Ok(Self::from_project(config, project, checker))
    }

    /// Load the project without probing the checker; for dry runs, which
    /// never type-check
    pub fn load_unverified(config: MigrateConfig, checker: C) -> Result<Self> {
        let project = Project::load(&config)?;
        Ok(Self::from_project(config, project, checker))
    }

    pub fn from_project(config: MigrateConfig, project: Project, checker: C) -> Self {
        let report = MigrationReport {
            files_loaded: project.files().len(),
            ..Default::default()
        };
        Self {
            config,
            project,
            checker,
            state: MigrationState::Loaded,
            diagnostics: Vec::new(),
            report,
        }
    }

    pub fn state(&self) -> MigrationState {
        self.state
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn report(&self) -> &MigrationReport {
        &self.report
    }

    /// Diagnostics from the most recent type-check
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn expect_state(&self, expected: MigrationState) -> Result<()> {
        if self.state != expected {
            return Err(MigrateError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    /// Run the rule-driven rewrite over every file, in memory
    pub fn rewrite(&mut self) -> Result<()> {
        self.expect_state(MigrationState::Loaded)?;

        let mut tracer = FileTracer::for_migration(&self.config);
        let summary = tracer.transform_project(&mut self.project)?;
        info!(
            "Rewrote {} of {} files ({} skipped, {} transforms)",
            summary.files_transformed,
            summary.files_processed,
            summary.files_skipped,
            summary.events.len()
        );
        for stats in tracer.stats().values() {
            debug!(
                "{}: {} matches, {:.0}% transformed",
                stats.rule_name,
                stats.applications,
                stats.success_rate() * 100.0
            );
        }

        self.report.files_skipped = summary.files_skipped;
        self.report.files_rewritten = summary.files_transformed;
        self.report.events.extend(summary.events);
        self.state = MigrationState::Rewritten;
        Ok(())
    }

    pub fn persist(&mut self) -> Result<usize> {
        self.expect_state(MigrationState::Rewritten)?;
        let written = self.project.persist()?;
        self.state = MigrationState::Persisted;
        Ok(written)
    }

    pub fn diagnose(&mut self) -> Result<usize> {
        self.expect_state(MigrationState::Persisted)?;
        self.diagnostics = self.checker.check(&self.project)?;
        let count = self.diagnostics.len();
        info!("{count} errors after refactor");
        self.report.diagnostics_after_rewrite = Some(count);
        self.state = MigrationState::Diagnosed;
        Ok(count)
    }

    /// Repair the diagnosed literals once; each repaired file is written as
    /// soon as its repairs are done
    pub fn repair(&mut self) -> Result<&RepairSummary> {
        self.expect_state(MigrationState::Diagnosed)?;
        let mut pass = DiagnosticRepairPass::new(&self.config);
        let summary = pass.run(&mut self.project, &self.diagnostics)?;
        self.report.events.extend(summary.events.iter().cloned());
        self.state = MigrationState::Repaired;
        Ok(self.report.repair.insert(summary))
    }

    /// Flush anything the repair pass left unwritten
    pub fn persist_repairs(&mut self) -> Result<usize> {
        self.expect_state(MigrationState::Repaired)?;
        let written = self.project.persist()?;
        self.state = MigrationState::RepairsPersisted;
        Ok(written)
    }

    /// Re-check the project; residual diagnostics are reported, not fixed
    pub fn verify(&mut self) -> Result<usize> {
        self.expect_state(MigrationState::RepairsPersisted)?;
        self.diagnostics = self.checker.check(&self.project)?;
        let count = self.diagnostics.len();
        info!("{count} errors after autofix");
        if count > 0 {
            warn!("{count} diagnostics remain and need manual attention");
            for diagnostic in &self.diagnostics {
                warn!("  {diagnostic}");
            }
        }
        self.report.diagnostics_after_repair = Some(count);
        self.state = MigrationState::Verified;
        Ok(count)
    }

    /// Every step in order
    pub fn run(mut self) -> Result<MigrationReport> {
        self.rewrite()?;
        self.persist()?;
        self.diagnose()?;
        self.repair()?;
        self.persist_repairs()?;
        self.verify()?;
        Ok(self.report)
    }

    /// Rewrite in memory only: nothing is written and the checker is not run
    pub fn dry_run(mut self) -> Result<MigrationReport> {
        self.rewrite()?;
        info!(
            "Dry run: {} transforms in {} files, nothing written",
            self.report.events.len(),
            self.report.files_rewritten
        );
        self.report.dry_run = true;
        Ok(self.report)
    }
}
