/*!
# Diagnostic Repair Pass

Second, narrower rewrite driven by type-checker feedback. Diagnostics that
look like a bare array literal standing where a vector object is now
required are located by source position, and the array on the flagged line
is wrapped in the clone constructor of the vector type of its arity.

Within a file, diagnostics are repaired from the last one to the first so
earlier positions stay valid while the file is rewritten; each file is
written back once its repairs are done. The pass runs once and never
re-checks.
*/

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::checker::Diagnostic;
use crate::project::Project;
use crate::tables::{REPAIR_CODES, REPAIR_MESSAGE_MARKERS};
use crate::tracer::matrix_rules::ArrayCloneWrapper;
use crate::tracer::{FileTracer, TraceEvent};
use crate::{MigrateConfig, Result};

/// Whether a diagnostic has the signature of an ambiguous literal vector
pub fn is_repair_candidate(diagnostic: &Diagnostic) -> bool {
    REPAIR_CODES.contains(&diagnostic.code)
        && REPAIR_MESSAGE_MARKERS
            .iter()
            .any(|marker| diagnostic.message.contains(marker))
}

/// Outcome of a repair pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepairSummary {
    /// Diagnostics that passed the code and message filter
    pub candidates: usize,
    /// Candidates that could not be located or belong to a skipped file
    pub skipped: usize,
    /// Array literals wrapped
    pub wrapped: usize,
    pub files_touched: usize,
    pub events: Vec<TraceEvent>,
}

pub struct DiagnosticRepairPass {
    skip_files: Vec<String>,
    max_depth: usize,
}

impl DiagnosticRepairPass {
    pub fn new(config: &MigrateConfig) -> Self {
        Self {
            skip_files: config.skip_files.clone(),
            max_depth: config.max_depth,
        }
    }

    /// Repair every candidate diagnostic, persisting each file after its
    /// repairs
    pub fn run(
        &mut self,
        project: &mut Project,
        diagnostics: &[Diagnostic],
    ) -> Result<RepairSummary> {
        let mut summary = RepairSummary::default();
        let mut by_file: BTreeMap<usize, Vec<(usize, &Diagnostic)>> = BTreeMap::new();

        for diagnostic in diagnostics.iter().filter(|d| is_repair_candidate(d)) {
            summary.candidates += 1;
            let (Some(path), Some(start)) = (&diagnostic.file, diagnostic.start) else {
                warn!("Skipping diagnostic without a source position: {diagnostic}");
                summary.skipped += 1;
                continue;
            };
            let Some(index) = project.index_of(path) else {
                warn!("Skipping diagnostic outside the project: {diagnostic}");
                summary.skipped += 1;
                continue;
            };
            by_file.entry(index).or_default().push((start, diagnostic));
        }

        for (index, mut located) in by_file {
            located.sort_by(|a, b| b.0.cmp(&a.0));
            let file = &mut project.files_mut()[index];
            if self.skip_files.contains(&file.base_name()) {
                debug!("Not repairing skipped file {}", file.path().display());
                summary.skipped += located.len();
                continue;
            }

            let mut wrapped_here = 0;
            for (start, diagnostic) in located {
                let line = file.line_of(start);
                info!(
                    "Attempting to fix error TS{} at {}:{}: {}",
                    diagnostic.code,
                    file.path().display(),
                    line + 1,
                    diagnostic.message.lines().next().unwrap_or_default()
                );

                let mut tracer = FileTracer::new().max_depth(self.max_depth);
                tracer.add_rule(Box::new(ArrayCloneWrapper::new(line)));
                let events = tracer.transform_file(file)?;
                if events.is_empty() {
                    debug!("Nothing to wrap on line {}", line + 1);
                }
                wrapped_here += events.len();
                summary.events.extend(events);
            }

            if wrapped_here > 0 {
                file.persist()?;
                summary.wrapped += wrapped_here;
                summary.files_touched += 1;
            }
        }

        info!(
            "Repair pass wrapped {} literals in {} files ({} of {} candidates skipped)",
            summary.wrapped, summary.files_touched, summary.skipped, summary.candidates
        );
        Ok(summary)
    }
}
