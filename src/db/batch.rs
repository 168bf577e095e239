//! All-or-nothing write batch for one template sync run.
//!
//! The sync layer fetches and maps everything first, stages it here, and the
//! batch is committed in a single transaction. Any template upsert or question
//! write failure rolls back every write of the run. Aggregation writes are
//! best-effort: each template's replacement runs in its own savepoint, and a
//! failure there leaves that template with no aggregated results.

use super::{Database, NewTemplate, aggregated, templates};
use crate::types::AggregatedResult;
use anyhow::Result;
use tracing::{debug, warn};

/// What to do with a template's aggregated results.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationOutcome {
    /// Fetch and mapping succeeded.
    Replace(Vec<AggregatedResult>),
    /// Fetch or mapping failed; prior results are dropped, none recreated.
    Clear,
}

#[derive(Debug, Clone)]
pub struct StagedTemplate {
    pub template: NewTemplate,
    pub aggregation: AggregationOutcome,
}

/// Staged writes for one import run.
#[derive(Debug, Clone)]
pub struct SyncBatch {
    api_token: String,
    templates: Vec<StagedTemplate>,
}

impl SyncBatch {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            templates: Vec::new(),
        }
    }

    pub fn stage(&mut self, template: NewTemplate, aggregation: AggregationOutcome) {
        self.templates.push(StagedTemplate {
            template,
            aggregation,
        });
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Database {
    /// Commit a staged batch atomically. Returns the number of templates written.
    pub fn apply_sync_batch(&self, batch: &SyncBatch) -> Result<usize> {
        let now = super::now_ms();
        self.with_conn_mut(|conn| {
            let mut tx = conn.transaction()?;

            for staged in &batch.templates {
                let template = &staged.template;
                let id = templates::upsert_template_internal(&tx, template, &batch.api_token, now)?;
                templates::replace_questions_internal(&tx, id, &template.questions)?;

                match &staged.aggregation {
                    AggregationOutcome::Replace(results) => {
                        let sp = tx.savepoint()?;
                        match aggregated::replace_results_internal(&sp, id, results) {
                            Ok(()) => {
                                sp.commit()?;
                                debug!(
                                    template = %template.external_id,
                                    results = results.len(),
                                    "Aggregated results replaced"
                                );
                            }
                            Err(e) => {
                                // Dropping the savepoint rolls it back.
                                drop(sp);
                                warn!(
                                    template = %template.external_id,
                                    error = %e,
                                    "Aggregated results could not be stored; clearing"
                                );
                                aggregated::clear_results_internal(&tx, id)?;
                            }
                        }
                    }
                    AggregationOutcome::Clear => {
                        aggregated::clear_results_internal(&tx, id)?;
                    }
                }
            }

            tx.commit()?;
            Ok(batch.templates.len())
        })
    }
}
