//! Template Sync and Aggregation Sync.
//!
//! Template Sync is all-or-nothing: every remote fetch and payload decode
//! happens before any write, then the staged [`SyncBatch`] is committed in one
//! transaction. Aggregation Sync is best-effort: a failed fetch or mapping
//! leaves the template with no aggregated results but never aborts the run.

use crate::aggregation::map_response;
use crate::api::{FormFlowApi, QuestionPayload, TemplatePayload};
use crate::db::{AggregationOutcome, Database, NewQuestion, NewTemplate, SyncBatch};
use anyhow::{Context, Result, anyhow};
use std::fmt;
use tracing::{debug, info, warn};

/// Prefix of every Template Sync failure message.
pub const IMPORT_FAILURE_PREFIX: &str = "Failed to import templates";

fn import_failure(err: impl fmt::Display) -> anyhow::Error {
    anyhow!("{}: {}", IMPORT_FAILURE_PREFIX, err)
}

fn to_new_question(q: &QuestionPayload) -> NewQuestion {
    NewQuestion {
        external_id: q.id.clone(),
        title: q.title.clone(),
        description: q.description.clone(),
        question_type: q.question_type.clone(),
        display_order: q.order,
        is_required: q.is_required,
    }
}

/// Convert a list entry into the fields written by the upsert.
pub fn to_new_template(payload: &TemplatePayload) -> Result<NewTemplate> {
    let created_at = payload
        .created_at_ms()
        .with_context(|| format!("template {}", payload.id))?;
    Ok(NewTemplate {
        external_id: payload.id.clone(),
        title: payload.title.clone(),
        description: payload.description.clone(),
        author: payload.author.clone(),
        is_published: payload.is_published,
        total_responses: payload.total_responses,
        created_at: Some(created_at),
        questions: payload.questions.iter().map(to_new_question).collect(),
    })
}

/// Drives both sync passes against one API client.
pub struct Syncer<A> {
    db: Database,
    api: A,
}

impl<A: FormFlowApi> Syncer<A> {
    pub fn new(db: Database, api: A) -> Self {
        Self { db, api }
    }

    /// Fetch and map one template's aggregated results. Never fails.
    pub async fn fetch_aggregation(&self, template_external_id: &str) -> AggregationOutcome {
        let response = match self.api.aggregated(template_external_id).await {
            Ok(response) => response,
            Err(e) => {
                debug!(
                    template = %template_external_id,
                    error = %e,
                    "No aggregated data"
                );
                return AggregationOutcome::Clear;
            }
        };

        match map_response(&response) {
            Ok(results) => AggregationOutcome::Replace(results),
            Err(e) => {
                warn!(
                    template = %template_external_id,
                    error = %format!("{:#}", e),
                    "Aggregated payload could not be mapped"
                );
                AggregationOutcome::Clear
            }
        }
    }

    /// Pull every template, its questions and aggregated results.
    ///
    /// Returns the number of templates processed.
    pub async fn import_templates(&self) -> Result<usize> {
        let payloads = self.api.list_templates().await.map_err(import_failure)?;
        info!(templates = payloads.len(), "Fetched template list");

        let mut batch = SyncBatch::new(self.api.credential());
        for payload in &payloads {
            let template = to_new_template(payload).map_err(|e| import_failure(format!("{:#}", e)))?;
            let aggregation = self.fetch_aggregation(&payload.id).await;
            debug!(
                template = %payload.id,
                questions = template.questions.len(),
                aggregated = matches!(aggregation, AggregationOutcome::Replace(_)),
                "Staged template"
            );
            batch.stage(template, aggregation);
        }

        debug!(staged = batch.len(), "Applying sync batch");
        let count = self
            .db
            .apply_sync_batch(&batch)
            .map_err(|e| import_failure(format!("{:#}", e)))?;
        info!(templates = count, "Template import committed");
        Ok(count)
    }

    /// Re-run Aggregation Sync for one already-imported template.
    ///
    /// Returns the number of aggregated results now stored.
    pub async fn sync_aggregated(&self, template_external_id: &str) -> Result<usize> {
        let template = self
            .db
            .get_template_by_external_id(template_external_id)?
            .ok_or_else(|| anyhow!("Template not found: {}", template_external_id))?;

        match self.fetch_aggregation(template_external_id).await {
            AggregationOutcome::Replace(results) => {
                self.db.replace_aggregated_results(template.id, &results)?;
                info!(
                    template = %template_external_id,
                    results = results.len(),
                    "Aggregated results refreshed"
                );
                Ok(results.len())
            }
            AggregationOutcome::Clear => {
                self.db.clear_aggregated_results(template.id)?;
                Ok(0)
            }
        }
    }
}
