//! Template and question storage.

use super::{Database, aggregated};
use crate::types::{Question, Template, TemplateDetail};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Field values written by an upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTemplate {
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub is_published: bool,
    pub total_responses: i64,
    pub created_at: Option<i64>,
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub question_type: String,
    pub display_order: i64,
    pub is_required: bool,
}

const TEMPLATE_COLUMNS: &str = "id, external_id, title, description, author, is_published,
     total_responses, created_at, api_token, last_import_at";

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    Ok(Template {
        id: row.get(0)?,
        external_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        author: row.get(4)?,
        is_published: row.get::<_, i32>(5)? != 0,
        total_responses: row.get(6)?,
        created_at: row.get(7)?,
        api_token: row.get(8)?,
        last_import_at: row.get(9)?,
    })
}

fn question_from_row(row: &Row<'_>) -> rusqlite::Result<Question> {
    Ok(Question {
        id: row.get(0)?,
        template_id: row.get(1)?,
        external_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        question_type: row.get(5)?,
        display_order: row.get(6)?,
        is_required: row.get::<_, i32>(7)? != 0,
    })
}

pub(crate) fn find_template_id(conn: &Connection, external_id: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM templates WHERE external_id = ?1",
            params![external_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Overwrite an existing template in place or create it. Returns the local id.
///
/// The credential token and import time are always stamped.
pub(crate) fn upsert_template_internal(
    conn: &Connection,
    template: &NewTemplate,
    api_token: &str,
    now: i64,
) -> Result<i64> {
    match find_template_id(conn, &template.external_id)? {
        Some(id) => {
            conn.execute(
                "UPDATE templates SET title = ?1, description = ?2, author = ?3,
                     is_published = ?4, total_responses = ?5, created_at = ?6,
                     api_token = ?7, last_import_at = ?8
                 WHERE id = ?9",
                params![
                    template.title,
                    template.description,
                    template.author,
                    template.is_published as i32,
                    template.total_responses,
                    template.created_at,
                    api_token,
                    now,
                    id
                ],
            )?;
            Ok(id)
        }
        None => {
            conn.execute(
                "INSERT INTO templates (external_id, title, description, author, is_published,
                     total_responses, created_at, api_token, last_import_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    template.external_id,
                    template.title,
                    template.description,
                    template.author,
                    template.is_published as i32,
                    template.total_responses,
                    template.created_at,
                    api_token,
                    now
                ],
            )?;
            Ok(conn.last_insert_rowid())
        }
    }
}

/// Delete every question of the template and insert the given ones.
pub(crate) fn replace_questions_internal(
    conn: &Connection,
    template_id: i64,
    questions: &[NewQuestion],
) -> Result<()> {
    conn.execute(
        "DELETE FROM questions WHERE template_id = ?1",
        params![template_id],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO questions (template_id, external_id, title, description, question_type,
             display_order, is_required)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for q in questions {
        stmt.execute(params![
            template_id,
            q.external_id,
            q.title,
            q.description,
            q.question_type,
            q.display_order,
            q.is_required as i32
        ])?;
    }
    Ok(())
}

fn get_template_internal(conn: &Connection, external_id: &str) -> Result<Option<Template>> {
    let sql = format!(
        "SELECT {} FROM templates WHERE external_id = ?1",
        TEMPLATE_COLUMNS
    );
    let template = conn
        .query_row(&sql, params![external_id], template_from_row)
        .optional()?;
    Ok(template)
}

fn list_questions_internal(conn: &Connection, template_id: i64) -> Result<Vec<Question>> {
    let mut stmt = conn.prepare(
        "SELECT id, template_id, external_id, title, description, question_type,
                display_order, is_required
         FROM questions WHERE template_id = ?1
         ORDER BY display_order ASC, id ASC",
    )?;
    let questions = stmt
        .query_map(params![template_id], question_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(questions)
}

impl Database {
    /// Upsert a single template with its questions in one transaction.
    pub fn upsert_template(&self, template: &NewTemplate, api_token: &str) -> Result<Template> {
        let now = super::now_ms();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let id = upsert_template_internal(&tx, template, api_token, now)?;
            replace_questions_internal(&tx, id, &template.questions)?;
            tx.commit()?;

            get_template_internal(conn, &template.external_id)?
                .ok_or_else(|| anyhow::anyhow!("Template {} vanished after upsert", id))
        })
    }

    /// Replace the question list of a template.
    pub fn replace_questions(&self, template_id: i64, questions: &[NewQuestion]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            replace_questions_internal(&tx, template_id, questions)?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Get a template by its FormFlow id.
    pub fn get_template_by_external_id(&self, external_id: &str) -> Result<Option<Template>> {
        self.with_conn(|conn| get_template_internal(conn, external_id))
    }

    /// List all templates, newest remote creation first.
    pub fn list_templates(&self) -> Result<Vec<Template>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM templates ORDER BY created_at DESC, id DESC",
                TEMPLATE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let templates = stmt
                .query_map([], template_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(templates)
        })
    }

    /// Questions of a template in display order.
    pub fn list_questions(&self, template_id: i64) -> Result<Vec<Question>> {
        self.with_conn(|conn| list_questions_internal(conn, template_id))
    }

    /// Template with questions and aggregated results.
    pub fn get_template_detail(&self, external_id: &str) -> Result<Option<TemplateDetail>> {
        self.with_conn(|conn| {
            let Some(template) = get_template_internal(conn, external_id)? else {
                return Ok(None);
            };
            let questions = list_questions_internal(conn, template.id)?;
            let results = aggregated::list_results_internal(conn, template.id)?;
            Ok(Some(TemplateDetail {
                template,
                questions,
                results,
            }))
        })
    }

    /// Delete a template and, by cascade, all of its children.
    ///
    /// Returns false if no such template exists.
    pub fn delete_template(&self, external_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM templates WHERE external_id = ?1",
                params![external_id],
            )?;
            Ok(deleted > 0)
        })
    }
}
