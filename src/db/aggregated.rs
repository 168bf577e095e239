//! Aggregated result storage with option-count and popular-answer children.

use super::Database;
use crate::types::{AggregatedResult, OptionCount, PopularAnswer};
use anyhow::Result;
use rusqlite::{Connection, params};

/// Remove all aggregated results of a template. Children go by cascade.
pub(crate) fn clear_results_internal(conn: &Connection, template_id: i64) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM aggregated_results WHERE template_id = ?1",
        params![template_id],
    )?;
    Ok(deleted)
}

/// Clear then insert. Callers wrap this in a transaction or savepoint.
pub(crate) fn replace_results_internal(
    conn: &Connection,
    template_id: i64,
    results: &[AggregatedResult],
) -> Result<()> {
    clear_results_internal(conn, template_id)?;

    let mut insert_result = conn.prepare(
        "INSERT INTO aggregated_results (template_id, question_external_id, question_title,
             question_type, aggregated_data, total_answers, average_value, min_value, max_value,
             earliest_date, latest_date, popular_time, popular_time_count,
             most_popular_answer, most_popular_count, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
    )?;
    let mut insert_option = conn.prepare(
        "INSERT INTO option_counts (result_id, option_text, count, position)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut insert_answer = conn.prepare(
        "INSERT INTO popular_answers (result_id, answer, count, position)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    for (position, r) in results.iter().enumerate() {
        insert_result.execute(params![
            template_id,
            r.question_external_id,
            r.question_title,
            r.question_type,
            r.aggregated_data,
            r.total_answers,
            r.average_value,
            r.min_value,
            r.max_value,
            r.earliest_date,
            r.latest_date,
            r.popular_time,
            r.popular_time_count,
            r.most_popular_answer,
            r.most_popular_count,
            position as i64
        ])?;
        let result_id = conn.last_insert_rowid();

        for (i, o) in r.option_counts.iter().enumerate() {
            insert_option.execute(params![result_id, o.option, o.count, i as i64])?;
        }
        for (i, a) in r.popular_answers.iter().enumerate() {
            insert_answer.execute(params![result_id, a.answer, a.count, i as i64])?;
        }
    }
    Ok(())
}

fn list_option_counts(conn: &Connection, result_id: i64) -> Result<Vec<OptionCount>> {
    let mut stmt = conn.prepare(
        "SELECT option_text, count FROM option_counts
         WHERE result_id = ?1 ORDER BY count DESC, position ASC",
    )?;
    let rows = stmt
        .query_map(params![result_id], |row| {
            Ok(OptionCount {
                option: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn list_popular_answers(conn: &Connection, result_id: i64) -> Result<Vec<PopularAnswer>> {
    let mut stmt = conn.prepare(
        "SELECT answer, count FROM popular_answers
         WHERE result_id = ?1 ORDER BY count DESC, position ASC",
    )?;
    let rows = stmt
        .query_map(params![result_id], |row| {
            Ok(PopularAnswer {
                answer: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn list_results_internal(
    conn: &Connection,
    template_id: i64,
) -> Result<Vec<AggregatedResult>> {
    let mut stmt = conn.prepare(
        "SELECT id, question_external_id, question_title, question_type, aggregated_data,
                total_answers, average_value, min_value, max_value, earliest_date, latest_date,
                popular_time, popular_time_count, most_popular_answer, most_popular_count
         FROM aggregated_results WHERE template_id = ?1
         ORDER BY position ASC, id ASC",
    )?;
    let rows = stmt
        .query_map(params![template_id], |row| {
            let id: i64 = row.get(0)?;
            let result = AggregatedResult {
                question_external_id: row.get(1)?,
                question_title: row.get(2)?,
                question_type: row.get(3)?,
                aggregated_data: row.get(4)?,
                total_answers: row.get(5)?,
                average_value: row.get(6)?,
                min_value: row.get(7)?,
                max_value: row.get(8)?,
                earliest_date: row.get(9)?,
                latest_date: row.get(10)?,
                popular_time: row.get(11)?,
                popular_time_count: row.get(12)?,
                most_popular_answer: row.get(13)?,
                most_popular_count: row.get(14)?,
                option_counts: Vec::new(),
                popular_answers: Vec::new(),
            };
            Ok((id, result))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut results = Vec::with_capacity(rows.len());
    for (id, mut result) in rows {
        result.option_counts = list_option_counts(conn, id)?;
        result.popular_answers = list_popular_answers(conn, id)?;
        results.push(result);
    }
    Ok(results)
}

impl Database {
    /// Atomically replace a template's aggregated results.
    pub fn replace_aggregated_results(
        &self,
        template_id: i64,
        results: &[AggregatedResult],
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            replace_results_internal(&tx, template_id, results)?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Remove a template's aggregated results. Returns the number removed.
    pub fn clear_aggregated_results(&self, template_id: i64) -> Result<usize> {
        self.with_conn(|conn| clear_results_internal(conn, template_id))
    }

    /// Aggregated results of a template, children ranked by count.
    pub fn list_aggregated_results(&self, template_id: i64) -> Result<Vec<AggregatedResult>> {
        self.with_conn(|conn| list_results_internal(conn, template_id))
    }
}
