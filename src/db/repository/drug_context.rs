use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

fn drug_context_from_row(row: &Row<'_>) -> rusqlite::Result<DrugContext> {
    Ok(DrugContext {
        drug_context_id: row.get(0)?,
        drug_concept_id: row.get(1)?,
        diagnosis_concept_id: row.get(2)?,
    })
}

/// Insert a drug context; `drug_context_id` is assigned by the database.
pub fn insert_drug_context(conn: &Connection, ctx: &DrugContext) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO drug_context (drug_concept_id, diagnosis_concept_id) VALUES (?1, ?2)",
        params![ctx.drug_concept_id, ctx.diagnosis_concept_id],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(drug_context_id = id, "Inserted drug context");
    Ok(id)
}

pub fn get_drug_context(conn: &Connection, id: i64) -> Result<Option<DrugContext>, DatabaseError> {
    let ctx = conn
        .query_row(
            "SELECT drug_context_id, drug_concept_id, diagnosis_concept_id
             FROM drug_context WHERE drug_context_id = ?1",
            params![id],
            drug_context_from_row,
        )
        .optional()?;
    Ok(ctx)
}

/// Diagnoses a drug is used for.
pub fn list_drug_contexts_for_drug(
    conn: &Connection,
    drug_concept_id: i64,
) -> Result<Vec<DrugContext>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT drug_context_id, drug_concept_id, diagnosis_concept_id
         FROM drug_context WHERE drug_concept_id = ?1 ORDER BY drug_context_id",
    )?;
    let rows = stmt
        .query_map(params![drug_concept_id], drug_context_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Drugs used for a diagnosis.
pub fn list_drug_contexts_for_diagnosis(
    conn: &Connection,
    diagnosis_concept_id: i64,
) -> Result<Vec<DrugContext>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT drug_context_id, drug_concept_id, diagnosis_concept_id
         FROM drug_context WHERE diagnosis_concept_id = ?1 ORDER BY drug_context_id",
    )?;
    let rows = stmt
        .query_map(params![diagnosis_concept_id], drug_context_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_drug_context(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM drug_context WHERE drug_context_id = ?1",
        params![id],
    )?;
    if deleted > 0 {
        tracing::info!(drug_context_id = id, "Deleted drug context");
    }
    Ok(deleted > 0)
}
