use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

fn context_from_row(row: &Row<'_>) -> rusqlite::Result<RegimenContext> {
    Ok(RegimenContext {
        regimen_context_id: row.get(0)?,
        regimen_reference_id: row.get(1)?,
        diagnosis_concept_id: row.get(2)?,
    })
}

/// Insert a regimen context; `regimen_context_id` is assigned by the database.
pub fn insert_regimen_context(conn: &Connection, ctx: &RegimenContext) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO regimen_context (regimen_reference_id, diagnosis_concept_id) VALUES (?1, ?2)",
        params![ctx.regimen_reference_id, ctx.diagnosis_concept_id],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(regimen_context_id = id, regimen_reference_id = ctx.regimen_reference_id, "Inserted regimen context");
    Ok(id)
}

pub fn get_regimen_context_by_id(conn: &Connection, id: i64) -> Result<Option<RegimenContext>, DatabaseError> {
    let ctx = conn
        .query_row(
            "SELECT regimen_context_id, regimen_reference_id, diagnosis_concept_id
             FROM regimen_context WHERE regimen_context_id = ?1",
            params![id],
            context_from_row,
        )
        .optional()?;
    Ok(ctx)
}

/// Context of a regimen (`has_context`). The schema allows several rows per
/// regimen; the lowest key wins.
pub fn get_regimen_context(
    conn: &Connection,
    regimen_reference_id: i64,
) -> Result<Option<RegimenContext>, DatabaseError> {
    let ctx = conn
        .query_row(
            "SELECT regimen_context_id, regimen_reference_id, diagnosis_concept_id
             FROM regimen_context WHERE regimen_reference_id = ?1
             ORDER BY regimen_context_id LIMIT 1",
            params![regimen_reference_id],
            context_from_row,
        )
        .optional()?;
    Ok(ctx)
}

/// Regimens used for a diagnosis.
pub fn list_regimen_contexts_for_diagnosis(
    conn: &Connection,
    diagnosis_concept_id: i64,
) -> Result<Vec<RegimenContext>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT regimen_context_id, regimen_reference_id, diagnosis_concept_id
         FROM regimen_context WHERE diagnosis_concept_id = ?1 ORDER BY regimen_context_id",
    )?;
    let rows = stmt
        .query_map(params![diagnosis_concept_id], context_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_regimen_context(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM regimen_context WHERE regimen_context_id = ?1",
        params![id],
    )?;
    if deleted > 0 {
        tracing::info!(regimen_context_id = id, "Deleted regimen context");
    }
    Ok(deleted > 0)
}

/// The regimen a context belongs to (`context_of`).
pub fn get_context_of(
    conn: &Connection,
    ctx: &RegimenContext,
) -> Result<Option<RegimenReference>, DatabaseError> {
    super::regimen_reference::get_regimen_reference(conn, ctx.regimen_reference_id)
}
