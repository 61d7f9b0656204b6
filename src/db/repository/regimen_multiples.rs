//! Directed equivalence pairs between regimen references.
//!
//! Pairs are stored exactly as given. Inserting (A, B) never creates
//! (B, A); callers wanting symmetry insert both rows.

use rusqlite::{params, Connection, Row};

use crate::db::DatabaseError;
use crate::models::*;

fn multiple_from_row(row: &Row<'_>) -> rusqlite::Result<RegimenMultiple> {
    Ok(RegimenMultiple {
        regimen_reference_id: row.get(0)?,
        equivalent_regimen_reference_id: row.get(1)?,
    })
}

/// Insert one pair. A duplicate pair is rejected by the composite key.
pub fn insert_regimen_multiple(conn: &Connection, pair: &RegimenMultiple) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO regimen_multiples (regimen_reference_id, equivalent_regimen_reference_id)
         VALUES (?1, ?2)",
        params![pair.regimen_reference_id, pair.equivalent_regimen_reference_id],
    )?;
    tracing::debug!(
        from = pair.regimen_reference_id,
        to = pair.equivalent_regimen_reference_id,
        "Inserted regimen multiple"
    );
    Ok(())
}

pub fn regimen_multiple_exists(conn: &Connection, pair: &RegimenMultiple) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM regimen_multiples
         WHERE regimen_reference_id = ?1 AND equivalent_regimen_reference_id = ?2",
        params![pair.regimen_reference_id, pair.equivalent_regimen_reference_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Pairs whose left side is `id`.
pub fn get_equivalent_regimens(conn: &Connection, id: i64) -> Result<Vec<RegimenMultiple>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT regimen_reference_id, equivalent_regimen_reference_id FROM regimen_multiples
         WHERE regimen_reference_id = ?1 ORDER BY equivalent_regimen_reference_id",
    )?;
    let rows = stmt
        .query_map(params![id], multiple_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Pairs whose right side is `id`.
pub fn get_regimens_equivalent_to(conn: &Connection, id: i64) -> Result<Vec<RegimenMultiple>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT regimen_reference_id, equivalent_regimen_reference_id FROM regimen_multiples
         WHERE equivalent_regimen_reference_id = ?1 ORDER BY regimen_reference_id",
    )?;
    let rows = stmt
        .query_map(params![id], multiple_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_regimen_multiples(conn: &Connection) -> Result<Vec<RegimenMultiple>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT regimen_reference_id, equivalent_regimen_reference_id FROM regimen_multiples
         ORDER BY regimen_reference_id, equivalent_regimen_reference_id",
    )?;
    let rows = stmt
        .query_map([], multiple_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_regimen_multiple(conn: &Connection, pair: &RegimenMultiple) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM regimen_multiples
         WHERE regimen_reference_id = ?1 AND equivalent_regimen_reference_id = ?2",
        params![pair.regimen_reference_id, pair.equivalent_regimen_reference_id],
    )?;
    if deleted > 0 {
        tracing::info!(
            from = pair.regimen_reference_id,
            to = pair.equivalent_regimen_reference_id,
            "Deleted regimen multiple"
        );
    }
    Ok(deleted > 0)
}
