use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

fn cycle_drug_from_row(row: &Row<'_>) -> rusqlite::Result<CycleDrug> {
    Ok(CycleDrug {
        cycle_drug_id: row.get(0)?,
        cycle_id: row.get(1)?,
        drug_id: row.get(2)?,
        route_id: row.get(3)?,
    })
}

/// Insert a cycle drug; `cycle_drug_id` is assigned by the database.
pub fn insert_cycle_drug(conn: &Connection, drug: &CycleDrug) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO cycle_drug (cycle_id, drug_id, route_id) VALUES (?1, ?2, ?3)",
        params![drug.cycle_id, drug.drug_id, drug.route_id],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(cycle_drug_id = id, cycle_id = drug.cycle_id, drug_id = drug.drug_id, "Inserted cycle drug");
    Ok(id)
}

pub fn get_cycle_drug(conn: &Connection, id: i64) -> Result<Option<CycleDrug>, DatabaseError> {
    let drug = conn
        .query_row(
            "SELECT cycle_drug_id, cycle_id, drug_id, route_id FROM cycle_drug WHERE cycle_drug_id = ?1",
            params![id],
            cycle_drug_from_row,
        )
        .optional()?;
    Ok(drug)
}

/// Drugs given in a cycle (`has_drugs`).
pub fn list_drugs_for_cycle(conn: &Connection, cycle_id: i64) -> Result<Vec<CycleDrug>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT cycle_drug_id, cycle_id, drug_id, route_id FROM cycle_drug
         WHERE cycle_id = ?1 ORDER BY cycle_drug_id",
    )?;
    let rows = stmt
        .query_map(params![cycle_id], cycle_drug_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every cycle drug row pointing at a drug concept, across all regimens.
pub fn list_cycle_drugs_by_concept(conn: &Connection, drug_id: i64) -> Result<Vec<CycleDrug>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT cycle_drug_id, cycle_id, drug_id, route_id FROM cycle_drug
         WHERE drug_id = ?1 ORDER BY cycle_drug_id",
    )?;
    let rows = stmt
        .query_map(params![drug_id], cycle_drug_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_cycle_drug(conn: &Connection, drug: &CycleDrug) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE cycle_drug SET cycle_id = ?2, drug_id = ?3, route_id = ?4 WHERE cycle_drug_id = ?1",
        params![drug.cycle_drug_id, drug.cycle_id, drug.drug_id, drug.route_id],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("cycle_drug", drug.cycle_drug_id));
    }
    Ok(())
}

pub fn delete_cycle_drug(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM cycle_drug WHERE cycle_drug_id = ?1", params![id])?;
    if deleted > 0 {
        tracing::info!(cycle_drug_id = id, "Deleted cycle drug");
    }
    Ok(deleted > 0)
}

/// The cycle a drug is given in (`drug_of`).
pub fn get_drug_of(
    conn: &Connection,
    drug: &CycleDrug,
) -> Result<Option<CycleReference>, DatabaseError> {
    super::cycle_reference::get_cycle_reference(conn, drug.cycle_id)
}
