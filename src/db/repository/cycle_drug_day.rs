use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

fn day_from_row(row: &Row<'_>) -> rusqlite::Result<CycleDrugDay> {
    Ok(CycleDrugDay {
        cycle_drug_day_id: row.get(0)?,
        cycle_drug_id: row.get(1)?,
        day: row.get(2)?,
    })
}

/// Insert an administration day; `cycle_drug_day_id` is assigned by the database.
pub fn insert_cycle_drug_day(conn: &Connection, day: &CycleDrugDay) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO cycle_drug_day (cycle_drug_id, day) VALUES (?1, ?2)",
        params![day.cycle_drug_id, day.day],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_cycle_drug_day(conn: &Connection, id: i64) -> Result<Option<CycleDrugDay>, DatabaseError> {
    let day = conn
        .query_row(
            "SELECT cycle_drug_day_id, cycle_drug_id, day FROM cycle_drug_day WHERE cycle_drug_day_id = ?1",
            params![id],
            day_from_row,
        )
        .optional()?;
    Ok(day)
}

/// Administration days of a cycle drug (`has_days`), ascending.
pub fn list_days_for_drug(conn: &Connection, cycle_drug_id: i64) -> Result<Vec<CycleDrugDay>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT cycle_drug_day_id, cycle_drug_id, day FROM cycle_drug_day
         WHERE cycle_drug_id = ?1 ORDER BY day IS NULL, day, cycle_drug_day_id",
    )?;
    let rows = stmt
        .query_map(params![cycle_drug_id], day_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_cycle_drug_day(conn: &Connection, day: &CycleDrugDay) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE cycle_drug_day SET cycle_drug_id = ?2, day = ?3 WHERE cycle_drug_day_id = ?1",
        params![day.cycle_drug_day_id, day.cycle_drug_id, day.day],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("cycle_drug_day", day.cycle_drug_day_id));
    }
    Ok(())
}

pub fn delete_cycle_drug_day(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM cycle_drug_day WHERE cycle_drug_day_id = ?1", params![id])?;
    Ok(deleted > 0)
}

/// The cycle drug an administration day belongs to (`cycle_drug_day_of`).
pub fn get_cycle_drug_day_of(
    conn: &Connection,
    day: &CycleDrugDay,
) -> Result<Option<CycleDrug>, DatabaseError> {
    super::cycle_drug::get_cycle_drug(conn, day.cycle_drug_id)
}
