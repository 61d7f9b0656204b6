use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

fn part_from_row(row: &Row<'_>) -> rusqlite::Result<RegimenPart> {
    Ok(RegimenPart {
        regimen_part_id: row.get(0)?,
        part_of: row.get(1)?,
        path: row.get(2)?,
        part: row.get(3)?,
        branch: row.get(4)?,
    })
}

/// Insert a part; `regimen_part_id` is assigned by the database.
pub fn insert_regimen_part(conn: &Connection, part: &RegimenPart) -> Result<i64, DatabaseError> {
    check_optional_label("branch", part.branch.as_deref())?;
    conn.execute(
        "INSERT INTO regimen_part (part_of, path, part, branch) VALUES (?1, ?2, ?3, ?4)",
        params![part.part_of, part.path, part.part, part.branch],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(regimen_part_id = id, part_of = part.part_of, "Inserted regimen part");
    Ok(id)
}

pub fn get_regimen_part(conn: &Connection, id: i64) -> Result<Option<RegimenPart>, DatabaseError> {
    let part = conn
        .query_row(
            "SELECT regimen_part_id, part_of, path, part, branch
             FROM regimen_part WHERE regimen_part_id = ?1",
            params![id],
            part_from_row,
        )
        .optional()?;
    Ok(part)
}

/// Parts of a regimen (`has_parts`), ordered by path then part.
pub fn list_regimen_parts(conn: &Connection, regimen_reference_id: i64) -> Result<Vec<RegimenPart>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT regimen_part_id, part_of, path, part, branch
         FROM regimen_part WHERE part_of = ?1
         ORDER BY path IS NULL, path, part IS NULL, part, regimen_part_id",
    )?;
    let rows = stmt
        .query_map(params![regimen_reference_id], part_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_regimen_part(conn: &Connection, part: &RegimenPart) -> Result<(), DatabaseError> {
    check_optional_label("branch", part.branch.as_deref())?;
    let updated = conn.execute(
        "UPDATE regimen_part SET part_of = ?2, path = ?3, part = ?4, branch = ?5
         WHERE regimen_part_id = ?1",
        params![part.regimen_part_id, part.part_of, part.path, part.part, part.branch],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("regimen_part", part.regimen_part_id));
    }
    Ok(())
}

pub fn delete_regimen_part(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM regimen_part WHERE regimen_part_id = ?1", params![id])?;
    if deleted > 0 {
        tracing::info!(regimen_part_id = id, "Deleted regimen part");
    }
    Ok(deleted > 0)
}

/// The regimen a part belongs to (`part_of_regimen`).
pub fn get_part_of_regimen(
    conn: &Connection,
    part: &RegimenPart,
) -> Result<Option<RegimenReference>, DatabaseError> {
    super::regimen_reference::get_regimen_reference(conn, part.part_of)
}
