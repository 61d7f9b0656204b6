use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

fn cycle_from_row(row: &Row<'_>) -> rusqlite::Result<CycleReference> {
    Ok(CycleReference {
        cycle_id: row.get(0)?,
        regimen_part: row.get(1)?,
        cycle_number: row.get(2)?,
        cycle_length: row.get(3)?,
        min_cycles: row.get(4)?,
        max_cycles: row.get(5)?,
    })
}

/// Insert a cycle; `cycle_id` is assigned by the database.
pub fn insert_cycle_reference(conn: &Connection, cycle: &CycleReference) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO cycle_reference (regimen_part, cycle_number, cycle_length, min_cycles, max_cycles)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            cycle.regimen_part,
            cycle.cycle_number,
            cycle.cycle_length,
            cycle.min_cycles,
            cycle.max_cycles,
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(cycle_id = id, regimen_part = cycle.regimen_part, "Inserted cycle reference");
    Ok(id)
}

pub fn get_cycle_reference(conn: &Connection, id: i64) -> Result<Option<CycleReference>, DatabaseError> {
    let cycle = conn
        .query_row(
            "SELECT cycle_id, regimen_part, cycle_number, cycle_length, min_cycles, max_cycles
             FROM cycle_reference WHERE cycle_id = ?1",
            params![id],
            cycle_from_row,
        )
        .optional()?;
    Ok(cycle)
}

/// Cycles of a part (`has_cycles`), ordered by cycle number.
pub fn list_cycles_for_part(conn: &Connection, regimen_part_id: i64) -> Result<Vec<CycleReference>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT cycle_id, regimen_part, cycle_number, cycle_length, min_cycles, max_cycles
         FROM cycle_reference WHERE regimen_part = ?1
         ORDER BY cycle_number IS NULL, cycle_number, cycle_id",
    )?;
    let rows = stmt
        .query_map(params![regimen_part_id], cycle_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_cycle_reference(conn: &Connection, cycle: &CycleReference) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE cycle_reference SET regimen_part = ?2, cycle_number = ?3, cycle_length = ?4,
         min_cycles = ?5, max_cycles = ?6
         WHERE cycle_id = ?1",
        params![
            cycle.cycle_id,
            cycle.regimen_part,
            cycle.cycle_number,
            cycle.cycle_length,
            cycle.min_cycles,
            cycle.max_cycles,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("cycle_reference", cycle.cycle_id));
    }
    Ok(())
}

pub fn delete_cycle_reference(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM cycle_reference WHERE cycle_id = ?1", params![id])?;
    if deleted > 0 {
        tracing::info!(cycle_id = id, "Deleted cycle reference");
    }
    Ok(deleted > 0)
}

/// The part a cycle belongs to (`cycle_of`).
pub fn get_cycle_of(
    conn: &Connection,
    cycle: &CycleReference,
) -> Result<Option<RegimenPart>, DatabaseError> {
    super::regimen_part::get_regimen_part(conn, cycle.regimen_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;

    #[test]
    fn cycle_insert_and_retrieve() {
        let conn = test_db();
        let r = make_regimen(&conn, "EP");
        let p = make_part(&conn, r, 1, 1);
        let id = make_cycle(&conn, p, 1);

        let c = get_cycle_reference(&conn, id).unwrap().unwrap();
        assert_eq!(c.regimen_part, p);
        assert_eq!(c.cycle_number, Some(1));
        assert_eq!(c.cycle_length, Some(21));
        assert_eq!(c.min_cycles, Some(4));
        assert_eq!(c.max_cycles, Some(6));
    }

    #[test]
    fn cycle_optional_columns_round_trip_as_none() {
        let conn = test_db();
        let r = make_regimen(&conn, "EP");
        let p = make_part(&conn, r, 1, 1);
        let id = insert_cycle_reference(&conn, &CycleReference {
            cycle_id: 0,
            regimen_part: p,
            cycle_number: None,
            cycle_length: None,
            min_cycles: None,
            max_cycles: None,
        })
        .unwrap();
        let c = get_cycle_reference(&conn, id).unwrap().unwrap();
        assert!(c.cycle_number.is_none() && c.cycle_length.is_none());
        assert!(c.min_cycles.is_none() && c.max_cycles.is_none());
    }

    #[test]
    fn cycles_ordered_by_number() {
        let conn = test_db();
        let r = make_regimen(&conn, "EP");
        let p = make_part(&conn, r, 1, 1);
        let c3 = make_cycle(&conn, p, 3);
        let c1 = make_cycle(&conn, p, 1);
        let ids: Vec<i64> = list_cycles_for_part(&conn, p).unwrap().iter().map(|c| c.cycle_id).collect();
        assert_eq!(ids, vec![c1, c3]);
    }

    #[test]
    fn cycle_requires_part() {
        let conn = test_db();
        let result = insert_cycle_reference(&conn, &CycleReference {
            cycle_id: 0,
            regimen_part: 12,
            cycle_number: Some(1),
            cycle_length: None,
            min_cycles: None,
            max_cycles: None,
        });
        assert!(matches!(result, Err(DatabaseError::Sqlite(_))));
    }

    #[test]
    fn cycle_update() {
        let conn = test_db();
        let r = make_regimen(&conn, "EP");
        let p = make_part(&conn, r, 1, 1);
        let id = make_cycle(&conn, p, 1);
        let mut c = get_cycle_reference(&conn, id).unwrap().unwrap();
        c.cycle_length = Some(28);
        update_cycle_reference(&conn, &c).unwrap();
        assert_eq!(get_cycle_reference(&conn, id).unwrap().unwrap().cycle_length, Some(28));
    }

    #[test]
    fn empty_cycle_delete() {
        let conn = test_db();
        let r = make_regimen(&conn, "EP");
        let p = make_part(&conn, r, 1, 1);
        let id = make_cycle(&conn, p, 1);
        assert!(delete_cycle_reference(&conn, id).unwrap());
        assert!(list_cycles_for_part(&conn, p).unwrap().is_empty());
    }

    #[test]
    fn cycle_navigates_to_part() {
        let conn = test_db();
        let r = make_regimen(&conn, "EP");
        let p = make_part(&conn, r, 2, 1);
        let id = make_cycle(&conn, p, 1);
        let cycle = get_cycle_reference(&conn, id).unwrap().unwrap();
        let part = get_cycle_of(&conn, &cycle).unwrap().unwrap();
        assert_eq!(part.regimen_part_id, p);
        assert_eq!(part.path, Some(2));
    }
}
