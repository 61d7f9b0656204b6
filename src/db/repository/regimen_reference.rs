use std::collections::HashSet;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::config::MAX_VARIANT_DEPTH;
use crate::db::DatabaseError;
use crate::models::*;

const REGIMEN_COLUMNS: &str = "regimen_reference_id, regimen_reference_name, regimen_label,
     common_name, context, variant_descriptor, variant_of_id, hemonc_id";

fn regimen_from_row(row: &Row<'_>) -> rusqlite::Result<RegimenReference> {
    Ok(RegimenReference {
        regimen_reference_id: row.get(0)?,
        regimen_reference_name: row.get(1)?,
        regimen_label: row.get(2)?,
        common_name: row.get(3)?,
        context: row.get(4)?,
        variant_descriptor: row.get(5)?,
        variant_of_id: row.get(6)?,
        hemonc_id: row.get(7)?,
    })
}

fn validate_regimen(regimen: &RegimenReference) -> Result<(), DatabaseError> {
    check_label("regimen_reference_name", &regimen.regimen_reference_name)?;
    check_label("regimen_label", &regimen.regimen_label)?;
    check_label("common_name", &regimen.common_name)?;
    check_label("context", &regimen.context)?;
    check_optional_label("variant_descriptor", regimen.variant_descriptor.as_deref())
}

/// Insert a regimen reference; `regimen_reference_id` is assigned by the database.
///
/// A fresh row cannot close a variant cycle, but its lineage must stay
/// within `MAX_VARIANT_DEPTH`.
pub fn insert_regimen_reference(
    conn: &Connection,
    regimen: &RegimenReference,
) -> Result<i64, DatabaseError> {
    validate_regimen(regimen)?;
    if let Some(parent) = regimen.variant_of_id {
        let depth = variant_lineage(conn, parent)?.len() + 1;
        ensure_depth_within_bound(depth, 0)?;
    }
    conn.execute(
        "INSERT INTO regimen_reference (regimen_reference_name, regimen_label, common_name,
         context, variant_descriptor, variant_of_id, hemonc_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            regimen.regimen_reference_name,
            regimen.regimen_label,
            regimen.common_name,
            regimen.context,
            regimen.variant_descriptor,
            regimen.variant_of_id,
            regimen.hemonc_id,
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(regimen_reference_id = id, name = %regimen.regimen_reference_name, "Inserted regimen reference");
    Ok(id)
}

pub fn get_regimen_reference(
    conn: &Connection,
    id: i64,
) -> Result<Option<RegimenReference>, DatabaseError> {
    let regimen = conn
        .query_row(
            &format!("SELECT {REGIMEN_COLUMNS} FROM regimen_reference WHERE regimen_reference_id = ?1"),
            params![id],
            regimen_from_row,
        )
        .optional()?;
    Ok(regimen)
}

pub fn list_regimen_references(
    conn: &Connection,
    filter: &RegimenFilter,
) -> Result<Vec<RegimenReference>, DatabaseError> {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(name) = &filter.name {
        values.push(Value::Text(like_substring(name)));
        let n = values.len();
        conditions.push(format!(
            "(LOWER(regimen_reference_name) LIKE LOWER(?{n}) ESCAPE '\\'
              OR LOWER(regimen_label) LIKE LOWER(?{n}) ESCAPE '\\'
              OR LOWER(common_name) LIKE LOWER(?{n}) ESCAPE '\\')"
        ));
    }
    if let Some(hemonc_id) = filter.hemonc_id {
        values.push(Value::Integer(hemonc_id));
        conditions.push(format!("hemonc_id = ?{}", values.len()));
    }
    if filter.roots_only {
        conditions.push("variant_of_id IS NULL".into());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let sql = format!(
        "SELECT {REGIMEN_COLUMNS} FROM regimen_reference{where_clause} ORDER BY regimen_reference_id"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), regimen_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Overwrite every column of an existing regimen reference.
///
/// A changed `variant_of_id` goes through the same cycle check as
/// [`set_variant_of`].
pub fn update_regimen_reference(
    conn: &Connection,
    regimen: &RegimenReference,
) -> Result<(), DatabaseError> {
    validate_regimen(regimen)?;
    let id = regimen.regimen_reference_id;
    if let Some(parent) = regimen.variant_of_id {
        ensure_acyclic_link(conn, id, parent)?;
    }
    let updated = conn.execute(
        "UPDATE regimen_reference SET regimen_reference_name = ?2, regimen_label = ?3,
         common_name = ?4, context = ?5, variant_descriptor = ?6, variant_of_id = ?7, hemonc_id = ?8
         WHERE regimen_reference_id = ?1",
        params![
            id,
            regimen.regimen_reference_name,
            regimen.regimen_label,
            regimen.common_name,
            regimen.context,
            regimen.variant_descriptor,
            regimen.variant_of_id,
            regimen.hemonc_id,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("regimen_reference", id));
    }
    Ok(())
}

/// Delete a regimen reference. Fails with a storage error while parts,
/// contexts, variants or multiples still point at it.
pub fn delete_regimen_reference(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM regimen_reference WHERE regimen_reference_id = ?1",
        params![id],
    )?;
    if deleted > 0 {
        tracing::info!(regimen_reference_id = id, "Deleted regimen reference");
    }
    Ok(deleted > 0)
}

/// The regimen this one is a variant of (`variant_of`).
pub fn get_variant_of(
    conn: &Connection,
    regimen: &RegimenReference,
) -> Result<Option<RegimenReference>, DatabaseError> {
    match regimen.variant_of_id {
        Some(parent) => get_regimen_reference(conn, parent),
        None => Ok(None),
    }
}

/// Direct variants of a regimen (`has_variants`).
pub fn get_variants(conn: &Connection, id: i64) -> Result<Vec<RegimenReference>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REGIMEN_COLUMNS} FROM regimen_reference
         WHERE variant_of_id = ?1 ORDER BY regimen_reference_id"
    ))?;
    let rows = stmt
        .query_map(params![id], regimen_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Ancestors of a regimen, nearest first, ending at the root.
///
/// Fails with [`DatabaseError::VariantCycle`] on a revisited regimen and with
/// [`DatabaseError::ConstraintViolation`] past `MAX_VARIANT_DEPTH` hops.
pub fn variant_lineage(conn: &Connection, id: i64) -> Result<Vec<RegimenReference>, DatabaseError> {
    let start = get_regimen_reference(conn, id)?
        .ok_or_else(|| DatabaseError::not_found("regimen_reference", id))?;

    let mut visited = HashSet::from([id]);
    let mut lineage = Vec::new();
    let mut next = start.variant_of_id;

    while let Some(parent_id) = next {
        if !visited.insert(parent_id) {
            return Err(DatabaseError::VariantCycle { regimen_reference_id: parent_id });
        }
        if lineage.len() >= MAX_VARIANT_DEPTH {
            return Err(DatabaseError::ConstraintViolation(format!(
                "variant lineage of {id} exceeds {MAX_VARIANT_DEPTH} hops"
            )));
        }
        let parent = get_regimen_reference(conn, parent_id)?
            .ok_or_else(|| DatabaseError::not_found("regimen_reference", parent_id))?;
        next = parent.variant_of_id;
        lineage.push(parent);
    }

    Ok(lineage)
}

/// Root of a regimen's variant tree (the regimen itself when it has no parent).
pub fn variant_root(conn: &Connection, id: i64) -> Result<RegimenReference, DatabaseError> {
    match variant_lineage(conn, id)?.pop() {
        Some(root) => Ok(root),
        None => get_regimen_reference(conn, id)?
            .ok_or_else(|| DatabaseError::not_found("regimen_reference", id)),
    }
}

/// Relink a regimen under a new parent, or detach it with `None`.
pub fn set_variant_of(
    conn: &Connection,
    id: i64,
    parent: Option<i64>,
) -> Result<(), DatabaseError> {
    if let Some(parent_id) = parent {
        ensure_acyclic_link(conn, id, parent_id)?;
    }
    let updated = conn.execute(
        "UPDATE regimen_reference SET variant_of_id = ?2 WHERE regimen_reference_id = ?1",
        params![id, parent],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("regimen_reference", id));
    }
    tracing::info!(regimen_reference_id = id, variant_of = ?parent, "Relinked regimen variant");
    Ok(())
}

/// `id -> parent_id` must not close a loop, and no regimen under `id`
/// may end up past `MAX_VARIANT_DEPTH`.
fn ensure_acyclic_link(conn: &Connection, id: i64, parent_id: i64) -> Result<(), DatabaseError> {
    if parent_id == id {
        return Err(DatabaseError::VariantCycle { regimen_reference_id: id });
    }
    let parent_lineage = variant_lineage(conn, parent_id)?;
    if parent_lineage.iter().any(|r| r.regimen_reference_id == id) {
        return Err(DatabaseError::VariantCycle { regimen_reference_id: id });
    }
    ensure_depth_within_bound(parent_lineage.len() + 1, variant_subtree_height(conn, id)?)
}

/// A regimen at `depth` ancestors with descendants `height` levels below it.
fn ensure_depth_within_bound(depth: usize, height: usize) -> Result<(), DatabaseError> {
    if depth + height > MAX_VARIANT_DEPTH {
        return Err(DatabaseError::ConstraintViolation(format!(
            "variant lineage would reach {} hops, limit is {MAX_VARIANT_DEPTH}",
            depth + height
        )));
    }
    Ok(())
}

/// Levels of variants below `id` (0 for a leaf). Stops one past the bound.
fn variant_subtree_height(conn: &Connection, id: i64) -> Result<usize, DatabaseError> {
    let height: i64 = conn.query_row(
        "WITH RECURSIVE sub(id, depth) AS (
             SELECT ?1, 0
             UNION ALL
             SELECT r.regimen_reference_id, sub.depth + 1
             FROM regimen_reference r JOIN sub ON r.variant_of_id = sub.id
             WHERE sub.depth <= ?2
         )
         SELECT MAX(depth) FROM sub",
        params![id, MAX_VARIANT_DEPTH as i64],
        |row| row.get(0),
    )?;
    Ok(height.max(0) as usize)
}

/// Escape `LIKE` wildcards so the user text matches literally under `ESCAPE '\'`.
fn like_substring(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
