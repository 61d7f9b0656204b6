//! Eager loading of a regimen's full ownership hierarchy.

use rusqlite::Connection;

use crate::db::DatabaseError;
use crate::models::*;

use super::cycle_drug::list_drugs_for_cycle;
use super::cycle_drug_day::list_days_for_drug;
use super::cycle_reference::list_cycles_for_part;
use super::regimen_context::get_regimen_context;
use super::regimen_part::list_regimen_parts;
use super::regimen_reference::{get_regimen_reference, get_variants};

/// Load a regimen with its context, direct variants and every part, cycle,
/// drug and day below it. `None` when the regimen does not exist.
pub fn load_regimen_tree(conn: &Connection, id: i64) -> Result<Option<RegimenTree>, DatabaseError> {
    let Some(regimen) = get_regimen_reference(conn, id)? else {
        return Ok(None);
    };

    let context = get_regimen_context(conn, id)?;
    let variants = get_variants(conn, id)?;

    let mut parts = Vec::new();
    for part in list_regimen_parts(conn, id)? {
        let mut cycles = Vec::new();
        for cycle in list_cycles_for_part(conn, part.regimen_part_id)? {
            let mut drugs = Vec::new();
            for drug in list_drugs_for_cycle(conn, cycle.cycle_id)? {
                let days = list_days_for_drug(conn, drug.cycle_drug_id)?;
                drugs.push(DrugTree { drug, days });
            }
            cycles.push(CycleTree { cycle, drugs });
        }
        parts.push(PartTree { part, cycles });
    }

    tracing::debug!(regimen_reference_id = id, parts = parts.len(), "Loaded regimen tree");

    Ok(Some(RegimenTree {
        regimen,
        context,
        variants,
        parts,
    }))
}

/// Like [`load_regimen_tree`] but a missing regimen is an error.
pub fn require_regimen_tree(conn: &Connection, id: i64) -> Result<RegimenTree, DatabaseError> {
    load_regimen_tree(conn, id)?.ok_or_else(|| DatabaseError::not_found("regimen_reference", id))
}
