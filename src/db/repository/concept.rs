//! Read-only access to the external `concept` vocabulary.
//!
//! The regimen tables only point at concepts; the relationship helpers here
//! resolve those pointers.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

const CONCEPT_COLUMNS: &str = "concept_id, concept_name, domain_id, vocabulary_id,
     concept_class_id, standard_concept, concept_code";

fn concept_from_row(row: &Row<'_>) -> rusqlite::Result<Concept> {
    Ok(Concept {
        concept_id: row.get(0)?,
        concept_name: row.get(1)?,
        domain_id: row.get(2)?,
        vocabulary_id: row.get(3)?,
        concept_class_id: row.get(4)?,
        standard_concept: row.get(5)?,
        concept_code: row.get(6)?,
    })
}

pub fn get_concept(conn: &Connection, concept_id: i64) -> Result<Option<Concept>, DatabaseError> {
    let concept = conn
        .query_row(
            &format!("SELECT {CONCEPT_COLUMNS} FROM concept WHERE concept_id = ?1"),
            params![concept_id],
            concept_from_row,
        )
        .optional()?;
    Ok(concept)
}

/// Like [`get_concept`] but a missing row is an error.
pub fn resolve_concept(conn: &Connection, concept_id: i64) -> Result<Concept, DatabaseError> {
    get_concept(conn, concept_id)?.ok_or_else(|| DatabaseError::not_found("concept", concept_id))
}

pub fn concept_exists(conn: &Connection, concept_id: i64) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM concept WHERE concept_id = ?1",
            params![concept_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// `drug_concept` and `diagnosis_concept` of a drug context.
pub fn drug_context_concepts(
    conn: &Connection,
    ctx: &DrugContext,
) -> Result<(Concept, Concept), DatabaseError> {
    Ok((
        resolve_concept(conn, ctx.drug_concept_id)?,
        resolve_concept(conn, ctx.diagnosis_concept_id)?,
    ))
}

/// `drug_concept` and `route_concept` of a cycle drug.
pub fn cycle_drug_concepts(
    conn: &Connection,
    drug: &CycleDrug,
) -> Result<(Concept, Concept), DatabaseError> {
    Ok((
        resolve_concept(conn, drug.drug_id)?,
        resolve_concept(conn, drug.route_id)?,
    ))
}

/// `diagnosis_concept` of a regimen context.
pub fn regimen_context_diagnosis(
    conn: &Connection,
    ctx: &RegimenContext,
) -> Result<Concept, DatabaseError> {
    resolve_concept(conn, ctx.diagnosis_concept_id)
}

/// `hemonc_concept` of a regimen; `None` when the regimen carries no HemOnc id.
pub fn hemonc_concept(
    conn: &Connection,
    regimen: &RegimenReference,
) -> Result<Option<Concept>, DatabaseError> {
    match regimen.hemonc_id {
        Some(id) => resolve_concept(conn, id).map(Some),
        None => Ok(None),
    }
}
