use std::collections::{BTreeSet, HashMap};

use rusqlite::Connection;
use serde::Serialize;

use crate::config::MAX_VARIANT_DEPTH;
use crate::db::DatabaseError;

/// A single integrity issue detected by the checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityIssue {
    pub category: String,
    pub severity: String,
    pub description: String,
    /// Key of the offending row in the table named by the description.
    /// For `regimen_multiples` this is the left half of the composite key.
    pub entity_id: Option<i64>,
}

/// Result of an integrity check across the regimen tables.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub issues: Vec<IntegrityIssue>,
    pub regimens_checked: i64,
    pub variant_cycle_detected: bool,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count(&self, category: &str) -> usize {
        self.issues.iter().filter(|i| i.category == category).count()
    }
}

/// (category, child table, child key, foreign key column, parent table, parent key)
const OWNERSHIP_LINKS: [(&str, &str, &str, &str, &str, &str); 7] = [
    ("orphaned_part", "regimen_part", "regimen_part_id", "part_of", "regimen_reference", "regimen_reference_id"),
    ("orphaned_cycle", "cycle_reference", "cycle_id", "regimen_part", "regimen_part", "regimen_part_id"),
    ("orphaned_cycle_drug", "cycle_drug", "cycle_drug_id", "cycle_id", "cycle_reference", "cycle_id"),
    ("orphaned_drug_day", "cycle_drug_day", "cycle_drug_day_id", "cycle_drug_id", "cycle_drug", "cycle_drug_id"),
    ("orphaned_context", "regimen_context", "regimen_context_id", "regimen_reference_id", "regimen_reference", "regimen_reference_id"),
    ("dangling_variant_of", "regimen_reference", "regimen_reference_id", "variant_of_id", "regimen_reference", "regimen_reference_id"),
    ("orphaned_multiple", "regimen_multiples", "regimen_reference_id", "equivalent_regimen_reference_id", "regimen_reference", "regimen_reference_id"),
];

/// (table, key, concept column)
const CONCEPT_LINKS: [(&str, &str, &str); 6] = [
    ("drug_context", "drug_context_id", "drug_concept_id"),
    ("drug_context", "drug_context_id", "diagnosis_concept_id"),
    ("regimen_reference", "regimen_reference_id", "hemonc_id"),
    ("regimen_context", "regimen_context_id", "diagnosis_concept_id"),
    ("cycle_drug", "cycle_drug_id", "drug_id"),
    ("cycle_drug", "cycle_drug_id", "route_id"),
];

/// Run a full integrity check across the regimen tables.
///
/// Detects:
/// - Children whose required parent row is missing, at every ownership level
/// - Regimen multiples whose left or right regimen is missing
/// - `variant_of` links to missing regimens, and variant cycles
/// - Concept references that do not resolve in `concept`
///
/// Only finds anything in databases written with foreign key enforcement
/// off, since enforcement rejects these rows at write time.
pub fn check_integrity(conn: &Connection) -> Result<IntegrityReport, DatabaseError> {
    let mut issues = Vec::new();

    // 1. Ownership links
    for (category, child, child_key, fk, parent, parent_key) in OWNERSHIP_LINKS {
        let ids = query_ids(
            conn,
            &format!(
                "SELECT c.{child_key} FROM {child} c
                 WHERE c.{fk} IS NOT NULL
                 AND NOT EXISTS (SELECT 1 FROM {parent} p WHERE p.{parent_key} = c.{fk})
                 ORDER BY c.{child_key}"
            ),
        )?;
        for id in ids {
            issues.push(IntegrityIssue {
                category: category.into(),
                severity: "high".into(),
                description: format!("{child} {id} references missing {parent} via {fk}"),
                entity_id: Some(id),
            });
        }
    }

    // 1b. Left side of regimen multiples
    let ids = query_ids(
        conn,
        "SELECT DISTINCT m.regimen_reference_id FROM regimen_multiples m
         WHERE NOT EXISTS (SELECT 1 FROM regimen_reference r
                           WHERE r.regimen_reference_id = m.regimen_reference_id)
         ORDER BY m.regimen_reference_id",
    )?;
    for id in ids {
        issues.push(IntegrityIssue {
            category: "orphaned_multiple".into(),
            severity: "high".into(),
            description: format!("regimen_multiples {id} references missing regimen_reference via regimen_reference_id"),
            entity_id: Some(id),
        });
    }

    // 2. Variant cycles and over-long lineages
    let scan = scan_variant_links(conn)?;
    let variant_cycle_detected = !scan.on_cycle.is_empty();
    for id in &scan.on_cycle {
        issues.push(IntegrityIssue {
            category: "variant_cycle".into(),
            severity: "high".into(),
            description: format!("regimen_reference {id} lies on a variant_of cycle"),
            entity_id: Some(*id),
        });
    }
    for id in &scan.too_deep {
        issues.push(IntegrityIssue {
            category: "excessive_variant_depth".into(),
            severity: "medium".into(),
            description: format!(
                "regimen_reference {id} has more than {MAX_VARIANT_DEPTH} variant_of ancestors"
            ),
            entity_id: Some(*id),
        });
    }

    // 3. Unresolved concepts
    for (table, key, column) in CONCEPT_LINKS {
        let ids = query_ids(
            conn,
            &format!(
                "SELECT t.{key} FROM {table} t
                 WHERE t.{column} IS NOT NULL
                 AND NOT EXISTS (SELECT 1 FROM concept c WHERE c.concept_id = t.{column})
                 ORDER BY t.{key}"
            ),
        )?;
        for id in ids {
            issues.push(IntegrityIssue {
                category: "unresolved_concept".into(),
                severity: "medium".into(),
                description: format!("{table} {id} has unresolved {column}"),
                entity_id: Some(id),
            });
        }
    }

    let regimens_checked: i64 =
        conn.query_row("SELECT COUNT(*) FROM regimen_reference", [], |row| row.get(0))?;

    if !issues.is_empty() {
        tracing::warn!(issues = issues.len(), regimens_checked, "Regimen integrity issues found");
    }

    Ok(IntegrityReport {
        issues,
        regimens_checked,
        variant_cycle_detected,
    })
}

fn query_ids(conn: &Connection, sql: &str) -> Result<Vec<i64>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

#[derive(Debug, Default)]
struct VariantScan {
    on_cycle: BTreeSet<i64>,
    too_deep: BTreeSet<i64>,
}

/// Walk every `variant_of` chain once.
///
/// Each regimen gets its ancestor count, or `None` when its chain runs into
/// a loop. Walks stop at regimens already resolved, so every row is visited
/// a bounded number of times and any loop is found whatever its length.
fn scan_variant_links(conn: &Connection) -> Result<VariantScan, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT regimen_reference_id, variant_of_id FROM regimen_reference",
    )?;
    let parents: HashMap<i64, Option<i64>> = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?)))?
        .collect::<Result<_, _>>()?;

    let mut scan = VariantScan::default();
    let mut depth: HashMap<i64, Option<usize>> = HashMap::with_capacity(parents.len());

    for &start in parents.keys() {
        if depth.contains_key(&start) {
            continue;
        }

        let mut path: Vec<i64> = Vec::new();
        let mut on_path: HashMap<i64, usize> = HashMap::new();
        let mut current = start;

        // Depth of the last regimen on `path`
        let tail_depth = loop {
            on_path.insert(current, path.len());
            path.push(current);

            // Dangling parents are reported separately; the chain ends there.
            let next = match parents.get(&current).copied().flatten() {
                Some(id) if parents.contains_key(&id) => id,
                _ => break Some(0),
            };
            if let Some(&resolved) = depth.get(&next) {
                break resolved.map(|d| d + 1);
            }
            if let Some(&pos) = on_path.get(&next) {
                for id in path.drain(pos..) {
                    scan.on_cycle.insert(id);
                    depth.insert(id, None);
                }
                break None;
            }
            current = next;
        };

        let mut d = tail_depth;
        for &id in path.iter().rev() {
            depth.insert(id, d);
            if matches!(d, Some(n) if n > MAX_VARIANT_DEPTH) {
                scan.too_deep.insert(id);
            }
            d = d.map(|n| n + 1);
        }
    }

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use rusqlite::params;

    fn full_regimen(conn: &Connection) -> i64 {
        let r = make_regimen(conn, "EP");
        let p = make_part(conn, r, 1, 1);
        let c = make_cycle(conn, p, 1);
        let d = make_cycle_drug(conn, c, CISPLATIN);
        make_day(conn, d, 1);
        r
    }

    #[test]
    fn valid_hierarchy_is_clean() {
        let conn = test_db();
        let r = full_regimen(&conn);
        make_variant(&conn, "EP variant", r);
        let report = check_integrity(&conn).unwrap();
        assert!(report.is_clean(), "unexpected issues: {:?}", report.issues);
        assert_eq!(report.regimens_checked, 2);
        assert!(!report.variant_cycle_detected);
    }

    #[test]
    fn orphans_reported_at_every_level() {
        let conn = test_db();
        without_foreign_keys(&conn, |conn| {
            conn.execute("INSERT INTO regimen_part (part_of) VALUES (900)", []).unwrap();
            conn.execute("INSERT INTO cycle_reference (regimen_part) VALUES (901)", []).unwrap();
            conn.execute(
                "INSERT INTO cycle_drug (cycle_id, drug_id, route_id) VALUES (902, ?1, ?2)",
                params![CISPLATIN, INTRAVENOUS],
            )
            .unwrap();
            conn.execute("INSERT INTO cycle_drug_day (cycle_drug_id, day) VALUES (903, 1)", []).unwrap();
            conn.execute(
                "INSERT INTO regimen_context (regimen_reference_id, diagnosis_concept_id) VALUES (904, ?1)",
                params![SMALL_CELL_LUNG],
            )
            .unwrap();
        });

        let report = check_integrity(&conn).unwrap();
        assert_eq!(report.count("orphaned_part"), 1);
        assert_eq!(report.count("orphaned_cycle"), 1);
        assert_eq!(report.count("orphaned_cycle_drug"), 1);
        assert_eq!(report.count("orphaned_drug_day"), 1);
        assert_eq!(report.count("orphaned_context"), 1);
        assert!(report.issues.iter().all(|i| i.severity == "high"));
    }

    #[test]
    fn deleted_parent_leaves_reported_orphan() {
        let conn = test_db();
        let r = full_regimen(&conn);
        without_foreign_keys(&conn, |conn| {
            crate::db::delete_regimen_reference(conn, r).unwrap();
        });
        let report = check_integrity(&conn).unwrap();
        assert_eq!(report.count("orphaned_part"), 1);
        assert_eq!(report.count("orphaned_cycle"), 0);
        assert_eq!(report.regimens_checked, 0);
    }

    #[test]
    fn dangling_variant_and_multiples() {
        let conn = test_db();
        let r = make_regimen(&conn, "EP");
        without_foreign_keys(&conn, |conn| {
            conn.execute(
                "UPDATE regimen_reference SET variant_of_id = 700 WHERE regimen_reference_id = ?1",
                params![r],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO regimen_multiples (regimen_reference_id, equivalent_regimen_reference_id) VALUES (?1, 701)",
                params![r],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO regimen_multiples (regimen_reference_id, equivalent_regimen_reference_id) VALUES (702, ?1)",
                params![r],
            )
            .unwrap();
        });

        let report = check_integrity(&conn).unwrap();
        assert_eq!(report.count("dangling_variant_of"), 1);
        assert_eq!(report.count("orphaned_multiple"), 2);
        assert!(!report.variant_cycle_detected);

        let multiple_keys: Vec<i64> = report
            .issues
            .iter()
            .filter(|i| i.category == "orphaned_multiple")
            .filter_map(|i| i.entity_id)
            .collect();
        assert_eq!(multiple_keys, vec![r, 702]);
    }

    #[test]
    fn cycle_longer_than_depth_limit_is_reported() {
        let conn = test_db();
        let chain = make_raw_chain(&conn, MAX_VARIANT_DEPTH + 3);
        let first = chain[0];
        let last = *chain.last().unwrap();
        conn.execute(
            "UPDATE regimen_reference SET variant_of_id = ?1 WHERE regimen_reference_id = ?2",
            params![last, first],
        )
        .unwrap();

        let report = check_integrity(&conn).unwrap();
        assert!(report.variant_cycle_detected);
        assert!(!report.is_clean());
        assert_eq!(report.count("variant_cycle"), chain.len());
        assert_eq!(report.count("excessive_variant_depth"), 0);
    }

    #[test]
    fn over_deep_lineage_is_reported() {
        let conn = test_db();
        // Root plus MAX_VARIANT_DEPTH + 2 descendants: the last two exceed the bound.
        let chain = make_raw_chain(&conn, MAX_VARIANT_DEPTH + 3);

        let report = check_integrity(&conn).unwrap();
        assert!(!report.variant_cycle_detected);
        let deep: Vec<i64> = report
            .issues
            .iter()
            .filter(|i| i.category == "excessive_variant_depth")
            .filter_map(|i| i.entity_id)
            .collect();
        assert_eq!(deep, chain[chain.len() - 2..].to_vec());
        assert!(crate::db::variant_lineage(&conn, chain[chain.len() - 3]).is_ok());
        assert!(crate::db::variant_lineage(&conn, chain[chain.len() - 2]).is_err());
    }

    #[test]
    fn variant_cycle_reported_once_per_member() {
        let conn = test_db();
        let a = make_regimen(&conn, "A");
        let b = make_variant(&conn, "B", a);
        let c = make_variant(&conn, "C", b);
        let tail = make_variant(&conn, "D", c);
        conn.execute(
            "UPDATE regimen_reference SET variant_of_id = ?1 WHERE regimen_reference_id = ?2",
            params![c, a],
        )
        .unwrap();

        let report = check_integrity(&conn).unwrap();
        assert!(report.variant_cycle_detected);
        let members: Vec<i64> = report
            .issues
            .iter()
            .filter(|i| i.category == "variant_cycle")
            .filter_map(|i| i.entity_id)
            .collect();
        assert_eq!(members, vec![a, b, c]);
        assert!(!members.contains(&tail));
    }

    #[test]
    fn unresolved_concepts_reported() {
        let conn = test_db();
        let r = make_regimen(&conn, "EP");
        let p = make_part(&conn, r, 1, 1);
        let c = make_cycle(&conn, p, 1);
        without_foreign_keys(&conn, |conn| {
            conn.execute(
                "INSERT INTO cycle_drug (cycle_id, drug_id, route_id) VALUES (?1, 5555, 6666)",
                params![c],
            )
            .unwrap();
            conn.execute(
                "UPDATE regimen_reference SET hemonc_id = 7777 WHERE regimen_reference_id = ?1",
                params![r],
            )
            .unwrap();
        });

        let report = check_integrity(&conn).unwrap();
        assert_eq!(report.count("unresolved_concept"), 3);
        assert!(report
            .issues
            .iter()
            .any(|i| i.description.contains("route_id")));
    }
}
