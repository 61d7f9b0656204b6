//! Eagerly loaded regimen hierarchy.
//!
//! Mirrors the ownership chain regimen → part → cycle → drug → day, with
//! each child collection already populated.

use serde::{Deserialize, Serialize};

use super::cycle::{CycleDrug, CycleDrugDay, CycleReference};
use super::regimen::{RegimenContext, RegimenPart, RegimenReference};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimenTree {
    pub regimen: RegimenReference,
    pub context: Option<RegimenContext>,
    pub variants: Vec<RegimenReference>,
    pub parts: Vec<PartTree>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartTree {
    pub part: RegimenPart,
    pub cycles: Vec<CycleTree>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleTree {
    pub cycle: CycleReference,
    pub drugs: Vec<DrugTree>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugTree {
    pub drug: CycleDrug,
    pub days: Vec<CycleDrugDay>,
}

impl RegimenTree {
    pub fn cycles(&self) -> impl Iterator<Item = &CycleTree> {
        self.parts.iter().flat_map(|p| p.cycles.iter())
    }

    pub fn drugs(&self) -> impl Iterator<Item = &DrugTree> {
        self.cycles().flat_map(|c| c.drugs.iter())
    }

    /// Distinct drug concept ids across all cycles, in first-seen order.
    pub fn drug_concept_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        for drug in self.drugs() {
            if !ids.contains(&drug.drug.drug_id) {
                ids.push(drug.drug.drug_id);
            }
        }
        ids
    }
}

impl DrugTree {
    /// Administration days with a recorded offset, ascending.
    pub fn day_offsets(&self) -> Vec<i32> {
        let mut days: Vec<i32> = self.days.iter().filter_map(|d| d.day).collect();
        days.sort_unstable();
        days
    }
}
