use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReference {
    pub cycle_id: i64,
    pub regimen_part: i64,
    pub cycle_number: Option<i32>,
    /// Length in days
    pub cycle_length: Option<i32>,
    pub min_cycles: Option<i32>,
    pub max_cycles: Option<i32>,
}

/// One drug given within a cycle, with its route of administration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleDrug {
    pub cycle_drug_id: i64,
    pub cycle_id: i64,
    pub drug_id: i64,
    pub route_id: i64,
}

/// Day offset within the cycle on which the drug is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleDrugDay {
    pub cycle_drug_day_id: i64,
    pub cycle_drug_id: i64,
    pub day: Option<i32>,
}
