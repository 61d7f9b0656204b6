use serde::{Deserialize, Serialize};

/// Central regimen record. `variant_of_id` links a variant to the regimen
/// it derives from; roots have none.
///
/// `regimen_reference_id` is assigned by the database on insert and ignored
/// by `insert_regimen_reference`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimenReference {
    pub regimen_reference_id: i64,
    pub regimen_reference_name: String,
    pub regimen_label: String,
    pub common_name: String,
    pub context: String,
    pub variant_descriptor: Option<String>,
    pub variant_of_id: Option<i64>,
    pub hemonc_id: Option<i64>,
}

/// Directed equivalence pair. (A, B) says nothing about (B, A).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegimenMultiple {
    pub regimen_reference_id: i64,
    pub equivalent_regimen_reference_id: i64,
}

/// Diagnosis a regimen is used for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimenContext {
    pub regimen_context_id: i64,
    pub regimen_reference_id: i64,
    pub diagnosis_concept_id: i64,
}

/// A phase or branch within a regimen's treatment path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimenPart {
    pub regimen_part_id: i64,
    pub part_of: i64,
    pub path: Option<i32>,
    pub part: Option<i32>,
    pub branch: Option<String>,
}
