use serde::{Deserialize, Serialize};

/// "This drug is used for this diagnosis", independent of any regimen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugContext {
    pub drug_context_id: i64,
    pub drug_concept_id: i64,
    pub diagnosis_concept_id: i64,
}
