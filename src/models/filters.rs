#[derive(Debug, Default)]
pub struct RegimenFilter {
    /// Literal substring of name, label or common name. Case folding is
    /// ASCII-only (SQLite `LOWER`).
    pub name: Option<String>,
    pub hemonc_id: Option<i64>,
    pub roots_only: bool,
}
