//! Row types produced by dataset scans.

/// One labelled training row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainRecord {
    pub id: i64,
    pub smiles: String,
    pub protein: String,
    /// Binary binding outcome, 0 or 1.
    pub outcome: u8,
}

/// One unlabelled inference row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRecord {
    pub id: i64,
    pub smiles: String,
    pub protein: String,
}
