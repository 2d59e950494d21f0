//! Dataset column naming.
//!
//! DEL screening dumps name their columns differently between vendors, so
//! the mapping is configuration rather than convention. The defaults match
//! the common layout: one assembled-molecule SMILES column, three
//! building-block SMILES columns, a protein name and a binary outcome.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSchema {
    /// Unique row identifier, shared between input rows and submission rows.
    pub id: String,
    /// SMILES of the assembled library member.
    pub molecule: String,
    /// SMILES of the individual building blocks. Present in the raw dumps
    /// but unused by the pipeline; listed so projections can be widened
    /// without touching code.
    pub building_blocks: Vec<String>,
    /// Target protein name.
    pub protein: String,
    /// Binary binding outcome column (train) and submission value column.
    pub outcome: String,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            molecule: "molecule_smiles".to_string(),
            building_blocks: vec![
                "buildingblock1_smiles".to_string(),
                "buildingblock2_smiles".to_string(),
                "buildingblock3_smiles".to_string(),
            ],
            protein: "protein_name".to_string(),
            outcome: "binds".to_string(),
        }
    }
}

impl DatasetSchema {
    /// Columns projected when scanning labelled training data.
    pub fn train_columns(&self) -> Vec<&str> {
        vec![&self.id, &self.molecule, &self.protein, &self.outcome]
    }

    /// Columns projected when scanning unlabelled test data.
    pub fn test_columns(&self) -> Vec<&str> {
        vec![&self.id, &self.molecule, &self.protein]
    }
}
