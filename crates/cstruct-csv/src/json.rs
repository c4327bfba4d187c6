//! JSON export of the extracted model, for tooling that doesn't read the
//! tagged CSV format.

use crate::error::{ConvertError, Result};
use crate::model::{MacroEntry, StructureRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything extracted for one conversion group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedGroup {
    pub group: String,
    pub kind: String,
    pub inputs: Vec<String>,
    pub macros: Vec<MacroEntry>,
    pub structures: Vec<StructureRecord>,
}

/// Serialize a group to pretty-printed JSON
pub fn export_json(group: &ExtractedGroup) -> Result<String> {
    serde_json::to_string_pretty(group)
        .map_err(|e| ConvertError::serialization("Failed to serialize extracted group", Some(e)))
}

/// Write a group as JSON, replacing any existing file.
pub fn write_json(group: &ExtractedGroup, path: &Path) -> Result<()> {
    let json = export_json(group)?;
    fs::write(path, json).map_err(|e| ConvertError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemberRecord, StructureKind};

    fn group() -> ExtractedGroup {
        let mut structure = StructureRecord::new("Hk_t", StructureKind::TypedefStruct);
        structure.push_member(MemberRecord::new("uint8", "data").with_array_size("##N##"));

        ExtractedGroup {
            group: "HK".to_string(),
            kind: "telemetry".to_string(),
            inputs: vec!["hk.h".to_string()],
            macros: vec![MacroEntry::new("N", "2")],
            structures: vec![structure],
        }
    }

    #[test]
    fn test_export_json_fields() {
        let json = export_json(&group()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["group"], "HK");
        assert_eq!(value["macros"][0]["name"], "N");
        assert_eq!(value["structures"][0]["kind"], "TypedefStruct");
        assert_eq!(value["structures"][0]["members"][0]["array_size"], "##N##");
    }

    #[test]
    fn test_export_json_parses_back() {
        let original = group();
        let json = export_json(&original).unwrap();
        let parsed: ExtractedGroup = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, original);
    }
}
