//! Tagged CSV document assembly.
//!
//! Row layout of an assembled document:
//!
//! ```text
//! # header comment block
//!
//! _macros_
//! "NAME","VALUE"
//!
//! _name_type_
//! "Name","Structure"
//! _column_data_
//! "Data Type","Variable Name","Array Size","Bit Length","Description"
//! "dataType","variableName","arraySize","bitLength","description"
//! ```
//!
//! The macro section sits between the header and the first structure regardless
//! of when each macro was found.

use crate::error::{ConvertError, Result};
use crate::macros::MacroTable;
use crate::model::{MemberRecord, StructureRecord};
use std::fs;
use std::path::Path;

pub const MACROS_TAG: &str = "_macros_";
pub const NAME_TYPE_TAG: &str = "_name_type_";
pub const COLUMN_DATA_TAG: &str = "_column_data_";

/// Type column of every structure's name row
pub const STRUCTURE_TYPE: &str = "Structure";

/// Column names of the member rows
pub const MEMBER_COLUMNS: [&str; 5] = [
    "Data Type",
    "Variable Name",
    "Array Size",
    "Bit Length",
    "Description",
];

const TOOL_NAME: &str = "cstruct-csv";

/// Describes a conversion group in the document header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeader {
    /// Group name (application or subsystem)
    pub group: String,
    /// Kind descriptor, e.g. `telemetry`
    pub kind: String,
    /// Input files, as listed in the group
    pub inputs: Vec<String>,
}

impl DocumentHeader {
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
            inputs: Vec::new(),
        }
    }

    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    fn rows(&self) -> Vec<String> {
        let mut rows = vec![
            format!("# Created by {TOOL_NAME}"),
            String::new(),
            "# Structures extracted from:".to_string(),
        ];
        rows.extend(self.inputs.iter().map(|input| format!("#   {input}")));
        rows.extend([
            String::new(),
            format!("# {} {} data tables", self.group, self.kind),
            format!(
                "#   Use the CCDD Data | Import table(s) command to import the {}",
                self.group
            ),
            "#   data table definitions into an existing project".to_string(),
            String::new(),
        ]);
        rows
    }
}

/// Ordered output rows for one conversion group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputDocument {
    rows: Vec<String>,
}

impl OutputDocument {
    /// Build the document for a group. Trailing blank rows are removed.
    pub fn assemble(
        header: &DocumentHeader,
        macros: &MacroTable,
        structures: &[StructureRecord],
        always_emit_macros: bool,
    ) -> Self {
        let mut rows = header.rows();

        if always_emit_macros || !macros.is_empty() {
            rows.push(MACROS_TAG.to_string());
            rows.extend(
                macros
                    .entries()
                    .iter()
                    .map(|entry| csv_row(&[entry.name.as_str(), entry.value.as_str()])),
            );
            rows.push(String::new());
        }

        for structure in structures {
            rows.push(NAME_TYPE_TAG.to_string());
            rows.push(csv_row(&[structure.name.as_str(), STRUCTURE_TYPE]));
            rows.push(COLUMN_DATA_TAG.to_string());
            rows.push(csv_row(&MEMBER_COLUMNS));
            rows.extend(structure.members.iter().map(member_row));
            rows.push(String::new());
        }

        while rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }

        Self { rows }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Document text, one row per line
    pub fn render(&self) -> String {
        let mut text = String::with_capacity(self.rows.iter().map(|row| row.len() + 1).sum());
        for row in &self.rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    /// Write the document, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render()).map_err(|e| ConvertError::io(path, e))
    }
}

fn member_row(member: &MemberRecord) -> String {
    csv_row(&[
        member.data_type.as_str(),
        member.variable_name.as_str(),
        member.array_size.as_str(),
        member.bit_length.as_str(),
        member.description.as_str(),
    ])
}

/// Quote every field, doubling embedded quotes
fn csv_row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| format!("\"{}\"", escape_csv(field)))
        .collect::<Vec<_>>()
        .join(",")
}

fn escape_csv(field: &str) -> String {
    field.replace('"', "\"\"")
}
