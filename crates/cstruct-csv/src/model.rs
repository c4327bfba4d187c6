//! Extracted structure, member, and macro records.

use serde::{Deserialize, Serialize};

/// How a structure was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    /// `struct Name { ... };`
    Struct,
    /// `typedef struct { ... } Name;`
    TypedefStruct,
}

/// One field within a structure
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Data type, with a ` *` suffix per pointer level
    pub data_type: String,

    /// Variable name, without pointer or array decoration
    pub variable_name: String,

    /// Comma-joined array dimensions, macro names bounded by the delimiter
    pub array_size: String,

    /// Bit-field length, macro names bounded by the delimiter
    pub bit_length: String,

    /// Text gathered from the member's comments
    pub description: String,
}

impl MemberRecord {
    pub fn new(data_type: impl Into<String>, variable_name: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            variable_name: variable_name.into(),
            ..Default::default()
        }
    }

    pub fn with_array_size(mut self, array_size: impl Into<String>) -> Self {
        self.array_size = array_size.into();
        self
    }

    pub fn with_bit_length(mut self, bit_length: impl Into<String>) -> Self {
        self.bit_length = bit_length.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append comment text to the description, separated by a single space
    pub fn append_description(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.description.is_empty() {
            self.description.push(' ');
        }
        self.description.push_str(text);
    }
}

/// The extracted representation of one `struct` / `typedef struct` declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRecord {
    /// Structure name
    pub name: String,

    /// Declaration form
    pub kind: StructureKind,

    /// Members in declaration order
    pub members: Vec<MemberRecord>,
}

impl StructureRecord {
    pub fn new(name: impl Into<String>, kind: StructureKind) -> Self {
        Self {
            name: name.into(),
            kind,
            members: Vec::new(),
        }
    }

    /// Check whether a member with this variable name was already added
    pub fn has_member(&self, variable_name: &str) -> bool {
        self.members
            .iter()
            .any(|member| member.variable_name == variable_name)
    }

    /// Add a member unless its variable name is already present.
    ///
    /// Returns the index of the new member, or `None` for a duplicate.
    pub fn push_member(&mut self, member: MemberRecord) -> Option<usize> {
        if self.has_member(&member.variable_name) {
            return None;
        }
        self.members.push(member);
        Some(self.members.len() - 1)
    }

    pub fn member(&self, variable_name: &str) -> Option<&MemberRecord> {
        self.members
            .iter()
            .find(|member| member.variable_name == variable_name)
    }
}

/// A named value referenced from an array size or bit length
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacroEntry {
    /// Macro name
    pub name: String,

    /// Placeholder value, real `#define` value, or rewritten formula
    pub value: String,
}

impl MacroEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
