//! Macro detection in array sizes and bit lengths
//!
//! Every symbolic size is registered in a document-wide [`MacroTable`] and bounded
//! with [`MACRO_DELIMITER`] in the emitted field, so the importer can locate and
//! substitute macro values:
//!
//! ```text
//! MAX_ENTRIES        -> ##MAX_ENTRIES##
//! 4,NUM_CHANNELS     -> 4,##NUM_CHANNELS##
//! (HDR_LEN + 2) * N  -> (##HDR_LEN## + 2) * ##N##
//! ```

use crate::model::MacroEntry;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Characters bounding a macro name inside emitted fields
pub const MACRO_DELIMITER: &str = "##";

// TODO: warn when a formula built from placeholder values evaluates to an
// array size below 1, which the importer rejects
/// Value assigned to macros whose definition isn't known
pub const DEFAULT_MACRO_VALUE: &str = "2";

/// Infix between the group name and counter of generated formula macros
pub const FORMULA_MACRO_INFIX: &str = "_CCDD_MACRO_";

const FORMULA_OPERATORS: &[char] = &['+', '-', '*', '/', '(', ')'];

// Decimal or hexadecimal literal with optional integer suffixes
static RE_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:0[xX][0-9a-fA-F]+|[0-9]+)[uUlL]*$").unwrap());

// Identifier or number token within a formula
static RE_FORMULA_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9][A-Za-z0-9_]*|[A-Za-z_][A-Za-z0-9_]*").unwrap());

static RE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Wrap a macro name in the delimiter
pub fn bound(name: &str) -> String {
    format!("{MACRO_DELIMITER}{name}{MACRO_DELIMITER}")
}

/// Check whether a size component is a plain number
pub fn is_numeric(text: &str) -> bool {
    RE_NUMERIC.is_match(text)
}

/// Check whether text is a valid C identifier
pub fn is_identifier(text: &str) -> bool {
    RE_IDENTIFIER.is_match(text)
}

/// Ordered, deduplicated macro definitions for one document
#[derive(Debug, Default, Clone)]
pub struct MacroTable {
    entries: Vec<MacroEntry>,
    names: HashSet<String>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a macro. The first definition of a name wins.
    ///
    /// Returns `true` if the macro was added.
    pub fn register(&mut self, name: &str, value: &str) -> bool {
        if !self.names.insert(name.to_string()) {
            return false;
        }
        self.entries.push(MacroEntry::new(name, value));
        true
    }

    pub fn get(&self, name: &str) -> Option<&MacroEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Entries in first-registration order
    pub fn entries(&self) -> &[MacroEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every bounded macro name in `text` with its value, once.
    pub fn substitute(&self, text: &str) -> String {
        self.entries.iter().fold(text.to_string(), |acc, entry| {
            acc.replace(&bound(&entry.name), &entry.value)
        })
    }
}

/// A captured `#define`: its rewritten value and the identifiers it references
#[derive(Debug, Clone, PartialEq, Eq)]
struct Definition {
    value: String,
    referenced: Vec<String>,
}

/// Rewrites size expressions and collects the macros they reference
#[derive(Debug, Default)]
pub struct MacroExtractor {
    table: MacroTable,
    definitions: HashMap<String, Definition>,
    formula_prefix: Option<String>,
    formula_count: usize,
}

impl MacroExtractor {
    /// Extractor that keeps formulas inline
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor that replaces each formula with a generated macro named after `group`
    pub fn with_formula_macros(group: &str) -> Self {
        Self {
            formula_prefix: Some(group.trim().to_string()),
            ..Self::default()
        }
    }

    /// Rewrite a comma-separated size expression, registering its macros.
    pub fn extract(&mut self, expression: &str) -> String {
        expression
            .split(',')
            .map(|component| self.extract_component(component.trim()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Record a `#define NAME VALUE` definition. The first definition of a
    /// name wins.
    ///
    /// Nothing enters the table until a size expression references the name.
    /// The macro then takes this value, and the identifiers within the value
    /// are registered after it.
    pub fn define(&mut self, name: &str, value: &str) -> bool {
        if self.definitions.contains_key(name) {
            return false;
        }

        let value = value.trim();
        let (value, referenced) = if is_numeric(value) {
            (value.to_string(), Vec::new())
        } else {
            bound_identifiers(value)
        };
        self.definitions
            .insert(name.to_string(), Definition { value, referenced });
        true
    }

    pub fn table(&self) -> &MacroTable {
        &self.table
    }

    pub fn into_table(self) -> MacroTable {
        self.table
    }

    fn extract_component(&mut self, component: &str) -> String {
        if component.is_empty() || is_numeric(component) {
            return component.to_string();
        }

        if !component.contains(FORMULA_OPERATORS) {
            self.reference(component);
            return bound(component);
        }

        let (rewritten, referenced) = bound_identifiers(component);
        for name in &referenced {
            self.reference(name);
        }

        match &self.formula_prefix {
            Some(prefix) => {
                self.formula_count += 1;
                let name = format!("{prefix}{FORMULA_MACRO_INFIX}{}", self.formula_count);
                self.table.register(&name, &rewritten);
                bound(&name)
            }
            None => rewritten,
        }
    }

    /// Register a referenced macro with its captured value, or the placeholder
    fn reference(&mut self, name: &str) {
        let Some(definition) = self.definitions.get(name).cloned() else {
            self.table.register(name, DEFAULT_MACRO_VALUE);
            return;
        };

        if self.table.register(name, &definition.value) {
            for inner in &definition.referenced {
                self.reference(inner);
            }
        }
    }
}

/// Bound each identifier of a formula, returning the rewritten text and the
/// identifiers in order of appearance.
fn bound_identifiers(formula: &str) -> (String, Vec<String>) {
    let mut referenced = Vec::new();
    let rewritten = RE_FORMULA_TOKEN
        .replace_all(formula, |caps: &Captures| {
            let token = &caps[0];
            if token.starts_with(|c: char| c.is_ascii_digit()) || token == "sizeof" {
                token.to_string()
            } else {
                referenced.push(token.to_string());
                bound(token)
            }
        })
        .into_owned();
    (rewritten, referenced)
}
