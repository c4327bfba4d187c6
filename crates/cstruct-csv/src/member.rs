//! Structure member parsing
//!
//! Consumes the body lines of one structure (everything between the opening and
//! closing lines) and appends a [`MemberRecord`] per declared variable.
//!
//! Handled forms:
//!
//! ```text
//! uint16 count;                      simple member
//! uint8  data[HDR_LEN + 4];          array, size run through the macro extractor
//! uint32 flag : 1;                   bit-field
//! char   *name, tag[2][8];           several variables sharing one type
//! unsigned long                      type on one line,
//!     low, high;  // range           variables on the next
//! ```

use crate::description::extract_description;
use crate::error::{ConversionWarning, Diagnostics};
use crate::macros::MacroExtractor;
use crate::model::{MemberRecord, StructureRecord};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Prefix for descriptions of members declared between `#if` and `#endif`
pub const COMPILER_MACRO_NOTE: &str = "(WITHIN COMPILER MACRO)";

static RE_DECORATION_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*([\[\]:,])\s*").unwrap());

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static RE_DIMENSION_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\]\s*\[").unwrap());

/// Parsing state carried from one body line to the next
#[derive(Debug, Default, Clone)]
pub struct MemberContext {
    /// Data type of the most recent declaration
    data_type: String,
    /// The previous line had no terminator, so this line continues its data type
    continue_data_type: bool,
    /// Inside a conditional compilation block
    within_compiler_macro: bool,
    /// Description from a type-only line, applied to the variables that follow
    carried_description: String,
    /// Index of the most recently emitted member
    last_member: Option<usize>,
}

/// A declaration line split at its terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeclarationSplit<'t> {
    declaration: &'t str,
    terminated: bool,
    trailing: Option<&'t str>,
}

/// Parser for the body of one structure
pub struct MemberParser<'a> {
    body: &'a [String],
    structure: &'a mut StructureRecord,
    macros: &'a mut MacroExtractor,
    diagnostics: &'a mut Diagnostics,
    context: MemberContext,
}

impl<'a> MemberParser<'a> {
    pub fn new(
        body: &'a [String],
        structure: &'a mut StructureRecord,
        macros: &'a mut MacroExtractor,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            body,
            structure,
            macros,
            diagnostics,
            context: MemberContext::default(),
        }
    }

    /// Parse every body line, appending members to the structure
    pub fn parse(mut self) {
        let mut row = 0;
        while row < self.body.len() {
            row = self.parse_line(row) + 1;
        }
    }

    /// Parse the line at `row`, returning the index of the last line consumed
    fn parse_line(&mut self, row: usize) -> usize {
        let body = self.body;
        let line = body[row].as_str();

        if line.starts_with("#if") {
            self.context.within_compiler_macro = true;
        } else if line.starts_with("#endif") {
            self.context.within_compiler_macro = false;
        }

        if line.starts_with("/*") || line.starts_with("//") {
            let description = extract_description(body, row, line);
            if let Some(member) = self
                .context
                .last_member
                .and_then(|index| self.structure.members.get_mut(index))
            {
                member.append_description(&description.text);
            }
            return description.last_line;
        }

        if is_skippable(line) {
            return row;
        }

        self.parse_declaration(row, line)
    }

    fn parse_declaration(&mut self, row: usize, text: &'a str) -> usize {
        let split = split_declaration(text);
        let declaration = normalize_declaration(split.declaration);
        let continued = self.context.continue_data_type;
        self.context.continue_data_type = !split.terminated;

        let (comment, rest) = match split.trailing {
            Some(trailing) if split.terminated && !is_comment(trailing) => (None, Some(trailing)),
            trailing => (trailing, None),
        };

        let mut last_line = row;
        let mut comment_text = String::new();
        if let Some(comment) = comment {
            let description = extract_description(self.body, row, comment);
            last_line = description.last_line;
            comment_text = description.text;
        }

        if declaration.is_empty() {
            return last_line;
        }

        // A type with its variables on the following line(s)
        if !split.terminated && !continued && !declaration.contains(',') {
            self.context.data_type = declaration;
            self.context.carried_description = comment_text;
            return last_line;
        }

        let (data_type, names) = if continued {
            (self.context.data_type.clone(), declaration.as_str())
        } else {
            match type_boundary(&declaration) {
                Some(boundary) => (
                    declaration[..boundary].trim().to_string(),
                    &declaration[boundary + 1..],
                ),
                None => {
                    self.diagnostics
                        .warn(ConversionWarning::InvalidMemberDefinition {
                            structure: self.structure.name.clone(),
                            text: text.to_string(),
                        });
                    return last_line;
                }
            }
        };
        self.context.data_type = data_type.clone();

        let mut description = String::new();
        if self.context.within_compiler_macro {
            description.push_str(COMPILER_MACRO_NOTE);
        }
        let carried = std::mem::take(&mut self.context.carried_description);
        for piece in [carried.as_str(), comment_text.as_str()] {
            if !piece.is_empty() {
                if !description.is_empty() {
                    description.push(' ');
                }
                description.push_str(piece);
            }
        }

        for token in names.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            self.add_variable(&data_type, token, &description, text);
        }

        match rest {
            Some(rest) => self.parse_declaration(row, rest).max(last_line),
            None => last_line,
        }
    }

    fn add_variable(&mut self, data_type: &str, token: &str, description: &str, line: &str) {
        let (name_part, dimensions, bits) = split_variable(token);
        let pointer_depth = name_part.len() - name_part.trim_start_matches('*').len();
        let name = name_part.trim_start_matches('*').trim();

        if name.is_empty() {
            self.diagnostics
                .warn(ConversionWarning::InvalidMemberDefinition {
                    structure: self.structure.name.clone(),
                    text: line.to_string(),
                });
            return;
        }

        if self.structure.has_member(name) {
            debug!(
                structure = %self.structure.name,
                variable = name,
                "dropping duplicate member"
            );
            return;
        }

        let array_size = dimensions
            .map(|dims| self.macros.extract(&dimension_list(dims)))
            .unwrap_or_default();
        let bit_length = bits
            .map(|bits| self.macros.extract(bits))
            .unwrap_or_default();

        let data_type = if pointer_depth > 0 {
            format!("{data_type} {}", "*".repeat(pointer_depth))
        } else {
            data_type.to_string()
        };

        let member = MemberRecord::new(data_type, name)
            .with_array_size(array_size)
            .with_bit_length(bit_length)
            .with_description(description);

        if let Some(index) = self.structure.push_member(member) {
            self.context.last_member = Some(index);
        }
    }
}

/// Parse the body lines of `structure`.
pub fn parse_members(
    body: &[String],
    structure: &mut StructureRecord,
    macros: &mut MacroExtractor,
    diagnostics: &mut Diagnostics,
) {
    MemberParser::new(body, structure, macros, diagnostics).parse();
}

/// Lines inside a structure body that never declare a member
fn is_skippable(line: &str) -> bool {
    line.is_empty()
        || line.starts_with('{')
        || line.starts_with("**")
        || line.starts_with("*/")
        || line.starts_with('#')
        || line.starts_with('\\')
        || line.ends_with('{')
}

fn is_comment(text: &str) -> bool {
    text.starts_with("/*") || text.starts_with("//")
}

/// Split at the first `;` not preceded by a comment opener on the same line.
fn split_declaration(text: &str) -> DeclarationSplit<'_> {
    if let Some(semicolon) = text.find(';') {
        let before = &text[..semicolon];
        if !before.contains("/*") && !before.contains("//") {
            let after = text[semicolon + 1..].trim();
            return DeclarationSplit {
                declaration: before,
                terminated: true,
                trailing: (!after.is_empty()).then_some(after),
            };
        }
    }

    let comment_start = [text.find("/*"), text.find("//")]
        .into_iter()
        .flatten()
        .min();

    match comment_start {
        Some(start) => DeclarationSplit {
            declaration: &text[..start],
            terminated: false,
            trailing: Some(&text[start..]),
        },
        None => DeclarationSplit {
            declaration: text,
            terminated: false,
            trailing: None,
        },
    }
}

/// Remove spacing around array, bit-field and list punctuation and collapse
/// remaining whitespace runs.
fn normalize_declaration(declaration: &str) -> String {
    let tightened = RE_DECORATION_SPACING.replace_all(declaration.trim(), "$1");
    RE_WHITESPACE.replace_all(&tightened, " ").into_owned()
}

/// Index of the space separating the data type from the variable list.
///
/// This is the last space before the first comma, moved in front of the first
/// `[` or `:` when that comes earlier, since sizes may contain spaces.
fn type_boundary(declaration: &str) -> Option<usize> {
    let head = declaration.split(',').next().unwrap_or(declaration);
    let boundary = head.rfind(' ')?;

    match declaration.find(|c: char| c == '[' || c == ':') {
        Some(decoration) if decoration < boundary => declaration[..decoration].rfind(' '),
        _ => Some(boundary),
    }
}

/// Split a variable token into its name, bracket groups, and bit length.
fn split_variable(token: &str) -> (&str, Option<&str>, Option<&str>) {
    if let Some(open) = token.find('[') {
        (&token[..open], Some(&token[open..]), None)
    } else if let Some(colon) = token.find(':') {
        (&token[..colon], None, Some(token[colon + 1..].trim()))
    } else {
        (token, None, None)
    }
}

/// `[4][N]` -> `4,N`
fn dimension_list(dimensions: &str) -> String {
    RE_DIMENSION_BREAK
        .replace_all(dimensions, ",")
        .chars()
        .filter(|c| !matches!(c, '[' | ']'))
        .collect()
}
