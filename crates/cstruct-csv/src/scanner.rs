//! Structure scanning
//!
//! A line-driven state machine locates `struct` and `typedef struct` definitions,
//! hands each body to the member parser, and collects the resulting records. Only
//! one open structure is tracked at a time: a new opening line abandons the
//! current one, and the next closing brace belongs to the most recent opening.

use crate::config::ConversionConfig;
use crate::error::{ConversionWarning, Diagnostics};
use crate::macros::{is_identifier, MacroExtractor, MacroTable};
use crate::member::parse_members;
use crate::model::{StructureKind, StructureRecord};
use crate::normalize::normalize_lines;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

// `typedef struct`, optional tag, then an optional brace and nothing but a comment
static RE_TYPEDEF_STRUCT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^typedef\s+struct(?:\s+[A-Za-z_]\w*)?\s*\{?\s*(?:$|/[*/])").unwrap()
});

static RE_STRUCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^struct\b\s*([A-Za-z_]\w*)?").unwrap());

static RE_INLINE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:typedef\s+)?struct\b").unwrap());

// Closing brace and padding keyword or attribute ahead of a typedef name
static RE_CLOSING_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\}\s*(?:OS_PACK\s+|__attribute__\s*\(\(.*?\)\)\s*)?").unwrap()
});

static RE_CLOSING_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*;.*").unwrap());

/// State machine for the structure scan
#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState {
    /// Between structures
    Searching,
    /// Inside the body of a structure opened on `open_line`. `in_comment` is
    /// set while a `/* ... */` block spans the following lines.
    InStructure {
        kind: StructureKind,
        name: String,
        open_line: usize,
        in_comment: bool,
    },
}

/// Output of scanning every source of one group
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Structures in the order they closed
    pub structures: Vec<StructureRecord>,
    /// Macros referenced by the structures, in first-seen order
    pub macros: MacroTable,
    /// Warnings raised while scanning
    pub warnings: Vec<ConversionWarning>,
}

/// Scanner accumulating the structures and macros of one conversion group
pub struct StructureScanner {
    config: ConversionConfig,
    extractor: MacroExtractor,
    diagnostics: Diagnostics,
    structures: Vec<StructureRecord>,
}

impl StructureScanner {
    pub fn new(group: &str, config: &ConversionConfig) -> Self {
        let extractor = if config.synthesize_formula_macros {
            MacroExtractor::with_formula_macros(group)
        } else {
            MacroExtractor::new()
        };

        Self {
            config: config.clone(),
            extractor,
            diagnostics: Diagnostics::new(),
            structures: Vec::new(),
        }
    }

    /// Scan the raw content of one source file
    pub fn scan_source(&mut self, content: &str) {
        let lines = normalize_lines(content, self.config.join_continuations);
        self.scan_lines(&lines);
    }

    /// Scan logical lines of one source file. The scan state does not carry
    /// over between calls.
    pub fn scan_lines(&mut self, lines: &[String]) {
        let lines = split_inline_bodies(lines);
        let mut state = ScanState::Searching;
        let mut row = 0;

        while row < lines.len() {
            let line = lines[row].as_str();

            state = match state {
                ScanState::Searching => match structure_opening(line) {
                    Some((kind, name)) => ScanState::InStructure {
                        kind,
                        name,
                        open_line: row,
                        in_comment: block_comment_open_after(line, false),
                    },
                    None => {
                        row = self.searching_line(&lines, row);
                        ScanState::Searching
                    }
                },
                ScanState::InStructure {
                    kind,
                    name,
                    open_line,
                    in_comment: true,
                } => ScanState::InStructure {
                    kind,
                    name,
                    open_line,
                    in_comment: block_comment_open_after(line, true),
                },
                ScanState::InStructure {
                    kind,
                    name,
                    open_line,
                    in_comment: false,
                } => {
                    if line.starts_with('}') {
                        self.close_structure(&lines, kind, name, open_line, row);
                        ScanState::Searching
                    } else if let Some((new_kind, new_name)) =
                        structure_opening(line).filter(|_| opens_body(&lines, row))
                    {
                        debug!(
                            abandoned = %name,
                            line = open_line + 1,
                            "structure reopened before closing"
                        );
                        ScanState::InStructure {
                            kind: new_kind,
                            name: new_name,
                            open_line: row,
                            in_comment: block_comment_open_after(line, false),
                        }
                    } else {
                        ScanState::InStructure {
                            kind,
                            name,
                            open_line,
                            in_comment: block_comment_open_after(line, false),
                        }
                    }
                }
            };

            row += 1;
        }

        if let ScanState::InStructure {
            name, open_line, ..
        } = state
        {
            debug!(
                structure = %name,
                line = open_line + 1,
                "dropping structure without closing brace"
            );
        }
    }

    /// Record a warning raised outside the scan itself
    pub fn warn(&mut self, warning: ConversionWarning) {
        self.diagnostics.warn(warning);
    }

    pub fn structures(&self) -> &[StructureRecord] {
        &self.structures
    }

    pub fn finish(self) -> ScanResult {
        ScanResult {
            structures: self.structures,
            macros: self.extractor.into_table(),
            warnings: self.diagnostics.into_warnings(),
        }
    }

    /// Handle a line outside any structure, returning the last line consumed
    fn searching_line(&mut self, lines: &[String], row: usize) -> usize {
        let line = lines[row].as_str();

        if line.starts_with("/*") && !line.contains("*/") {
            return lines[row + 1..]
                .iter()
                .position(|next| next.contains("*/"))
                .map_or(lines.len() - 1, |offset| row + 1 + offset);
        }

        if is_typedef(line) && RE_INLINE_START.is_match(line) {
            debug!(text = line, "skipping struct typedef without a body");
        } else if is_typedef(line) {
            if self.config.warn_unhandled_typedefs {
                self.diagnostics
                    .warn(ConversionWarning::UnhandledDeclaration {
                        text: line.to_string(),
                    });
            }
        } else if self.config.capture_defines {
            self.capture_define(line);
        }

        row
    }

    fn capture_define(&mut self, line: &str) {
        let words: Vec<&str> = line.split_whitespace().collect();
        if let ["#define", name, value] = words.as_slice() {
            if is_identifier(name) && self.extractor.define(name, value) {
                debug!(name = *name, value = *value, "captured macro definition");
            }
        }
    }

    fn close_structure(
        &mut self,
        lines: &[String],
        kind: StructureKind,
        name: String,
        open_line: usize,
        row: usize,
    ) {
        let closing = lines[row].as_str();
        let name = match kind {
            StructureKind::Struct => name,
            StructureKind::TypedefStruct => typedef_name(closing),
        };

        if name.is_empty() {
            self.diagnostics
                .warn(ConversionWarning::MissingStructureName {
                    closing: closing.to_string(),
                });
            return;
        }

        let mut structure = StructureRecord::new(name, kind);
        parse_members(
            &lines[open_line + 1..row],
            &mut structure,
            &mut self.extractor,
            &mut self.diagnostics,
        );

        debug!(
            structure = %structure.name,
            members = structure.members.len(),
            "extracted structure"
        );
        self.structures.push(structure);
    }
}

/// Scan every source of a group in memory.
pub fn scan_sources<'s>(
    group: &str,
    sources: impl IntoIterator<Item = &'s str>,
    config: &ConversionConfig,
) -> ScanResult {
    let mut scanner = StructureScanner::new(group, config);
    for content in sources {
        scanner.scan_source(content);
    }
    scanner.finish()
}

/// Detect a structure opening line, returning its kind and name.
///
/// Typedef names are only known at the closing line, so they start out empty.
fn structure_opening(line: &str) -> Option<(StructureKind, String)> {
    if RE_TYPEDEF_STRUCT.is_match(line) {
        return Some((StructureKind::TypedefStruct, String::new()));
    }

    let code = code_part(line);
    if code.contains([';', '=', '(']) {
        return None;
    }

    RE_STRUCT.captures(code).map(|caps| {
        let name = caps.get(1).map_or("", |m| m.as_str());
        (StructureKind::Struct, name.to_string())
    })
}

/// Check whether a nested opening line starts a body: its code ends with `{`,
/// or the next line with code starts with one.
fn opens_body(lines: &[String], row: usize) -> bool {
    if code_part(&lines[row]).trim_end().ends_with('{') {
        return true;
    }

    lines[row + 1..]
        .iter()
        .map(|line| code_part(line).trim())
        .find(|code| !code.is_empty())
        .is_some_and(|code| code.starts_with('{'))
}

/// Whether a `/* ... */` block is still open at the end of `line`.
fn block_comment_open_after(line: &str, mut open: bool) -> bool {
    let mut rest = line;
    loop {
        if open {
            match rest.find("*/") {
                Some(end) => {
                    rest = &rest[end + 2..];
                    open = false;
                }
                None => return true,
            }
        } else {
            let line_comment = rest.find("//");
            match rest.find("/*") {
                Some(start) if line_comment.map_or(true, |at| start < at) => {
                    rest = &rest[start + 2..];
                    open = true;
                }
                _ => return false,
            }
        }
    }
}

fn is_typedef(line: &str) -> bool {
    line.strip_prefix("typedef")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Line text ahead of any comment
fn code_part(line: &str) -> &str {
    let end = [line.find("/*"), line.find("//")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..end]
}

/// Resolve the name of a typedef from its closing line: `} OS_PACK Name_t;`
fn typedef_name(closing: &str) -> String {
    let name = RE_CLOSING_PREFIX.replace(closing, "");
    let name = RE_CLOSING_SUFFIX.replace(&name, "");
    let name = name.split(',').next().unwrap_or_default().trim();

    if is_identifier(name) {
        name.to_string()
    } else {
        String::new()
    }
}

/// Break `struct S { int a; } T;` style lines into opening, body and closing
/// lines so the state machine sees each part separately.
fn split_inline_bodies(lines: &[String]) -> Vec<String> {
    let mut split = Vec::with_capacity(lines.len());

    for line in lines {
        match inline_body(line) {
            Some((head, body, tail)) => {
                split.push(head.to_string());
                if !body.is_empty() {
                    split.push(body.to_string());
                }
                if let Some(tail) = tail {
                    split.push(tail.to_string());
                }
            }
            None => split.push(line.clone()),
        }
    }

    split
}

fn inline_body(line: &str) -> Option<(&str, &str, Option<&str>)> {
    if !RE_INLINE_START.is_match(line) {
        return None;
    }

    let open = line.find('{')?;
    let head = line[..=open].trim();
    let after = line[open + 1..].trim();
    if head.contains('=') || after.is_empty() || after.starts_with("/*") || after.starts_with("//")
    {
        return None;
    }

    match after.rfind('}') {
        Some(close) => Some((head, after[..close].trim(), Some(after[close..].trim()))),
        None => Some((head, after, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str, config: &ConversionConfig) -> ScanResult {
        scan_sources("TEST", [source], config)
    }

    fn names(result: &ScanResult) -> Vec<&str> {
        result.structures.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_plain_struct() {
        let result = scan("struct A {\n  int a;\n  char b[4];\n};", &ConversionConfig::generic());

        assert_eq!(names(&result), vec!["A"]);
        let structure = &result.structures[0];
        assert_eq!(structure.kind, StructureKind::Struct);
        assert_eq!(structure.members.len(), 2);
        assert_eq!(structure.members[1].array_size, "4");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_typedef_name_from_closing_line() {
        let source = "typedef struct\n{\n  uint8 x;\n} OS_PACK Hk_Tlm_t;\n\
                      typedef struct tag {\n  uint8 y;\n} Other_t, *OtherPtr_t;";
        let result = scan(source, &ConversionConfig::generic());

        assert_eq!(names(&result), vec!["Hk_Tlm_t", "Other_t"]);
        assert_eq!(result.structures[0].kind, StructureKind::TypedefStruct);
    }

    #[test]
    fn test_typedef_with_attribute() {
        let source = "typedef struct {\nint a;\n} __attribute__((packed)) Packed_t;";
        let result = scan(source, &ConversionConfig::generic());

        assert_eq!(names(&result), vec!["Packed_t"]);
    }

    #[test]
    fn test_typedef_missing_name_discarded() {
        let source = "typedef struct {\nint a;\n};\nstruct B {\nint b;\n};";
        let result = scan(source, &ConversionConfig::generic());

        assert_eq!(names(&result), vec!["B"]);
        assert_eq!(
            result.warnings,
            vec![ConversionWarning::MissingStructureName {
                closing: "};".to_string()
            }]
        );
    }

    #[test]
    fn test_struct_member_is_not_an_opening() {
        let source = "struct Outer {\nstruct Inner inner;\nint x;\n};";
        let result = scan(source, &ConversionConfig::generic());

        assert_eq!(names(&result), vec!["Outer"]);
        let members = &result.structures[0].members;
        assert_eq!(members[0].data_type, "struct Inner");
        assert_eq!(members[0].variable_name, "inner");
        assert_eq!(members[1].variable_name, "x");
    }

    #[test]
    fn test_reopening_abandons_outer_structure() {
        let source = "struct Outer {\nint a;\nstruct Inner {\nint b;\n};\nint c;\n};";
        let result = scan(source, &ConversionConfig::generic());

        assert_eq!(names(&result), vec!["Inner"]);
        assert_eq!(result.structures[0].members.len(), 1);
    }

    #[test]
    fn test_unterminated_structure_dropped() {
        let result = scan("struct A {\nint a;\n", &ConversionConfig::generic());

        assert!(result.structures.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_single_line_definitions() {
        let source = "struct Point { int x; int y; };\ntypedef struct { uint8 id; } Tag_t;";
        let result = scan(source, &ConversionConfig::generic());

        assert_eq!(names(&result), vec!["Point", "Tag_t"]);
        assert_eq!(result.structures[0].members.len(), 2);
        assert_eq!(result.structures[1].members[0].variable_name, "id");
    }

    #[test]
    fn test_forward_declarations_ignored() {
        let source = "struct A;\nstruct A *make_a(void);\nstruct A instance = { 0 };";
        let result = scan(source, &ConversionConfig::generic());

        assert!(result.structures.is_empty());
    }

    #[test]
    fn test_unhandled_typedef_warning_per_variant() {
        let source = "typedef int count_t;\ntypedef struct {\nint a;\n} A_t;";

        let generic = scan(source, &ConversionConfig::generic());
        assert!(generic.warnings.is_empty());

        let cfs = scan(source, &ConversionConfig::cfs());
        assert_eq!(names(&cfs), vec!["A_t"]);
        assert_eq!(
            cfs.warnings,
            vec![ConversionWarning::UnhandledDeclaration {
                text: "typedef int count_t;".to_string()
            }]
        );
    }

    #[test]
    fn test_block_comment_hides_markers() {
        let source = "/* Example:\nstruct Hidden {\nint a;\n};\n*/\nstruct Shown {\nint b;\n};";
        let result = scan(source, &ConversionConfig::generic());

        assert_eq!(names(&result), vec!["Shown"]);
    }

    #[test]
    fn test_capture_defines() {
        let source = "#define MAX_LEN 16\n#define MACRO(x) (x)\nstruct A {\nchar s[MAX_LEN];\nint t[OTHER];\n};";
        let config = ConversionConfig::generic().with_capture_defines(true);
        let result = scan(source, &config);

        let values: Vec<(&str, &str)> = result
            .macros
            .entries()
            .iter()
            .map(|e| (e.name.as_str(), e.value.as_str()))
            .collect();
        assert_eq!(values, vec![("MAX_LEN", "16"), ("OTHER", "2")]);
    }

    #[test]
    fn test_defines_ignored_by_default() {
        let source = "#define MAX_LEN 16\nstruct A {\nchar s[MAX_LEN];\n};";
        let result = scan(source, &ConversionConfig::generic());

        assert_eq!(result.macros.get("MAX_LEN").unwrap().value, "2");
    }

    #[test]
    fn test_macro_table_shared_across_sources() {
        let result = scan_sources(
            "TEST",
            ["struct A {\nint a[N];\n};", "struct B {\nint b[N];\nint c[M];\n};"],
            &ConversionConfig::generic(),
        );

        assert_eq!(names(&result), vec!["A", "B"]);
        assert_eq!(result.macros.len(), 2);
    }

    #[test]
    fn test_formula_macros_named_after_group() {
        let result = scan_sources(
            "HK",
            ["struct A {\nint a[N + 1];\n};"],
            &ConversionConfig::cfs(),
        );

        assert_eq!(result.structures[0].members[0].array_size, "##HK_CCDD_MACRO_1##");
        assert!(result.macros.contains("HK_CCDD_MACRO_1"));
    }

    #[test]
    fn test_comment_continuation_inside_body() {
        let source = "struct A {\n int a; /* the enclosing\n struct member count */\n int b;\n};";
        let result = scan(source, &ConversionConfig::generic());

        assert_eq!(names(&result), vec!["A"]);
        let members = &result.structures[0].members;
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].variable_name, "a");
        assert_eq!(members[0].description, "the enclosing struct member count");
        assert_eq!(members[1].variable_name, "b");
    }

    #[test]
    fn test_struct_type_on_its_own_line() {
        let source = "struct Outer {\n int first;\n struct Inner\n inner;\n int last;\n};";
        let result = scan(source, &ConversionConfig::generic());

        assert_eq!(names(&result), vec!["Outer"]);
        let members = &result.structures[0].members;
        let variables: Vec<&str> = members.iter().map(|m| m.variable_name.as_str()).collect();
        assert_eq!(variables, vec!["first", "inner", "last"]);
        assert_eq!(members[1].data_type, "struct Inner");
    }

    #[test]
    fn test_nested_opening_with_brace_on_next_line() {
        let source = "struct Outer {\nint a;\nstruct Inner\n/* inner body */\n{\nint b;\n};";
        let result = scan(source, &ConversionConfig::generic());

        assert_eq!(names(&result), vec!["Inner"]);
        assert_eq!(result.structures[0].members[0].variable_name, "b");
    }

    #[test]
    fn test_struct_typedef_alias_not_warned() {
        let source = "typedef struct Foo Foo_t;\ntypedef struct {\nint a;\n} A_t;";
        let result = scan(source, &ConversionConfig::cfs());

        assert_eq!(names(&result), vec!["A_t"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unreferenced_define_not_in_table() {
        let source = "#define APP_VERSION 3\n#define N 4\nstruct A {\nint a[N];\n};";
        let config = ConversionConfig::generic().with_capture_defines(true);
        let result = scan(source, &config);

        assert!(!result.macros.contains("APP_VERSION"));
        assert_eq!(result.macros.len(), 1);
        assert_eq!(result.macros.get("N").unwrap().value, "4");
    }

    #[test]
    fn test_block_comment_state() {
        assert!(block_comment_open_after("int a; /* open", false));
        assert!(!block_comment_open_after("int a; /* closed */", false));
        assert!(!block_comment_open_after("still */ int b;", true));
        assert!(block_comment_open_after("no end here", true));
        assert!(!block_comment_open_after("int c; // /* not a block", false));
    }

    #[test]
    fn test_typedef_name_parsing() {
        assert_eq!(typedef_name("} Name_t;"), "Name_t");
        assert_eq!(typedef_name("}OS_PACK Name_t ; /* x */"), "Name_t");
        assert_eq!(typedef_name("};"), "");
        assert_eq!(typedef_name("}"), "");
    }
}
