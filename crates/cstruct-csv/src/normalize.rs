//! Physical to logical line conversion
//!
//! Every line is trimmed. When continuation joining is enabled, a line ending in
//! a backslash loses the marker and the next line is appended to it directly.

const CONTINUATION_MARKER: char = '\\';

/// Convert raw file content into trimmed logical lines.
pub fn normalize_lines(content: &str, join_continuations: bool) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut continue_line = false;

    for physical in content.lines() {
        let trimmed = physical.trim();

        let joined = match lines.last_mut() {
            Some(previous) if continue_line => {
                previous.pop();
                previous.push_str(trimmed);
                true
            }
            _ => false,
        };
        if !joined {
            lines.push(trimmed.to_string());
        }

        continue_line = join_continuations
            && lines
                .last()
                .is_some_and(|line| line.ends_with(CONTINUATION_MARKER));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(normalize_lines("", true).is_empty());
        assert!(normalize_lines("", false).is_empty());
    }

    #[test]
    fn test_trims_lines() {
        let lines = normalize_lines("  struct A\t\n{  \n\tint a;\n};", true);
        assert_eq!(lines, vec!["struct A", "{", "int a;", "};"]);
    }

    #[test]
    fn test_joins_continued_lines() {
        let source = "#define SIZE \\\n  (4 + \\\n  BASE)\nint x;";
        let lines = normalize_lines(source, true);

        assert_eq!(lines, vec!["#define SIZE (4 + BASE)", "int x;"]);
    }

    #[test]
    fn test_join_disabled_keeps_markers() {
        let source = "#define SIZE \\\n  4";
        let lines = normalize_lines(source, false);

        assert_eq!(lines, vec!["#define SIZE \\", "4"]);
    }

    #[test]
    fn test_trailing_continuation_at_eof() {
        let lines = normalize_lines("int a; \\", true);
        assert_eq!(lines, vec!["int a; \\"]);
    }

    #[test]
    fn test_crlf_input() {
        let lines = normalize_lines("int a;\r\nint b;\r\n", true);
        assert_eq!(lines, vec!["int a;", "int b;"]);
    }
}
