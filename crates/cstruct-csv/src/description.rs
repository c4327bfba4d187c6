//! Comment text extraction for member descriptions
//!
//! Two comment styles are recognized:
//! - a run of `//` lines, ending at the first following line that doesn't start with `//`
//! - a `/* ... */` block, ending at the first line whose text ends with `*/`
//!
//! Delimiters, doxygen tags (`\brief`, `\par`, ...) and leading `*` continuation
//! markers are removed. Non-empty pieces are joined with single spaces.

use regex::Regex;
use std::sync::LazyLock;

// "/*", "/**", "/**<", "/*!<", "*/" and "\tag" doxygen escapes
static RE_BLOCK_DELIMITERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*+!?<?|\*+/|\\\S+\s*").unwrap());

/// Text of a comment and the line where it ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    /// Collected comment text
    pub text: String,
    /// Index of the last line consumed by the comment
    pub last_line: usize,
}

/// Extract the comment beginning on line `start`.
///
/// `opening` is the comment text found on the starting line; for a trailing
/// comment this is the text after the declaration. The scan never runs past the
/// end of `lines`; an unterminated block ends at the last line.
pub fn extract_description(lines: &[String], start: usize, opening: &str) -> Description {
    let opening = opening.trim();

    if opening.starts_with("//") {
        extract_line_comments(lines, start, opening)
    } else if opening.starts_with("/*") {
        extract_block_comment(lines, start, opening)
    } else {
        Description {
            text: opening.to_string(),
            last_line: start,
        }
    }
}

fn extract_line_comments(lines: &[String], start: usize, opening: &str) -> Description {
    let mut pieces = vec![strip_line_comment(opening)];
    let mut row = start;

    while let Some(next) = lines.get(row + 1).map(|line| line.trim()) {
        if !next.starts_with("//") {
            break;
        }
        row += 1;
        pieces.push(strip_line_comment(next));
    }

    Description {
        text: join_pieces(pieces),
        last_line: row,
    }
}

fn extract_block_comment(lines: &[String], start: usize, opening: &str) -> Description {
    let mut pieces = vec![strip_block_comment(opening)];
    let mut row = start;
    let mut closed = opening.ends_with("*/");

    while !closed && row + 1 < lines.len() {
        row += 1;
        let text = lines[row].trim();
        pieces.push(strip_block_comment(text));
        closed = text.ends_with("*/");
    }

    Description {
        text: join_pieces(pieces),
        last_line: row,
    }
}

fn strip_line_comment(text: &str) -> String {
    let body = text.trim_start_matches('/');
    let body = body
        .strip_prefix("!<")
        .or_else(|| body.strip_prefix('<'))
        .or_else(|| body.strip_prefix('!'))
        .unwrap_or(body);
    body.trim().to_string()
}

fn strip_block_comment(text: &str) -> String {
    let stripped = RE_BLOCK_DELIMITERS.replace_all(text, "");
    stripped.trim().trim_start_matches('*').trim().to_string()
}

fn join_pieces(pieces: Vec<String>) -> String {
    pieces
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|line| line.trim().to_string()).collect()
    }

    #[test]
    fn test_single_line_block() {
        let body = lines("int a; /**< Packet length */");
        let description = extract_description(&body, 0, "/**< Packet length */");

        assert_eq!(description.text, "Packet length");
        assert_eq!(description.last_line, 0);
    }

    #[test]
    fn test_multi_line_block_skips_empty_rows() {
        let body = lines(
            "/* First part\n\
             *\n\
             * second part\n\
             */\n\
             int next;",
        );
        let description = extract_description(&body, 0, &body[0]);

        assert_eq!(description.text, "First part second part");
        assert_eq!(description.last_line, 3);
    }

    #[test]
    fn test_doxygen_tags_removed() {
        let body = lines("/** \\brief Command counter */");
        let description = extract_description(&body, 0, &body[0]);

        assert_eq!(description.text, "Command counter");
    }

    #[test]
    fn test_line_comment_run() {
        let body = lines("// Number of\n//   valid entries\nint count;");
        let description = extract_description(&body, 0, &body[0]);

        assert_eq!(description.text, "Number of valid entries");
        assert_eq!(description.last_line, 1);
    }

    #[test]
    fn test_trailing_doxygen_line_comment() {
        let body = lines("uint8 mode; ///< Operating mode");
        let description = extract_description(&body, 0, "///< Operating mode");

        assert_eq!(description.text, "Operating mode");
    }

    #[test]
    fn test_unterminated_block_stops_at_end() {
        let body = lines("/* never closed\nstill comment");
        let description = extract_description(&body, 0, &body[0]);

        assert_eq!(description.text, "never closed still comment");
        assert_eq!(description.last_line, 1);
    }

    #[test]
    fn test_plain_trailing_text() {
        let body = lines("int a; spare");
        let description = extract_description(&body, 0, " spare ");

        assert_eq!(description.text, "spare");
        assert_eq!(description.last_line, 0);
    }
}
