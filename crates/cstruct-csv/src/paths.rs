//! Conversion paths file parsing
//!
//! Each non-comment line describes one conversion group:
//!
//! ```text
//! # name, kind, output file, input files...
//! HK, telemetry, hk_tlm.csv, fsw/src/hk_msg.h, fsw/src/hk_tbl.h
//! ```

use crate::error::{ConvertError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default name of the conversion paths file
pub const DEFAULT_PATHS_FILE: &str = "conversion_paths";

const MIN_FIELDS: usize = 4;

/// One set of input files converted into one output document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionGroup {
    /// Group name, used in the header and for generated macro names
    pub name: String,
    /// Kind descriptor, e.g. `telemetry` or `command`
    pub kind: String,
    /// Output file path
    pub output: PathBuf,
    /// Input files in scan order
    pub inputs: Vec<PathBuf>,
}

impl ConversionGroup {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            output: output.into(),
            inputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.inputs.push(input.into());
        self
    }

    pub fn with_inputs<I, P>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }
}

/// Parse conversion paths content.
///
/// Output paths are resolved against `output_dir`; `source` only names the file
/// in error messages.
pub fn parse_conversion_paths(
    content: &str,
    source: &Path,
    output_dir: &Path,
) -> Result<Vec<ConversionGroup>> {
    let mut groups = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < MIN_FIELDS {
            return Err(ConvertError::Config {
                path: source.to_path_buf(),
                line: index + 1,
                message: format!(
                    "expected at least {MIN_FIELDS} fields (name, kind, output, input), found {}",
                    fields.len()
                ),
            });
        }

        if let Some(position) = fields.iter().position(|field| field.is_empty()) {
            return Err(ConvertError::Config {
                path: source.to_path_buf(),
                line: index + 1,
                message: format!("field {} is empty", position + 1),
            });
        }

        groups.push(
            ConversionGroup::new(fields[0], fields[1], output_dir.join(fields[2]))
                .with_inputs(fields[3..].iter().copied()),
        );
    }

    Ok(groups)
}

/// Read and parse a conversion paths file.
pub fn load_conversion_paths(path: &Path, output_dir: &Path) -> Result<Vec<ConversionGroup>> {
    let content = fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    parse_conversion_paths(&content, path, output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_groups() {
        let content = "# comment\n\nHK, telemetry, hk.csv, a.h, b.h\nCMD,command,cmd.csv,c.h\n";
        let groups =
            parse_conversion_paths(content, Path::new("conversion_paths"), Path::new("out")).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[0],
            ConversionGroup::new("HK", "telemetry", "out/hk.csv").with_inputs(["a.h", "b.h"])
        );
        assert_eq!(groups[1].inputs, vec![PathBuf::from("c.h")]);
    }

    #[test]
    fn test_too_few_fields_names_line() {
        let content = "HK, telemetry, hk.csv, a.h\n\nbroken, line\n";
        let err = parse_conversion_paths(content, Path::new("paths"), Path::new("")).unwrap_err();

        match err {
            ConvertError::Config { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_field_rejected() {
        let err = parse_conversion_paths("HK, , hk.csv, a.h", Path::new("paths"), Path::new(""))
            .unwrap_err();

        assert!(err.to_string().contains("field 2 is empty"));
    }

    #[test]
    fn test_missing_paths_file() {
        let err = load_conversion_paths(Path::new("/nonexistent/conversion_paths"), Path::new(""))
            .unwrap_err();

        assert!(matches!(err, ConvertError::Io { .. }));
    }
}
