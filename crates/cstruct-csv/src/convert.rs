//! Group conversion: read the inputs, scan, assemble and write the document.

use crate::config::ConversionConfig;
use crate::document::{DocumentHeader, OutputDocument};
use crate::error::{ConversionWarning, ConvertError, Result};
use crate::json::{write_json, ExtractedGroup};
use crate::macros::MacroTable;
use crate::model::StructureRecord;
use crate::paths::ConversionGroup;
use crate::scanner::{ScanResult, StructureScanner};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Result of converting one group
#[derive(Debug, Clone)]
pub struct Conversion {
    pub header: DocumentHeader,
    pub document: OutputDocument,
    pub structures: Vec<StructureRecord>,
    pub macros: MacroTable,
    pub warnings: Vec<ConversionWarning>,
}

impl Conversion {
    fn from_scan(header: DocumentHeader, scan: ScanResult, config: &ConversionConfig) -> Self {
        let document = OutputDocument::assemble(
            &header,
            &scan.macros,
            &scan.structures,
            config.always_emit_macro_section,
        );

        Self {
            header,
            document,
            structures: scan.structures,
            macros: scan.macros,
            warnings: scan.warnings,
        }
    }

    /// Serializable view of the extracted model
    pub fn to_extracted(&self) -> ExtractedGroup {
        ExtractedGroup {
            group: self.header.group.clone(),
            kind: self.header.kind.clone(),
            inputs: self.header.inputs.clone(),
            macros: self.macros.entries().to_vec(),
            structures: self.structures.clone(),
        }
    }
}

/// Convert in-memory sources given as `(label, content)` pairs.
///
/// Nothing is read from or written to disk.
pub fn convert_text(
    name: &str,
    kind: &str,
    sources: &[(&str, &str)],
    config: &ConversionConfig,
) -> Conversion {
    let mut scanner = StructureScanner::new(name, config);
    for (_, content) in sources {
        scanner.scan_source(content);
    }

    let header =
        DocumentHeader::new(name, kind).with_inputs(sources.iter().map(|(label, _)| *label));
    Conversion::from_scan(header, scanner.finish(), config)
}

/// Convert one group and write its output file.
///
/// Missing inputs are skipped with a warning. A read or write failure aborts the
/// group.
#[instrument(skip_all, fields(group = %group.name))]
pub fn convert_group(group: &ConversionGroup, config: &ConversionConfig) -> Result<Conversion> {
    let mut scanner = StructureScanner::new(&group.name, config);

    for input in &group.inputs {
        if !input.exists() {
            scanner.warn(ConversionWarning::MissingInput(input.clone()));
            continue;
        }

        let bytes = fs::read(input).map_err(|e| ConvertError::io(input, e))?;
        debug!(input = %input.display(), bytes = bytes.len(), "scanning input");
        scanner.scan_source(&String::from_utf8_lossy(&bytes));
    }

    let header = DocumentHeader::new(&group.name, &group.kind)
        .with_inputs(group.inputs.iter().map(|input| input.display().to_string()));
    let conversion = Conversion::from_scan(header, scanner.finish(), config);

    conversion.document.write_to(&group.output)?;
    if config.export_json {
        write_json(&conversion.to_extracted(), &json_path(&group.output))?;
    }

    info!(
        output = %group.output.display(),
        structures = conversion.structures.len(),
        macros = conversion.macros.len(),
        warnings = conversion.warnings.len(),
        "group converted"
    );
    Ok(conversion)
}

/// Convert every group, in parallel when configured. Results keep group order.
pub fn convert_all(groups: &[ConversionGroup], config: &ConversionConfig) -> Vec<Result<Conversion>> {
    if config.parallel {
        groups
            .par_iter()
            .map(|group| convert_group(group, config))
            .collect()
    } else {
        groups
            .iter()
            .map(|group| convert_group(group, config))
            .collect()
    }
}

/// JSON export path for an output file: `<output>.json`
pub fn json_path(output: &Path) -> PathBuf {
    let mut path = output.as_os_str().to_owned();
    path.push(".json");
    PathBuf::from(path)
}
