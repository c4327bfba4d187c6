//! # cstruct-csv
//!
//! Extracts C `struct` and `typedef struct` definitions from header files and
//! writes them as tagged CSV data tables, together with the size macros the
//! members reference.
//!
//! ## Features
//!
//! - Plain structures and typedefs, including `OS_PACK` / attribute padding keywords
//! - Multi-variable declarations, pointers, arrays and bit-fields
//! - Member descriptions from trailing `//` and `/* */` comments
//! - Members inside `#if` blocks flagged as compiler-macro dependent
//! - Symbolic array sizes collected into one macro table per document
//! - **cFS preset** that replaces formula sizes with generated macros
//!
//! ## Quick Start
//!
//! ```rust
//! use cstruct_csv::{convert_text, ConversionConfig};
//!
//! let source = r#"
//! struct Packet {
//!     uint16 length;              /* Payload length */
//!     uint8  payload[MAX_PAYLOAD];
//! };
//! "#;
//!
//! let conversion = convert_text(
//!     "APP",
//!     "telemetry",
//!     &[("app_msg.h", source)],
//!     &ConversionConfig::generic(),
//! );
//!
//! assert_eq!(conversion.structures[0].members.len(), 2);
//! assert!(conversion.macros.contains("MAX_PAYLOAD"));
//! print!("{}", conversion.document.render());
//! ```
//!
//! ## Conversion Groups
//!
//! ```rust,no_run
//! use cstruct_csv::{convert_all, load_conversion_paths, ConversionConfig};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let groups = load_conversion_paths(Path::new("conversion_paths"), Path::new("out"))?;
//! for result in convert_all(&groups, &ConversionConfig::cfs().with_parallel(true)) {
//!     let conversion = result?;
//!     println!("{}: {} structures", conversion.header.group, conversion.structures.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod convert;
pub mod description;
pub mod document;
pub mod error;
pub mod json;
pub mod macros;
pub mod member;
pub mod model;
pub mod normalize;
pub mod paths;
pub mod scanner;

pub use config::{ConversionConfig, Variant};
pub use convert::{convert_all, convert_group, convert_text, Conversion};
pub use document::{DocumentHeader, OutputDocument};
pub use error::{ConversionWarning, ConvertError, Diagnostics, Result};
pub use json::{export_json, ExtractedGroup};
pub use macros::{MacroExtractor, MacroTable};
pub use model::{MacroEntry, MemberRecord, StructureKind, StructureRecord};
pub use paths::{load_conversion_paths, parse_conversion_paths, ConversionGroup};
pub use scanner::{scan_sources, ScanResult, StructureScanner};
