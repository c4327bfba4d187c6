//! Conversion presets and the toggles they set.

use serde::{Deserialize, Serialize};

/// Source header family a preset is tuned for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Arbitrary C headers listed in a conversion paths file
    Generic,
    /// cFE/cFS message headers
    Cfs,
}

/// Configuration for conversion behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Join lines ending in a backslash with the following line
    pub join_continuations: bool,

    /// Replace formula array sizes with a generated `<GROUP>_CCDD_MACRO_<n>` macro
    pub synthesize_formula_macros: bool,

    /// Write the `_macros_` tag even when no macro was found
    pub always_emit_macro_section: bool,

    /// Warn about `typedef` lines that are not structure definitions
    pub warn_unhandled_typedefs: bool,

    /// Use `#define NAME VALUE` lines outside structures as macro values
    pub capture_defines: bool,

    /// Convert independent groups in parallel (for `convert_all`)
    pub parallel: bool,

    /// Also write the extracted model as JSON next to each output
    pub export_json: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self::generic()
    }
}

impl ConversionConfig {
    /// Configuration for arbitrary C headers
    pub fn generic() -> Self {
        Self {
            join_continuations: true,
            synthesize_formula_macros: false,
            always_emit_macro_section: false,
            warn_unhandled_typedefs: false,
            capture_defines: false,
            parallel: false,
            export_json: false,
        }
    }

    /// Configuration for cFE/cFS message headers
    pub fn cfs() -> Self {
        Self {
            join_continuations: false,
            synthesize_formula_macros: true,
            always_emit_macro_section: true,
            warn_unhandled_typedefs: true,
            ..Self::generic()
        }
    }

    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Generic => Self::generic(),
            Variant::Cfs => Self::cfs(),
        }
    }

    /// Enable `#define` value capture
    pub fn with_capture_defines(mut self, capture: bool) -> Self {
        self.capture_defines = capture;
        self
    }

    /// Enable parallel group conversion
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enable JSON export of the extracted model
    pub fn with_export_json(mut self, export: bool) -> Self {
        self.export_json = export;
        self
    }
}
