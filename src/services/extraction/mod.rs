//! Structured-output extraction: asks a completion model for JSON matching an
//! [`OutputShape`], repairing and validating the reply and retrying with the
//! failure reason until the shape is satisfied or attempts run out.

pub mod extractor;
pub mod repair;
pub mod shape;

pub use extractor::{
    build_system_instruction, validate_output, ExtractOptions, Extracted, StructuredExtractor,
    UserPrompts,
};
pub use repair::repair_and_parse;
pub use shape::{Field, OutputShape};
