//! Spec page extraction.

pub mod extractor;
pub mod rules;

pub use extractor::{parse_spec_page, validate_url, Extractor, SpecRecord};
pub use rules::{Clean, Field, FieldRule, RowMatch, RULES};
