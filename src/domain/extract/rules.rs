//! Declarative extraction table: which section/row of a spec page feeds which field,
//! and how the raw cell text is cleaned.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The eleven fields an extraction yields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Model,
    ReleaseDate,
    Dimensions,
    Weight,
    DisplaySize,
    Os,
    Chipset,
    InternalMemory,
    MainCamera,
    SelfieCamera,
    Battery,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::Model,
        Field::ReleaseDate,
        Field::Dimensions,
        Field::Weight,
        Field::DisplaySize,
        Field::Os,
        Field::Chipset,
        Field::InternalMemory,
        Field::MainCamera,
        Field::SelfieCamera,
        Field::Battery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Model => "model",
            Field::ReleaseDate => "release_date",
            Field::Dimensions => "dimensions",
            Field::Weight => "weight",
            Field::DisplaySize => "display_size",
            Field::Os => "os",
            Field::Chipset => "chipset",
            Field::InternalMemory => "internal_memory",
            Field::MainCamera => "main_camera",
            Field::SelfieCamera => "selfie_camera",
            Field::Battery => "battery",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which row of a section holds the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMatch {
    /// The row whose label cell contains this keyword (case-insensitive).
    Label(&'static str),
    /// The first row that has a value cell.
    First,
}

/// Field-specific truncation applied to the raw cell text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clean {
    /// Whitespace collapsed, nothing removed.
    AsIs,
    /// Keep everything up to and including the first occurrence of the marker.
    KeepThrough(&'static str),
    /// Drop everything from the first occurrence of the marker.
    CutAt(&'static str),
    /// Keep the text after the marker; the whole text when the marker is absent.
    After(&'static str),
    /// Keep line structure, collapsing whitespace inside each line.
    Lines,
}

impl Clean {
    /// Returns `None` when nothing is left after cleaning.
    pub fn apply(&self, raw: &str) -> Option<String> {
        let cleaned = match self {
            Clean::Lines => raw
                .lines()
                .map(collapse_whitespace)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            other => {
                let text = collapse_whitespace(raw);
                match other {
                    Clean::KeepThrough(marker) => match text.find(marker) {
                        Some(idx) => text[..idx + marker.len()].trim().to_string(),
                        None => text,
                    },
                    Clean::CutAt(marker) => match text.find(marker) {
                        Some(idx) => text[..idx].trim().to_string(),
                        None => text,
                    },
                    Clean::After(marker) => match text.find(marker) {
                        Some(idx) => text[idx + marker.len()..].trim().to_string(),
                        None => text,
                    },
                    Clean::AsIs | Clean::Lines => text,
                }
            }
        };
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}

/// One entry of the extraction table.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    /// Keyword searched in the section header cell of a spec table.
    pub section: &'static str,
    pub row: RowMatch,
    pub clean: Clean,
}

/// Every table-backed field. The model name comes from the page title instead.
pub const RULES: &[FieldRule] = &[
    FieldRule {
        field: Field::ReleaseDate,
        section: "Launch",
        row: RowMatch::Label("Status"),
        clean: Clean::After("Released "),
    },
    FieldRule {
        field: Field::Dimensions,
        section: "Body",
        row: RowMatch::Label("Dimensions"),
        clean: Clean::KeepThrough("mm"),
    },
    FieldRule {
        field: Field::Weight,
        section: "Body",
        row: RowMatch::Label("Weight"),
        clean: Clean::KeepThrough("g"),
    },
    FieldRule {
        field: Field::DisplaySize,
        section: "Display",
        row: RowMatch::Label("Size"),
        clean: Clean::CutAt(","),
    },
    FieldRule {
        field: Field::Os,
        section: "Platform",
        row: RowMatch::Label("OS"),
        clean: Clean::AsIs,
    },
    FieldRule {
        field: Field::Chipset,
        section: "Platform",
        row: RowMatch::Label("Chipset"),
        clean: Clean::AsIs,
    },
    FieldRule {
        field: Field::InternalMemory,
        section: "Memory",
        row: RowMatch::Label("Internal"),
        clean: Clean::AsIs,
    },
    FieldRule {
        field: Field::MainCamera,
        section: "Main Camera",
        row: RowMatch::First,
        clean: Clean::Lines,
    },
    FieldRule {
        field: Field::SelfieCamera,
        section: "Selfie",
        row: RowMatch::First,
        clean: Clean::CutAt(","),
    },
    FieldRule {
        field: Field::Battery,
        section: "Battery",
        row: RowMatch::First,
        clean: Clean::KeepThrough("mAh"),
    },
];

/// Selectors tried in order for the model name.
pub const TITLE_SELECTORS: &[&str] = &[".specs-phone-name-title", "h1"];

pub fn rule_for(field: Field) -> Option<&'static FieldRule> {
    RULES.iter().find(|r| r.field == field)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
