//! Model-name comparison used by the duplicate resolver.

/// How the duplicate resolver compares model names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateMatch {
    /// Case- and whitespace-sensitive equality.
    #[default]
    Exact,
    /// Trimmed, whitespace-collapsed, case-folded equality.
    Normalized,
}

impl DuplicateMatch {
    /// The form of `name` compared under this mode.
    pub fn key(&self, name: &str) -> String {
        match self {
            DuplicateMatch::Exact => name.to_string(),
            DuplicateMatch::Normalized => normalize_model_name(name),
        }
    }
}

pub fn normalize_model_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
