use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Detailed technical attributes of a catalog item, keyed by the item's identifier.
///
/// Values are free text (scraped or typed by hand) and are only ever displayed,
/// so no format is enforced and any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SpecSheet {
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub display_size: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub chipset: Option<String>,
    #[serde(default)]
    pub internal_memory: Option<String>,
    #[serde(default)]
    pub main_camera: Option<String>,
    #[serde(default)]
    pub selfie_camera: Option<String>,
    #[serde(default)]
    pub battery: Option<String>,
}

impl SpecSheet {
    /// Drops blank values so "" and missing are stored the same way.
    pub fn normalized(mut self) -> Self {
        for slot in self.slots_mut() {
            if slot.as_deref().map(str::trim).map_or(false, str::is_empty) {
                *slot = None;
            } else if let Some(v) = slot.as_mut() {
                *v = v.trim().to_string();
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.slots().iter().all(|s| s.is_none())
    }

    fn slots(&self) -> [&Option<String>; 9] {
        [
            &self.dimensions,
            &self.weight,
            &self.display_size,
            &self.os,
            &self.chipset,
            &self.internal_memory,
            &self.main_camera,
            &self.selfie_camera,
            &self.battery,
        ]
    }

    fn slots_mut(&mut self) -> [&mut Option<String>; 9] {
        [
            &mut self.dimensions,
            &mut self.weight,
            &mut self.display_size,
            &mut self.os,
            &mut self.chipset,
            &mut self.internal_memory,
            &mut self.main_camera,
            &mut self.selfie_camera,
            &mut self.battery,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_drops_blank_values() {
        let sheet = SpecSheet {
            os: Some("  Android 13 ".into()),
            chipset: Some("   ".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(sheet.os.as_deref(), Some("Android 13"));
        assert_eq!(sheet.chipset, None);
        assert!(!sheet.is_empty());
        assert!(SpecSheet::default().is_empty());
    }
}
