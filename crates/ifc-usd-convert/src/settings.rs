// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion settings
//!
//! Every field has a default, so a settings file only needs the keys it
//! changes.

use crate::error::{ConvertError, Result};
use ifc_usd_model::TessellationSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one conversion run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertSettings {
    /// Apply placement chains so geometry lands in world coordinates
    pub world_coords: bool,
    /// Visited nodes between progress events
    pub progress_interval: usize,
    /// Prim holding spaces missed by the primary traversal
    pub reconciliation_root: String,
    /// Scope under the default prim holding materials
    pub materials_scope: String,
    /// Top-level prim and stage default prim
    pub default_prim: String,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            world_coords: true,
            progress_interval: 10,
            reconciliation_root: "OrphanedSpaces".to_string(),
            materials_scope: "Materials".to_string(),
            default_prim: "World".to_string(),
        }
    }
}

impl ConvertSettings {
    /// Parse settings from JSON text
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Load settings from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConvertError::SettingsRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json).map_err(|source| ConvertError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Settings handed to the tessellator
    pub fn tessellation(&self) -> TessellationSettings {
        TessellationSettings {
            use_world_coords: self.world_coords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = ConvertSettings::from_json(r#"{"progress_interval": 25}"#).unwrap();
        assert_eq!(settings.progress_interval, 25);
        assert!(settings.world_coords);
        assert_eq!(settings.reconciliation_root, "OrphanedSpaces");
        assert!(settings.tessellation().use_world_coords);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(ConvertSettings::from_json(r#"{"worldCoords": false}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"world_coords": false, "default_prim": "Site"}}"#).unwrap();

        let settings = ConvertSettings::from_file(file.path()).unwrap();
        assert!(!settings.world_coords);
        assert_eq!(settings.default_prim, "Site");

        let missing = ConvertSettings::from_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConvertError::SettingsRead { .. })));
    }
}
