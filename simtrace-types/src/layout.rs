//! Study-wide documents shared by every replication.
//!
//! Their contents belong to the rendering layer, so only the version tag is
//! interpreted here and the rest is kept as an opaque JSON object.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Versioned, default_format_version};

/// Static layout of the simulated model (components, positions, routes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelLayout {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl ModelLayout {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.get(field)
    }
}

impl Versioned for ModelLayout {
    fn format_version(&self) -> u32 {
        self.format_version
    }
}

/// Visual styling shared by all replications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedVisualConfig {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl SharedVisualConfig {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.get(field)
    }
}

impl Versioned for SharedVisualConfig {
    fn format_version(&self) -> u32 {
        self.format_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_keeps_everything_but_version() {
        let layout: ModelLayout =
            serde_json::from_str(r#"{ "formatVersion": 1, "components": [ { "id": "q1" } ] }"#)
                .unwrap();

        assert_eq!(layout.format_version, 1);
        assert!(layout.get("formatVersion").is_none());
        assert_eq!(layout.get("components").unwrap()[0]["id"], "q1");
    }
}
