//! Bridge light identities.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// A light known to the bridge.
///
/// Maps the stable hardware id the host sees (`unique_id`) to the
/// bridge-local number used in group membership. Immutable once loaded.
///
/// # Example
///
/// ```
/// use hue_autolight::Light;
///
/// let light = Light::new("5", "Lamp", "AA:BB");
/// assert_eq!(light.number(), "5");
/// assert_eq!(light.to_string(), "Light 5 \"Lamp\" AA:BB");
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Light {
    name: String,
    number: String,
    unique_id: String,
}

/// One entry of `GET /lights`.
#[derive(Debug, Deserialize)]
struct LightRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    uniqueid: String,
}

impl Light {
    pub fn new(number: &str, name: &str, unique_id: &str) -> Self {
        Light {
            name: name.to_string(),
            number: number.to_string(),
            unique_id: unique_id.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bridge-local numeric id.
    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Decode a `GET /lights` body, ordered by bridge number.
    pub(crate) fn from_listing(body: &Value) -> Result<Vec<Light>> {
        if !body.is_object() {
            return Err(Error::malformed_listing("lights"));
        }
        let records: HashMap<String, LightRecord> =
            serde_json::from_value(body.clone()).map_err(Error::JsonLoad)?;

        let mut lights: Vec<Light> = records
            .into_iter()
            .map(|(number, record)| Light {
                name: record.name,
                number,
                unique_id: record.uniqueid,
            })
            .collect();
        lights.sort_by(|a, b| bridge_order(&a.number, &b.number));
        Ok(lights)
    }
}

impl fmt::Display for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Light {} \"{}\" {}", self.number, self.name, self.unique_id)
    }
}

/// Numeric ordering for bridge ids, which are decimal strings.
pub(crate) fn bridge_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_listing() {
        let body = json!({
            "10": {"name": "Hall", "uniqueid": "00:11", "state": {"on": true}},
            "5": {"name": "Lamp", "uniqueid": "AA:BB"},
        });
        let lights = Light::from_listing(&body).unwrap();
        assert_eq!(lights.len(), 2);
        assert_eq!(lights[0], Light::new("5", "Lamp", "AA:BB"));
        assert_eq!(lights[1].number(), "10");
        assert_eq!(lights[1].unique_id(), "00:11");
    }

    #[test]
    fn test_from_listing_rejects_non_object() {
        let err = Light::from_listing(&json!([{"error": {}}])).unwrap_err();
        assert_eq!(err, Error::malformed_listing("lights"));
    }

    #[test]
    fn test_from_listing_missing_fields() {
        let lights = Light::from_listing(&json!({"3": {}})).unwrap();
        assert_eq!(lights[0].name(), "");
        assert_eq!(lights[0].unique_id(), "");
    }
}
