//! Request bodies sent to the bridge.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{Brightness, ColorTemp, PowerMode, Transition};

/// A body for a group `action` or light `state` endpoint.
///
/// Only the attributes that were set are serialized.
///
/// # Example
///
/// ```
/// use hue_autolight::{ActionPayload, Brightness, ColorTemp, Transition};
///
/// let mut payload = ActionPayload::new();
/// assert!(!payload.is_valid());
///
/// payload.brightness(&Brightness::create(200).unwrap());
/// payload.color_temp(&ColorTemp::create(300).unwrap());
/// payload.transition(&Transition::seconds(10.0));
/// assert_eq!(
///     serde_json::to_string(&payload).unwrap(),
///     r#"{"bri":200,"ct":300,"transitiontime":100}"#
/// );
/// ```
#[serde_with::skip_serializing_none]
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ActionPayload {
    pub(crate) on: Option<bool>,
    pub(crate) bri: Option<u8>,
    pub(crate) ct: Option<u16>,
    #[serde(rename = "transitiontime")]
    pub(crate) transition: Option<u16>,
}

impl ActionPayload {
    /// Create a new empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if this payload changes anything on the lights.
    ///
    /// A transition alone is not valid.
    pub fn is_valid(&self) -> bool {
        self.on.is_some() || self.bri.is_some() || self.ct.is_some()
    }

    pub fn power(&mut self, power: PowerMode) {
        self.on = Some(power.is_on());
    }

    pub fn brightness(&mut self, brightness: &Brightness) {
        self.bri = Some(brightness.value);
    }

    pub fn color_temp(&mut self, temp: &ColorTemp) {
        self.ct = Some(temp.mirek);
    }

    pub fn transition(&mut self, transition: &Transition) {
        self.transition = Some(transition.deciseconds());
    }

    pub(crate) fn raw_brightness(&mut self, bri: u8) {
        self.bri = Some(bri);
    }

    pub(crate) fn raw_color_temp(&mut self, ct: u16) {
        self.ct = Some(ct);
    }

    pub(crate) fn raw_transition(&mut self, deciseconds: u16) {
        self.transition = Some(deciseconds);
    }
}

impl From<PowerMode> for ActionPayload {
    fn from(power: PowerMode) -> Self {
        let mut p = ActionPayload::new();
        p.power(power);
        p
    }
}

impl From<&Brightness> for ActionPayload {
    fn from(brightness: &Brightness) -> Self {
        let mut p = ActionPayload::new();
        p.brightness(brightness);
        p
    }
}

impl From<&ColorTemp> for ActionPayload {
    fn from(temp: &ColorTemp) -> Self {
        let mut p = ActionPayload::new();
        p.color_temp(temp);
        p
    }
}

/// A body replacing a group's membership.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MembershipPayload {
    pub(crate) lights: Vec<String>,
}

impl From<&BTreeSet<String>> for MembershipPayload {
    fn from(lights: &BTreeSet<String>) -> Self {
        MembershipPayload {
            lights: lights.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparse_serialization() {
        let payload = ActionPayload::from(&Brightness::create(120).unwrap());
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({"bri": 120}));

        let mut off = ActionPayload::from(PowerMode::Off);
        off.raw_transition(25);
        assert_eq!(
            serde_json::to_value(&off).unwrap(),
            json!({"on": false, "transitiontime": 25})
        );
    }

    #[test]
    fn test_transition_alone_is_invalid() {
        let mut payload = ActionPayload::new();
        payload.transition(&Transition::seconds(2.0));
        assert!(!payload.is_valid());
        payload.color_temp(&ColorTemp::create(250).unwrap());
        assert!(payload.is_valid());
    }

    #[test]
    fn test_membership_is_ordered() {
        let lights: BTreeSet<String> = ["2", "1"].iter().map(|s| s.to_string()).collect();
        let payload = MembershipPayload::from(&lights);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"lights": ["1", "2"]})
        );
    }
}
