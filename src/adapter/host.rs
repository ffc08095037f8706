//! What the adapter needs from the host automation platform.

use std::future::Future;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::Error;
use crate::types::{ColorTemp, Transition};

type Result<T> = std::result::Result<T, Error>;

/// Snapshot of a host light entity.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct EntityState {
    pub entity_id: String,
    /// Registry unique id; `None` for entities without a registry entry
    pub unique_id: Option<String>,
    pub name: String,
    pub is_on: bool,
    /// Host brightness, 0 to 255
    pub brightness: Option<u8>,
    /// Color temperature in mirek
    pub color_temp: Option<u16>,
    /// The entity controls a whole bridge group
    pub is_bridge_group: bool,
}

impl EntityState {
    /// A plain bridge light entity.
    pub fn light(entity_id: &str, unique_id: &str, name: &str) -> Self {
        EntityState {
            entity_id: entity_id.to_string(),
            unique_id: Some(unique_id.to_string()),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// An entity controlling the bridge group named `name`.
    pub fn bridge_group(entity_id: &str, name: &str) -> Self {
        EntityState {
            entity_id: entity_id.to_string(),
            name: name.to_string(),
            is_bridge_group: true,
            ..Default::default()
        }
    }

    /// Mark the entity on with the given values.
    pub fn on(mut self, brightness: Option<u8>, color_temp: Option<u16>) -> Self {
        self.is_on = true;
        self.brightness = brightness;
        self.color_temp = color_temp;
        self
    }
}

fn clamp_host_brightness(value: i64) -> u8 {
    value.clamp(0, i64::from(u8::MAX)) as u8
}

fn clamped_brightness<'de, D>(deserializer: D) -> std::result::Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.map(|b| clamp_host_brightness(b as i64)))
}

fn clamped_color_temp<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.map(|ct| ColorTemp::clamped(ct as i64).mirek()))
}

/// Parameters of a turn-on or turn-off command.
///
/// Values are clamped to their valid ranges when built with
/// [`LightParams::from_raw`] or deserialized, so the adapter never has to
/// re-check them.
///
/// # Example
///
/// ```
/// use hue_autolight::LightParams;
///
/// let params = LightParams::from_raw(Some(300), Some(100), Some(-1.0));
/// assert_eq!(params.brightness, Some(255));
/// assert_eq!(params.color_temp, Some(153));
/// assert_eq!(params.transition.unwrap().deciseconds(), 0);
/// ```
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct LightParams {
    #[serde(default, deserialize_with = "clamped_brightness")]
    pub brightness: Option<u8>,
    #[serde(default, deserialize_with = "clamped_color_temp")]
    pub color_temp: Option<u16>,
    #[serde(default)]
    pub transition: Option<Transition>,
}

impl LightParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from unvalidated host input.
    pub fn from_raw(brightness: Option<i64>, color_temp: Option<i64>, transition: Option<f64>) -> Self {
        LightParams {
            brightness: brightness.map(clamp_host_brightness),
            color_temp: color_temp.map(|ct| ColorTemp::clamped(ct).mirek()),
            transition: transition.map(Transition::seconds),
        }
    }

    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn with_color_temp(mut self, mirek: u16) -> Self {
        self.color_temp = Some(ColorTemp::clamped(i64::from(mirek)).mirek());
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }
}

/// Extra parameters of the `dim` service.
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct DimParams {
    /// Temperature to dim to; the desired temperature if absent
    #[serde(default, deserialize_with = "clamped_color_temp")]
    pub color_temp: Option<u16>,
    #[serde(default)]
    pub dim_transition: Option<Transition>,
    /// Turn the light off this long after dimming
    #[serde(default)]
    pub off_after: Option<Transition>,
    #[serde(default)]
    pub off_transition: Option<Transition>,
}

/// A service invocation targeting one or more host entities.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ServiceCall<P = LightParams> {
    pub entity_ids: Vec<String>,
    pub params: P,
}

impl<P> ServiceCall<P> {
    pub fn new(entity_ids: &[&str], params: P) -> Self {
        ServiceCall {
            entity_ids: entity_ids.iter().map(|s| s.to_string()).collect(),
            params,
        }
    }
}

/// The host platform: a source of entity state and a sink for device
/// control calls.
pub trait Host: Send + Sync + 'static {
    /// Every light entity the host knows.
    fn light_states(&self) -> Vec<EntityState>;

    fn entity_state(&self, entity_id: &str) -> Option<EntityState>;

    /// Physically turn an entity on.
    fn turn_on(
        &self,
        entity_id: &str,
        params: &LightParams,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Physically turn an entity off.
    fn turn_off(
        &self,
        entity_id: &str,
        params: &LightParams,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_clamped() {
        let params = LightParams::from_raw(Some(-4), Some(900), Some(7000.0));
        assert_eq!(params.brightness, Some(0));
        assert_eq!(params.color_temp, Some(454));
        assert_eq!(params.transition.unwrap().deciseconds(), 65530);
    }

    #[test]
    fn test_params_deserialize_clamped() {
        let params: LightParams =
            serde_json::from_value(json!({"brightness": 900, "color_temp": 20, "transition": -2.0}))
                .unwrap();
        assert_eq!(params.brightness, Some(255));
        assert_eq!(params.color_temp, Some(153));
        assert_eq!(params.transition, Some(Transition::seconds(0.0)));

        let params: LightParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params, LightParams::new());
    }

    #[test]
    fn test_dim_params_deserialize_clamped() {
        let call: ServiceCall<DimParams> = serde_json::from_str(
            r#"{"entity_ids":["light.lamp"],"params":{"off_after":-5.0,"color_temp":9000}}"#,
        )
        .unwrap();
        assert_eq!(call.params.off_after, Some(Transition::seconds(0.0)));
        assert_eq!(call.params.color_temp, Some(454));
        assert_eq!(call.params.dim_transition, None);
    }

    #[test]
    fn test_params_serialize_sparse() {
        let params = LightParams::new().with_brightness(120);
        assert_eq!(serde_json::to_value(params).unwrap(), json!({"brightness": 120}));
    }

    #[test]
    fn test_entity_builders() {
        let state = EntityState::light("light.lamp", "AA:BB", "Lamp").on(Some(200), None);
        assert!(state.is_on);
        assert!(!state.is_bridge_group);
        assert_eq!(state.unique_id.as_deref(), Some("AA:BB"));

        let group = EntityState::bridge_group("light.living", "Living");
        assert!(group.is_bridge_group);
        assert_eq!(group.unique_id, None);
    }
}
