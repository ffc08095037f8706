//! Scripted bridge and host for unit tests.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value, json};

use crate::adapter::{EntityState, Host, LightParams};
use crate::bridge::{Bridge, BridgeResponse};
use crate::errors::Error;
use crate::runtime::lock;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Request {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct MockState {
    gets: HashMap<String, BridgeResponse>,
    puts: HashMap<String, VecDeque<BridgeResponse>>,
    unreachable: HashSet<String>,
    requests: Vec<Request>,
}

/// Answers GETs from fixtures and PUTs by acknowledging every attribute,
/// unless a reply was queued for the path.
#[derive(Clone, Default)]
pub(crate) struct MockBridge {
    state: Arc<Mutex<MockState>>,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bridge listing one light and the two managed groups.
    pub fn standard() -> Self {
        let bridge = Self::new();
        bridge.with_get("/lights", json!({"5": {"name": "Lamp", "uniqueid": "AA:BB"}}));
        bridge.with_get(
            "/groups",
            json!({
                "1": {"name": "Auto Brightness", "lights": []},
                "2": {"name": "Auto Temperature", "lights": []},
            }),
        );
        bridge
    }

    pub fn with_get(&self, path: &str, body: Value) {
        lock(&self.state)
            .gets
            .insert(path.to_string(), BridgeResponse::new(200, body));
    }

    /// Queue a one-shot reply for the next PUT to `path`.
    pub fn queue_put(&self, path: &str, response: BridgeResponse) {
        lock(&self.state)
            .puts
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    /// Fail every request to `path` as if the bridge were unreachable. The
    /// failure is a transient 503, the class the engine retries on the next
    /// trigger.
    pub fn set_unreachable(&self, path: &str, unreachable: bool) {
        let mut state = lock(&self.state);
        if unreachable {
            state.unreachable.insert(path.to_string());
        } else {
            state.unreachable.remove(path);
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        lock(&self.state).requests.clone()
    }

    pub fn puts(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "PUT")
            .collect()
    }

    pub fn clear_requests(&self) {
        lock(&self.state).requests.clear();
    }

    /// The success reply a real bridge gives for a fully applied PUT.
    pub fn acknowledge(path: &str, body: &Value) -> Value {
        let items: Vec<Value> = body
            .as_object()
            .map(|attrs| {
                attrs
                    .iter()
                    .map(|(key, value)| {
                        let mut success = Map::new();
                        success.insert(format!("{path}/{key}"), value.clone());
                        json!({ "success": success })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Value::Array(items)
    }
}

impl Bridge for MockBridge {
    async fn get(&self, path: &str) -> Result<BridgeResponse> {
        let mut state = lock(&self.state);
        state.requests.push(Request {
            method: "GET",
            path: path.to_string(),
            body: None,
        });
        if state.unreachable.contains(path) {
            return Err(Error::status("GET", path, 503, &Value::Null));
        }
        Ok(state.gets.get(path).cloned().unwrap_or_else(|| {
            BridgeResponse::new(404, json!([{"error": {"type": 3, "address": path}}]))
        }))
    }

    async fn put(&self, path: &str, body: &Value) -> Result<BridgeResponse> {
        let mut state = lock(&self.state);
        state.requests.push(Request {
            method: "PUT",
            path: path.to_string(),
            body: Some(body.clone()),
        });
        if state.unreachable.contains(path) {
            return Err(Error::status("PUT", path, 503, &Value::Null));
        }
        let queued = state.puts.get_mut(path).and_then(VecDeque::pop_front);
        Ok(queued.unwrap_or_else(|| BridgeResponse::new(200, Self::acknowledge(path, body))))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HostCall {
    TurnOn(String, LightParams),
    TurnOff(String, LightParams),
}

#[derive(Default)]
struct HostState {
    entities: BTreeMap<String, EntityState>,
    calls: Vec<HostCall>,
}

/// A host whose entities are set up by the test. Device calls are recorded
/// and do not change entity state.
#[derive(Clone, Default)]
pub(crate) struct MockHost {
    state: Arc<Mutex<HostState>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, entity: EntityState) {
        lock(&self.state)
            .entities
            .insert(entity.entity_id.clone(), entity);
    }

    /// Mark a known entity on with the given values.
    pub fn set_on(&self, entity_id: &str, brightness: Option<u8>, color_temp: Option<u16>) {
        if let Some(entity) = lock(&self.state).entities.get_mut(entity_id) {
            entity.is_on = true;
            entity.brightness = brightness;
            entity.color_temp = color_temp;
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        lock(&self.state).calls.clone()
    }
}

impl Host for MockHost {
    fn light_states(&self) -> Vec<EntityState> {
        lock(&self.state).entities.values().cloned().collect()
    }

    fn entity_state(&self, entity_id: &str) -> Option<EntityState> {
        lock(&self.state).entities.get(entity_id).cloned()
    }

    async fn turn_on(&self, entity_id: &str, params: &LightParams) -> Result<()> {
        lock(&self.state)
            .calls
            .push(HostCall::TurnOn(entity_id.to_string(), *params));
        Ok(())
    }

    async fn turn_off(&self, entity_id: &str, params: &LightParams) -> Result<()> {
        lock(&self.state)
            .calls
            .push(HostCall::TurnOff(entity_id.to_string(), *params));
        Ok(())
    }
}
