//! The reconciliation engine.
//!
//! The engine owns every [`Light`] and [`Group`] loaded from the bridge and
//! converges the two distinguished groups (automatic brightness and
//! automatic temperature) to the desired state held in their
//! [`DirtyValue`](crate::DirtyValue) cells.
//!
//! Mutations are synchronous and only mark cells dirty. The first mutation
//! after a quiet period spawns a loop task which, after a short settle
//! delay, runs one [`Step`] at a time until nothing is pending or the step
//! cap is reached. Steps run in a fixed priority order:
//!
//! 1. pending commands (all lights off)
//! 2. loading lights
//! 3. loading groups
//! 4. group membership
//! 5. brightness and temperature values
//!
//! Network calls are made without holding the state lock, so a value may
//! change while its write is in flight. Acknowledgements only clean a cell
//! whose value still equals what the bridge confirmed.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Value, json};
use strum::IntoEnumIterator;
use strum_macros::Display;

use crate::bridge::{Bridge, BridgeResponse};
use crate::config::EngineConfig;
use crate::errors::Error;
use crate::group::{Group, GroupKind};
use crate::history::MessageHistory;
use crate::light::Light;
use crate::payload::{ActionPayload, MembershipPayload};
use crate::response::BridgeReply;
use crate::runtime::{self, JoinHandle, lock};
use crate::types::{Brightness, ColorTemp, PowerMode, Transition};
use crate::value::DirtyValue;

type Result<T> = std::result::Result<T, Error>;

/// Callback fired after a group reload resolved both distinguished groups.
pub type ReadyCallback = Arc<dyn Fn() + Send + Sync>;

/// Path addressing every light on the bridge.
const ALL_LIGHTS_ACTION: &str = "/groups/0/action";

/// Spacing between per-light commands; bridges throttle bursts.
const LIGHT_COMMAND_SPACING: Duration = Duration::from_millis(200);

/// Upper bound on steps run by a single [`ReconciliationEngine::drain`].
const DRAIN_LIMIT: usize = 100;

/// One unit of reconciliation work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Step {
    ProcessCommands,
    LoadLights,
    LoadGroups,
    UpdateGroupMembership,
    UpdateGroupValues,
}

/// Result of running one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing was pending
    Idle,
    /// The step ran; more work may follow
    Completed(Step),
    /// The bridge could not be reached or refused the request
    Failed(Step),
}

impl StepOutcome {
    pub fn is_idle(&self) -> bool {
        matches!(self, StepOutcome::Idle)
    }
}

/// The request a step is about to make, decided under the state lock.
#[derive(Debug)]
enum Plan {
    AllOff(ActionPayload),
    LoadLights,
    LoadGroups,
    Membership {
        kind: GroupKind,
        path: String,
        lights: BTreeSet<String>,
    },
    Values {
        path: String,
        payload: ActionPayload,
    },
}

impl Plan {
    fn step(&self) -> Step {
        match self {
            Plan::AllOff(_) => Step::ProcessCommands,
            Plan::LoadLights => Step::LoadLights,
            Plan::LoadGroups => Step::LoadGroups,
            Plan::Membership { .. } => Step::UpdateGroupMembership,
            Plan::Values { .. } => Step::UpdateGroupValues,
        }
    }
}

#[derive(Debug, Default)]
struct EngineState {
    /// `None` until the first successful listing
    lights: Option<Vec<Light>>,
    groups: Option<Vec<Group>>,
    brightness_group: Option<usize>,
    temperature_group: Option<usize>,
    reload_lights_requested: bool,
    reload_groups_requested: bool,
    all_off_requested: Option<Option<Transition>>,
    looping: bool,
}

impl EngineState {
    fn group(&self, kind: GroupKind) -> Option<&Group> {
        let index = match kind {
            GroupKind::Brightness => self.brightness_group?,
            GroupKind::Temperature => self.temperature_group?,
        };
        self.groups.as_ref()?.get(index)
    }

    fn group_mut(&mut self, kind: GroupKind) -> Option<&mut Group> {
        let index = match kind {
            GroupKind::Brightness => self.brightness_group?,
            GroupKind::Temperature => self.temperature_group?,
        };
        self.groups.as_mut()?.get_mut(index)
    }

    /// The group of `kind`, only while it still lives at `path`.
    fn group_at(&mut self, kind: GroupKind, path: &str) -> Option<&mut Group> {
        self.group_mut(kind).filter(|g| g.path() == path)
    }

    fn is_ready(&self) -> bool {
        self.group(GroupKind::Brightness).is_some() && self.group(GroupKind::Temperature).is_some()
    }

    fn plan(&self, config: &EngineConfig) -> Option<Plan> {
        if let Some(transition) = self.all_off_requested {
            let mut payload = ActionPayload::from(PowerMode::Off);
            match transition {
                Some(t) => payload.transition(&t),
                None => payload.raw_transition(config.all_off_transition),
            }
            return Some(Plan::AllOff(payload));
        }
        if self.lights.is_none() || self.reload_lights_requested {
            return Some(Plan::LoadLights);
        }
        if self.groups.is_none() || self.reload_groups_requested {
            return Some(Plan::LoadGroups);
        }
        self.plan_membership().or_else(|| self.plan_values(config))
    }

    fn plan_membership(&self) -> Option<Plan> {
        if !self.is_ready() {
            return None;
        }
        GroupKind::iter().find_map(|kind| {
            let group = self.group(kind)?;
            if group.lights.is_dirty() && !group.lights.is_empty() {
                Some(Plan::Membership {
                    kind,
                    path: group.path(),
                    lights: group.lights.members(),
                })
            } else {
                None
            }
        })
    }

    fn plan_values(&self, config: &EngineConfig) -> Option<Plan> {
        let bri_group = self.group(GroupKind::Brightness)?;
        let ct_group = self.group(GroupKind::Temperature)?;

        let bri = pending(&bri_group.brightness).filter(|_| !bri_group.lights.is_empty());
        let ct = pending(&ct_group.color_temp).filter(|_| !ct_group.lights.is_empty());

        let mut payload = ActionPayload::new();
        let path = match (bri, ct) {
            (Some(bri), Some(ct)) if bri_group.lights.value() == ct_group.lights.value() => {
                // Same lights in both groups: one command to one group.
                payload.raw_brightness(bri);
                payload.raw_color_temp(ct);
                bri_group.action_path()
            }
            (Some(bri), _) => {
                payload.raw_brightness(bri);
                bri_group.action_path()
            }
            (None, Some(ct)) => {
                payload.raw_color_temp(ct);
                ct_group.action_path()
            }
            (None, None) => return None,
        };

        let major = (payload.bri.is_some() && bri_group.brightness.is_major())
            || (payload.ct.is_some() && ct_group.color_temp.is_major());
        if major {
            payload.raw_transition(config.major_transition);
        }
        Some(Plan::Values { path, payload })
    }

    /// Mark the loop as running if it may be started.
    fn claim_loop(&mut self, background: bool) -> bool {
        if background && !self.looping && runtime::has_runtime() {
            self.looping = true;
            true
        } else {
            false
        }
    }
}

/// A dirty value worth sending. Zero is the placeholder left by a reload.
fn pending<T: Copy + Default + PartialEq>(cell: &DirtyValue<T>) -> Option<T> {
    if !cell.is_dirty() {
        return None;
    }
    cell.value().copied().filter(|v| *v != T::default())
}

struct Inner<B> {
    bridge: B,
    config: EngineConfig,
    state: Mutex<EngineState>,
    ready_callback: Mutex<Option<ReadyCallback>>,
    task: Mutex<Option<JoinHandle<usize>>>,
    history: Mutex<MessageHistory>,
}

/// Converges the bridge's automatic groups to the desired state.
///
/// Cloning is cheap and yields a handle to the same engine.
pub struct ReconciliationEngine<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for ReconciliationEngine<B> {
    fn clone(&self) -> Self {
        ReconciliationEngine {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Bridge> ReconciliationEngine<B> {
    pub fn new(bridge: B, config: EngineConfig) -> Self {
        ReconciliationEngine {
            inner: Arc::new(Inner {
                bridge,
                config,
                state: Mutex::new(EngineState::default()),
                ready_callback: Mutex::new(None),
                task: Mutex::new(None),
                history: Mutex::new(MessageHistory::new()),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Register the callback fired after both distinguished groups were
    /// (re)loaded. Replaces any previous callback.
    pub fn set_ready_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *lock(&self.inner.ready_callback) = Some(Arc::new(callback));
    }

    /// Both distinguished groups are resolved.
    pub fn is_ready(&self) -> bool {
        lock(&self.inner.state).is_ready()
    }

    /// A loop task is currently running.
    pub fn is_looping(&self) -> bool {
        lock(&self.inner.state).looping
    }

    // ── Desired state ────────────────────────────────────────────────

    pub fn set_automatic_brightness_lights(&self, lights: BTreeSet<String>) {
        self.mutate_group(GroupKind::Brightness, |g| g.lights.set(lights));
    }

    pub fn set_automatic_temperature_lights(&self, lights: BTreeSet<String>) {
        self.mutate_group(GroupKind::Temperature, |g| g.lights.set(lights));
    }

    pub fn add_automatic_brightness_light(&self, light: &str) {
        self.add_lights(GroupKind::Brightness, [light]);
    }

    pub fn add_automatic_temperature_light(&self, light: &str) {
        self.add_lights(GroupKind::Temperature, [light]);
    }

    pub fn remove_automatic_brightness_light(&self, light: &str) {
        self.remove_lights(GroupKind::Brightness, [light]);
    }

    pub fn remove_automatic_temperature_light(&self, light: &str) {
        self.remove_lights(GroupKind::Temperature, [light]);
    }

    pub fn add_automatic_brightness_lights(&self, lights: &BTreeSet<String>) {
        self.add_lights(GroupKind::Brightness, lights.iter().map(String::as_str));
    }

    pub fn add_automatic_temperature_lights(&self, lights: &BTreeSet<String>) {
        self.add_lights(GroupKind::Temperature, lights.iter().map(String::as_str));
    }

    pub fn remove_automatic_brightness_lights(&self, lights: &BTreeSet<String>) {
        self.remove_lights(GroupKind::Brightness, lights.iter().map(String::as_str));
    }

    pub fn remove_automatic_temperature_lights(&self, lights: &BTreeSet<String>) {
        self.remove_lights(GroupKind::Temperature, lights.iter().map(String::as_str));
    }

    /// Add lights to a distinguished group's membership.
    pub fn add_lights<'a>(&self, kind: GroupKind, lights: impl IntoIterator<Item = &'a str>) {
        self.mutate_group(kind, |g| {
            lights
                .into_iter()
                .filter(|l| !l.is_empty())
                .fold(false, |changed, l| g.lights.insert(l) || changed)
        });
    }

    /// Remove lights from a distinguished group's membership.
    pub fn remove_lights<'a>(&self, kind: GroupKind, lights: impl IntoIterator<Item = &'a str>) {
        self.mutate_group(kind, |g| {
            lights
                .into_iter()
                .fold(false, |changed, l| g.lights.remove(l) || changed)
        });
    }

    /// Set the desired brightness, clamped to the bridge range.
    pub fn set_automatic_brightness(&self, brightness: u8) {
        let brightness = Brightness::clamped(i64::from(brightness));
        self.mutate_group(GroupKind::Brightness, |g| g.brightness.set(brightness.value()));
    }

    /// Set the desired color temperature, clamped to the mirek range.
    pub fn set_automatic_temperature(&self, mirek: u16) {
        let temp = ColorTemp::clamped(i64::from(mirek));
        self.mutate_group(GroupKind::Temperature, |g| g.color_temp.set(temp.mirek()));
    }

    /// Turn every light on the bridge off.
    ///
    /// The automatic groups are emptied once the bridge answered.
    pub fn request_all_off(&self, transition: Option<Transition>) {
        self.mutate(|state| state.all_off_requested = Some(transition));
    }

    /// Reload lights and groups, discarding all acknowledgement state.
    pub fn request_reload(&self) {
        self.mutate(|state| {
            state.reload_lights_requested = true;
            state.reload_groups_requested = true;
        });
    }

    /// Start the loop without changing anything, e.g. for the initial load.
    pub fn run_loop(&self) {
        self.mutate(|_| ());
    }

    fn mutate(&self, f: impl FnOnce(&mut EngineState)) {
        let start = {
            let mut state = lock(&self.inner.state);
            f(&mut state);
            state.claim_loop(self.inner.config.background)
        };
        if start {
            self.spawn_loop();
        }
    }

    /// Apply `f` to a distinguished group; dropped while not ready.
    fn mutate_group(&self, kind: GroupKind, f: impl FnOnce(&mut Group) -> bool) {
        let start = {
            let mut state = lock(&self.inner.state);
            let Some(group) = state.group_mut(kind) else {
                debug!("Automatic {} group not loaded; dropping update", kind);
                return;
            };
            if !f(group) {
                return;
            }
            state.claim_loop(self.inner.config.background)
        };
        if start {
            self.spawn_loop();
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// The light with the given unique id, without logging misses.
    pub fn light(&self, unique_id: &str) -> Option<Light> {
        let state = lock(&self.inner.state);
        state
            .lights
            .iter()
            .flatten()
            .find(|l| l.unique_id() == unique_id)
            .cloned()
    }

    /// Bridge number of a light, without logging misses.
    pub fn light_number_from_unique_id(&self, unique_id: &str) -> Option<String> {
        self.light(unique_id).map(|l| l.number().to_string())
    }

    pub fn light_numbers_from_unique_id(&self, unique_id: &str) -> Option<BTreeSet<String>> {
        let number = self.light_number_from_unique_id(unique_id);
        if number.is_none() {
            warn!("Light with unique id '{}' not found", unique_id);
        }
        number.map(|n| BTreeSet::from([n]))
    }

    pub fn light_numbers_from_name(&self, name: &str) -> Option<BTreeSet<String>> {
        let state = lock(&self.inner.state);
        let found = state
            .lights
            .iter()
            .flatten()
            .find(|l| l.name() == name)
            .map(|l| BTreeSet::from([l.number().to_string()]));
        if found.is_none() {
            warn!("Light with name '{}' not found", name);
        }
        found
    }

    /// Light numbers of the first group named `name`.
    pub fn light_numbers_from_group_name(&self, name: &str) -> Option<BTreeSet<String>> {
        let state = lock(&self.inner.state);
        state
            .groups
            .iter()
            .flatten()
            .find(|g| g.name() == name)
            .map(|g| g.lights.members())
    }

    /// Snapshot of a distinguished group.
    pub fn group(&self, kind: GroupKind) -> Option<Group> {
        lock(&self.inner.state).group(kind).cloned()
    }

    pub fn groups(&self) -> Vec<Group> {
        lock(&self.inner.state).groups.clone().unwrap_or_default()
    }

    pub fn lights(&self) -> Vec<Light> {
        lock(&self.inner.state).lights.clone().unwrap_or_default()
    }

    pub fn history(&self) -> MessageHistory {
        lock(&self.inner.history).clone()
    }

    /// Returns diagnostics including group state and request history.
    pub fn diagnostics(&self) -> Value {
        let describe = |g: Option<&Group>| {
            g.map(|g| {
                json!({
                    "number": g.number(),
                    "name": g.name(),
                    "lights": g.lights().to_string(),
                    "brightness": g.brightness().to_string(),
                    "color_temp": g.color_temp().to_string(),
                })
            })
        };

        let state = lock(&self.inner.state);
        let mut diag = json!({
            "ready": state.is_ready(),
            "looping": state.looping,
            "lights": state.lights.as_ref().map(Vec::len),
            "groups": state.groups.as_ref().map(Vec::len),
            "brightness_group": describe(state.group(GroupKind::Brightness)),
            "temperature_group": describe(state.group(GroupKind::Temperature)),
        });
        drop(state);

        let history = lock(&self.inner.history);
        diag["history"] = serde_json::to_value(history.summary()).unwrap_or(Value::Null);
        diag
    }

    // ── Driving ──────────────────────────────────────────────────────

    /// Run a single step.
    pub async fn step(&self) -> StepOutcome {
        self.run_step(false).await
    }

    /// Run steps back to back until idle or a step fails.
    pub async fn drain(&self) -> Vec<StepOutcome> {
        let mut outcomes = Vec::new();
        while outcomes.len() < DRAIN_LIMIT {
            let outcome = self.step().await;
            outcomes.push(outcome);
            if !matches!(outcome, StepOutcome::Completed(_)) {
                break;
            }
        }
        outcomes
    }

    /// Wait for the running loop task, if any. Returns the steps it ran.
    pub async fn wait_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let Some(handle) = lock(&self.inner.task).take() else {
                return total;
            };
            total += handle.await.unwrap_or_default();
        }
    }

    fn spawn_loop(&self) {
        let engine = self.clone();
        let handle = runtime::spawn(async move { engine.drive().await });
        *lock(&self.inner.task) = Some(handle);
    }

    async fn drive(self) -> usize {
        let config = &self.inner.config;
        debug!("Reconciliation loop started");
        runtime::sleep(config.settle_delay()).await;

        let mut completed = 0;
        loop {
            match self.run_step(true).await {
                StepOutcome::Idle => break,
                StepOutcome::Completed(_) => {
                    completed += 1;
                    if completed >= config.max_steps {
                        lock(&self.inner.state).looping = false;
                        break;
                    }
                    runtime::sleep(config.step_interval()).await;
                }
                StepOutcome::Failed(_) => {
                    lock(&self.inner.state).looping = false;
                    break;
                }
            }
        }
        debug!("Reconciliation loop finished after {} steps", completed);
        completed
    }

    /// Plan and execute one step. The loop task releases its claim in the
    /// same critical section that finds nothing to do.
    async fn run_step(&self, release_loop: bool) -> StepOutcome {
        let plan = {
            let mut state = lock(&self.inner.state);
            let plan = state.plan(&self.inner.config);
            if plan.is_none() && release_loop {
                state.looping = false;
            }
            plan
        };
        let Some(plan) = plan else {
            return StepOutcome::Idle;
        };

        let step = plan.step();
        match self.execute(plan).await {
            Ok(()) => StepOutcome::Completed(step),
            Err(e) => {
                warn!("Step {} failed: {}", step, e);
                lock(&self.inner.history).record_error(&e.to_string());
                StepOutcome::Failed(step)
            }
        }
    }

    async fn execute(&self, plan: Plan) -> Result<()> {
        match plan {
            Plan::AllOff(payload) => self.all_off(&payload).await,
            Plan::LoadLights => self.load_lights().await,
            Plan::LoadGroups => self.load_groups().await,
            Plan::Membership { kind, path, lights } => {
                self.update_membership(kind, &path, &lights).await
            }
            Plan::Values { path, payload } => self.update_values(&path, &payload).await,
        }
    }

    async fn all_off(&self, payload: &ActionPayload) -> Result<()> {
        let resp = self.put(ALL_LIGHTS_ACTION, payload).await?;
        info!("PUT {} {} -> {}", resp.status, ALL_LIGHTS_ACTION, resp.body);

        // Nothing is assigned to either automatic group after an all-off.
        let mut state = lock(&self.inner.state);
        for kind in GroupKind::iter() {
            if let Some(group) = state.group_mut(kind) {
                group.lights.reset(BTreeSet::new());
                group.lights.clean();
            }
        }
        state.all_off_requested = None;
        Ok(())
    }

    async fn load_lights(&self) -> Result<()> {
        let resp = self.get_ok("/lights").await?;
        let lights = Light::from_listing(&resp.body)?;
        for light in &lights {
            info!("Discovered Hue Light: {}", light);
        }
        info!("Loaded {} lights from Hue", lights.len());

        let mut state = lock(&self.inner.state);
        state.lights = Some(lights);
        state.reload_lights_requested = false;
        Ok(())
    }

    async fn load_groups(&self) -> Result<()> {
        let resp = self.get_ok("/groups").await?;
        let mut groups = Group::from_listing(&resp.body)?;
        for group in &groups {
            info!("Discovered Hue Group: {}", group);
        }
        info!("Loaded {} groups from Hue", groups.len());

        let config = &self.inner.config;
        let brightness_group = groups.iter().position(|g| g.name() == config.brightness_group);
        let temperature_group = groups.iter().position(|g| g.name() == config.temperature_group);
        match brightness_group {
            Some(i) => info!("Hue Automatic Brightness group is {}", groups[i].number()),
            None => warn!("No group named '{}'", config.brightness_group),
        }
        match temperature_group {
            Some(i) => info!("Hue Automatic Temperature group is {}", groups[i].number()),
            None => warn!("No group named '{}'", config.temperature_group),
        }
        // Membership and values are rebuilt from scratch.
        for index in [brightness_group, temperature_group].into_iter().flatten() {
            groups[index].reset_tracking();
        }

        let ready = {
            let mut state = lock(&self.inner.state);
            state.groups = Some(groups);
            state.brightness_group = brightness_group;
            state.temperature_group = temperature_group;
            state.reload_groups_requested = false;
            state.is_ready()
        };

        if ready {
            let callback = lock(&self.inner.ready_callback).clone();
            if let Some(callback) = callback {
                callback();
            }
        }
        Ok(())
    }

    async fn update_membership(
        &self,
        kind: GroupKind,
        path: &str,
        lights: &BTreeSet<String>,
    ) -> Result<()> {
        info!("Updating Hue {} group {} to {:?}", kind, path, lights);
        let payload = MembershipPayload::from(lights);
        let resp = self.put_ok(path, &payload).await?;
        let reply = BridgeReply::parse(&resp.body);
        log_reply_errors(path, &reply);

        let key = format!("{path}/lights");
        let acknowledged: Option<BTreeSet<String>> = reply
            .acknowledged(&key)
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        let mut state = lock(&self.inner.state);
        let acked = match (state.group_at(kind, path), acknowledged) {
            (Some(group), Some(acknowledged)) => group.lights.acknowledge(&acknowledged),
            _ => false,
        };
        info!(
            "PUT {} {} {} {:?}",
            resp.status,
            if acked { "ACK" } else { "NAK" },
            path,
            lights
        );
        Ok(())
    }

    async fn update_values(&self, path: &str, payload: &ActionPayload) -> Result<()> {
        let resp = self.put_ok(path, payload).await?;
        let reply = BridgeReply::parse(&resp.body);
        log_reply_errors(path, &reply);

        let bri = reply
            .acknowledged(&format!("{path}/bri"))
            .and_then(Value::as_u64)
            .and_then(|v| u8::try_from(v).ok());
        let ct = reply
            .acknowledged(&format!("{path}/ct"))
            .and_then(Value::as_u64)
            .and_then(|v| u16::try_from(v).ok());

        let mut state = lock(&self.inner.state);
        if let (Some(bri), Some(group)) = (bri, state.group_mut(GroupKind::Brightness)) {
            group.brightness.acknowledge(&bri);
        }
        if let (Some(ct), Some(group)) = (ct, state.group_mut(GroupKind::Temperature)) {
            group.color_temp.acknowledge(&ct);
        }
        info!("PUT {} {} -> {}", resp.status, path, resp.body);
        Ok(())
    }

    /// Send desired values straight to a set of lights.
    ///
    /// Uses the action endpoint of a group with exactly these lights if one
    /// exists, else each light's state endpoint.
    pub async fn apply_direct(
        &self,
        lights: &BTreeSet<String>,
        payload: &ActionPayload,
    ) -> Result<()> {
        if lights.is_empty() || !payload.is_valid() {
            return Ok(());
        }

        let group_path = {
            let state = lock(&self.inner.state);
            state
                .groups
                .iter()
                .flatten()
                .find(|g| g.lights.value() == Some(lights))
                .map(Group::action_path)
        };
        if let Some(path) = group_path {
            let resp = self.put_ok(&path, payload).await?;
            info!("PUT {} {} -> {}", resp.status, path, resp.body);
            return Ok(());
        }

        for (i, light) in lights.iter().enumerate() {
            if i > 0 {
                runtime::sleep(LIGHT_COMMAND_SPACING).await;
            }
            let path = format!("/lights/{light}/state");
            let resp = self.put_ok(&path, payload).await?;
            info!("PUT {} {} -> {}", resp.status, path, resp.body);
        }
        Ok(())
    }

    // ── Transport ────────────────────────────────────────────────────

    async fn get_ok(&self, path: &str) -> Result<BridgeResponse> {
        lock(&self.inner.history).sent("GET", path, &Value::Null);
        let resp = self.inner.bridge.get(path).await?;
        lock(&self.inner.history).received("GET", path, resp.status, &resp.body);
        if resp.is_ok() {
            info!("GET {} {}", resp.status, path);
            Ok(resp)
        } else {
            Err(Error::status("GET", path, resp.status, &resp.body))
        }
    }

    async fn put(&self, path: &str, body: &impl Serialize) -> Result<BridgeResponse> {
        let body = serde_json::to_value(body).map_err(Error::JsonDump)?;
        lock(&self.inner.history).sent("PUT", path, &body);
        let resp = self.inner.bridge.put(path, &body).await?;
        lock(&self.inner.history).received("PUT", path, resp.status, &resp.body);
        Ok(resp)
    }

    async fn put_ok(&self, path: &str, body: &impl Serialize) -> Result<BridgeResponse> {
        let resp = self.put(path, body).await?;
        if resp.is_ok() {
            Ok(resp)
        } else {
            Err(Error::status("PUT", path, resp.status, &resp.body))
        }
    }
}

fn log_reply_errors(path: &str, reply: &BridgeReply) {
    for error in reply.errors() {
        warn!(
            "PUT {} rejected {}: {} (type {})",
            path, error.address, error.description, error.kind
        );
    }
}
