//! Glue between a host automation platform and the engine.
//!
//! The [`IntegrationAdapter`] sits in front of the host's light services.
//! It fills in the desired brightness and temperature on turn-on commands,
//! decides through [`policy`] whether the light keeps following the
//! automatic values, and forwards the physical call to the [`Host`].
//! Host state changes (desired defaults, night mode, entities coming and
//! going) are translated into engine mutations.

mod host;
pub mod policy;
mod timers;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{info, warn};

use crate::bridge::{Bridge, HttpBridge};
use crate::config::AdapterConfig;
use crate::engine::ReconciliationEngine;
use crate::errors::Error;
use crate::payload::ActionPayload;
use crate::runtime::lock;
use crate::types::{Brightness, ColorTemp, Transition};

pub use host::{DimParams, EntityState, Host, LightParams, ServiceCall};
pub use policy::{Tracking, TrackingDecision};
pub use timers::OffTimers;

type Result<T> = std::result::Result<T, Error>;

/// Host-side brightness ceiling; the bridge clamps further.
const HOST_MAX_BRIGHTNESS: i64 = 255;

#[derive(Debug, Clone, Copy)]
struct DesiredState {
    brightness: u8,
    temperature: u16,
    night_mode: bool,
}

struct AdapterInner<H, B> {
    engine: ReconciliationEngine<B>,
    host: H,
    config: AdapterConfig,
    state: Mutex<DesiredState>,
    timers: OffTimers,
}

/// Applies default on-values and automatic tracking to host light commands.
pub struct IntegrationAdapter<H, B = HttpBridge> {
    inner: Arc<AdapterInner<H, B>>,
}

impl<H, B> Clone for IntegrationAdapter<H, B> {
    fn clone(&self) -> Self {
        IntegrationAdapter {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn clamp_brightness(value: i64) -> u8 {
    value.clamp(i64::from(Brightness::MIN), HOST_MAX_BRIGHTNESS) as u8
}

impl<H: Host, B: Bridge> IntegrationAdapter<H, B> {
    /// Wrap `engine`. When configured, the adapter re-pushes the desired
    /// state every time the engine (re)loads its groups.
    pub fn new(engine: ReconciliationEngine<B>, host: H, config: AdapterConfig) -> Self {
        let state = DesiredState {
            brightness: clamp_brightness(i64::from(config.default_brightness)),
            temperature: ColorTemp::clamped(i64::from(config.default_temperature)).mirek(),
            night_mode: false,
        };
        let adapter = IntegrationAdapter {
            inner: Arc::new(AdapterInner {
                engine,
                host,
                config,
                state: Mutex::new(state),
                timers: OffTimers::new(),
            }),
        };

        if adapter.inner.config.repush_on_ready {
            let weak = Arc::downgrade(&adapter.inner);
            adapter.inner.engine.set_ready_callback(move || {
                if let Some(inner) = weak.upgrade() {
                    IntegrationAdapter { inner }.push_desired_state();
                }
            });
        }
        adapter
    }

    /// Kick off the initial load of lights and groups.
    pub fn start(&self) {
        self.inner.engine.run_loop();
    }

    pub fn engine(&self) -> &ReconciliationEngine<B> {
        &self.inner.engine
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn timers(&self) -> &OffTimers {
        &self.inner.timers
    }

    pub fn current_brightness(&self) -> u8 {
        lock(&self.inner.state).brightness
    }

    pub fn current_temperature(&self) -> u16 {
        lock(&self.inner.state).temperature
    }

    pub fn night_mode(&self) -> bool {
        lock(&self.inner.state).night_mode
    }

    fn close_enough(&self, actual: Option<i64>, desired: i64) -> bool {
        actual.is_some_and(|a| a.abs_diff(desired) < u64::from(self.inner.config.close_enough))
    }

    /// Bridge light numbers behind a host entity.
    pub fn lights_for_entity(&self, state: &EntityState) -> Option<BTreeSet<String>> {
        let engine = &self.inner.engine;
        if state.is_bridge_group {
            engine.light_numbers_from_group_name(&state.name)
        } else {
            engine.light_numbers_from_unique_id(state.unique_id.as_deref()?)
        }
    }

    fn apply_tracking(&self, lights: &BTreeSet<String>, decision: &TrackingDecision) {
        let engine = &self.inner.engine;
        match decision.brightness {
            Tracking::Start => engine.add_automatic_brightness_lights(lights),
            Tracking::Stop => engine.remove_automatic_brightness_lights(lights),
            Tracking::Keep => {}
        }
        match decision.color_temp {
            Tracking::Start => engine.add_automatic_temperature_lights(lights),
            Tracking::Stop => engine.remove_automatic_temperature_lights(lights),
            Tracking::Keep => {}
        }
    }

    // ── Host state hooks ─────────────────────────────────────────────

    /// The host's desired brightness changed.
    pub fn default_brightness_changed(&self, value: f64) {
        let brightness = clamp_brightness(value as i64);
        let night_mode = {
            let mut state = lock(&self.inner.state);
            state.brightness = brightness;
            state.night_mode
        };
        if !night_mode {
            self.inner.engine.set_automatic_brightness(brightness);
        }
    }

    /// The host's desired color temperature changed.
    pub fn default_temperature_changed(&self, value: f64) {
        let temperature = ColorTemp::clamped(value as i64).mirek();
        let night_mode = {
            let mut state = lock(&self.inner.state);
            state.temperature = temperature;
            state.night_mode
        };
        if !night_mode {
            self.inner.engine.set_automatic_temperature(temperature);
        }
    }

    pub fn night_mode_changed(&self, enabled: bool) {
        lock(&self.inner.state).night_mode = enabled;
        if enabled && self.inner.config.cancel_timers_on_night_mode {
            let cancelled = self.inner.timers.cancel_all();
            info!("Night mode on; cancelled {} timers", cancelled);
        }
    }

    /// A light entity appeared on the host.
    pub fn entity_added(&self, state: &EntityState) {
        if !state.is_on || state.is_bridge_group {
            return;
        }
        if !self.inner.config.is_automatic_entity(&state.entity_id) {
            return;
        }
        let Some(unique_id) = state.unique_id.as_deref() else {
            return;
        };
        let Some(lights) = self.inner.engine.light_numbers_from_unique_id(unique_id) else {
            return;
        };

        let desired = *lock(&self.inner.state);
        let engine = &self.inner.engine;
        if self.close_enough(state.brightness.map(i64::from), i64::from(desired.brightness)) {
            engine.add_automatic_brightness_lights(&lights);
        }
        if self.close_enough(state.color_temp.map(i64::from), i64::from(desired.temperature)) {
            engine.add_automatic_temperature_lights(&lights);
        }
    }

    /// A light entity disappeared from the host.
    pub fn entity_removed(&self, state: &EntityState) {
        if let Some(lights) = self.lights_for_entity(state) {
            info!("Remove light: {}", state.entity_id);
            self.inner.engine.remove_automatic_brightness_lights(&lights);
            self.inner.engine.remove_automatic_temperature_lights(&lights);
        }
    }

    /// Set both automatic groups from the lights currently following the
    /// desired values, then the desired values themselves.
    pub fn push_desired_state(&self) {
        let desired = *lock(&self.inner.state);
        let engine = &self.inner.engine;
        let mut brightness_lights = BTreeSet::new();
        let mut temperature_lights = BTreeSet::new();

        for state in self.inner.host.light_states() {
            if !state.is_on || state.is_bridge_group {
                continue;
            }
            if !self.inner.config.is_automatic_entity(&state.entity_id) {
                continue;
            }
            let Some(light) = state.unique_id.as_deref().and_then(|id| engine.light(id)) else {
                continue;
            };
            let number = light.number().to_string();
            if self.close_enough(state.brightness.map(i64::from), i64::from(desired.brightness)) {
                brightness_lights.insert(number.clone());
            }
            if self.close_enough(state.color_temp.map(i64::from), i64::from(desired.temperature)) {
                temperature_lights.insert(number);
            }
        }

        info!(
            "Bridge ready; tracking brightness {:?} temperature {:?}",
            brightness_lights, temperature_lights
        );
        engine.set_automatic_brightness_lights(brightness_lights);
        engine.set_automatic_temperature_lights(temperature_lights);
        engine.set_automatic_brightness(desired.brightness);
        engine.set_automatic_temperature(desired.temperature);
    }

    // ── Light commands ───────────────────────────────────────────────

    /// Turn an entity on, applying the default values and tracking policy.
    pub async fn turn_on(&self, entity_id: &str, mut params: LightParams) -> Result<()> {
        let state = self
            .inner
            .host
            .entity_state(entity_id)
            .ok_or_else(|| Error::UnknownEntity(entity_id.to_string()))?;

        if self.inner.config.is_automatic_entity(entity_id) {
            let lights = self.lights_for_entity(&state);
            info!("ON COMMAND FOR {} -> {:?}", entity_id, lights);

            let decision = policy::on_command(state.is_on, &params);
            let desired = *lock(&self.inner.state);
            if decision.fill_brightness {
                params.brightness = Some(desired.brightness);
            }
            if decision.fill_color_temp {
                params.color_temp = Some(desired.temperature);
            }
            if decision.default_transition && params.transition.is_none() {
                params.transition = self.inner.config.on_transition();
            }
            if let Some(lights) = &lights {
                self.apply_tracking(lights, &decision);
            }
        }

        // An explicit brightness overrides a pending turn-off.
        if params.brightness.is_some() {
            self.inner.timers.cancel(entity_id);
        }
        self.inner.host.turn_on(entity_id, &params).await
    }

    /// Turn an entity off and stop tracking it.
    pub async fn turn_off(&self, entity_id: &str, mut params: LightParams) -> Result<()> {
        let state = self
            .inner
            .host
            .entity_state(entity_id)
            .ok_or_else(|| Error::UnknownEntity(entity_id.to_string()))?;

        let decision = policy::off_command();
        if let Some(lights) = self.lights_for_entity(&state) {
            self.apply_tracking(&lights, &decision);
        }
        if self.inner.config.is_automatic_entity(entity_id)
            && decision.default_transition
            && params.transition.is_none()
        {
            params.transition = self.inner.config.off_transition();
        }
        info!("OFF {} {:?}", entity_id, params);
        self.inner.host.turn_off(entity_id, &params).await
    }

    // ── Services ─────────────────────────────────────────────────────

    /// Turn entities on through the tracking policy.
    pub async fn auto_on(&self, call: &ServiceCall) -> Result<()> {
        for entity_id in &call.entity_ids {
            self.turn_on(entity_id, call.params).await?;
        }
        Ok(())
    }

    /// Push the desired values straight to the bridge, bypassing the host.
    pub async fn motion_on(&self, call: &ServiceCall) -> Result<()> {
        let desired = *lock(&self.inner.state);
        let mut payload = ActionPayload::new();
        payload.brightness(&Brightness::clamped(i64::from(
            call.params.brightness.unwrap_or(desired.brightness),
        )));
        payload.color_temp(&ColorTemp::clamped(i64::from(
            call.params.color_temp.unwrap_or(desired.temperature),
        )));
        if let Some(transition) = &call.params.transition {
            payload.transition(transition);
        }

        for entity_id in &call.entity_ids {
            let Some(state) = self.inner.host.entity_state(entity_id) else {
                warn!("Unknown entity {}", entity_id);
                continue;
            };
            let Some(lights) = self.lights_for_entity(&state) else {
                continue;
            };
            self.inner.engine.apply_direct(&lights, &payload).await?;
        }
        Ok(())
    }

    /// Dim lights that are on to a quarter of the desired brightness,
    /// optionally turning them off later.
    pub async fn dim(&self, call: &ServiceCall<DimParams>) -> Result<()> {
        let desired = *lock(&self.inner.state);
        let brightness = clamp_brightness(i64::from(desired.brightness) / 4);

        for entity_id in &call.entity_ids {
            let Some(state) = self.inner.host.entity_state(entity_id) else {
                warn!("Unknown entity {}", entity_id);
                continue;
            };
            if !state.is_on {
                continue;
            }

            let params = LightParams {
                brightness: Some(brightness),
                color_temp: Some(call.params.color_temp.unwrap_or(desired.temperature)),
                transition: call.params.dim_transition,
            };
            self.turn_on(entity_id, params).await?;

            if let Some(off_after) = call.params.off_after {
                self.start_off_timer(entity_id, off_after.as_duration(), call.params.off_transition);
            }
        }
        Ok(())
    }

    fn start_off_timer(
        &self,
        entity_id: &str,
        delay: Duration,
        transition: Option<Transition>,
    ) {
        let weak = Arc::downgrade(&self.inner);
        let target = entity_id.to_string();
        self.inner.timers.start(entity_id, delay, async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let params = LightParams {
                transition,
                ..LightParams::default()
            };
            if let Err(e) = (IntegrationAdapter { inner }).turn_off(&target, params).await {
                warn!("Timed turn-off of {} failed: {}", target, e);
            }
        });
    }

    /// Reload lights and groups from the bridge.
    pub fn reload(&self) {
        self.inner.engine.request_reload();
    }

    /// Turn every light on the bridge off.
    pub fn all_lights_off(&self, transition: Option<Transition>) {
        self.inner.engine.request_all_off(transition);
    }
}
