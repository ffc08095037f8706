//! # hue_autolight
//!
//! Keeps a Philips Hue bridge's automatic brightness and color temperature
//! groups in step with a desired state.
//!
//! Two groups on the bridge are managed by name: one whose members follow
//! the automatic brightness, one whose members follow the automatic color
//! temperature. Callers change the desired membership and values; the
//! [`ReconciliationEngine`] works out the smallest set of bridge requests
//! that gets the bridge there, and only considers a value applied once the
//! bridge acknowledged exactly that value.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hue_autolight::{Config, HttpBridge, ReconciliationEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hue_autolight::Error> {
//!     let config = Config::from_json(r#"{"bridge": {"host": "192.168.1.2", "username": "key"}}"#)?;
//!     let engine = ReconciliationEngine::new(HttpBridge::new(&config.bridge)?, config.engine);
//!
//!     engine.request_reload();
//!     engine.wait_idle().await;
//!
//!     if let Some(light) = engine.light_number_from_unique_id("00:17:88:01:00:aa:bb:cc-0b") {
//!         engine.add_automatic_brightness_light(&light);
//!         engine.set_automatic_brightness(180);
//!     }
//!     engine.wait_idle().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Dirty tracking**: every desired value lives in a [`DirtyValue`] that
//!   remembers whether the bridge confirmed it
//! - **Coalescing**: brightness and temperature for the same set of lights go
//!   out as one request
//! - **Fades**: large jumps get a slow transition, small drifts snap
//! - **Host integration**: [`IntegrationAdapter`] fills in default on-values
//!   for a home automation platform and decides which lights keep following
//!   the automatic values
//! - **Off-timers**: delayed turn-off per entity with [`OffTimers`]
//!
//! ## Communication
//!
//! All traffic goes over the bridge's REST API (`GET /lights`,
//! `GET /groups`, `PUT /groups/{id}`, `PUT /groups/{id}/action`). Nothing is
//! retried immediately: a failed request leaves the value dirty until the
//! next change triggers another pass.
//!
//! ## Runtime
//!
//! The engine spawns its loop on the ambient tokio runtime. With
//! `EngineConfig::background` off, nothing is spawned and the caller drives
//! the engine with [`ReconciliationEngine::drain`].

mod adapter;
mod bridge;
mod config;
mod engine;
mod errors;
mod group;
mod history;
mod light;
mod payload;
mod response;
pub mod runtime;
#[cfg(test)]
mod testing;
mod types;
mod value;

// Re-export public API
pub use adapter::policy;
pub use adapter::{
    DimParams, EntityState, Host, IntegrationAdapter, LightParams, OffTimers, ServiceCall,
    Tracking, TrackingDecision,
};
pub use bridge::{Bridge, BridgeResponse, HttpBridge};
pub use config::{AdapterConfig, BridgeConfig, Config, EngineConfig};
pub use engine::{ReadyCallback, ReconciliationEngine, Step, StepOutcome};
pub use errors::Error;
pub use group::{Group, GroupKind};
pub use history::{Direction, HistoryEntry, HistorySummary, MessageHistory};
pub use light::Light;
pub use payload::{ActionPayload, MembershipPayload};
pub use response::{BridgeReply, ReplyError, ReplyItem};
pub use types::{Brightness, ColorTemp, PowerMode, Transition};
pub use value::{DirtyValue, LightSet, MAJOR_CHANGE_THRESHOLD, Magnitude};
