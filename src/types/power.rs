//! Power mode for light control.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Power state requested for a light.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PowerMode {
    /// Turn the light on
    On,
    /// Turn the light off
    Off,
}

impl PowerMode {
    /// Value of the bridge's `on` attribute.
    pub fn is_on(self) -> bool {
        matches!(self, PowerMode::On)
    }
}
