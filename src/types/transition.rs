//! Transition durations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A fade duration, stored in seconds as the host expresses it.
///
/// The bridge counts transitions in tenths of a second; see
/// [`Transition::deciseconds`].
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(from = "f64", into = "f64")]
pub struct Transition {
    pub(crate) seconds: f64,
}

impl From<f64> for Transition {
    fn from(seconds: f64) -> Self {
        Transition::seconds(seconds)
    }
}

impl From<Transition> for f64 {
    fn from(transition: Transition) -> Self {
        transition.seconds
    }
}

impl Transition {
    pub const MAX_SECONDS: f64 = 6553.0;

    /// Clamp a duration in seconds into 0-6553.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_autolight::Transition;
    ///
    /// assert_eq!(Transition::seconds(1.5).deciseconds(), 15);
    /// assert_eq!(Transition::seconds(-3.0).deciseconds(), 0);
    /// assert_eq!(Transition::seconds(1e9).deciseconds(), 65530);
    /// ```
    pub fn seconds(seconds: f64) -> Self {
        let seconds = if seconds.is_finite() {
            seconds.clamp(0.0, Self::MAX_SECONDS)
        } else {
            0.0
        };
        Transition { seconds }
    }

    /// A transition expressed in bridge units.
    pub fn from_deciseconds(deciseconds: u16) -> Self {
        Transition {
            seconds: f64::from(deciseconds) / 10.0,
        }
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.seconds
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs_f64(self.seconds)
    }

    /// The `transitiontime` value for the bridge.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn deciseconds(&self) -> u16 {
        (self.seconds * 10.0).round() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_clamps() {
        let t: Transition = serde_json::from_str("-5.0").unwrap();
        assert_eq!(t.as_secs_f64(), 0.0);
        assert_eq!(t.as_duration(), Duration::ZERO);

        let t: Transition = serde_json::from_str("1e12").unwrap();
        assert_eq!(t.as_secs_f64(), Transition::MAX_SECONDS);

        assert_eq!(serde_json::to_string(&Transition::seconds(2.5)).unwrap(), "2.5");
    }
}
