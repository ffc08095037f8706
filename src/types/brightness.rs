//! Brightness on the bridge's scale.

use serde::{Deserialize, Serialize};

/// Bridge brightness from 3 to 254.
///
/// 254 is the bridge's physical ceiling; host-side values go up to 255 and
/// are clamped on the way in.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Brightness {
    pub(crate) value: u8,
}

impl Default for Brightness {
    fn default() -> Self {
        Self::new()
    }
}

impl Brightness {
    pub const MIN: u8 = 3;
    pub const MAX: u8 = 254;

    pub fn new() -> Self {
        Brightness { value: Self::MAX }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value is outside valid range (3-254).
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_autolight::Brightness;
    ///
    /// assert!(Brightness::create(2).is_none());
    /// assert!(Brightness::create(254).is_some());
    /// assert!(Brightness::create(255).is_none());
    /// ```
    pub fn create(value: u8) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Some(Brightness { value })
        } else {
            None
        }
    }

    /// Clamp any integer into the bridge range.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_autolight::Brightness;
    ///
    /// assert_eq!(Brightness::clamped(255).value(), 254);
    /// assert_eq!(Brightness::clamped(-4).value(), 3);
    /// assert_eq!(Brightness::clamped(128).value(), 128);
    /// ```
    pub fn clamped(value: i64) -> Self {
        let value = value.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        Brightness {
            value: u8::try_from(value).unwrap_or(Self::MAX),
        }
    }
}
