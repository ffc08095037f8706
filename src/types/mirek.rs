//! Color temperature on the mirek scale.

use serde::{Deserialize, Serialize};

/// Color temperature in mirek, with valid values from 153 to 454.
///
/// Lower values are cooler (153 ≈ 6500K), higher values warmer (454 ≈ 2200K).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ColorTemp {
    pub(crate) mirek: u16,
}

impl ColorTemp {
    pub const MIN: u16 = 153;
    pub const MAX: u16 = 454;

    pub fn mirek(&self) -> u16 {
        self.mirek
    }

    /// Returns `None` if value is outside the valid range (153-454).
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_autolight::ColorTemp;
    ///
    /// assert!(ColorTemp::create(152).is_none());
    /// assert!(ColorTemp::create(153).is_some());
    /// assert!(ColorTemp::create(454).is_some());
    /// assert!(ColorTemp::create(455).is_none());
    /// ```
    pub fn create(mirek: u16) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&mirek) {
            Some(ColorTemp { mirek })
        } else {
            None
        }
    }

    /// Clamp any integer into the mirek range.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_autolight::ColorTemp;
    ///
    /// assert_eq!(ColorTemp::clamped(100).mirek(), 153);
    /// assert_eq!(ColorTemp::clamped(500).mirek(), 454);
    /// ```
    pub fn clamped(mirek: i64) -> Self {
        let mirek = mirek.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        ColorTemp {
            mirek: u16::try_from(mirek).unwrap_or(Self::MAX),
        }
    }
}
