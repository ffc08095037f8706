//! Desired-value cells with dirty tracking.

use std::collections::BTreeSet;
use std::fmt;

/// Difference above which a numeric change counts as major.
pub const MAJOR_CHANGE_THRESHOLD: u64 = 10;

/// Classifies how large a change between two values is.
///
/// Major changes are sent to the bridge with a slow transition so the
/// lights fade instead of jumping.
pub trait Magnitude: PartialEq {
    /// Returns `true` if moving from `from` to `to` is a major change.
    fn is_major_change(from: Option<&Self>, to: &Self) -> bool;
}

macro_rules! numeric_magnitude {
    ($($t:ty),*) => {
        $(
            impl Magnitude for $t {
                fn is_major_change(from: Option<&Self>, to: &Self) -> bool {
                    from.is_none_or(|from| u64::from(from.abs_diff(*to)) > MAJOR_CHANGE_THRESHOLD)
                }
            }
        )*
    };
}

numeric_magnitude!(u8, u16, u32, i32);

impl Magnitude for BTreeSet<String> {
    fn is_major_change(_from: Option<&Self>, _to: &Self) -> bool {
        false
    }
}

/// A single desired value together with its acknowledgement state.
///
/// `dirty` is set whenever the value differs from the last value the bridge
/// confirmed. The value itself is never cleared by acknowledgement.
///
/// # Example
///
/// ```
/// use hue_autolight::DirtyValue;
///
/// let mut bri: DirtyValue<u8> = DirtyValue::empty();
/// assert!(bri.set(100));
/// assert!(bri.is_dirty() && bri.is_major());
///
/// bri.clean();
/// assert!(!bri.set(100));
/// assert!(!bri.is_dirty());
///
/// assert!(bri.set(95));
/// assert!(!bri.is_major());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DirtyValue<T> {
    value: Option<T>,
    dirty: bool,
    major: bool,
}

impl<T> Default for DirtyValue<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> DirtyValue<T> {
    /// A cell with no value yet.
    pub fn empty() -> Self {
        DirtyValue {
            value: None,
            dirty: false,
            major: false,
        }
    }

    /// A clean cell holding a value the bridge already reports.
    pub fn new(value: T) -> Self {
        DirtyValue {
            value: Some(value),
            dirty: false,
            major: false,
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_major(&self) -> bool {
        self.major
    }

    /// Replace the value and force it dirty, dropping any acknowledgement
    /// state.
    pub fn reset(&mut self, value: T) {
        self.value = Some(value);
        self.dirty = true;
        self.major = false;
    }

    /// Mark the current value as confirmed by the bridge.
    pub fn clean(&mut self) {
        self.dirty = false;
        self.major = false;
    }
}

impl<T: Magnitude> DirtyValue<T> {
    /// Set a new desired value.
    ///
    /// Returns `false` without touching the cell when the value is unchanged.
    pub fn set(&mut self, value: T) -> bool {
        if self.value.as_ref() == Some(&value) {
            return false;
        }
        self.major = T::is_major_change(self.value.as_ref(), &value);
        self.value = Some(value);
        self.dirty = true;
        true
    }

    /// Clean the cell only if `acknowledged` still matches the desired value.
    ///
    /// A value that changed again while the request was in flight stays
    /// dirty. Returns `true` if the cell was cleaned.
    pub fn acknowledge(&mut self, acknowledged: &T) -> bool {
        if self.value.as_ref() == Some(acknowledged) {
            self.clean();
            true
        } else {
            false
        }
    }
}

impl<T: fmt::Debug> fmt::Display for DirtyValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{v:?}")?,
            None => write!(f, "None")?,
        }
        if self.dirty {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// Membership of a bridge group: a set of bridge-local light numbers.
pub type LightSet = DirtyValue<BTreeSet<String>>;

impl DirtyValue<BTreeSet<String>> {
    /// Light numbers currently desired, empty if never set.
    pub fn members(&self) -> BTreeSet<String> {
        self.value.clone().unwrap_or_default()
    }

    pub fn contains(&self, light: &str) -> bool {
        self.value.as_ref().is_some_and(|set| set.contains(light))
    }

    pub fn is_empty(&self) -> bool {
        self.value.as_ref().is_none_or(BTreeSet::is_empty)
    }

    /// Add a light, marking the set dirty if it was not already a member.
    pub fn insert(&mut self, light: &str) -> bool {
        let set = self.value.get_or_insert_with(BTreeSet::new);
        if set.insert(light.to_string()) {
            self.dirty = true;
            true
        } else {
            false
        }
    }

    /// Remove a light, marking the set dirty if it was a member.
    pub fn remove(&mut self, light: &str) -> bool {
        let removed = self.value.as_mut().is_some_and(|set| set.remove(light));
        if removed {
            self.dirty = true;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_marks_dirty_only_on_change() {
        let mut value: DirtyValue<u8> = DirtyValue::new(100);
        assert!(!value.is_dirty());

        assert!(!value.set(100));
        assert!(!value.is_dirty());

        assert!(value.set(120));
        assert!(value.is_dirty());

        value.clean();
        assert!(!value.set(120));
        assert!(!value.is_dirty());
        assert_eq!(value.value(), Some(&120));
    }

    #[test]
    fn test_set_twice_is_idempotent() {
        let mut value: DirtyValue<u16> = DirtyValue::new(200);
        assert!(value.set(210));
        value.clean();
        assert!(value.set(220));
        assert!(!value.set(220));
        assert!(value.is_dirty());
    }

    #[test]
    fn test_major_change_classification() {
        let mut value: DirtyValue<u8> = DirtyValue::new(100);
        value.set(95);
        assert!(!value.is_major());

        let mut value: DirtyValue<u8> = DirtyValue::new(100);
        value.set(80);
        assert!(value.is_major());

        let mut value: DirtyValue<u16> = DirtyValue::empty();
        value.set(153);
        assert!(value.is_major());

        let mut value: DirtyValue<u8> = DirtyValue::new(100);
        value.set(110);
        assert!(!value.is_major(), "a difference of exactly 10 is minor");
    }

    #[test]
    fn test_reset_always_dirty() {
        let mut value: DirtyValue<u8> = DirtyValue::new(0);
        value.reset(0);
        assert!(value.is_dirty());
        assert!(!value.is_major());

        let mut value: DirtyValue<u8> = DirtyValue::empty();
        value.set(200);
        assert!(value.is_major());
        value.reset(0);
        assert!(value.is_dirty());
        assert!(!value.is_major());
    }

    #[test]
    fn test_clean_keeps_value() {
        let mut value: DirtyValue<u8> = DirtyValue::empty();
        value.set(42);
        value.clean();
        assert_eq!(value.value(), Some(&42));
        assert!(!value.is_dirty());
        assert!(!value.is_major());
    }

    #[test]
    fn test_acknowledge_stale_value_stays_dirty() {
        let mut value: DirtyValue<u8> = DirtyValue::empty();
        value.set(100);
        value.set(150);
        assert!(!value.acknowledge(&100));
        assert!(value.is_dirty());
        assert!(value.acknowledge(&150));
        assert!(!value.is_dirty());
    }

    #[test]
    fn test_light_set_uses_set_equality() {
        let mut lights = LightSet::new(set_of(&["1", "2"]));
        assert!(!lights.set(set_of(&["2", "1"])));
        assert!(!lights.is_dirty());
        assert!(lights.set(set_of(&["1"])));
        assert!(lights.is_dirty());
        assert!(!lights.is_major());
    }

    #[test]
    fn test_light_set_membership() {
        let mut lights = LightSet::empty();
        assert!(lights.is_empty());
        assert!(lights.insert("5"));
        assert!(lights.is_dirty());
        lights.clean();
        assert!(!lights.insert("5"));
        assert!(!lights.is_dirty());
        assert!(lights.contains("5"));
        assert!(!lights.remove("6"));
        assert!(lights.remove("5"));
        assert!(lights.is_dirty());
        assert!(lights.is_empty());
    }

    #[test]
    fn test_set_back_to_confirmed_value_stays_dirty() {
        let mut value: DirtyValue<u8> = DirtyValue::new(100);
        assert!(value.set(120));
        assert!(value.set(100));
        assert!(value.is_dirty(), "the write of 120 may still be in flight");
        assert!(value.acknowledge(&100));
        assert!(!value.is_dirty());
    }

    #[test]
    fn test_light_set_remove_from_unset() {
        let mut lights = LightSet::empty();
        assert!(!lights.remove("1"));
        assert!(!lights.is_dirty());

        let mut lights = LightSet::new(set_of(&["1", "2"]));
        assert!(lights.remove("2"));
        assert!(lights.is_dirty());
        assert_eq!(lights.members(), set_of(&["1"]));
    }

    #[test]
    fn test_display_marks_dirty() {
        let mut value: DirtyValue<u8> = DirtyValue::new(3);
        assert_eq!(value.to_string(), "3");
        value.set(4);
        assert_eq!(value.to_string(), "4*");
    }
}
