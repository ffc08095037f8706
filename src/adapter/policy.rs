//! Which on/off commands start or stop automatic tracking.
//!
//! A light follows the automatic brightness (or temperature) only while
//! nobody asked for a specific brightness (or temperature). The table:
//!
//! | light was | brightness given | temp given | brightness   | temperature  |
//! |-----------|------------------|------------|--------------|--------------|
//! | off       | no               | no         | fill + start | fill + start |
//! | off       | yes              | no         | stop         | fill + start |
//! | off       | no               | yes        | fill + start | stop         |
//! | off       | yes              | yes        | stop         | stop         |
//! | on        | no               | no         | fill + start | fill + start |
//! | on        | yes              | -          | stop         | keep         |
//! | on        | -                | yes        | keep         | stop         |
//!
//! Turning a light off stops both.

use strum_macros::Display;

use super::host::LightParams;

/// What to do with a light's membership in one automatic group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Tracking {
    Start,
    Stop,
    Keep,
}

/// The outcome of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingDecision {
    pub brightness: Tracking,
    pub color_temp: Tracking,
    /// Send the desired brightness with the command
    pub fill_brightness: bool,
    /// Send the desired temperature with the command
    pub fill_color_temp: bool,
    /// Apply the default transition when the command has none
    pub default_transition: bool,
}

/// Decide for a turn-on command.
pub fn on_command(was_on: bool, params: &LightParams) -> TrackingDecision {
    let bri_given = params.brightness.is_some();
    let ct_given = params.color_temp.is_some();

    if was_on {
        // Re-trigger without values, e.g. motion: follow both again.
        if !bri_given && !ct_given {
            return TrackingDecision {
                brightness: Tracking::Start,
                color_temp: Tracking::Start,
                fill_brightness: true,
                fill_color_temp: true,
                default_transition: false,
            };
        }
        return TrackingDecision {
            brightness: if bri_given { Tracking::Stop } else { Tracking::Keep },
            color_temp: if ct_given { Tracking::Stop } else { Tracking::Keep },
            fill_brightness: false,
            fill_color_temp: false,
            default_transition: false,
        };
    }

    TrackingDecision {
        brightness: if bri_given { Tracking::Stop } else { Tracking::Start },
        color_temp: if ct_given { Tracking::Stop } else { Tracking::Start },
        fill_brightness: !bri_given,
        fill_color_temp: !ct_given,
        default_transition: true,
    }
}

/// Decide for a turn-off command.
pub fn off_command() -> TrackingDecision {
    TrackingDecision {
        brightness: Tracking::Stop,
        color_temp: Tracking::Stop,
        fill_brightness: false,
        fill_color_temp: false,
        default_transition: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Tracking::*;

    fn params(bri: Option<u8>, ct: Option<u16>) -> LightParams {
        LightParams {
            brightness: bri,
            color_temp: ct,
            transition: None,
        }
    }

    #[test]
    fn test_turn_on_from_off() {
        let d = on_command(false, &params(None, None));
        assert_eq!((d.brightness, d.color_temp), (Start, Start));
        assert!(d.fill_brightness && d.fill_color_temp && d.default_transition);

        let d = on_command(false, &params(Some(100), None));
        assert_eq!((d.brightness, d.color_temp), (Stop, Start));
        assert!(!d.fill_brightness && d.fill_color_temp);

        let d = on_command(false, &params(None, Some(300)));
        assert_eq!((d.brightness, d.color_temp), (Start, Stop));
        assert!(d.fill_brightness && !d.fill_color_temp);

        let d = on_command(false, &params(Some(100), Some(300)));
        assert_eq!((d.brightness, d.color_temp), (Stop, Stop));
        assert!(!d.fill_brightness && !d.fill_color_temp);
    }

    #[test]
    fn test_retrigger() {
        let d = on_command(true, &params(None, None));
        assert_eq!((d.brightness, d.color_temp), (Start, Start));
        assert!(d.fill_brightness && d.fill_color_temp);
        assert!(!d.default_transition);

        let d = on_command(true, &params(Some(10), None));
        assert_eq!((d.brightness, d.color_temp), (Stop, Keep));
        assert!(!d.fill_brightness && !d.fill_color_temp);

        let d = on_command(true, &params(None, Some(400)));
        assert_eq!((d.brightness, d.color_temp), (Keep, Stop));
    }

    #[test]
    fn test_turn_off() {
        let d = off_command();
        assert_eq!((d.brightness, d.color_temp), (Stop, Stop));
        assert_eq!(d.brightness.to_string(), "stop");
    }
}
