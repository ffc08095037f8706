//! Value types for light control parameters.

mod brightness;
mod mirek;
mod power;
mod transition;

pub use brightness::Brightness;
pub use mirek::ColorTemp;
pub use power::PowerMode;
pub use transition::Transition;
