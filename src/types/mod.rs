//! Value types for light control parameters.

mod brightness;
mod light_id;
mod power;

pub use brightness::Brightness;
pub use light_id::{InvalidLightId, LightId};
pub use power::PowerMode;
