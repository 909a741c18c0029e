//! Value objects - immutable types validated at construction.

mod capture_status;
mod game_mode;
mod names;
mod species;
mod variant;

pub use capture_status::CaptureStatus;
pub use game_mode::GameMode;
pub use names::{CreatureName, LocationName, Nickname, PlaythroughName, MAX_NICKNAME_LENGTH};
pub use species::{Composition, SpeciesId};
pub use variant::{CycleDirection, VariantKey};
