pub mod profile;
pub mod reading;

pub use profile::UserProfile;
pub use reading::{latest, GlucoseReading};
