pub mod cache;
pub mod commander;
pub mod info;

pub use cache::{CargoEntry, SessionState};
pub use commander::CommanderInfo;
pub use info::LocationInfo;
