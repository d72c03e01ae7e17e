pub mod markers;
pub mod policy;
pub mod runner;

pub use markers::{WriteGuard, WriteMarkers};
pub use policy::StickyPolicy;
pub use runner::stick_value;
