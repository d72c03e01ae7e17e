pub mod detector;
pub mod model;
pub mod watcher;

pub use detector::ChangeDetector;
pub use model::{DetectorPolicy, RescanReason};
pub use watcher::UrlWatcher;
