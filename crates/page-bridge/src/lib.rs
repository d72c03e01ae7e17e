pub mod errors;
pub mod events;
pub mod fake;
pub mod model;
pub mod ports;

pub use errors::PageError;
pub use events::PageEvent;
pub use fake::FakePage;
pub use model::{NodeId, NodeSnapshot, NodeTag, PageSnapshot};
pub use ports::PagePort;
