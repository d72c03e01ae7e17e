pub mod adapter;
pub mod errors;
pub mod json_file;
pub mod memory;
pub mod ports;

pub use adapter::ValueStore;
pub use errors::StoreError;
pub use json_file::JsonFileBackend;
pub use memory::MemoryBackend;
pub use ports::StoreBackend;
