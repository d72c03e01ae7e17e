pub mod controller;
pub mod policy;
pub mod title;

pub use controller::FieldController;
pub use policy::AutosavePolicy;
