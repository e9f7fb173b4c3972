pub mod registry;
pub mod store;

pub use registry::ModRegistry;
pub use store::{JsonRosterStore, RosterStore};
