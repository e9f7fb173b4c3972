pub mod mod_record;

pub use mod_record::{ModRecord, ModStatus};
