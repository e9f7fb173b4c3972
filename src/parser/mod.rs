pub mod changelog;
pub mod events;
pub mod preset;

pub use changelog::extract_update_timestamp;
pub use events::{FetchEvent, LineDecoder};
pub use preset::{normalize_handle, parse_preset, parse_preset_rows, ImportError, PresetEntry};
