pub mod driver;
pub mod postprocess;
pub mod probe;
pub mod progress;
pub mod runscript;
pub mod sink;
pub mod updater;

pub use driver::FetchDriver;
pub use postprocess::PostProcessor;
pub use probe::StalenessProber;
pub use progress::{BufferProgress, ConsoleProgress, ProgressReporter, ProgressSink};
pub use runscript::{RunScripts, RunscriptBuilder};
pub use sink::{EventSink, UpdateSink, ValidateSink};
pub use updater::ModUpdater;
