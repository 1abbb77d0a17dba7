pub mod ledger;
pub mod position;
pub mod recorder;
pub mod state;
pub mod tracker;

pub use ledger::{continue_reading, HistoryEntry, HistoryLedger};
pub use position::{
    clamp_position, compute_absolute_position, compute_progress_percentage, locate,
    resolve_position,
};
pub use recorder::{
    record_progress, Clock, ProgressKey, ProgressRecorder, ProgressUpdate, SystemClock,
};
pub use state::{ReadingPosition, ReadingStatus};
pub use tracker::ProgressTracker;
