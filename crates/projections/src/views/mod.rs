//! Read model views.

pub mod dispute_queue;
pub mod tracking_directory;

pub use dispute_queue::{DisputeQueueEntry, DisputeQueueView};
pub use tracking_directory::{TrackingDirectoryView, TrackingHandle};
