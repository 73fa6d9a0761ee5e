//! Fulfillment coordinators: the write-side workflows that tie the
//! aggregates together.
//!
//! The tracking coordinator keeps orders and shipments in step as courier
//! scans arrive; the dispute coordinator guards who may act on a dispute
//! and when. Both sit between the HTTP layer and the domain services.

pub mod actor;
pub mod blob;
pub mod coordinator;
pub mod disputes;
pub mod error;
pub mod numbers;

pub use actor::Actor;
pub use blob::{BlobStore, InMemoryBlobStore, UploadFile};
pub use coordinator::{TrackingCoordinator, TrackingSubmission};
pub use disputes::DisputeCoordinator;
pub use error::FulfillmentError;
pub use numbers::NumberGenerator;
