//! Append-only event log.
//!
//! Tracking facts, order timeline changes, and dispute turns are all
//! persisted as immutable events. The store enforces optimistic concurrency
//! through per-aggregate versions, which is what makes single-write
//! invariants (one seller response per dispute) hold under concurrent
//! requests.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventId, StoredEvent, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use query::EventQuery;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
