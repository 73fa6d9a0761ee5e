//! Domain model for marketplace order fulfillment.
//!
//! Three event-sourced aggregates cover the lifecycle of a sale:
//!
//! - [`order::Order`] holds the buyer-facing purchase and its coarse status
//! - [`shipment::Shipment`] holds the courier-facing tracking log
//! - [`dispute::Dispute`] holds the buyer/seller negotiation after a problem
//!
//! The [`bridge`] module maps fine-grained shipment statuses onto the coarse
//! order statuses buyers see, so the two state machines never drift apart.

pub mod aggregate;
pub mod bridge;
pub mod command;
pub mod dispute;
pub mod error;
pub mod order;
pub mod shipment;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{CommandHandler, CommandResult};
pub use error::DomainError;
