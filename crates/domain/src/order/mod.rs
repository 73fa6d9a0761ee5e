//! Order aggregate: the buyer-facing purchase record.
//!
//! An order carries the coarse status shown on marketplace pages. Fine
//! tracking detail lives on the shipment aggregate; the bridge maps it
//! onto the order whenever new tracking arrives.

mod aggregate;
mod events;
mod service;
mod state;

pub use aggregate::Order;
pub use events::OrderEvent;
pub use service::OrderService;
pub use state::{OrderStatus, TimelineEntry};

use thiserror::Error;

/// Business rule violations for orders.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// The order was already placed.
    #[error("order has already been placed")]
    AlreadyPlaced,

    /// The order does not exist yet.
    #[error("order has not been placed")]
    NotPlaced,

    /// The requested status change is not allowed.
    #[error("cannot move order from {from} to {to}")]
    InvalidStateTransition { from: OrderStatus, to: OrderStatus },

    /// The order has progressed past the point of cancellation.
    #[error("order in status {status} can no longer be cancelled")]
    CannotCancel { status: OrderStatus },
}
