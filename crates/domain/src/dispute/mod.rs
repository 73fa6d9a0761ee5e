//! Dispute aggregate: the buyer/seller negotiation after a problem.
//!
//! A dispute alternates between the parties under a response deadline.
//! The seller gets exactly one response; the buyer may refine theirs each
//! turn. Either side can escalate to platform review, and an admin closes
//! the dispute with an outcome.

mod aggregate;
mod events;
mod service;
mod state;
mod value_objects;

pub use aggregate::{Dispute, RESPONSE_WINDOW_DAYS};
pub use events::DisputeEvent;
pub use service::DisputeService;
pub use state::DisputeStatus;
pub use value_objects::{
    DisputeKind, DisputeOutcome, DisputePriority, Evidence, EvidenceKind, NextAction, Party,
    PartyResponse, ResolutionRecord,
};

use thiserror::Error;

/// Business rule violations for disputes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DisputeError {
    /// The dispute was already opened.
    #[error("dispute has already been opened")]
    AlreadyOpened,

    /// The dispute does not exist yet.
    #[error("dispute has not been opened")]
    NotOpened,

    /// The dispute reached a terminal status and takes no more input.
    #[error("dispute is closed in status {status}")]
    Closed { status: DisputeStatus },

    /// The seller already used their single response.
    #[error("seller response has already been submitted")]
    SellerResponseAlreadySubmitted,

    /// The seller tried to respond out of turn.
    #[error("dispute in status {status} is not awaiting the seller")]
    NotSellersTurn { status: DisputeStatus },

    /// The buyer tried to respond out of turn.
    #[error("dispute in status {status} is not awaiting the buyer")]
    NotBuyersTurn { status: DisputeStatus },
}
