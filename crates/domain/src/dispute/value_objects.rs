use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the buyer wants out of the dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeKind {
    Refund,
    Return,
    Quality,
    Delivery,
    Other,
}

/// Queue priority for the platform review team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputePriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// The side of the marketplace a submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Buyer,
    Seller,
    Admin,
}

/// The medium of an evidence attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Image,
    Document,
    Video,
    Other,
}

/// One piece of evidence attached to the dispute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub kind: EvidenceKind,

    /// Where the uploaded file lives in blob storage.
    pub url: String,

    pub description: Option<String>,

    pub submitted_by: Party,

    pub uploaded_at: DateTime<Utc>,
}

/// A party's written response in the negotiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyResponse {
    pub text: String,
    pub responded_at: DateTime<Utc>,
}

/// How an admin closed the dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeOutcome {
    /// The buyer's claim was upheld.
    Approved,

    /// The buyer's claim was denied.
    Rejected,

    /// Closed by mutual agreement without a ruling.
    Resolved,
}

/// The admin's closing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub outcome: DisputeOutcome,
    pub resolution: String,
    pub resolved_by: String,
    pub resolved_at: DateTime<Utc>,
}

/// What the dispute is waiting for, computed for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextAction {
    /// Human-readable prompt, e.g. "Waiting for the seller to respond".
    pub message: String,

    /// True when the seller side owes the next move.
    pub action_required: bool,

    /// True when the response deadline has passed unanswered.
    pub deadline_expired: bool,
}
