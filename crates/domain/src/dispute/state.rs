use serde::{Deserialize, Serialize};

/// The dispute's place in the negotiation.
///
/// `SellerResponse` and `BuyerResponse` name whose response arrived last,
/// which is the opposite of whose turn it is: a dispute in
/// `SellerResponse` is waiting on the buyer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    #[default]
    New,
    UnderReview,
    SellerResponse,
    BuyerResponse,
    Approved,
    Rejected,
    Resolved,
}

impl DisputeStatus {
    /// Returns true for statuses the dispute never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DisputeStatus::Approved | DisputeStatus::Rejected | DisputeStatus::Resolved
        )
    }

    /// Returns true while the dispute still blocks a new one on the order.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::New => "new",
            DisputeStatus::UnderReview => "under_review",
            DisputeStatus::SellerResponse => "seller_response",
            DisputeStatus::BuyerResponse => "buyer_response",
            DisputeStatus::Approved => "approved",
            DisputeStatus::Rejected => "rejected",
            DisputeStatus::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
