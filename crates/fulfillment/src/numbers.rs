//! Allocation of public reference numbers.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use common::{DisputeNumber, OrderNumber, ReferenceKind, TrackingNumber};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::FulfillmentError;

/// How many candidates to try before giving up.
const MAX_ATTEMPTS: usize = 16;

/// Generates unique, human-facing reference numbers.
///
/// A number is the kind's prefix, the UTC date, and a six-hex-digit
/// suffix, e.g. `ORD-20260823-4F7A2C`. The generator keeps a claim set so
/// a suffix collision within the process is retried instead of issued
/// twice; the odds of exhausting [`MAX_ATTEMPTS`] are negligible, but the
/// failure is explicit rather than a silent duplicate.
#[derive(Clone, Default)]
pub struct NumberGenerator {
    claimed: Arc<RwLock<HashSet<String>>>,
}

impl NumberGenerator {
    /// Creates an empty generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a fresh number of the given kind.
    pub async fn next(&self, kind: ReferenceKind) -> Result<String, FulfillmentError> {
        for _ in 0..MAX_ATTEMPTS {
            let candidate = candidate(kind);
            let mut claimed = self.claimed.write().await;
            if claimed.insert(candidate.clone()) {
                return Ok(candidate);
            }
        }
        Err(FulfillmentError::NumberSpaceExhausted { kind })
    }

    /// Claims a fresh order number.
    pub async fn order_number(&self) -> Result<OrderNumber, FulfillmentError> {
        Ok(OrderNumber::from_generated(
            self.next(ReferenceKind::Order).await?,
        ))
    }

    /// Claims a fresh tracking number.
    pub async fn tracking_number(&self) -> Result<TrackingNumber, FulfillmentError> {
        Ok(TrackingNumber::from_generated(
            self.next(ReferenceKind::Shipment).await?,
        ))
    }

    /// Claims a fresh dispute number.
    pub async fn dispute_number(&self) -> Result<DisputeNumber, FulfillmentError> {
        Ok(DisputeNumber::from_generated(
            self.next(ReferenceKind::Dispute).await?,
        ))
    }
}

fn candidate(kind: ReferenceKind) -> String {
    let date = Utc::now().format("%Y%m%d");
    let uuid = Uuid::new_v4();
    let suffix: String = uuid
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();
    format!("{}-{}-{}", kind.prefix(), date, suffix)
}
