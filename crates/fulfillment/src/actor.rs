//! Caller identity, as asserted by the gateway in front of this service.

use common::{BuyerId, SellerId};
use domain::dispute::Party;

use crate::error::FulfillmentError;

/// Who is making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Buyer(BuyerId),
    Seller(SellerId),
    Admin,
}

impl Actor {
    /// Returns the role name used in audit fields.
    pub fn role(&self) -> &'static str {
        match self {
            Actor::Buyer(_) => "buyer",
            Actor::Seller(_) => "seller",
            Actor::Admin => "admin",
        }
    }

    /// Returns true for platform staff.
    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin)
    }

    /// Returns the dispute party this actor submits as.
    pub fn party(&self) -> Party {
        match self {
            Actor::Buyer(_) => Party::Buyer,
            Actor::Seller(_) => Party::Seller,
            Actor::Admin => Party::Admin,
        }
    }

    /// Requires the actor to be this buyer, or an admin.
    pub fn require_buyer(&self, buyer_id: BuyerId) -> Result<(), FulfillmentError> {
        match self {
            Actor::Buyer(id) if *id == buyer_id => Ok(()),
            Actor::Admin => Ok(()),
            _ => Err(FulfillmentError::Forbidden(
                "only the buyer on this order may do that".to_string(),
            )),
        }
    }

    /// Requires the actor to be this seller, or an admin.
    pub fn require_seller(&self, seller_id: SellerId) -> Result<(), FulfillmentError> {
        match self {
            Actor::Seller(id) if *id == seller_id => Ok(()),
            Actor::Admin => Ok(()),
            _ => Err(FulfillmentError::Forbidden(
                "only the seller on this order may do that".to_string(),
            )),
        }
    }

    /// Requires the actor to be one of the two parties, or an admin.
    pub fn require_party(
        &self,
        buyer_id: BuyerId,
        seller_id: SellerId,
    ) -> Result<(), FulfillmentError> {
        match self {
            Actor::Buyer(id) if *id == buyer_id => Ok(()),
            Actor::Seller(id) if *id == seller_id => Ok(()),
            Actor::Admin => Ok(()),
            _ => Err(FulfillmentError::Forbidden(
                "not a party to this dispute".to_string(),
            )),
        }
    }

    /// Requires platform staff.
    pub fn require_admin(&self) -> Result<(), FulfillmentError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(FulfillmentError::Forbidden(
                "admin access required".to_string(),
            ))
        }
    }
}
