//! Human-facing reference numbers.
//!
//! Orders, shipments, and disputes each carry a prefixed reference number
//! (`ORD-…`, `SHP-…`, `DSP-…`) shown to buyers and sellers. The number is the
//! public identity of the record; aggregate UUIDs stay internal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of record a reference number identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Order,
    Shipment,
    Dispute,
}

impl ReferenceKind {
    /// Returns the number prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            ReferenceKind::Order => "ORD",
            ReferenceKind::Shipment => "SHP",
            ReferenceKind::Dispute => "DSP",
        }
    }
}

/// Error returned when parsing a malformed reference number.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {expected:?} reference number: {value}")]
pub struct InvalidReferenceNumber {
    pub expected: ReferenceKind,
    pub value: String,
}

macro_rules! reference_number {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a validated reference string.
            ///
            /// The value must carry the kind's prefix.
            pub fn parse(value: impl Into<String>) -> Result<Self, InvalidReferenceNumber> {
                let value = value.into();
                let prefix = $kind.prefix();
                if value.len() > prefix.len() + 1
                    && value.starts_with(prefix)
                    && value.as_bytes()[prefix.len()] == b'-'
                {
                    Ok(Self(value))
                } else {
                    Err(InvalidReferenceNumber {
                        expected: $kind,
                        value,
                    })
                }
            }

            /// Wraps a string produced by the number generator.
            ///
            /// Only for freshly generated values; external input goes
            /// through [`Self::parse`].
            pub fn from_generated(value: String) -> Self {
                Self(value)
            }

            /// Returns the number as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the kind of record this number identifies.
            pub fn kind() -> ReferenceKind {
                $kind
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

reference_number! {
    /// Public order number, e.g. `ORD-20260823-4F7A2C`.
    OrderNumber, ReferenceKind::Order
}

reference_number! {
    /// Public shipment tracking number, e.g. `SHP-20260823-9B01E4`.
    TrackingNumber, ReferenceKind::Shipment
}

reference_number! {
    /// Public dispute number, e.g. `DSP-20260823-C55A10`.
    DisputeNumber, ReferenceKind::Dispute
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_prefixed_numbers() {
        assert!(OrderNumber::parse("ORD-20260823-4F7A2C").is_ok());
        assert!(TrackingNumber::parse("SHP-1").is_ok());
        assert!(DisputeNumber::parse("DSP-XYZ").is_ok());
    }

    #[test]
    fn parse_rejects_wrong_prefix() {
        let err = OrderNumber::parse("SHP-20260823-4F7A2C").unwrap_err();
        assert_eq!(err.expected, ReferenceKind::Order);
        assert!(TrackingNumber::parse("SHP").is_err());
        assert!(DisputeNumber::parse("DSPX-1").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let n = OrderNumber::parse("ORD-1").unwrap();
        assert_eq!(serde_json::to_string(&n).unwrap(), "\"ORD-1\"");
    }
}
