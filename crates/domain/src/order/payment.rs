//! Payment status of an order.

use serde::{Deserialize, Serialize};

/// Payment status, tracked independently of the order status.
///
/// ```text
/// Pending ──┬──► Paid ──► Refunded
///           └──► Failed ──┬──► Paid
///                         └──► Pending
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Returns true if the payment can move from this status to `target`.
    pub fn can_transition_to(&self, target: PaymentStatus) -> bool {
        matches!(
            (self, target),
            (PaymentStatus::Pending, PaymentStatus::Paid | PaymentStatus::Failed)
                | (PaymentStatus::Failed, PaymentStatus::Paid | PaymentStatus::Pending)
                | (PaymentStatus::Paid, PaymentStatus::Refunded)
        )
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
