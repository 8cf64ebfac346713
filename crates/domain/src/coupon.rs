//! Coupon aggregate.

use common::{CouponId, Money, UserId, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by coupon transitions.
#[derive(Debug, Error)]
pub enum CouponError {
    /// The coupon has already been consumed.
    #[error("coupon {id} has already been used")]
    AlreadyUsed { id: CouponId },

    /// The coupon is not in the Used state, so there is nothing to restore.
    #[error("coupon {id} is not used, cannot restore")]
    NotUsed { id: CouponId },

    /// The coupon belongs to a different user.
    #[error("coupon {id} does not belong to user {user_id}")]
    WrongOwner { id: CouponId, user_id: UserId },
}

/// Lifecycle of an issued coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CouponStatus {
    /// Issued to a user and available for an order.
    #[default]
    Issued,

    /// Consumed by a paid order.
    Used,
}

impl CouponStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponStatus::Issued => "Issued",
            CouponStatus::Used => "Used",
        }
    }
}

impl std::fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A coupon issued to a user, carrying an order-level discount.
///
/// Consumption happens inside the payment-settlement step of the order saga;
/// restoration is its compensation (and part of order cancellation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    id: CouponId,
    owner_id: UserId,
    discount: Money,
    status: CouponStatus,
    version: Version,
}

impl Coupon {
    /// Issues a new coupon to a user.
    pub fn issue(id: CouponId, owner_id: UserId, discount: Money) -> Self {
        Self {
            id,
            owner_id,
            discount,
            status: CouponStatus::Issued,
            version: Version::initial(),
        }
    }

    /// Returns the coupon ID.
    pub fn id(&self) -> CouponId {
        self.id
    }

    /// Returns the owning user.
    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Returns the order-level discount this coupon grants.
    pub fn discount(&self) -> Money {
        self.discount
    }

    /// Returns the current status.
    pub fn status(&self) -> CouponStatus {
        self.status
    }

    /// Returns the version this state was read at.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Sets the version. Called by the store after a successful write.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Fails unless the coupon belongs to `user_id`.
    pub fn ensure_owned_by(&self, user_id: UserId) -> Result<(), CouponError> {
        if self.owner_id != user_id {
            return Err(CouponError::WrongOwner { id: self.id, user_id });
        }
        Ok(())
    }

    /// Consumes the coupon (Issued → Used).
    pub fn use_coupon(&mut self) -> Result<(), CouponError> {
        if self.status == CouponStatus::Used {
            return Err(CouponError::AlreadyUsed { id: self.id });
        }
        self.status = CouponStatus::Used;
        Ok(())
    }

    /// Restores the coupon (Used → Issued).
    pub fn restore(&mut self) -> Result<(), CouponError> {
        if self.status == CouponStatus::Issued {
            return Err(CouponError::NotUsed { id: self.id });
        }
        self.status = CouponStatus::Issued;
        Ok(())
    }
}
