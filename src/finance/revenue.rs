//! Revenue split between content designer and platform.

use serde::Serialize;

use crate::models::RevenueSharingSettings;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RevenueSplit {
    pub designer_share: i64,
    pub platform_fee: i64,
}

/// Split a completed purchase amount.
///
/// The designer share is floored integer arithmetic and the platform fee is
/// the remainder, so `designer_share + platform_fee == amount` holds exactly
/// for every input — no rounding leakage.
pub fn split_amount(amount: i64, settings: &RevenueSharingSettings) -> RevenueSplit {
    let designer_share = amount * settings.designer_share_percent / 100;
    RevenueSplit {
        designer_share,
        platform_fee: amount - designer_share,
    }
}
