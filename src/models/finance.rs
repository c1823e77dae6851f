use serde::{Deserialize, Serialize};

/// Revenue split between a content designer and the platform.
///
/// The two percentages must sum to exactly 100; validated wherever settings
/// are written. Stored globally (single row) with optional per-exam
/// overrides that fall back to the global row when absent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RevenueSharingSettings {
    pub designer_share_percent: i64,
    pub platform_fee_percent: i64,
}

impl RevenueSharingSettings {
    pub fn validate(&self) -> bool {
        (0..=100).contains(&self.designer_share_percent)
            && (0..=100).contains(&self.platform_fee_percent)
            && self.designer_share_percent + self.platform_fee_percent == 100
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRevenueSharingSettings {
    pub designer_share_percent: i64,
    pub platform_fee_percent: i64,
}
