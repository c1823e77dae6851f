//! Exam and flashcard pricing.
//!
//! Pure computation over an injected [`PricingConfig`] — no globals, no
//! side effects, so tests can swap tiers and rates freely.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::UserType;

/// Question-count bracket an exam falls into. Each bracket carries a fixed
/// base price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceCategory {
    A,
    B,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    FirstPurchase,
    Student,
    BulkExam,
    BulkFlashcard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discount {
    pub kind: DiscountKind,
    /// Human-facing rate, e.g. 10.0 for a 10% discount.
    pub percentage: f64,
    /// Discount value in currency units: round(base_price * rate).
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingResult {
    pub base_price: i64,
    pub discounts: Vec<Discount>,
    pub total_discount: i64,
    pub final_price: i64,
    /// Present for exam pricing, absent for flashcard bundles.
    pub price_category: Option<PriceCategory>,
}

#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Base prices per bracket: A = 10-20 questions, B = 21-30, C = 31-50.
    pub category_a_price: i64,
    pub category_b_price: i64,
    pub category_c_price: i64,

    /// Discount rates as fractions (0.10 = 10%). Eligibility is evaluated
    /// independently per rate; all eligible discounts stack additively.
    pub first_purchase_rate: f64,
    pub student_rate: f64,
    pub bulk_exam_rate: f64,
    pub bulk_flashcard_rate: f64,

    /// Minimum exam count in one calculation for the bulk-exam discount.
    pub bulk_exam_threshold: u32,
    /// Minimum flashcard count in one bundle for the bulk-flashcard discount.
    pub bulk_flashcard_threshold: usize,

    pub exam_min_price: i64,
    pub exam_max_price: i64,

    /// Used when a flashcard has no price of its own.
    pub flashcard_default_price: i64,
    pub flashcard_min_price: i64,
    pub flashcard_max_price: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            category_a_price: 800,
            category_b_price: 1000,
            category_c_price: 1500,
            first_purchase_rate: 0.10,
            student_rate: 0.20,
            bulk_exam_rate: 0.15,
            bulk_flashcard_rate: 0.10,
            bulk_exam_threshold: 5,
            bulk_flashcard_threshold: 10,
            exam_min_price: 500,
            exam_max_price: 10_000,
            flashcard_default_price: 100,
            flashcard_min_price: 50,
            flashcard_max_price: 20_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Price a single exam for a buyer.
    ///
    /// `question_count` outside [10, 50] is the caller's validation error;
    /// bracket selection here is the only range check performed.
    pub fn exam_price(
        &self,
        question_count: u32,
        user_type: UserType,
        is_first_purchase: bool,
        bulk_count: u32,
    ) -> Result<PricingResult> {
        let (category, base_price) = match question_count {
            10..=20 => (PriceCategory::A, self.config.category_a_price),
            21..=30 => (PriceCategory::B, self.config.category_b_price),
            31..=50 => (PriceCategory::C, self.config.category_c_price),
            _ => {
                return Err(AppError::BadRequest(
                    "Question count must be between 10 and 50".into(),
                ));
            }
        };

        let mut discounts = Vec::new();
        if is_first_purchase {
            discounts.push(discount(
                DiscountKind::FirstPurchase,
                base_price,
                self.config.first_purchase_rate,
            ));
        }
        if user_type == UserType::Student {
            discounts.push(discount(
                DiscountKind::Student,
                base_price,
                self.config.student_rate,
            ));
        }
        if bulk_count >= self.config.bulk_exam_threshold {
            discounts.push(discount(
                DiscountKind::BulkExam,
                base_price,
                self.config.bulk_exam_rate,
            ));
        }

        Ok(self.finish(
            base_price,
            discounts,
            Some(category),
            self.config.exam_min_price,
            self.config.exam_max_price,
        ))
    }

    /// Price a flashcard bundle. Each entry is the card's own price, with
    /// None falling back to the configured default.
    pub fn flashcard_bulk_price(
        &self,
        prices: &[Option<i64>],
        user_type: UserType,
        is_first_purchase: bool,
    ) -> PricingResult {
        let base_price: i64 = prices
            .iter()
            .map(|p| p.unwrap_or(self.config.flashcard_default_price))
            .sum();

        let mut discounts = Vec::new();
        if is_first_purchase {
            discounts.push(discount(
                DiscountKind::FirstPurchase,
                base_price,
                self.config.first_purchase_rate,
            ));
        }
        if user_type == UserType::Student {
            discounts.push(discount(
                DiscountKind::Student,
                base_price,
                self.config.student_rate,
            ));
        }
        if prices.len() >= self.config.bulk_flashcard_threshold {
            discounts.push(discount(
                DiscountKind::BulkFlashcard,
                base_price,
                self.config.bulk_flashcard_rate,
            ));
        }

        self.finish(
            base_price,
            discounts,
            None,
            self.config.flashcard_min_price,
            self.config.flashcard_max_price,
        )
    }

    fn finish(
        &self,
        base_price: i64,
        discounts: Vec<Discount>,
        price_category: Option<PriceCategory>,
        min_price: i64,
        max_price: i64,
    ) -> PricingResult {
        let total_discount: i64 = discounts.iter().map(|d| d.amount).sum();
        let final_price = clamp_price(base_price - total_discount, min_price, max_price);

        PricingResult {
            base_price,
            discounts,
            total_discount,
            final_price,
            price_category,
        }
    }
}

fn discount(kind: DiscountKind, base_price: i64, rate: f64) -> Discount {
    Discount {
        kind,
        percentage: rate * 100.0,
        amount: (base_price as f64 * rate).round() as i64,
    }
}

/// Uniform clamp order for every price path: floor at 0 first, then clamp
/// into [min, max].
fn clamp_price(price: i64, min: i64, max: i64) -> i64 {
    price.max(0).clamp(min, max)
}
