//! Wastage records and the closed reason taxonomy.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::record::{ProductId, RecordKey};

/// Why stock left the shelf without being sold.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WastageReason {
  /// Stale or past its sell-by date.
  StaleDiscarded,
  Damaged,
  RecycledVariantA,
  RecycledVariantB,
  RecycledVariantC,
  RecycledOther,
  EmployeeMeal,
  Sample,
  Donation,
  GivenFree,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReasonCategory {
  Wastage,
  Recycled,
  Giveaway,
}

impl WastageReason {
  /// The fixed reason → category table.
  pub const fn category(self) -> ReasonCategory {
    match self {
      Self::StaleDiscarded | Self::Damaged => ReasonCategory::Wastage,
      Self::RecycledVariantA
      | Self::RecycledVariantB
      | Self::RecycledVariantC
      | Self::RecycledOther => ReasonCategory::Recycled,
      Self::EmployeeMeal | Self::Sample | Self::Donation | Self::GivenFree => {
        ReasonCategory::Giveaway
      }
    }
  }
}

/// What triggered the wastage.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceAction {
  /// Units taken off today's shelf; today's record is reduced.
  #[default]
  StockRemoval,
  /// Yesterday's leftover not carried forward; it never entered today's
  /// record.
  CarryoverDisposal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WastageRecord {
  pub wastage_id:      Uuid,
  pub product_id:      ProductId,
  /// Operating day the wastage was recorded on.
  pub date:            NaiveDate,
  pub qty:             i64,
  pub reason:          WastageReason,
  /// Derived from `reason` at creation and stored as-is.
  pub reason_category: ReasonCategory,
  pub unit_cost:       Decimal,
  pub total_cost:      Decimal,
  pub source_action:   SourceAction,
  /// Units taken from today's production; the rest came from carryover.
  pub from_production: i64,
  pub actor:           String,
  pub created_at:      DateTime<Utc>,
}

impl WastageRecord {
  /// The daily record this wastage belongs to.
  pub fn key(&self) -> RecordKey {
    RecordKey::new(self.date, self.product_id.clone())
  }
}

/// Input to the wastage tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWastage {
  pub product_id:    ProductId,
  pub qty:           i64,
  pub reason:        WastageReason,
  #[serde(default)]
  pub source_action: SourceAction,
}

/// Per-category totals for one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
  pub qty:        i64,
  pub total_cost: Decimal,
}
