//! [`FeedSnapshot`]: sold quantities handed over in one piece, e.g. posted
//! by a point-of-sale export.

use std::{collections::BTreeMap, convert::Infallible};

use chrono::NaiveDate;
use crumb_core::{ProductId, external::SalesFeed};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedSnapshot(pub BTreeMap<ProductId, i64>);

impl FromIterator<(ProductId, i64)> for FeedSnapshot {
  fn from_iter<I: IntoIterator<Item = (ProductId, i64)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

impl SalesFeed for FeedSnapshot {
  type Error = Infallible;

  /// The snapshot is already for the requested day.
  async fn daily_sold_quantities(
    &self,
    _date: NaiveDate,
  ) -> Result<BTreeMap<ProductId, i64>, Infallible> {
    Ok(self.0.clone())
  }
}
