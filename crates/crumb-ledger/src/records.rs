//! [`DailyRecords`]: reads and version-guarded writes of daily records.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use crumb_core::{
  DailyRecord, RecordKey, Stock,
  record::RecordPatch,
  store::{CommitOutcome, LedgerStore, RecordWrite, Versioned, WriteBatch},
};

use crate::{Error, Result, Shared};

pub struct DailyRecords<S> {
  shared: Arc<Shared<S>>,
}

impl<S> Clone for DailyRecords<S> {
  fn clone(&self) -> Self { Self { shared: Arc::clone(&self.shared) } }
}

impl<S: LedgerStore> DailyRecords<S> {
  pub(crate) fn new(shared: Arc<Shared<S>>) -> Self { Self { shared } }

  /// The current operating day.
  pub fn today(&self) -> NaiveDate { self.shared.clock.today() }

  pub(crate) fn now(&self) -> DateTime<Utc> { self.shared.clock.now() }

  pub(crate) fn store(&self) -> &S { &self.shared.store }

  pub(crate) fn max_attempts(&self) -> u32 {
    self.shared.config.max_commit_attempts.max(1)
  }

  // ── Reads ───────────────────────────────────────────────────────────────

  pub async fn get(&self, key: RecordKey) -> Result<Option<DailyRecord>> {
    Ok(self.get_versioned(key).await?.map(|v| v.value))
  }

  pub async fn get_versioned(
    &self,
    key: RecordKey,
  ) -> Result<Option<Versioned<DailyRecord>>> {
    self.shared.store.get_record(key).await.map_err(Error::store)
  }

  /// Like [`Self::get`], but a missing record is an error.
  pub async fn require(&self, key: RecordKey) -> Result<DailyRecord> {
    let missing = key.to_string();
    self
      .get(key)
      .await?
      .ok_or_else(|| crumb_core::Error::RecordNotFound(missing).into())
  }

  pub async fn list(&self, date: NaiveDate) -> Result<Vec<DailyRecord>> {
    let records =
      self.shared.store.list_records(date).await.map_err(Error::store)?;
    Ok(records.into_iter().map(|v| v.value).collect())
  }

  /// Sellable and expected-remaining quantities of `record`.
  pub fn compute_stock(record: &DailyRecord) -> Result<Stock> {
    Ok(record.stock()?)
  }

  // ── Writes ──────────────────────────────────────────────────────────────

  /// Return the record for `key`, creating a zeroed one if absent.
  ///
  /// If another caller creates the record first, theirs is returned.
  pub async fn ensure(&self, key: RecordKey) -> Result<DailyRecord> {
    key.product_id.validate()?;
    for _ in 0..self.max_attempts() {
      if let Some(existing) = self.get(key.clone()).await? {
        return Ok(existing);
      }
      let fresh = DailyRecord::new(key.clone(), self.now());
      let batch = WriteBatch::default().record(RecordWrite::insert(fresh.clone()));
      if self.commit(batch).await? {
        tracing::info!(%key, "created daily record");
        return Ok(fresh);
      }
    }
    Err(self.gave_up())
  }

  /// Overwrite fields of an existing record atomically.
  pub async fn set_fields(
    &self,
    key: RecordKey,
    patch: &RecordPatch,
  ) -> Result<DailyRecord> {
    let (record, ()) =
      self.update(key, false, |record| record.apply_patch(patch)).await?;
    Ok(record)
  }

  /// Read-validate-write one record.
  ///
  /// `mutate` runs against a fresh copy on every attempt and must be free of
  /// side effects. When it fails nothing is written. When it leaves the
  /// record unchanged nothing is written either. With `create_missing` a
  /// zeroed record stands in for an absent one and is inserted.
  pub async fn update<T, F>(
    &self,
    key: RecordKey,
    create_missing: bool,
    mut mutate: F,
  ) -> Result<(DailyRecord, T)>
  where
    T: Send,
    F: FnMut(&mut DailyRecord) -> crumb_core::Result<T> + Send,
  {
    self
      .transact(key, create_missing, |record, _| Ok(mutate(record)?))
      .await
  }

  /// Like [`Self::update`], but `plan` may add further writes to the batch
  /// that commits the record.
  pub(crate) async fn transact<T, F>(
    &self,
    key: RecordKey,
    create_missing: bool,
    mut plan: F,
  ) -> Result<(DailyRecord, T)>
  where
    T: Send,
    F: FnMut(&mut DailyRecord, &mut WriteBatch) -> Result<T> + Send,
  {
    key.product_id.validate()?;
    for attempt in 1..=self.max_attempts() {
      if let Some(done) =
        self.attempt(&key, create_missing, &mut plan).await?
      {
        return Ok(done);
      }
      self.pause(&key, attempt).await;
    }
    Err(self.gave_up())
  }

  /// One pass of [`Self::transact`]. `None` means the commit conflicted.
  pub(crate) async fn attempt<T, F>(
    &self,
    key: &RecordKey,
    create_missing: bool,
    plan: &mut F,
  ) -> Result<Option<(DailyRecord, T)>>
  where
    T: Send,
    F: FnMut(&mut DailyRecord, &mut WriteBatch) -> Result<T> + Send,
  {
    let (mut record, expected_version) =
      match self.get_versioned(key.clone()).await? {
        Some(current) => (current.value, current.version),
        None if create_missing => (DailyRecord::new(key.clone(), self.now()), 0),
        None => {
          return Err(crumb_core::Error::RecordNotFound(key.to_string()).into());
        }
      };

    let before = record.clone();
    let mut batch = WriteBatch::default();
    let output = plan(&mut record, &mut batch)?;

    let extra = !batch.insert_wastage.is_empty() || !batch.delete_wastage.is_empty();
    if record == before && !extra {
      return Ok(Some((record, output)));
    }

    record.stock()?;
    record.updated_at = self.now();
    batch
      .records
      .insert(0, RecordWrite::update(record.clone(), expected_version));

    Ok(self.commit(batch).await?.then_some((record, output)))
  }

  /// Commit `batch`. `false` means a guard was stale and nothing was written.
  pub(crate) async fn commit(&self, batch: WriteBatch) -> Result<bool> {
    let outcome = self.shared.store.commit(batch).await.map_err(Error::store)?;
    Ok(outcome == CommitOutcome::Committed)
  }

  /// Back off before retrying a conflicted commit.
  pub(crate) async fn pause(&self, key: &RecordKey, attempt: u32) {
    tracing::debug!(%key, attempt, "record changed concurrently, retrying");
    tokio::task::yield_now().await;
  }

  pub(crate) fn gave_up(&self) -> Error {
    let attempts = self.max_attempts();
    tracing::warn!(attempts, "giving up after repeated commit conflicts");
    crumb_core::Error::ConcurrentModification { attempts }.into()
  }
}
