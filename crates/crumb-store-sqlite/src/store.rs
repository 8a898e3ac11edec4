//! [`SqliteStore`]: the SQLite implementation of [`LedgerStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crumb_core::{
  DailyRecord, ProductId, RecordKey,
  movement::StockMovement,
  store::{CommitOutcome, LedgerStore, Versioned, WriteBatch},
  wastage::WastageRecord,
};

use crate::{
  Result,
  encode::{
    MOVEMENT_COLUMNS, RECORD_COLUMNS, RawMovement, RawRecord, RawWastage,
    WASTAGE_COLUMNS, encode_date, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Crumb ledger store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// A record write ready to cross into the connection thread.
struct EncodedWrite {
  row:              RawRecord,
  expected_version: i64,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Version-guarded write of one record. Returns `false` if the guard failed.
fn write_record(
  tx: &rusqlite::Transaction<'_>,
  write: &EncodedWrite,
) -> rusqlite::Result<bool> {
  let r = &write.row;
  let changed = if write.expected_version == 0 {
    tx.execute(
      "INSERT INTO daily_records (
         date, product_id, carryover_qty, new_production_qty, total_available,
         reserved_qty, sold_qty, cancelled_qty, actual_remaining, variance,
         variance_remarks, status, historical_edit, carried_over,
         carryover_settled, updated_at, version
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
       ON CONFLICT (date, product_id) DO NOTHING",
      rusqlite::params![
        r.date,
        r.product_id,
        r.carryover_qty,
        r.new_production_qty,
        r.total_available,
        r.reserved_qty,
        r.sold_qty,
        r.cancelled_qty,
        r.actual_remaining,
        r.variance,
        r.variance_remarks,
        r.status,
        r.historical_edit,
        r.carried_over,
        r.carryover_settled,
        r.updated_at,
        r.version,
      ],
    )?
  } else {
    tx.execute(
      "UPDATE daily_records SET
         carryover_qty      = ?3,
         new_production_qty = ?4,
         total_available    = ?5,
         reserved_qty       = ?6,
         sold_qty           = ?7,
         cancelled_qty      = ?8,
         actual_remaining   = ?9,
         variance           = ?10,
         variance_remarks   = ?11,
         status             = ?12,
         historical_edit    = ?13,
         carried_over       = ?14,
         carryover_settled  = ?15,
         updated_at         = ?16,
         version            = ?17
       WHERE date = ?1 AND product_id = ?2 AND version = ?18",
      rusqlite::params![
        r.date,
        r.product_id,
        r.carryover_qty,
        r.new_production_qty,
        r.total_available,
        r.reserved_qty,
        r.sold_qty,
        r.cancelled_qty,
        r.actual_remaining,
        r.variance,
        r.variance_remarks,
        r.status,
        r.historical_edit,
        r.carried_over,
        r.carryover_settled,
        r.updated_at,
        r.version,
        write.expected_version,
      ],
    )?
  };
  Ok(changed == 1)
}

// ─── LedgerStore impl ────────────────────────────────────────────────────────

impl LedgerStore for SqliteStore {
  type Error = crate::Error;

  // ── Daily records ─────────────────────────────────────────────────────────

  async fn get_record(&self, key: RecordKey) -> Result<Option<Versioned<DailyRecord>>> {
    let date_str    = encode_date(key.date);
    let product_str = key.product_id.as_str().to_owned();

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {RECORD_COLUMNS} FROM daily_records
               WHERE date = ?1 AND product_id = ?2"
            ),
            rusqlite::params![date_str, product_str],
            RawRecord::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRecord::into_versioned).transpose()
  }

  async fn list_records(&self, date: NaiveDate) -> Result<Vec<Versioned<DailyRecord>>> {
    let date_str = encode_date(date);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORD_COLUMNS} FROM daily_records
           WHERE date = ?1 ORDER BY product_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![date_str], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_versioned).collect()
  }

  async fn commit(&self, batch: WriteBatch) -> Result<CommitOutcome> {
    let writes = batch
      .records
      .iter()
      .map(|w| {
        Ok(EncodedWrite {
          row:              RawRecord::encode(&w.record, w.expected_version + 1)?,
          expected_version: w.expected_version as i64,
        })
      })
      .collect::<Result<Vec<_>>>()?;
    let inserts: Vec<RawWastage> =
      batch.insert_wastage.iter().map(RawWastage::encode).collect();
    let deletes: Vec<String> =
      batch.delete_wastage.iter().copied().map(encode_uuid).collect();

    let outcome = self
      .conn
      .call(move |conn| {
        // Dropping `tx` without committing rolls everything back.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for write in &writes {
          if !write_record(&tx, write)? {
            return Ok(CommitOutcome::Conflict);
          }
        }

        for id in &deletes {
          let removed = tx.execute(
            "DELETE FROM wastage_records WHERE wastage_id = ?1",
            rusqlite::params![id],
          )?;
          if removed == 0 {
            return Ok(CommitOutcome::Conflict);
          }
        }

        for w in &inserts {
          tx.execute(
            &format!(
              "INSERT INTO wastage_records ({WASTAGE_COLUMNS})
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            rusqlite::params![
              w.wastage_id,
              w.product_id,
              w.date,
              w.qty,
              w.reason,
              w.reason_category,
              w.unit_cost,
              w.total_cost,
              w.source_action,
              w.from_production,
              w.actor,
              w.created_at,
            ],
          )?;
        }

        tx.commit()?;
        Ok(CommitOutcome::Committed)
      })
      .await?;

    if outcome == CommitOutcome::Conflict {
      tracing::debug!("commit rejected: stale version or missing wastage row");
    }
    Ok(outcome)
  }

  // ── Movements ─────────────────────────────────────────────────────────────

  async fn append_movement(&self, movement: StockMovement) -> Result<()> {
    let m = RawMovement::encode(&movement);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO stock_movements ({MOVEMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
          ),
          rusqlite::params![
            m.movement_id,
            m.product_id,
            m.date,
            m.movement_type,
            m.qty,
            m.note,
            m.actor,
            m.reference,
            m.recorded_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn movements(
    &self,
    product_id: ProductId,
    date:       NaiveDate,
  ) -> Result<Vec<StockMovement>> {
    let product_str = product_id.as_str().to_owned();
    let date_str    = encode_date(date);

    let raws: Vec<RawMovement> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MOVEMENT_COLUMNS} FROM stock_movements
           WHERE product_id = ?1 AND date = ?2
           ORDER BY seq DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![product_str, date_str], RawMovement::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMovement::into_movement).collect()
  }

  // ── Wastage ───────────────────────────────────────────────────────────────

  async fn get_wastage(&self, wastage_id: Uuid) -> Result<Option<WastageRecord>> {
    let id_str = encode_uuid(wastage_id);

    let raw: Option<RawWastage> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {WASTAGE_COLUMNS} FROM wastage_records WHERE wastage_id = ?1"
            ),
            rusqlite::params![id_str],
            RawWastage::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawWastage::into_wastage).transpose()
  }

  async fn list_wastage(&self, date: NaiveDate) -> Result<Vec<WastageRecord>> {
    let date_str = encode_date(date);

    let raws: Vec<RawWastage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {WASTAGE_COLUMNS} FROM wastage_records
           WHERE date = ?1 ORDER BY created_at, wastage_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![date_str], RawWastage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawWastage::into_wastage).collect()
  }
}
