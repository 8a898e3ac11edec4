//! SQL schema for the Crumb SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per operating day and product. Rows are only ever written through
-- a version-guarded insert or update.
CREATE TABLE IF NOT EXISTS daily_records (
    date               TEXT    NOT NULL,   -- ISO 8601 calendar day
    product_id         TEXT    NOT NULL,
    carryover_qty      INTEGER NOT NULL CHECK (carryover_qty >= 0),
    new_production_qty INTEGER NOT NULL CHECK (new_production_qty >= 0),
    total_available    INTEGER NOT NULL,
    reserved_qty       INTEGER NOT NULL CHECK (reserved_qty >= 0),
    sold_qty           INTEGER NOT NULL CHECK (sold_qty >= 0),
    cancelled_qty      INTEGER NOT NULL CHECK (cancelled_qty >= 0),
    actual_remaining   INTEGER,
    variance           INTEGER,
    variance_remarks   TEXT,
    status             TEXT    NOT NULL DEFAULT 'open',
    historical_edit    TEXT,               -- JSON-encoded HistoricalEdit or NULL
    carried_over       INTEGER NOT NULL DEFAULT 0,
    carryover_settled  INTEGER NOT NULL DEFAULT 0,
    updated_at         TEXT    NOT NULL,   -- ISO 8601 UTC
    version            INTEGER NOT NULL,
    PRIMARY KEY (date, product_id),
    CHECK (total_available = carryover_qty + new_production_qty)
) WITHOUT ROWID;

-- Strictly append-only. No UPDATE or DELETE is ever issued against it.
CREATE TABLE IF NOT EXISTS stock_movements (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    movement_id   TEXT    NOT NULL UNIQUE,
    product_id    TEXT    NOT NULL,
    date          TEXT    NOT NULL,
    movement_type TEXT    NOT NULL,
    qty           INTEGER NOT NULL,
    note          TEXT    NOT NULL DEFAULT '',
    actor         TEXT    NOT NULL,
    reference     TEXT,
    recorded_at   TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS wastage_records (
    wastage_id      TEXT    PRIMARY KEY,
    product_id      TEXT    NOT NULL,
    date            TEXT    NOT NULL,
    qty             INTEGER NOT NULL CHECK (qty > 0),
    reason          TEXT    NOT NULL,
    reason_category TEXT    NOT NULL,
    unit_cost       TEXT    NOT NULL,   -- decimal string
    total_cost      TEXT    NOT NULL,   -- decimal string
    source_action   TEXT    NOT NULL,
    from_production INTEGER NOT NULL DEFAULT 0,
    actor           TEXT    NOT NULL,
    created_at      TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS movements_key_idx ON stock_movements(product_id, date);
CREATE INDEX IF NOT EXISTS wastage_date_idx  ON wastage_records(date);

PRAGMA user_version = 1;
";
