// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use jobprofit_app::{
    AppSetting, CalculationHistoryEntry, DEFAULT_VAT_RATE, HISTORY_KEY, HistoryStore, SettingKey,
    SettingValue, VatConfig, check_storable, decode_history, encode_history, record,
};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

pub const APP_NAME: &str = "jobprofit";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[("settings", &["key", "value", "updated_at"])];

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        debug!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
            debug!("validated existing schema");
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            debug!("created schema");
        }
        Ok(())
    }

    pub fn get_setting(&self, key: SettingKey) -> Result<Option<SettingValue>> {
        let raw = read_value(&self.conn, key.as_str())?;
        raw.map(|value| {
            SettingValue::parse_for_key(key, &value).ok_or_else(|| {
                anyhow!(
                    "setting `{}` has invalid value `{}`; run `jobprofit --check`, then set a valid value",
                    key.as_str(),
                    value
                )
            })
        })
        .transpose()
    }

    pub fn put_setting(&self, key: SettingKey, value: SettingValue) -> Result<()> {
        let raw = value.to_storage(key).ok_or_else(|| {
            anyhow!(
                "setting `{}` expected {:?} value",
                key.as_str(),
                key.expected_value_kind()
            )
        })?;
        write_value(&self.conn, key.as_str(), &raw)
    }

    pub fn list_settings(&self) -> Result<Vec<AppSetting>> {
        let mut settings = Vec::with_capacity(SettingKey::ALL.len());
        for key in SettingKey::ALL {
            let value = self
                .get_setting(key)?
                .unwrap_or_else(|| default_setting_value(key));
            settings.push(AppSetting { key, value });
        }
        Ok(settings)
    }

    pub fn get_vat_registered_override(&self) -> Result<Option<bool>> {
        match self.get_setting(SettingKey::VatRegistered)? {
            Some(SettingValue::Bool(value)) => Ok(Some(value)),
            Some(SettingValue::Number(_)) => bail!(
                "setting `{}` must be on/off; run `jobprofit --set-vat on|off`",
                SettingKey::VatRegistered.as_str()
            ),
            None => Ok(None),
        }
    }

    pub fn put_vat_registered(&self, registered: bool) -> Result<()> {
        self.put_setting(SettingKey::VatRegistered, SettingValue::Bool(registered))
    }

    pub fn get_vat_rate_override(&self) -> Result<Option<f64>> {
        match self.get_setting(SettingKey::VatRate)? {
            Some(SettingValue::Number(value)) => Ok(Some(value)),
            Some(SettingValue::Bool(_)) => bail!(
                "setting `{}` must be a number; run `jobprofit --set-vat-rate <percent>`",
                SettingKey::VatRate.as_str()
            ),
            None => Ok(None),
        }
    }

    pub fn put_vat_rate(&self, rate: f64) -> Result<()> {
        if !(0.0..=100.0).contains(&rate) {
            bail!("VAT rate must be between 0 and 100, got {rate}");
        }
        self.put_setting(SettingKey::VatRate, SettingValue::Number(rate))
    }

    /// Applies stored VAT settings on top of `defaults`.
    pub fn vat_config(&self, defaults: VatConfig) -> Result<VatConfig> {
        Ok(VatConfig {
            registered: self
                .get_vat_registered_override()?
                .unwrap_or(defaults.registered),
            rate: self.get_vat_rate_override()?.unwrap_or(defaults.rate),
        })
    }

    /// Strict history read; callers that must never fail use
    /// [`HistoryStore::load_history`].
    pub fn read_history(&self) -> Result<Vec<CalculationHistoryEntry>> {
        read_history(&self.conn)
    }
}

impl HistoryStore for Store {
    fn load_history(&self) -> Vec<CalculationHistoryEntry> {
        read_history_or_empty(&self.conn)
    }

    fn append_history(
        &self,
        entry: CalculationHistoryEntry,
    ) -> Result<Vec<CalculationHistoryEntry>> {
        check_storable(&entry)?;
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .context("begin history transaction")?;
        let current = read_history_or_empty(&tx);
        let history = record(entry, &current);
        let encoded = encode_history(&history).context("encode history")?;
        write_value(&tx, HISTORY_KEY, &encoded)?;
        tx.commit().context("commit history transaction")?;
        debug!(entries = history.len(), "saved calculation history");
        Ok(history)
    }

    fn clear_history(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?", params![HISTORY_KEY])
            .context("clear history")?;
        Ok(())
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("JOBPROFIT_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!(
            "cannot resolve data directory; set JOBPROFIT_DB_PATH to a writable database path"
        )
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("jobprofit.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn read_history(conn: &Connection) -> Result<Vec<CalculationHistoryEntry>> {
    match read_value(conn, HISTORY_KEY)? {
        Some(raw) => decode_history(&raw).context("decode stored history"),
        None => Ok(Vec::new()),
    }
}

fn read_history_or_empty(conn: &Connection) -> Vec<CalculationHistoryEntry> {
    match read_history(conn) {
        Ok(history) => history,
        Err(error) => {
            warn!("ignoring unreadable history: {error:#}");
            Vec::new()
        }
    }
}

fn read_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM settings WHERE key = ?",
        params![key],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .with_context(|| format!("read setting {key}"))
}

fn write_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let now = now_rfc3339()?;
    conn.execute(
        "
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
          value = excluded.value,
          updated_at = excluded.updated_at
        ",
        params![key, value, now],
    )
    .with_context(|| format!("upsert setting {key}"))?;
    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; point JOBPROFIT_DB_PATH at a jobprofit database"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; use a jobprofit-compatible database",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn default_setting_value(key: SettingKey) -> SettingValue {
    match key {
        SettingKey::VatRegistered => SettingValue::Bool(false),
        SettingKey::VatRate => SettingValue::Number(DEFAULT_VAT_RATE),
    }
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}
