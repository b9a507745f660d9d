// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use jobprofit_app::{
    CalculationHistoryEntry, HISTORY_KEY, HISTORY_LIMIT, HistoryStore, VatConfig, calculate,
    validate,
};
use jobprofit_db::{Store, validate_db_path};
use jobprofit_testkit::{
    fixture_datetime, fixture_timestamp, history_entry, overflowing_inputs, temp_db_path,
};
use std::collections::BTreeSet;
use std::thread;
use time::Duration;

#[test]
fn validate_db_path_rejects_uri_forms() {
    assert!(validate_db_path("file:test.db").is_err());
    assert!(validate_db_path("https://example.com/db.sqlite").is_err());
    assert!(validate_db_path("db.sqlite?mode=ro").is_err());
    assert!(validate_db_path("").is_err());
    assert!(validate_db_path(":memory:").is_ok());
    assert!(validate_db_path("/tmp/jobprofit.db").is_ok());
}

#[test]
fn bootstrap_is_idempotent() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    store.bootstrap()?;
    assert_eq!(store.list_settings()?.len(), 2);
    Ok(())
}

#[test]
fn bootstrap_rejects_schema_missing_required_column() -> Result<()> {
    let store = Store::open_memory()?;
    store.raw_connection().execute_batch(
        "
        CREATE TABLE settings (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );
        ",
    )?;

    let err = store
        .bootstrap()
        .expect_err("schema validation should fail");
    let message = err.to_string();
    assert!(message.contains("table `settings` is missing required columns"));
    assert!(message.contains("updated_at"));
    Ok(())
}

#[test]
fn bootstrap_rejects_foreign_database() -> Result<()> {
    let store = Store::open_memory()?;
    store
        .raw_connection()
        .execute_batch("CREATE TABLE projects (id INTEGER PRIMARY KEY);")?;

    let err = store
        .bootstrap()
        .expect_err("foreign database should be rejected");
    assert!(err.to_string().contains("missing required table `settings`"));
    Ok(())
}

#[test]
fn history_survives_reopen() -> Result<()> {
    let (_dir, db_path) = temp_db_path()?;
    let at = fixture_timestamp();
    {
        let store = Store::open(&db_path)?;
        store.bootstrap()?;
        store.append_history(history_entry(at, "Rewire"))?;
        store.append_history(history_entry(at + Duration::minutes(5), "EV charger"))?;
    }

    let store = Store::open(&db_path)?;
    store.bootstrap()?;
    let history = store.load_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].job_type, "EV charger");
    assert_eq!(history[1].job_type, "Rewire");
    assert_eq!(history[1].timestamp, at);
    assert_eq!(history[1].inputs.material_cost, 650.0);

    let raw: String = store.raw_connection().query_row(
        "SELECT value FROM settings WHERE key = ?",
        rusqlite::params![HISTORY_KEY],
        |row| row.get(0),
    )?;
    assert!(raw.contains(fixture_datetime()));
    Ok(())
}

#[test]
fn overflowing_entry_is_refused_and_history_kept() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    for minute in 0..5 {
        store.append_history(history_entry(
            fixture_timestamp() + Duration::minutes(minute),
            &format!("job {minute}"),
        ))?;
    }

    let inputs = overflowing_inputs();
    assert!(validate(&inputs).is_empty());
    let results = calculate(&inputs, VatConfig::default());
    assert!(results.minimum_quote_ex_vat.is_infinite());
    let entry = CalculationHistoryEntry::new(
        fixture_timestamp() + Duration::minutes(10),
        "Huge",
        inputs,
        results,
    );

    let err = store
        .append_history(entry)
        .expect_err("non-finite entry should not be stored");
    assert!(err.to_string().contains("too large to store"));
    assert_eq!(store.read_history()?.len(), 5);

    let history = store.append_history(history_entry(
        fixture_timestamp() + Duration::minutes(20),
        "after",
    ))?;
    assert_eq!(history.len(), 6);
    assert_eq!(history[0].job_type, "after");
    Ok(())
}

#[test]
fn history_is_capped_at_limit() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    for minute in 0..15 {
        store.append_history(history_entry(
            fixture_timestamp() + Duration::minutes(minute),
            &format!("job {minute}"),
        ))?;
    }

    let history = store.load_history();
    assert_eq!(history.len(), HISTORY_LIMIT);
    assert_eq!(history[0].job_type, "job 14");
    assert_eq!(history[HISTORY_LIMIT - 1].job_type, "job 5");
    Ok(())
}

#[test]
fn corrupt_history_is_replaced_on_next_append() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    store.raw_connection().execute(
        "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)",
        rusqlite::params![HISTORY_KEY, "not json at all", "2026-02-19T12:00:00Z"],
    )?;

    assert!(store.load_history().is_empty());
    let history = store.append_history(history_entry(fixture_timestamp(), "Fresh start"))?;
    assert_eq!(history.len(), 1);
    assert_eq!(store.read_history()?.len(), 1);
    Ok(())
}

#[test]
fn clear_history_empties_stored_list() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    store.append_history(history_entry(fixture_timestamp(), "Rewire"))?;
    store.clear_history()?;
    assert!(store.load_history().is_empty());

    let history = store.append_history(history_entry(fixture_timestamp(), "Again"))?;
    assert_eq!(history.len(), 1);
    Ok(())
}

#[test]
fn same_millisecond_entries_get_unique_ids() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    for job in ["a", "b", "c"] {
        store.append_history(history_entry(fixture_timestamp(), job))?;
    }
    let ids: BTreeSet<i64> = store
        .load_history()
        .iter()
        .map(|entry| entry.id.get())
        .collect();
    assert_eq!(ids.len(), 3);
    Ok(())
}

#[test]
fn concurrent_appends_keep_every_entry() -> Result<()> {
    let (_dir, db_path) = temp_db_path()?;
    {
        let store = Store::open(&db_path)?;
        store.bootstrap()?;
    }

    let handles: Vec<_> = (0..2_i64)
        .map(|writer| {
            let path = db_path.clone();
            thread::spawn(move || -> Result<()> {
                let store = Store::open(&path)?;
                for index in 0..4_i64 {
                    let at = fixture_timestamp()
                        + Duration::minutes(writer)
                        + Duration::seconds(index);
                    store.append_history(history_entry(at, &format!("writer {writer} job {index}")))?;
                }
                Ok(())
            })
        })
        .collect();
    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("writer thread panicked"))??;
    }

    let store = Store::open(&db_path)?;
    let history = store.read_history()?;
    assert_eq!(history.len(), 8);
    let jobs: BTreeSet<&str> = history.iter().map(|entry| entry.job_type.as_str()).collect();
    assert_eq!(jobs.len(), 8);
    Ok(())
}

#[test]
fn vat_overrides_persist_across_reopen() -> Result<()> {
    let (_dir, db_path) = temp_db_path()?;
    {
        let store = Store::open(&db_path)?;
        store.bootstrap()?;
        store.put_vat_registered(true)?;
        store.put_vat_rate(5.0)?;
    }

    let store = Store::open(&db_path)?;
    store.bootstrap()?;
    let vat = store.vat_config(VatConfig::default())?;
    assert!(vat.registered);
    assert_eq!(vat.rate, 5.0);
    Ok(())
}
