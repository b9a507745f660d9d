// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{CalculationHistoryEntry, HistoryEntryId};

pub const HISTORY_LIMIT: usize = 10;
pub const HISTORY_KEY: &str = "job-profitability-history";

/// Persistence seam for the calculation log.
///
/// `load_history` never fails: unreadable or malformed stored data yields an
/// empty history. `append_history` must run its read-modify-write as one unit.
pub trait HistoryStore {
    fn load_history(&self) -> Vec<CalculationHistoryEntry>;

    fn append_history(&self, entry: CalculationHistoryEntry)
    -> Result<Vec<CalculationHistoryEntry>>;

    fn clear_history(&self) -> Result<()>;
}

/// Refuses entries with infinite or NaN amounts, which JSON would store as
/// `null` and no later load could read back.
pub fn check_storable(entry: &CalculationHistoryEntry) -> Result<()> {
    if !entry.is_finite() {
        bail!(
            "calculation {} has amounts too large to store; history left unchanged",
            entry.id
        );
    }
    Ok(())
}

/// Prepends `entry` and keeps the newest [`HISTORY_LIMIT`] entries.
///
/// An id that would not sort above the current newest entry is bumped so ids
/// stay unique and time-ordered.
pub fn record(
    mut entry: CalculationHistoryEntry,
    current: &[CalculationHistoryEntry],
) -> Vec<CalculationHistoryEntry> {
    if let Some(newest) = current.first()
        && entry.id <= newest.id
    {
        entry.id = HistoryEntryId::new(newest.id.get() + 1);
    }

    let mut history = Vec::with_capacity(HISTORY_LIMIT);
    history.push(entry);
    history.extend(current.iter().take(HISTORY_LIMIT - 1).cloned());
    history
}

pub fn encode_history(history: &[CalculationHistoryEntry]) -> serde_json::Result<String> {
    serde_json::to_string(history)
}

pub fn decode_history(raw: &str) -> serde_json::Result<Vec<CalculationHistoryEntry>> {
    let mut history: Vec<CalculationHistoryEntry> = serde_json::from_str(raw)?;
    history.truncate(HISTORY_LIMIT);
    Ok(history)
}
