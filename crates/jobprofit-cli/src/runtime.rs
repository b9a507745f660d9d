// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use jobprofit_app::format::{format_currency, format_percent, format_timestamp};
use jobprofit_app::{
    CalculationHistoryEntry, CalculationResult, CalculatorCommand, CalculatorEvent,
    CalculatorState, FieldErrors, HistoryStore, classify, itemized_report, share_entry,
};
use std::fmt::Write as _;
use time::OffsetDateTime;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Calculated {
        result: CalculationResult,
        report: String,
        saved: Option<CalculationHistoryEntry>,
    },
    Rejected(FieldErrors),
}

/// Drives one session against a history backend.
pub struct CalcRuntime<'a, H: HistoryStore> {
    history: &'a H,
}

impl<'a, H: HistoryStore> CalcRuntime<'a, H> {
    pub fn new(history: &'a H) -> Self {
        Self { history }
    }

    /// Validates and calculates the session's job, then records it.
    ///
    /// A failed history write is logged and leaves `saved` empty; it never
    /// hides the computed result.
    pub fn calculate(
        &self,
        state: &mut CalculatorState,
        now: OffsetDateTime,
    ) -> Result<JobOutcome> {
        for event in state.dispatch(CalculatorCommand::Calculate) {
            match event {
                CalculatorEvent::ValidationFailed(errors) => {
                    info!(fields = errors.len(), "job inputs rejected");
                    return Ok(JobOutcome::Rejected(errors));
                }
                CalculatorEvent::Calculated(result) => {
                    let entry = CalculationHistoryEntry::new(
                        now,
                        state.job_type.as_str(),
                        state.inputs.clone(),
                        result,
                    );
                    let saved = match self.history.append_history(entry) {
                        Ok(history) => history.into_iter().next(),
                        Err(error) => {
                            warn!("could not save calculation history: {error:#}");
                            None
                        }
                    };
                    info!(
                        job_type = %state.job_type,
                        total_costs = result.total_costs,
                        margin = result.actual_profit_margin,
                        profitable = classify(&state.inputs, &result).is_profitable(),
                        "calculated job"
                    );
                    return Ok(JobOutcome::Calculated {
                        result,
                        report: itemized_report(&state.inputs, &result),
                        saved,
                    });
                }
                _ => {}
            }
        }
        bail!("calculation finished without a result; rerun with JOBPROFIT_LOG=debug")
    }

    pub fn history_listing(&self) -> String {
        let history = self.history.load_history();
        if history.is_empty() {
            return "No calculations recorded yet".to_owned();
        }

        let mut text = String::new();
        for entry in &history {
            let profitability = classify(&entry.inputs, &entry.results);
            let _ = writeln!(
                text,
                "{}  {}  {}  quote {}  costs {}  margin {}  {}",
                entry.id,
                format_timestamp(entry.timestamp),
                entry.job_type,
                format_currency(entry.inputs.quote_amount),
                format_currency(entry.results.total_costs),
                format_percent(entry.results.actual_profit_margin),
                profitability.label(),
            );
        }
        text
    }

    pub fn share_latest(&self) -> Option<String> {
        self.history.load_history().first().map(share_entry)
    }

    pub fn clear_history(&self) -> Result<()> {
        self.history.clear_history()?;
        info!("cleared calculation history");
        Ok(())
    }
}
