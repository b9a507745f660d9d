// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt::Write as _;

use crate::format::{format_currency, format_hours, format_percent};
use crate::{CalculationHistoryEntry, CalculationResult, JobInputs, Profitability, classify};

/// Plain-text summary for clipboard or native share targets.
pub fn share_summary(job_type: &str, inputs: &JobInputs, result: &CalculationResult) -> String {
    let labour = inputs.labour_totals();
    let mut text = String::new();
    let _ = writeln!(text, "Job Profitability Analysis - {job_type}");
    let _ = writeln!(text, "Material cost: {}", format_currency(inputs.material_cost));
    let _ = writeln!(
        text,
        "Labour: {} hours @ {}/hr",
        format_hours(labour.total_hours),
        format_currency(labour.blended_rate)
    );
    let _ = writeln!(text, "Total costs: {}", format_currency(result.total_costs));
    let _ = writeln!(text, "Quote amount: {}", format_currency(inputs.quote_amount));
    let _ = write!(
        text,
        "Profit margin: {}",
        format_percent(result.actual_profit_margin)
    );
    text
}

pub fn share_entry(entry: &CalculationHistoryEntry) -> String {
    share_summary(&entry.job_type, &entry.inputs, &entry.results)
}

/// Itemized result block shown after a successful calculation.
pub fn itemized_report(inputs: &JobInputs, result: &CalculationResult) -> String {
    let breakdown = &result.breakdown;
    let rows = [
        ("Materials", inputs.material_cost),
        ("Labour", breakdown.total_labour_cost),
        ("Travel & admin", breakdown.non_billable_cost),
        ("Mileage", breakdown.mileage_cost),
        ("Parking & tolls", inputs.parking_tolls),
        ("Subcontractors", inputs.subcontractor_cost),
        ("Consumables", breakdown.consumables_cost),
        ("Direct costs", breakdown.direct_costs),
        ("Overhead", breakdown.overhead_cost),
        ("Contingency", breakdown.contingency_cost),
        ("Warranty reserve", breakdown.warranty_reserve_cost),
        ("Total costs", result.total_costs),
        ("Minimum quote (ex VAT)", result.minimum_quote_ex_vat),
        ("Material markup", breakdown.material_markup_value),
        ("Discount", breakdown.discount_value),
        ("Suggested price (ex VAT)", result.suggested_client_price_ex_vat),
        ("Your quote (ex VAT)", inputs.quote_amount),
        ("VAT", result.vat_amount),
        ("Total with VAT", result.total_with_vat),
        ("Actual profit", result.actual_profit),
    ];

    let mut text = String::new();
    if inputs.use_multi_worker {
        let _ = writeln!(text, "Team");
        for worker in &inputs.workers {
            let _ = writeln!(
                text,
                "  #{} {} ({}): {} h @ {}/hr = {}",
                worker.id,
                worker.role,
                worker.skill_level.label(),
                format_hours(worker.hours),
                format_currency(worker.hourly_rate),
                format_currency(worker.labour_cost())
            );
        }
    }
    for (label, value) in rows {
        let _ = writeln!(text, "{label:<26}{:>14}", format_currency(value));
    }
    let _ = writeln!(
        text,
        "{:<26}{:>14}",
        "Actual margin",
        format_percent(result.actual_profit_margin)
    );

    match classify(inputs, result) {
        Profitability::Profitable => {
            let _ = write!(
                text,
                "Profitable: meets the {} target margin",
                format_percent(inputs.desired_profit_margin)
            );
        }
        Profitability::Unprofitable { shortfall } => {
            let _ = write!(
                text,
                "Unprofitable: raise the quote by {} to reach the {} target margin",
                format_currency(shortfall),
                format_percent(inputs.desired_profit_margin)
            );
        }
    }
    text
}
