// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{CalculationResult, CostBreakdown, JobInputs, Profitability, VatConfig};

/// Floor for `1 - margin/100` when deriving the minimum quote. Margins at or
/// above 99% are clamped here rather than producing a true margin price.
pub const MARGIN_DENOMINATOR_FLOOR: f64 = 0.01;

/// Derives itemized costs, quotes, profit and VAT from validated inputs.
///
/// Pure and deterministic. Callers are expected to run
/// [`crate::validate`] first; the two division guards (team hours and quote
/// amount of zero) resolve to fallbacks instead of failing.
pub fn calculate(inputs: &JobInputs, vat: VatConfig) -> CalculationResult {
    let labour = inputs.labour_totals();

    let non_billable_cost = (inputs.travel_hours + inputs.admin_hours) * labour.blended_rate;
    let mileage_cost = inputs.miles * inputs.mileage_rate;
    let consumables_cost = inputs.material_cost * percent(inputs.consumables_percent);

    let direct_costs = inputs.material_cost
        + labour.total_cost
        + non_billable_cost
        + mileage_cost
        + inputs.parking_tolls
        + inputs.subcontractor_cost
        + consumables_cost;

    let overhead_cost = direct_costs * percent(inputs.overhead_percentage);
    let contingency_cost = direct_costs * percent(inputs.contingency_percent);
    let warranty_reserve_cost = direct_costs * percent(inputs.warranty_reserve_percent);
    let total_costs = direct_costs + overhead_cost + contingency_cost + warranty_reserve_cost;

    let minimum_quote_ex_vat = minimum_quote(total_costs, inputs.desired_profit_margin);

    let material_markup_value = inputs.material_cost * percent(inputs.material_markup_percent);
    let discount_base = minimum_quote_ex_vat + material_markup_value;
    let discount_value = discount_base * percent(inputs.discount_percent);
    let suggested_client_price_ex_vat = discount_base - discount_value;

    let actual_profit = inputs.quote_amount - total_costs;
    let actual_profit_margin = if inputs.quote_amount > 0.0 {
        (actual_profit / inputs.quote_amount) * 100.0
    } else {
        0.0
    };

    let vat_amount = if vat.registered {
        inputs.quote_amount * percent(vat.rate)
    } else {
        0.0
    };
    let total_with_vat = inputs.quote_amount + vat_amount;

    CalculationResult {
        total_costs,
        actual_profit,
        actual_profit_margin,
        vat_amount,
        total_with_vat,
        minimum_quote_ex_vat,
        suggested_client_price_ex_vat,
        breakdown: CostBreakdown {
            total_labour_hours: labour.total_hours,
            total_labour_cost: labour.total_cost,
            blended_hourly_rate: labour.blended_rate,
            non_billable_cost,
            mileage_cost,
            consumables_cost,
            direct_costs,
            overhead_cost,
            contingency_cost,
            warranty_reserve_cost,
            material_markup_value,
            discount_base,
            discount_value,
        },
    }
}

pub fn minimum_quote(total_costs: f64, desired_profit_margin: f64) -> f64 {
    let denominator = (1.0 - percent(desired_profit_margin)).max(MARGIN_DENOMINATOR_FLOOR);
    total_costs / denominator
}

pub fn classify(inputs: &JobInputs, result: &CalculationResult) -> Profitability {
    if result.actual_profit_margin >= inputs.desired_profit_margin {
        Profitability::Profitable
    } else {
        Profitability::Unprofitable {
            shortfall: (result.minimum_quote_ex_vat - inputs.quote_amount).max(0.0),
        }
    }
}

fn percent(value: f64) -> f64 {
    value / 100.0
}
