// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use jobprofit_app::{
    CalculatorCommand, CalculatorEvent, CalculatorState, HISTORY_LIMIT, HistoryStore, JobField,
    JobInputs, Profitability, VatConfig, Worker, calculate, classify, validate,
};
use jobprofit_testkit::{
    JobFaker, MemoryHistory, fixture_timestamp, history_entry, job_types, scenario_inputs,
    team_inputs,
};
use time::Duration;

const SEEDS: u64 = 200;

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0)
}

#[test]
fn calculation_is_deterministic_across_seeds() {
    for seed in 0..SEEDS {
        let mut faker = JobFaker::new(seed);
        let inputs = faker.valid_inputs();
        let vat = faker.vat_config();
        assert_eq!(
            calculate(&inputs, vat),
            calculate(&inputs, vat),
            "seed {seed}"
        );
    }
}

#[test]
fn every_valid_result_is_finite() {
    for seed in 0..SEEDS {
        let mut faker = JobFaker::new(seed);
        let inputs = faker.valid_inputs();
        let result = calculate(&inputs, faker.vat_config());
        for value in [
            result.total_costs,
            result.actual_profit,
            result.actual_profit_margin,
            result.vat_amount,
            result.total_with_vat,
            result.minimum_quote_ex_vat,
            result.suggested_client_price_ex_vat,
        ] {
            assert!(value.is_finite(), "seed {seed}: {result:?}");
        }
    }
}

#[test]
fn cost_identities_hold() {
    for seed in 0..SEEDS {
        let mut faker = JobFaker::new(seed);
        let inputs = faker.valid_inputs();
        let vat = faker.vat_config();
        let result = calculate(&inputs, vat);
        let breakdown = result.breakdown;

        assert!(close(
            result.total_costs,
            breakdown.direct_costs
                + breakdown.overhead_cost
                + breakdown.contingency_cost
                + breakdown.warranty_reserve_cost
        ));
        assert!(close(
            result.actual_profit,
            inputs.quote_amount - result.total_costs
        ));
        assert!(close(
            result.total_with_vat,
            inputs.quote_amount + result.vat_amount
        ));
        if !vat.registered {
            assert_eq!(result.vat_amount, 0.0, "seed {seed}");
        }
        assert!(
            result.minimum_quote_ex_vat >= result.total_costs,
            "seed {seed}"
        );
    }
}

#[test]
fn validator_reports_every_broken_field() {
    let percent_fields: [(JobField, fn(&mut JobInputs)); 7] = [
        (JobField::OverheadPercentage, |i: &mut JobInputs| i.overhead_percentage = 101.0),
        (JobField::DesiredProfitMargin, |i: &mut JobInputs| i.desired_profit_margin = -1.0),
        (JobField::ConsumablesPercent, |i: &mut JobInputs| i.consumables_percent = 150.0),
        (JobField::MaterialMarkupPercent, |i: &mut JobInputs| i.material_markup_percent = -5.0),
        (JobField::ContingencyPercent, |i: &mut JobInputs| i.contingency_percent = 100.01),
        (JobField::WarrantyReservePercent, |i: &mut JobInputs| i.warranty_reserve_percent = -0.01),
        (JobField::DiscountPercent, |i: &mut JobInputs| i.discount_percent = 250.0),
    ];
    let cost_fields: [(JobField, fn(&mut JobInputs)); 7] = [
        (JobField::MaterialCost, |i: &mut JobInputs| i.material_cost = -1.0),
        (JobField::TravelHours, |i: &mut JobInputs| i.travel_hours = -1.0),
        (JobField::AdminHours, |i: &mut JobInputs| i.admin_hours = -1.0),
        (JobField::Miles, |i: &mut JobInputs| i.miles = -1.0),
        (JobField::MileageRate, |i: &mut JobInputs| i.mileage_rate = -1.0),
        (JobField::SubcontractorCost, |i: &mut JobInputs| i.subcontractor_cost = -1.0),
        (JobField::ParkingTolls, |i: &mut JobInputs| i.parking_tolls = -1.0),
    ];
    let breakers: Vec<_> = percent_fields.into_iter().chain(cost_fields).collect();

    for seed in 0..SEEDS {
        let mut faker = JobFaker::new(seed);
        let mut inputs = faker.valid_inputs();
        let count = 1 + faker.int_n(breakers.len());
        let mut expected = Vec::with_capacity(count);
        for _ in 0..count {
            let (field, breaker) = breakers[faker.int_n(breakers.len())];
            breaker(&mut inputs);
            if !expected.contains(&field) {
                expected.push(field);
            }
        }

        let errors = validate(&inputs);
        assert_eq!(errors.len(), expected.len(), "seed {seed}: {errors}");
        for field in expected {
            assert!(errors.contains(field), "seed {seed}: missing {field}");
        }
    }
}

#[test]
fn team_matches_equivalent_single_worker() {
    for seed in 0..SEEDS {
        let mut faker = JobFaker::new(seed);
        let mut inputs = faker.valid_inputs();
        let size = 1 + faker.int_n(5);
        let hours = 0.5 * (1 + faker.int_n(20)) as f64;
        let rate = (15 + faker.int_n(60)) as f64;

        inputs.use_multi_worker = true;
        inputs.workers = faker
            .team(size)
            .into_iter()
            .map(|worker| Worker {
                hours,
                hourly_rate: rate,
                ..worker
            })
            .collect();
        let team = calculate(&inputs, VatConfig::default());

        let single_inputs = JobInputs {
            use_multi_worker: false,
            workers: Vec::new(),
            labour_hours: hours * size as f64,
            hourly_rate: rate,
            ..inputs
        };
        let single = calculate(&single_inputs, VatConfig::default());

        assert!(close(team.total_costs, single.total_costs), "seed {seed}");
        assert!(close(
            team.breakdown.blended_hourly_rate,
            single.breakdown.blended_hourly_rate
        ));
        assert!(close(team.minimum_quote_ex_vat, single.minimum_quote_ex_vat));
    }
}

#[test]
fn minimum_quote_grows_with_margin() {
    for seed in 0..SEEDS {
        let mut faker = JobFaker::new(seed);
        let mut inputs = faker.valid_inputs();
        let mut previous: Option<f64> = None;
        for margin in [0.0, 10.0, 25.0, 50.0, 75.0, 98.0] {
            inputs.desired_profit_margin = margin;
            let result = calculate(&inputs, VatConfig::default());
            assert!(result.total_costs > 0.0, "seed {seed}");
            if let Some(previous) = previous {
                assert!(
                    result.minimum_quote_ex_vat > previous,
                    "seed {seed} margin {margin}: {} <= {previous}",
                    result.minimum_quote_ex_vat
                );
            }
            previous = Some(result.minimum_quote_ex_vat);
        }
    }
}

#[test]
fn profitability_matches_margin_comparison() {
    for seed in 0..SEEDS {
        let mut faker = JobFaker::new(seed);
        let inputs = faker.valid_inputs();
        let result = calculate(&inputs, VatConfig::default());
        match classify(&inputs, &result) {
            Profitability::Profitable => {
                assert!(result.actual_profit_margin >= inputs.desired_profit_margin);
            }
            Profitability::Unprofitable { shortfall } => {
                assert!(result.actual_profit_margin < inputs.desired_profit_margin);
                assert!(shortfall >= 0.0, "seed {seed}");
            }
        }
    }
}

#[test]
fn history_never_exceeds_limit() -> Result<()> {
    let store = MemoryHistory::new();
    let mut faker = JobFaker::new(17);
    for minute in 0..40 {
        let history = store.append_history(history_entry(
            fixture_timestamp() + Duration::minutes(minute),
            &faker.job_type(),
        ))?;
        assert!(history.len() <= HISTORY_LIMIT);
        assert!(job_types().contains(&history[0].job_type.as_str()));
        assert!(
            history
                .windows(2)
                .all(|pair| pair[0].timestamp >= pair[1].timestamp)
        );
    }
    assert_eq!(store.load_history().len(), HISTORY_LIMIT);
    Ok(())
}

#[test]
fn session_calculates_fixture_jobs() {
    for inputs in [scenario_inputs(), team_inputs()] {
        let mut state = CalculatorState::with_inputs(inputs.clone());
        let events = state.dispatch(CalculatorCommand::Calculate);
        assert!(
            matches!(events.first(), Some(CalculatorEvent::Calculated(_))),
            "{events:?}"
        );
        assert_eq!(
            state.last_result,
            Some(calculate(&inputs, VatConfig::default()))
        );
    }
}
