// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{CalculationResult, JobInputs};

pub const PERCENT_RANGE_MESSAGE: &str = "Must be between 0–100%";
pub const NEGATIVE_MESSAGE: &str = "Cannot be negative";
pub const OVERFLOW_MESSAGE: &str = "Amounts are too large to calculate; check for extra digits";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JobField {
    MaterialCost,
    Workers,
    LabourHours,
    HourlyRate,
    OverheadPercentage,
    DesiredProfitMargin,
    ConsumablesPercent,
    MaterialMarkupPercent,
    ContingencyPercent,
    WarrantyReservePercent,
    DiscountPercent,
    TravelHours,
    AdminHours,
    Miles,
    MileageRate,
    SubcontractorCost,
    ParkingTolls,
    QuoteAmount,
    Results,
}

impl JobField {
    /// Fields that name a job input, in job-file order.
    pub const INPUTS: [Self; 18] = [
        Self::MaterialCost,
        Self::Workers,
        Self::LabourHours,
        Self::HourlyRate,
        Self::OverheadPercentage,
        Self::DesiredProfitMargin,
        Self::ConsumablesPercent,
        Self::MaterialMarkupPercent,
        Self::ContingencyPercent,
        Self::WarrantyReservePercent,
        Self::DiscountPercent,
        Self::TravelHours,
        Self::AdminHours,
        Self::Miles,
        Self::MileageRate,
        Self::SubcontractorCost,
        Self::ParkingTolls,
        Self::QuoteAmount,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::INPUTS
            .into_iter()
            .find(|field| field.as_str() == value)
    }

    pub const fn is_percent(self) -> bool {
        matches!(
            self,
            Self::OverheadPercentage
                | Self::DesiredProfitMargin
                | Self::ConsumablesPercent
                | Self::MaterialMarkupPercent
                | Self::ContingencyPercent
                | Self::WarrantyReservePercent
                | Self::DiscountPercent
        )
    }

    /// Inputs a job may leave blank, meaning zero.
    pub const fn is_optional(self) -> bool {
        matches!(
            self,
            Self::MaterialCost
                | Self::TravelHours
                | Self::AdminHours
                | Self::Miles
                | Self::SubcontractorCost
                | Self::ParkingTolls
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MaterialCost => "materialCost",
            Self::Workers => "workers",
            Self::LabourHours => "labourHours",
            Self::HourlyRate => "hourlyRate",
            Self::OverheadPercentage => "overheadPercentage",
            Self::DesiredProfitMargin => "desiredProfitMargin",
            Self::ConsumablesPercent => "consumablesPercent",
            Self::MaterialMarkupPercent => "materialMarkupPercent",
            Self::ContingencyPercent => "contingencyPercent",
            Self::WarrantyReservePercent => "warrantyReservePercent",
            Self::DiscountPercent => "discountPercent",
            Self::TravelHours => "travelHours",
            Self::AdminHours => "adminHours",
            Self::Miles => "miles",
            Self::MileageRate => "mileageRate",
            Self::SubcontractorCost => "subcontractorCost",
            Self::ParkingTolls => "parkingTolls",
            Self::QuoteAmount => "quoteAmount",
            Self::Results => "results",
        }
    }
}

impl std::fmt::Display for JobField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-keyed violation messages. Empty means the inputs are valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<JobField, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: JobField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: JobField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: JobField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (JobField, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Checks every rule and collects all violations, not just the first.
pub fn validate(inputs: &JobInputs) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if !is_non_negative(inputs.material_cost) {
        errors.insert(JobField::MaterialCost, "Material cost cannot be negative");
    }

    if inputs.use_multi_worker {
        if inputs.workers.is_empty() {
            errors.insert(JobField::Workers, "Add at least one worker");
        }
        let totals = inputs.labour_totals();
        if !is_positive(totals.total_hours) {
            errors.insert(
                JobField::LabourHours,
                "Total labour hours must be greater than 0",
            );
        }
        if !is_positive(totals.total_cost) {
            errors.insert(
                JobField::HourlyRate,
                "Total labour cost must be greater than 0",
            );
        }
    } else {
        if !is_positive(inputs.labour_hours) {
            errors.insert(JobField::LabourHours, "Labour hours must be greater than 0");
        }
        if !is_positive(inputs.hourly_rate) {
            errors.insert(JobField::HourlyRate, "Hourly rate must be greater than 0");
        }
    }

    for (field, value) in [
        (JobField::OverheadPercentage, inputs.overhead_percentage),
        (JobField::DesiredProfitMargin, inputs.desired_profit_margin),
        (JobField::ConsumablesPercent, inputs.consumables_percent),
        (JobField::MaterialMarkupPercent, inputs.material_markup_percent),
        (JobField::ContingencyPercent, inputs.contingency_percent),
        (JobField::WarrantyReservePercent, inputs.warranty_reserve_percent),
        (JobField::DiscountPercent, inputs.discount_percent),
    ] {
        if !(0.0..=100.0).contains(&value) {
            errors.insert(field, PERCENT_RANGE_MESSAGE);
        }
    }

    for (field, value) in [
        (JobField::TravelHours, inputs.travel_hours),
        (JobField::AdminHours, inputs.admin_hours),
        (JobField::Miles, inputs.miles),
        (JobField::MileageRate, inputs.mileage_rate),
        (JobField::SubcontractorCost, inputs.subcontractor_cost),
        (JobField::ParkingTolls, inputs.parking_tolls),
    ] {
        if !is_non_negative(value) {
            errors.insert(field, NEGATIVE_MESSAGE);
        }
    }

    if !is_positive(inputs.quote_amount) {
        errors.insert(JobField::QuoteAmount, "Quote amount must be greater than 0");
    }

    errors
}

/// Rejects results that overflowed, which valid but extreme inputs can reach.
pub fn validate_result(result: &CalculationResult) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if !result.is_finite() {
        errors.insert(JobField::Results, OVERFLOW_MESSAGE);
    }
    errors
}

// NaN and infinity fail both checks.
fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::{
        JobField, NEGATIVE_MESSAGE, OVERFLOW_MESSAGE, PERCENT_RANGE_MESSAGE, validate,
        validate_result,
    };
    use crate::{JobInputs, SkillLevel, VatConfig, Worker, WorkerId, calculate};

    fn valid_inputs() -> JobInputs {
        JobInputs {
            material_cost: 650.0,
            labour_hours: 8.0,
            hourly_rate: 52.0,
            quote_amount: 1100.0,
            ..JobInputs::default()
        }
    }

    #[test]
    fn valid_inputs_produce_no_errors() {
        assert!(validate(&valid_inputs()).is_empty());
    }

    #[test]
    fn negative_material_cost_is_rejected() {
        let errors = validate(&JobInputs {
            material_cost: -1.0,
            ..valid_inputs()
        });
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(JobField::MaterialCost));
    }

    #[test]
    fn zero_material_cost_is_allowed() {
        let errors = validate(&JobInputs {
            material_cost: 0.0,
            ..valid_inputs()
        });
        assert!(errors.is_empty());
    }

    #[test]
    fn single_worker_mode_requires_hours_and_rate() {
        let errors = validate(&JobInputs {
            labour_hours: 0.0,
            hourly_rate: 0.0,
            ..valid_inputs()
        });
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(JobField::LabourHours));
        assert!(errors.contains(JobField::HourlyRate));
    }

    #[test]
    fn multi_worker_mode_with_empty_team_reports_every_labour_field() {
        let errors = validate(&JobInputs {
            use_multi_worker: true,
            workers: Vec::new(),
            ..valid_inputs()
        });
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(JobField::Workers));
        assert!(errors.contains(JobField::LabourHours));
        assert!(errors.contains(JobField::HourlyRate));
    }

    #[test]
    fn multi_worker_mode_ignores_scalar_labour_fields() {
        let errors = validate(&JobInputs {
            labour_hours: 0.0,
            hourly_rate: 0.0,
            use_multi_worker: true,
            workers: vec![Worker {
                id: WorkerId::new(1),
                role: "Electrician".to_owned(),
                hours: 4.0,
                hourly_rate: 40.0,
                skill_level: SkillLevel::Electrician,
            }],
            ..valid_inputs()
        });
        assert!(errors.is_empty(), "unexpected errors: {errors}");
    }

    #[test]
    fn multi_worker_mode_with_unpaid_team_flags_rate() {
        let errors = validate(&JobInputs {
            use_multi_worker: true,
            workers: vec![Worker {
                id: WorkerId::new(1),
                role: "Apprentice".to_owned(),
                hours: 4.0,
                hourly_rate: 0.0,
                skill_level: SkillLevel::Apprentice,
            }],
            ..valid_inputs()
        });
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(JobField::HourlyRate));
    }

    #[test]
    fn percentages_outside_range_use_shared_message() {
        let errors = validate(&JobInputs {
            overhead_percentage: -0.1,
            discount_percent: 100.5,
            ..valid_inputs()
        });
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.get(JobField::OverheadPercentage),
            Some(PERCENT_RANGE_MESSAGE)
        );
        assert_eq!(
            errors.get(JobField::DiscountPercent),
            Some(PERCENT_RANGE_MESSAGE)
        );
    }

    #[test]
    fn percentage_bounds_are_inclusive() {
        let errors = validate(&JobInputs {
            desired_profit_margin: 100.0,
            contingency_percent: 0.0,
            ..valid_inputs()
        });
        assert!(errors.is_empty());
    }

    #[test]
    fn negative_ancillary_costs_use_shared_message() {
        let errors = validate(&JobInputs {
            travel_hours: -1.0,
            miles: -5.0,
            parking_tolls: -0.01,
            ..valid_inputs()
        });
        assert_eq!(errors.len(), 3);
        for field in [JobField::TravelHours, JobField::Miles, JobField::ParkingTolls] {
            assert_eq!(errors.get(field), Some(NEGATIVE_MESSAGE), "field {field}");
        }
    }

    #[test]
    fn zero_quote_is_rejected() {
        let errors = validate(&JobInputs {
            quote_amount: 0.0,
            ..valid_inputs()
        });
        assert!(errors.contains(JobField::QuoteAmount));
    }

    #[test]
    fn nan_values_are_violations() {
        let errors = validate(&JobInputs {
            material_cost: f64::NAN,
            warranty_reserve_percent: f64::NAN,
            admin_hours: f64::NAN,
            quote_amount: f64::NAN,
            ..valid_inputs()
        });
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn infinite_values_are_violations() {
        let errors = validate(&JobInputs {
            material_cost: f64::INFINITY,
            parking_tolls: f64::INFINITY,
            quote_amount: f64::INFINITY,
            ..valid_inputs()
        });
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(JobField::MaterialCost));
        assert!(errors.contains(JobField::ParkingTolls));
        assert!(errors.contains(JobField::QuoteAmount));
    }

    #[test]
    fn overflowing_totals_are_flagged_on_the_result() {
        let inputs = JobInputs {
            material_cost: 1e307,
            desired_profit_margin: 100.0,
            ..valid_inputs()
        };
        assert!(validate(&inputs).is_empty());

        let errors = validate_result(&calculate(&inputs, VatConfig::default()));
        assert_eq!(errors.get(JobField::Results), Some(OVERFLOW_MESSAGE));
        assert!(
            validate_result(&calculate(&valid_inputs(), VatConfig::default())).is_empty()
        );
    }

    #[test]
    fn field_names_parse_back_to_input_fields() {
        for field in JobField::INPUTS {
            assert_eq!(JobField::parse(field.as_str()), Some(field));
        }
        assert_eq!(JobField::parse("results"), None);
        assert_eq!(JobField::parse("materialcost"), None);
        assert!(JobField::DiscountPercent.is_percent());
        assert!(JobField::ParkingTolls.is_optional());
        assert!(!JobField::QuoteAmount.is_optional());
    }

    #[test]
    fn every_independent_violation_is_reported() {
        let errors = validate(&JobInputs {
            material_cost: -1.0,
            labour_hours: -2.0,
            hourly_rate: 0.0,
            overhead_percentage: 101.0,
            desired_profit_margin: -1.0,
            consumables_percent: 200.0,
            material_markup_percent: -3.0,
            contingency_percent: 150.0,
            warranty_reserve_percent: -0.5,
            discount_percent: 100.1,
            quote_amount: -10.0,
            travel_hours: -1.0,
            admin_hours: -1.0,
            miles: -1.0,
            mileage_rate: -1.0,
            subcontractor_cost: -1.0,
            parking_tolls: -1.0,
            workers: Vec::new(),
            use_multi_worker: false,
        });
        assert_eq!(errors.len(), 17);
    }

    #[test]
    fn display_lists_every_field() {
        let errors = validate(&JobInputs {
            material_cost: -1.0,
            quote_amount: 0.0,
            ..valid_inputs()
        });
        let rendered = errors.to_string();
        assert!(rendered.contains("materialCost: Material cost cannot be negative"));
        assert!(rendered.contains("quoteAmount: Quote amount must be greater than 0"));
    }
}
