// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::JobField;
use crate::ids::*;

pub const DEFAULT_HOURLY_RATE: f64 = 45.0;
pub const DEFAULT_VAT_RATE: f64 = 20.0;
pub const DEFAULT_MILEAGE_RATE: f64 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Apprentice,
    Improver,
    Electrician,
    Approved,
    Supervisor,
}

impl SkillLevel {
    pub const ALL: [Self; 5] = [
        Self::Apprentice,
        Self::Improver,
        Self::Electrician,
        Self::Approved,
        Self::Supervisor,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apprentice => "apprentice",
            Self::Improver => "improver",
            Self::Electrician => "electrician",
            Self::Approved => "approved",
            Self::Supervisor => "supervisor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "apprentice" => Some(Self::Apprentice),
            "improver" => Some(Self::Improver),
            "electrician" => Some(Self::Electrician),
            "approved" => Some(Self::Approved),
            "supervisor" => Some(Self::Supervisor),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Apprentice => "Apprentice",
            Self::Improver => "Improver",
            Self::Electrician => "Electrician",
            Self::Approved => "Approved Electrician",
            Self::Supervisor => "Supervisor",
        }
    }
}

/// One member of the labour team. `skill_level` is informational and never
/// feeds the calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Worker {
    pub id: WorkerId,
    pub role: String,
    pub hours: f64,
    pub hourly_rate: f64,
    pub skill_level: SkillLevel,
}

impl Worker {
    pub fn labour_cost(&self) -> f64 {
        self.hours * self.hourly_rate
    }
}

/// The complete parameter set for one pricing computation.
///
/// In multi-worker mode `labour_hours` and `hourly_rate` are not authoritative
/// for labour; use [`JobInputs::labour_totals`]. `hourly_rate` still serves as
/// the fallback rate when the team has no hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobInputs {
    pub material_cost: f64,
    pub labour_hours: f64,
    pub hourly_rate: f64,
    pub overhead_percentage: f64,
    pub desired_profit_margin: f64,
    pub consumables_percent: f64,
    pub material_markup_percent: f64,
    pub contingency_percent: f64,
    pub warranty_reserve_percent: f64,
    pub discount_percent: f64,
    pub quote_amount: f64,
    pub travel_hours: f64,
    pub admin_hours: f64,
    pub miles: f64,
    pub mileage_rate: f64,
    pub subcontractor_cost: f64,
    pub parking_tolls: f64,
    pub workers: Vec<Worker>,
    pub use_multi_worker: bool,
}

impl Default for JobInputs {
    fn default() -> Self {
        Self {
            material_cost: 0.0,
            labour_hours: 0.0,
            hourly_rate: DEFAULT_HOURLY_RATE,
            overhead_percentage: 15.0,
            desired_profit_margin: 20.0,
            consumables_percent: 5.0,
            material_markup_percent: 10.0,
            contingency_percent: 5.0,
            warranty_reserve_percent: 2.0,
            discount_percent: 0.0,
            quote_amount: 0.0,
            travel_hours: 0.0,
            admin_hours: 0.0,
            miles: 0.0,
            mileage_rate: DEFAULT_MILEAGE_RATE,
            subcontractor_cost: 0.0,
            parking_tolls: 0.0,
            workers: Vec::new(),
            use_multi_worker: false,
        }
    }
}

impl JobInputs {
    /// Effective labour figures for the active mode.
    pub fn labour_totals(&self) -> LabourTotals {
        if !self.use_multi_worker {
            return LabourTotals {
                total_hours: self.labour_hours,
                total_cost: self.labour_hours * self.hourly_rate,
                blended_rate: self.hourly_rate,
            };
        }

        let total_hours: f64 = self.workers.iter().map(|worker| worker.hours).sum();
        let total_cost: f64 = self.workers.iter().map(Worker::labour_cost).sum();
        let blended_rate = if total_hours > 0.0 {
            total_cost / total_hours
        } else {
            self.hourly_rate
        };
        LabourTotals {
            total_hours,
            total_cost,
            blended_rate,
        }
    }

    /// Overwrites one scalar input. Returns false for fields that are not
    /// plain numbers (the team list and calculated results).
    pub fn set_field(&mut self, field: JobField, value: f64) -> bool {
        let slot = match field {
            JobField::MaterialCost => &mut self.material_cost,
            JobField::LabourHours => &mut self.labour_hours,
            JobField::HourlyRate => &mut self.hourly_rate,
            JobField::OverheadPercentage => &mut self.overhead_percentage,
            JobField::DesiredProfitMargin => &mut self.desired_profit_margin,
            JobField::ConsumablesPercent => &mut self.consumables_percent,
            JobField::MaterialMarkupPercent => &mut self.material_markup_percent,
            JobField::ContingencyPercent => &mut self.contingency_percent,
            JobField::WarrantyReservePercent => &mut self.warranty_reserve_percent,
            JobField::DiscountPercent => &mut self.discount_percent,
            JobField::TravelHours => &mut self.travel_hours,
            JobField::AdminHours => &mut self.admin_hours,
            JobField::Miles => &mut self.miles,
            JobField::MileageRate => &mut self.mileage_rate,
            JobField::SubcontractorCost => &mut self.subcontractor_cost,
            JobField::ParkingTolls => &mut self.parking_tolls,
            JobField::QuoteAmount => &mut self.quote_amount,
            JobField::Workers | JobField::Results => return false,
        };
        *slot = value;
        true
    }

    pub fn is_finite(&self) -> bool {
        [
            self.material_cost,
            self.labour_hours,
            self.hourly_rate,
            self.overhead_percentage,
            self.desired_profit_margin,
            self.consumables_percent,
            self.material_markup_percent,
            self.contingency_percent,
            self.warranty_reserve_percent,
            self.discount_percent,
            self.quote_amount,
            self.travel_hours,
            self.admin_hours,
            self.miles,
            self.mileage_rate,
            self.subcontractor_cost,
            self.parking_tolls,
        ]
        .iter()
        .all(|value| value.is_finite())
            && self
                .workers
                .iter()
                .all(|worker| worker.hours.is_finite() && worker.hourly_rate.is_finite())
    }

    pub fn next_worker_id(&self) -> WorkerId {
        let max = self
            .workers
            .iter()
            .map(|worker| worker.id.get())
            .max()
            .unwrap_or(0);
        WorkerId::new(max + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabourTotals {
    pub total_hours: f64,
    pub total_cost: f64,
    pub blended_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VatConfig {
    pub registered: bool,
    pub rate: f64,
}

impl Default for VatConfig {
    fn default() -> Self {
        Self {
            registered: false,
            rate: DEFAULT_VAT_RATE,
        }
    }
}

/// Every intermediate quantity of a calculation, in derivation order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub total_labour_hours: f64,
    pub total_labour_cost: f64,
    pub blended_hourly_rate: f64,
    pub non_billable_cost: f64,
    pub mileage_cost: f64,
    pub consumables_cost: f64,
    pub direct_costs: f64,
    pub overhead_cost: f64,
    pub contingency_cost: f64,
    pub warranty_reserve_cost: f64,
    pub material_markup_value: f64,
    pub discount_base: f64,
    pub discount_value: f64,
}

impl CostBreakdown {
    pub fn is_finite(&self) -> bool {
        [
            self.total_labour_hours,
            self.total_labour_cost,
            self.blended_hourly_rate,
            self.non_billable_cost,
            self.mileage_cost,
            self.consumables_cost,
            self.direct_costs,
            self.overhead_cost,
            self.contingency_cost,
            self.warranty_reserve_cost,
            self.material_markup_value,
            self.discount_base,
            self.discount_value,
        ]
        .iter()
        .all(|value| value.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub total_costs: f64,
    pub actual_profit: f64,
    pub actual_profit_margin: f64,
    pub vat_amount: f64,
    #[serde(rename = "totalWithVAT")]
    pub total_with_vat: f64,
    #[serde(rename = "minimumQuoteExVAT")]
    pub minimum_quote_ex_vat: f64,
    #[serde(rename = "suggestedClientPriceExVAT")]
    pub suggested_client_price_ex_vat: f64,
    #[serde(default)]
    pub breakdown: CostBreakdown,
}

impl CalculationResult {
    /// JSON has no encoding for infinities or NaN, so only finite results can
    /// be stored.
    pub fn is_finite(&self) -> bool {
        [
            self.total_costs,
            self.actual_profit,
            self.actual_profit_margin,
            self.vat_amount,
            self.total_with_vat,
            self.minimum_quote_ex_vat,
            self.suggested_client_price_ex_vat,
        ]
        .iter()
        .all(|value| value.is_finite())
            && self.breakdown.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Profitability {
    Profitable,
    Unprofitable { shortfall: f64 },
}

impl Profitability {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Profitable => "Profitable",
            Self::Unprofitable { .. } => "Unprofitable",
        }
    }

    pub const fn is_profitable(self) -> bool {
        matches!(self, Self::Profitable)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationHistoryEntry {
    pub id: HistoryEntryId,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub job_type: String,
    pub inputs: JobInputs,
    pub results: CalculationResult,
}

impl CalculationHistoryEntry {
    /// Builds an entry whose id is the timestamp in unix milliseconds.
    pub fn new(
        timestamp: OffsetDateTime,
        job_type: impl Into<String>,
        inputs: JobInputs,
        results: CalculationResult,
    ) -> Self {
        let millis = timestamp.unix_timestamp_nanos() / 1_000_000;
        Self {
            id: HistoryEntryId::new(i64::try_from(millis).unwrap_or(i64::MAX)),
            timestamp,
            job_type: job_type.into(),
            inputs,
            results,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.inputs.is_finite() && self.results.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingKey {
    VatRegistered,
    VatRate,
}

impl SettingKey {
    pub const ALL: [Self; 2] = [Self::VatRegistered, Self::VatRate];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VatRegistered => "vat.registered",
            Self::VatRate => "vat.rate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "vat.registered" => Some(Self::VatRegistered),
            "vat.rate" => Some(Self::VatRate),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::VatRegistered => "VAT registered",
            Self::VatRate => "VAT rate",
        }
    }

    pub const fn expected_value_kind(self) -> SettingValueKind {
        match self {
            Self::VatRegistered => SettingValueKind::Bool,
            Self::VatRate => SettingValueKind::Number,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingValueKind {
    Bool,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
}

impl SettingValue {
    pub fn parse_for_key(key: SettingKey, raw: &str) -> Option<Self> {
        match key.expected_value_kind() {
            SettingValueKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Some(Self::Bool(true)),
                "0" | "false" | "off" | "no" => Some(Self::Bool(false)),
                _ => None,
            },
            SettingValueKind::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(Self::Number),
        }
    }

    pub fn to_storage(&self, key: SettingKey) -> Option<String> {
        match (key.expected_value_kind(), self) {
            (SettingValueKind::Bool, Self::Bool(value)) => {
                Some(if *value { "true" } else { "false" }.to_owned())
            }
            (SettingValueKind::Number, Self::Number(value)) => Some(value.to_string()),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Bool(true) => "on".to_owned(),
            Self::Bool(false) => "off".to_owned(),
            Self::Number(value) => format!("{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSetting {
    pub key: SettingKey,
    pub value: SettingValue,
}
