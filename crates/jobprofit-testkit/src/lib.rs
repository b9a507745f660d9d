// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use jobprofit_app::{
    CalculationHistoryEntry, HistoryStore, JobInputs, SkillLevel, VatConfig, Worker, WorkerId,
    calculate, check_storable, decode_history, encode_history, record,
};
use std::cell::RefCell;
use std::path::PathBuf;
use time::OffsetDateTime;
use time::macros::datetime;

const JOB_TYPES: [&str; 12] = [
    "Consumer unit upgrade",
    "Full rewire",
    "EV charger install",
    "Kitchen rewire",
    "Outdoor lighting",
    "EICR inspection",
    "Socket additions",
    "Shower circuit",
    "Fault finding",
    "Garden office supply",
    "Smoke alarm upgrade",
    "Loft conversion first fix",
];

const ROLES: [(&str, SkillLevel); 5] = [
    ("Apprentice", SkillLevel::Apprentice),
    ("Improver", SkillLevel::Improver),
    ("Electrician", SkillLevel::Electrician),
    ("Approved Electrician", SkillLevel::Approved),
    ("Supervisor", SkillLevel::Supervisor),
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of realistic, always-valid job inputs.
#[derive(Debug, Clone)]
pub struct JobFaker {
    rng: DeterministicRng,
}

impl JobFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn job_type(&mut self) -> String {
        JOB_TYPES[self.rng.int_n(JOB_TYPES.len())].to_owned()
    }

    pub fn worker(&mut self, id: i64) -> Worker {
        let (role, skill_level) = ROLES[self.rng.int_n(ROLES.len())];
        Worker {
            id: WorkerId::new(id),
            role: role.to_owned(),
            hours: self.half_hours(1, 80),
            hourly_rate: self.amount(1_200, 8_500),
            skill_level,
        }
    }

    pub fn team(&mut self, size: usize) -> Vec<Worker> {
        (1..=size).map(|id| self.worker(id as i64)).collect()
    }

    /// Inputs that pass validation. Half of them use multi-worker mode.
    pub fn valid_inputs(&mut self) -> JobInputs {
        let use_multi_worker = self.rng.bool();
        let workers = if use_multi_worker {
            let size = 1 + self.rng.int_n(4);
            self.team(size)
        } else {
            Vec::new()
        };

        JobInputs {
            material_cost: self.amount(0, 500_000),
            labour_hours: self.half_hours(1, 160),
            hourly_rate: self.amount(1_500, 9_000),
            overhead_percentage: self.percent(0, 40),
            desired_profit_margin: self.percent(0, 60),
            consumables_percent: self.percent(0, 15),
            material_markup_percent: self.percent(0, 30),
            contingency_percent: self.percent(0, 15),
            warranty_reserve_percent: self.percent(0, 5),
            discount_percent: self.percent(0, 20),
            quote_amount: self.amount(5_000, 2_000_000),
            travel_hours: self.half_hours(0, 16),
            admin_hours: self.half_hours(0, 8),
            miles: self.int_range(0, 150) as f64,
            mileage_rate: self.amount(0, 60),
            subcontractor_cost: self.amount(0, 150_000),
            parking_tolls: self.amount(0, 5_000),
            workers,
            use_multi_worker,
        }
    }

    pub fn vat_config(&mut self) -> VatConfig {
        VatConfig {
            registered: self.rng.bool(),
            rate: self.percent(0, 25),
        }
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    // Whole pence keep generated amounts representable the way users enter them.
    fn amount(&mut self, min_pence: i64, max_pence: i64) -> f64 {
        self.int_range(min_pence, max_pence) as f64 / 100.0
    }

    fn half_hours(&mut self, min_halves: i64, max_halves: i64) -> f64 {
        self.int_range(min_halves, max_halves) as f64 / 2.0
    }

    fn percent(&mut self, min: i64, max: i64) -> f64 {
        self.int_range(min, max) as f64
    }
}

/// In-memory history backend that keeps the serialized payload, so tests can
/// exercise the same decode path a real store uses.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    raw: RefCell<Option<String>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: RefCell::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.borrow().clone()
    }
}

impl HistoryStore for MemoryHistory {
    fn load_history(&self) -> Vec<CalculationHistoryEntry> {
        match self.raw.borrow().as_deref() {
            Some(raw) => decode_history(raw).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    fn append_history(
        &self,
        entry: CalculationHistoryEntry,
    ) -> Result<Vec<CalculationHistoryEntry>> {
        check_storable(&entry)?;
        let history = record(entry, &self.load_history());
        let encoded = encode_history(&history).context("encode history")?;
        self.raw.replace(Some(encoded));
        Ok(history)
    }

    fn clear_history(&self) -> Result<()> {
        self.raw.replace(None);
        Ok(())
    }
}

/// Worked example: an under-priced consumer unit upgrade.
pub fn scenario_inputs() -> JobInputs {
    JobInputs {
        material_cost: 650.0,
        labour_hours: 8.0,
        hourly_rate: 52.0,
        overhead_percentage: 20.0,
        desired_profit_margin: 25.0,
        consumables_percent: 5.0,
        material_markup_percent: 10.0,
        contingency_percent: 5.0,
        warranty_reserve_percent: 0.0,
        discount_percent: 0.0,
        quote_amount: 1100.0,
        travel_hours: 1.0,
        admin_hours: 0.5,
        miles: 20.0,
        mileage_rate: 0.45,
        subcontractor_cost: 0.0,
        parking_tolls: 15.0,
        workers: Vec::new(),
        use_multi_worker: false,
    }
}

/// Three workers at 5h and 20/hr each, equivalent to 15h at 20/hr.
pub fn team_inputs() -> JobInputs {
    let workers = (1..=3)
        .map(|id| Worker {
            id: WorkerId::new(id),
            role: "Electrician".to_owned(),
            hours: 5.0,
            hourly_rate: 20.0,
            skill_level: SkillLevel::Electrician,
        })
        .collect();
    JobInputs {
        workers,
        use_multi_worker: true,
        ..scenario_inputs()
    }
}

/// Passes validation but overflows the minimum quote to infinity.
pub fn overflowing_inputs() -> JobInputs {
    JobInputs {
        material_cost: 1e307,
        desired_profit_margin: 100.0,
        ..scenario_inputs()
    }
}

pub fn history_entry(timestamp: OffsetDateTime, job_type: &str) -> CalculationHistoryEntry {
    let inputs = scenario_inputs();
    let results = calculate(&inputs, VatConfig::default());
    CalculationHistoryEntry::new(timestamp, job_type, inputs, results)
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("jobprofit.db");
    Ok((dir, db_path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

pub fn fixture_timestamp() -> OffsetDateTime {
    datetime!(2026-02-19 12:34:56 UTC)
}

pub fn job_types() -> &'static [&'static str] {
    &JOB_TYPES
}
