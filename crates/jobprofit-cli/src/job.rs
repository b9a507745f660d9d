// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use jobprofit_app::{JobField, JobInputs};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const EXTRA_KEYS: [&str; 2] = ["jobType", "useMultiWorker"];

/// A job description on disk: every `JobInputs` field (camelCase) plus an
/// optional label. Missing fields take the calculator defaults; unknown keys
/// are rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFile {
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(flatten)]
    pub inputs: JobInputs,
}

impl JobFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read job file {}", path.display()))?;
        Self::parse(&raw).with_context(|| {
            format!(
                "parse job file {}; run `jobprofit --print-example-job` for a template",
                path.display()
            )
        })
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let value: toml::Value = toml::from_str(raw).context("decode job TOML")?;
        if let Some(table) = value.as_table() {
            for key in table.keys() {
                check_key(key)?;
            }
        }
        value.try_into().context("decode job TOML")
    }

    pub fn example() -> &'static str {
        EXAMPLE_JOB
    }
}

fn is_known_key(key: &str) -> bool {
    EXTRA_KEYS.contains(&key) || JobField::parse(key).is_some()
}

fn check_key(key: &str) -> Result<()> {
    if is_known_key(key) {
        return Ok(());
    }

    let suggestion = EXTRA_KEYS
        .into_iter()
        .chain(JobField::INPUTS.map(JobField::as_str))
        .find(|known| known.eq_ignore_ascii_case(key));
    match suggestion {
        Some(known) => bail!("unknown key `{key}` in job file; did you mean `{known}`?"),
        None => bail!(
            "unknown key `{key}` in job file; run `jobprofit --print-example-job` for the field names"
        ),
    }
}

const EXAMPLE_JOB: &str = r#"# jobprofit job file
jobType = "Consumer unit upgrade"

materialCost = 650.0
labourHours = 8.0
hourlyRate = 52.0
quoteAmount = 1100.0

overheadPercentage = 20.0
desiredProfitMargin = 25.0
consumablesPercent = 5.0
materialMarkupPercent = 10.0
contingencyPercent = 5.0
warrantyReservePercent = 0.0
discountPercent = 0.0

travelHours = 1.0
adminHours = 0.5
miles = 20.0
mileageRate = 0.45
subcontractorCost = 0.0
parkingTolls = 15.0

# Set to true and list the team below to price labour per worker.
useMultiWorker = false

# [[workers]]
# id = 1
# role = "Electrician"
# hours = 6.0
# hourlyRate = 40.0
# skillLevel = "electrician"
#
# [[workers]]
# id = 2
# role = "Apprentice"
# hours = 6.0
# hourlyRate = 15.0
# skillLevel = "apprentice"
"#;
