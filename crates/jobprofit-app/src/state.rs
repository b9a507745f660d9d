// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    CalculationResult, FieldErrors, JobInputs, VatConfig, Worker, WorkerId, calculate, validate,
    validate_result,
};

pub const DEFAULT_JOB_TYPE: &str = "General";

/// One calculator session: the inputs being edited plus the outcome of the
/// last calculation. Owned by the caller and never shared.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorState {
    pub inputs: JobInputs,
    pub job_type: String,
    pub vat: VatConfig,
    pub last_result: Option<CalculationResult>,
    pub errors: FieldErrors,
    pub status_line: Option<String>,
}

impl Default for CalculatorState {
    fn default() -> Self {
        Self {
            inputs: JobInputs::default(),
            job_type: DEFAULT_JOB_TYPE.to_owned(),
            vat: VatConfig::default(),
            last_result: None,
            errors: FieldErrors::new(),
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalculatorCommand {
    SetMultiWorker(bool),
    AddWorker(Worker),
    RemoveWorker(WorkerId),
    SetJobType(String),
    SetVat(VatConfig),
    Calculate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalculatorEvent {
    ModeChanged { multi_worker: bool },
    WorkersChanged { count: usize },
    JobTypeChanged(String),
    VatChanged(VatConfig),
    ValidationFailed(FieldErrors),
    Calculated(CalculationResult),
    StatusUpdated(String),
}

impl CalculatorState {
    pub fn with_inputs(inputs: JobInputs) -> Self {
        Self {
            inputs,
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: CalculatorCommand) -> Vec<CalculatorEvent> {
        match command {
            CalculatorCommand::SetMultiWorker(multi_worker) => {
                self.inputs.use_multi_worker = multi_worker;
                let label = if multi_worker {
                    "multi-worker mode"
                } else {
                    "single-worker mode"
                };
                vec![
                    CalculatorEvent::ModeChanged { multi_worker },
                    self.set_status(label),
                ]
            }
            CalculatorCommand::AddWorker(mut worker) => {
                if self.inputs.workers.iter().any(|w| w.id == worker.id) {
                    worker.id = self.inputs.next_worker_id();
                }
                self.inputs.workers.push(worker);
                vec![CalculatorEvent::WorkersChanged {
                    count: self.inputs.workers.len(),
                }]
            }
            CalculatorCommand::RemoveWorker(worker_id) => {
                let before = self.inputs.workers.len();
                self.inputs.workers.retain(|worker| worker.id != worker_id);
                if self.inputs.workers.len() == before {
                    return vec![self.set_status(&format!("no worker with id {worker_id}"))];
                }
                vec![CalculatorEvent::WorkersChanged {
                    count: self.inputs.workers.len(),
                }]
            }
            CalculatorCommand::SetJobType(job_type) => {
                let trimmed = job_type.trim();
                self.job_type = if trimmed.is_empty() {
                    DEFAULT_JOB_TYPE.to_owned()
                } else {
                    trimmed.to_owned()
                };
                vec![CalculatorEvent::JobTypeChanged(self.job_type.clone())]
            }
            CalculatorCommand::SetVat(vat) => {
                self.vat = vat;
                vec![CalculatorEvent::VatChanged(vat)]
            }
            CalculatorCommand::Calculate => self.calculate(),
        }
    }

    fn calculate(&mut self) -> Vec<CalculatorEvent> {
        let errors = validate(&self.inputs);
        if !errors.is_empty() {
            return self.reject(errors);
        }

        let result = calculate(&self.inputs, self.vat);
        let errors = validate_result(&result);
        if !errors.is_empty() {
            return self.reject(errors);
        }

        self.errors = FieldErrors::new();
        self.last_result = Some(result);
        vec![
            CalculatorEvent::Calculated(result),
            self.set_status("calculation complete"),
        ]
    }

    fn reject(&mut self, errors: FieldErrors) -> Vec<CalculatorEvent> {
        self.last_result = None;
        self.errors = errors.clone();
        let status = format!("{} field(s) need attention", errors.len());
        vec![
            CalculatorEvent::ValidationFailed(errors),
            self.set_status(&status),
        ]
    }

    fn set_status(&mut self, message: &str) -> CalculatorEvent {
        self.status_line = Some(message.to_owned());
        CalculatorEvent::StatusUpdated(message.to_owned())
    }
}
