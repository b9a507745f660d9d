// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod job;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use jobprofit_app::format::{parse_amount, parse_optional_amount, parse_percent};
use jobprofit_app::{
    AppSetting, CalculatorCommand, CalculatorEvent, CalculatorState, HistoryStore, JobField,
    SkillLevel, VatConfig, Worker, WorkerId,
};
use jobprofit_db::Store;
use job::JobFile;
use runtime::{CalcRuntime, JobOutcome};
use std::env;
use std::fmt::Write as _;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    if options.print_example_job {
        print!("{}", JobFile::example());
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `jobprofit --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    init_logging(&config.log_level());

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or JOBPROFIT_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;

    if options.check_only {
        store.list_settings()?;
        store.read_history().context(
            "stored history is unreadable; run `jobprofit --clear-history` to start a fresh log",
        )?;
        debug!(path = %db_path.display(), "check passed");
        return Ok(());
    }

    if !options.has_action() {
        print_help();
        return Ok(());
    }

    if let Some(registered) = options.set_vat {
        store.put_vat_registered(registered)?;
    }
    if let Some(rate) = options.set_vat_rate {
        store.put_vat_rate(rate)?;
    }
    if options.set_vat.is_some() || options.set_vat_rate.is_some() {
        print!("{}", settings_report(&store.list_settings()?));
    }

    let runtime = CalcRuntime::new(&store);
    if options.clear_history {
        runtime.clear_history()?;
        println!("History cleared");
    }

    if options.job_path.is_some() || options.demo {
        let vat = store.vat_config(config.vat())?;
        run_job(&runtime, &options, vat)?;
    }

    if options.show_history {
        print!("{}", ensure_trailing_newline(runtime.history_listing()));
    }

    if options.share {
        match runtime.share_latest() {
            Some(summary) => println!("{summary}"),
            None => println!("No calculations recorded yet"),
        }
    }

    Ok(())
}

fn run_job<H: HistoryStore>(
    runtime: &CalcRuntime<'_, H>,
    options: &CliOptions,
    vat: VatConfig,
) -> Result<()> {
    let job = match &options.job_path {
        Some(path) => JobFile::load(path)?,
        None => JobFile::parse(JobFile::example())?,
    };

    let mut state = prepare_session(job, options, vat)?;
    match runtime.calculate(&mut state, OffsetDateTime::now_utc())? {
        JobOutcome::Calculated { report, saved, .. } => {
            println!("{}", state.job_type);
            println!("{report}");
            if saved.is_none() {
                eprintln!("warning: calculation was not saved to history");
            }
            println!("Calculation complete");
            Ok(())
        }
        JobOutcome::Rejected(errors) => {
            for (field, message) in errors.iter() {
                eprintln!("  {field}: {message}");
            }
            bail!(
                "{} field(s) need attention; fix the job file and retry",
                errors.len()
            )
        }
    }
}

/// Applies command-line edits to the job file's inputs, in the order: job
/// type, worker removals, worker additions, mode, field overrides, quote.
fn prepare_session(job: JobFile, options: &CliOptions, vat: VatConfig) -> Result<CalculatorState> {
    let mut state = CalculatorState::with_inputs(job.inputs);
    if let Some(job_type) = options.job_type.clone().or(job.job_type) {
        state.dispatch(CalculatorCommand::SetJobType(job_type));
    }

    for worker_id in &options.remove_workers {
        let events = state.dispatch(CalculatorCommand::RemoveWorker(*worker_id));
        if !events
            .iter()
            .any(|event| matches!(event, CalculatorEvent::WorkersChanged { .. }))
        {
            bail!("job has no worker with id {worker_id}; check the [[workers]] ids in the job file");
        }
    }
    for worker in &options.workers {
        let mut worker = worker.clone();
        worker.id = state.inputs.next_worker_id();
        state.dispatch(CalculatorCommand::AddWorker(worker));
    }
    if options.single_worker {
        state.dispatch(CalculatorCommand::SetMultiWorker(false));
    } else if !options.workers.is_empty() {
        state.dispatch(CalculatorCommand::SetMultiWorker(true));
    }

    for (field, value) in &options.field_overrides {
        if !state.inputs.set_field(*field, *value) {
            bail!("{field} cannot be set with --set");
        }
    }
    if let Some(quote) = options.quote {
        state.inputs.quote_amount = quote;
    }
    state.dispatch(CalculatorCommand::SetVat(vat));
    Ok(state)
}

fn settings_report(settings: &[AppSetting]) -> String {
    let mut text = String::new();
    for setting in settings {
        let _ = writeln!(text, "{}: {}", setting.key.label(), setting.value.display());
    }
    text
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env("JOBPROFIT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn ensure_trailing_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    config_path: PathBuf,
    job_path: Option<PathBuf>,
    job_type: Option<String>,
    quote: Option<f64>,
    field_overrides: Vec<(JobField, f64)>,
    workers: Vec<Worker>,
    remove_workers: Vec<WorkerId>,
    single_worker: bool,
    show_history: bool,
    share: bool,
    clear_history: bool,
    set_vat: Option<bool>,
    set_vat_rate: Option<f64>,
    print_config_path: bool,
    print_db_path: bool,
    print_example: bool,
    print_example_job: bool,
    demo: bool,
    check_only: bool,
    show_help: bool,
}

impl CliOptions {
    fn new(config_path: PathBuf) -> Self {
        Self {
            config_path,
            job_path: None,
            job_type: None,
            quote: None,
            field_overrides: Vec::new(),
            workers: Vec::new(),
            remove_workers: Vec::new(),
            single_worker: false,
            show_history: false,
            share: false,
            clear_history: false,
            set_vat: None,
            set_vat_rate: None,
            print_config_path: false,
            print_db_path: false,
            print_example: false,
            print_example_job: false,
            demo: false,
            check_only: false,
            show_help: false,
        }
    }

    fn has_action(&self) -> bool {
        self.job_path.is_some()
            || self.demo
            || self.show_history
            || self.share
            || self.clear_history
            || self.set_vat.is_some()
            || self.set_vat_rate.is_some()
    }
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions::new(default_config_path);

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--job" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--job requires a file path"))?;
                options.job_path = Some(PathBuf::from(value.as_ref()));
            }
            "--job-type" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--job-type requires a label"))?;
                options.job_type = Some(value.as_ref().to_owned());
            }
            "--quote" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--quote requires an amount"))?;
                let amount = parse_amount(value.as_ref())
                    .with_context(|| format!("--quote {:?} is not a valid amount", value.as_ref()))?;
                options.quote = Some(amount);
            }
            "--set" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--set requires <field>=<value>"))?;
                options
                    .field_overrides
                    .push(parse_field_override(value.as_ref())?);
            }
            "--worker" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--worker requires <role>:<hours>:<rate>[:<skill>]"))?;
                options.workers.push(parse_worker(value.as_ref())?);
            }
            "--remove-worker" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--remove-worker requires a worker id"))?;
                let id = value.as_ref().trim().parse::<i64>().with_context(|| {
                    format!("--remove-worker {:?} is not a worker id", value.as_ref())
                })?;
                options.remove_workers.push(WorkerId::new(id));
            }
            "--single-worker" => {
                options.single_worker = true;
            }
            "--history" => {
                options.show_history = true;
            }
            "--share" => {
                options.share = true;
            }
            "--clear-history" => {
                options.clear_history = true;
            }
            "--set-vat" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--set-vat requires on or off"))?;
                options.set_vat = Some(parse_switch(value.as_ref())?);
            }
            "--set-vat-rate" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--set-vat-rate requires a percentage"))?;
                let rate = parse_percent(value.as_ref()).with_context(|| {
                    format!("--set-vat-rate {:?} is not a valid percentage", value.as_ref())
                })?;
                options.set_vat_rate = Some(rate);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--print-example-job" => {
                options.print_example_job = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.single_worker && !options.workers.is_empty() {
        bail!("--single-worker cannot be combined with --worker");
    }

    Ok(options)
}

/// Parses `<field>=<value>`. Blank values mean zero for optional amounts.
fn parse_field_override(raw: &str) -> Result<(JobField, f64)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("--set expects <field>=<value>, got {raw:?}"))?;
    let name = name.trim();
    let field = JobField::parse(name).ok_or_else(|| {
        anyhow!("--set names unknown field {name:?}; run `jobprofit --print-example-job` for field names")
    })?;
    if field == JobField::Workers {
        bail!("--set cannot change workers; use --worker and --remove-worker");
    }

    let parsed = if field.is_percent() {
        parse_percent(value)
    } else if field.is_optional() {
        parse_optional_amount(value)
    } else {
        parse_amount(value)
    };
    let parsed = parsed.with_context(|| format!("--set {raw:?} has an invalid value"))?;
    Ok((field, parsed))
}

/// Parses `<role>:<hours>:<rate>[:<skill>]`. The id is assigned when the
/// worker joins the session.
fn parse_worker(raw: &str) -> Result<Worker> {
    let parts: Vec<&str> = raw.split(':').map(str::trim).collect();
    let (role, hours, rate, skill) = match parts.as_slice() {
        [role, hours, rate] => (*role, *hours, *rate, None),
        [role, hours, rate, skill] => (*role, *hours, *rate, Some(*skill)),
        _ => bail!("--worker expects <role>:<hours>:<rate>[:<skill>], got {raw:?}"),
    };
    if role.is_empty() {
        bail!("--worker {raw:?} needs a role");
    }

    let hours =
        parse_amount(hours).with_context(|| format!("--worker {raw:?} has invalid hours"))?;
    let hourly_rate =
        parse_amount(rate).with_context(|| format!("--worker {raw:?} has an invalid rate"))?;
    let skill_level = match skill {
        Some(skill) => SkillLevel::parse(&skill.to_ascii_lowercase()).ok_or_else(|| {
            anyhow!(
                "unknown skill level {skill:?}; expected one of {}",
                SkillLevel::ALL.map(SkillLevel::as_str).join(", ")
            )
        })?,
        None => SkillLevel::Electrician,
    };

    Ok(Worker {
        id: WorkerId::new(0),
        role: role.to_owned(),
        hours,
        hourly_rate,
        skill_level,
    })
}

fn parse_switch(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => bail!("expected on or off, got {other:?}"),
    }
}

fn print_help() {
    println!("jobprofit - job profitability calculator");
    println!("  --job <path>             Calculate the job described in a TOML file");
    println!("  --job-type <label>       Label for the calculation (overrides the job file)");
    println!("  --quote <amount>         Override the job file's quote amount");
    println!("  --set <field>=<value>    Override one job input, e.g. parkingTolls=12.50");
    println!("  --worker <r:h:rate[:s]>  Add a worker and price labour per worker");
    println!("  --remove-worker <id>     Drop a worker listed in the job file");
    println!("  --single-worker          Price labour from labourHours and hourlyRate");
    println!("  --history                List the last 10 calculations, newest first");
    println!("  --share                  Print a shareable summary of the newest calculation");
    println!("  --clear-history          Delete all recorded calculations");
    println!("  --set-vat <on|off>       Store whether you are VAT registered");
    println!("  --set-vat-rate <pct>     Store the VAT rate (0-100)");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --print-example-job      Print a job file template");
    println!("  --demo                   Calculate the example job against an in-memory database");
    println!("  --check                  Validate config + DB and exit");
    println!("  --help                   Show this help");
}
