//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::blend::BlendOutcome;
use crate::domain::config_validation::{
    check_risk_free_rate, data_source_kind, evaluation_settings, validate_config, DataSourceKind,
    EvaluationSettings,
};
use crate::domain::engine::{evaluate_series, BenchmarkEngine};
use crate::domain::error::FundbenchError;
use crate::domain::evaluator::{Evaluation, EvaluationResult};
use crate::domain::periods::{periods_for, EvaluationPeriod};
use crate::domain::security::{Security, SecurityQuery};
use crate::domain::value_series::ValueSeries;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;
use crate::ports::DataSource;

#[derive(Parser, Debug)]
#[command(
    name = "fundbench",
    about = "Benchmark construction and performance evaluation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the blended value series of a benchmark or fund
    Blend {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        id: i64,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Evaluate a benchmark or a single security over the period menu
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, conflicts_with = "security", required_unless_present = "security")]
        id: Option<i64>,
        #[arg(long)]
        security: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, allow_negative_numbers = true)]
        risk_free_rate: Option<f64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Show the evaluation periods generated for a date span
    Periods {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// List securities matching a query
    Securities {
        #[arg(short, long)]
        config: PathBuf,
        /// Query term, e.g. `type.like=TI%` or `.order_by=code desc`
        #[arg(short, long = "query", value_parser = parse_key_val)]
        query: Vec<(String, String)>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// What an evaluation runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Schedule(i64),
    Security(String),
}

pub fn run(cli: Cli) -> ExitCode {
    let mut stdout = io::stdout().lock();
    let result = match cli.command {
        Command::Blend {
            config,
            id,
            start,
            end,
            output,
            format,
        } => run_blend(&config, id, start, end, output.as_deref(), format, &mut stdout),
        Command::Evaluate {
            config,
            id,
            security,
            start,
            end,
            risk_free_rate,
            output,
            format,
        } => {
            let subject = match (id, security) {
                (Some(id), _) => Subject::Schedule(id),
                (None, Some(code)) => Subject::Security(code),
                (None, None) => {
                    eprintln!("error: --id or --security is required");
                    return ExitCode::from(2);
                }
            };
            run_evaluate(
                &config,
                &subject,
                start,
                end,
                risk_free_rate,
                output.as_deref(),
                format,
                &mut stdout,
            )
        }
        Command::Periods { start, end, format } => run_periods(start, end, format, &mut stdout),
        Command::Securities {
            config,
            query,
            format,
        } => run_securities(&config, &query, format, &mut stdout),
        Command::Validate { config } => run_validate(&config, &mut stdout),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, FundbenchError> {
    tracing::info!(path = %path.display(), "loading config");
    let config = FileConfigAdapter::from_file(path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Open the data source named by `[data] source`.
pub fn open_source(config: &dyn ConfigPort) -> Result<Box<dyn DataSource>, FundbenchError> {
    match data_source_kind(config)? {
        DataSourceKind::Csv => {
            let dir = config
                .get_string("data", "csv_dir")
                .ok_or_else(|| FundbenchError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                })?;
            tracing::info!(%dir, "using CSV data source");
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        DataSourceKind::Sqlite => open_sqlite(config),
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &dyn ConfigPort) -> Result<Box<dyn DataSource>, FundbenchError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    tracing::info!("using SQLite data source");
    Ok(Box::new(SqliteAdapter::from_config(config)?))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &dyn ConfigPort) -> Result<Box<dyn DataSource>, FundbenchError> {
    Err(FundbenchError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: "built without the sqlite feature".into(),
    })
}

/// Request window: flags first, then `[evaluation]`, then open-ended.
pub fn resolve_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    settings: &EvaluationSettings,
) -> Result<(NaiveDate, NaiveDate), FundbenchError> {
    let start = start
        .or(settings.start_date)
        .or_else(|| NaiveDate::from_ymd_opt(1900, 1, 1))
        .unwrap_or(NaiveDate::MIN);
    let end = end
        .or(settings.end_date)
        .or_else(|| NaiveDate::from_ymd_opt(9999, 12, 31))
        .unwrap_or(NaiveDate::MAX);
    FundbenchError::check_order(start, end)?;
    Ok((start, end))
}

/// `--risk-free-rate` when given, checked like the config value; otherwise
/// the `[evaluation]` setting.
pub fn resolve_risk_free_rate(
    flag: Option<f64>,
    settings: &EvaluationSettings,
) -> Result<f64, FundbenchError> {
    match flag {
        Some(value) => check_risk_free_rate(value, "--risk-free-rate"),
        None => Ok(settings.risk_free_rate),
    }
}

fn run_blend(
    config_path: &Path,
    id: i64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    output: Option<&Path>,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), FundbenchError> {
    let config = load_config(config_path)?;
    let settings = evaluation_settings(&config)?;
    let (start, end) = resolve_window(start, end, &settings)?;
    let source = open_source(&config)?;

    run_blend_pipeline(source.as_ref(), id, start, end, output, format, out).map(|_| ())
}

pub fn run_blend_pipeline(
    source: &dyn DataSource,
    id: i64,
    start: NaiveDate,
    end: NaiveDate,
    output: Option<&Path>,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<BlendOutcome, FundbenchError> {
    let engine = BenchmarkEngine::new(source.prices(), source.schedules());

    tracing::info!(schedule = id, %start, %end, "building blended series");
    let outcome = engine.build_with_diagnostics(id, start, end)?;
    if outcome.overlap_count() > 0 {
        tracing::warn!(
            schedule = id,
            dates = outcome.overlap_count(),
            "dates with overlapping weight groups"
        );
    }

    emit_series(&outcome.series, output, format, out)?;
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
fn run_evaluate(
    config_path: &Path,
    subject: &Subject,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    risk_free_rate: Option<f64>,
    output: Option<&Path>,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), FundbenchError> {
    let config = load_config(config_path)?;
    let settings = evaluation_settings(&config)?;
    let (start, end) = resolve_window(start, end, &settings)?;
    let risk_free_rate = resolve_risk_free_rate(risk_free_rate, &settings)?;
    let source = open_source(&config)?;

    run_evaluate_pipeline(
        source.as_ref(),
        subject,
        start,
        end,
        risk_free_rate,
        output,
        format,
        out,
    )
    .map(|_| ())
}

#[allow(clippy::too_many_arguments)]
pub fn run_evaluate_pipeline(
    source: &dyn DataSource,
    subject: &Subject,
    start: NaiveDate,
    end: NaiveDate,
    risk_free_rate: f64,
    output: Option<&Path>,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<Evaluation, FundbenchError> {
    let engine = BenchmarkEngine::new(source.prices(), source.schedules());

    // Stage 1: series
    let series = match subject {
        Subject::Schedule(id) => {
            tracing::info!(schedule = id, %start, %end, "building blended series");
            engine.build_benchmark_series(*id, start, end)?
        }
        Subject::Security(code) => {
            tracing::info!(security = %code, %start, %end, "loading security prices");
            engine.security_series(code, start, end)?
        }
    };

    // Stage 2: evaluation
    tracing::info!(
        observations = series.len(),
        risk_free_rate,
        "evaluating periods"
    );
    let evaluation = evaluate_series(&series, risk_free_rate);
    tracing::info!(
        results = evaluation.results.len(),
        skipped = evaluation.diagnostics.len(),
        "evaluation complete"
    );

    // Stage 3: output
    emit_results(&evaluation.results, output, format, out)?;
    Ok(evaluation)
}

fn run_periods(
    start: NaiveDate,
    end: NaiveDate,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), FundbenchError> {
    let periods = periods_for(start, end)?;
    match format {
        OutputFormat::Table => out.write_all(render_periods_table(&periods).as_bytes())?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&periods)
                .map_err(|e| FundbenchError::Io(io::Error::other(e.to_string())))?;
            writeln!(out, "{json}")?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            for period in &periods {
                wtr.serialize(period)
                    .map_err(|e| FundbenchError::Io(io::Error::other(e.to_string())))?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

fn run_securities(
    config_path: &Path,
    pairs: &[(String, String)],
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), FundbenchError> {
    let query = SecurityQuery::parse(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    let config = load_config(config_path)?;
    let source = open_source(&config)?;

    let securities = source.securities().list_securities(&query)?;
    tracing::info!(count = securities.len(), "securities listed");
    write_securities(&securities, format, out)
}

pub fn write_securities(
    securities: &[Security],
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), FundbenchError> {
    match format {
        OutputFormat::Table => out.write_all(render_securities_table(securities).as_bytes())?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(securities)
                .map_err(|e| FundbenchError::Io(io::Error::other(e.to_string())))?;
            writeln!(out, "{json}")?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            for security in securities {
                wtr.serialize(security)
                    .map_err(|e| FundbenchError::Io(io::Error::other(e.to_string())))?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

fn run_validate(config_path: &Path, out: &mut dyn Write) -> Result<(), FundbenchError> {
    let config = load_config(config_path)?;
    let settings = evaluation_settings(&config)?;
    let source = match data_source_kind(&config)? {
        DataSourceKind::Csv => "csv",
        DataSourceKind::Sqlite => "sqlite",
    };

    writeln!(out, "Config validated successfully")?;
    writeln!(out, "  source:          {source}")?;
    writeln!(out, "  risk_free_rate:  {}", settings.risk_free_rate)?;
    if let Some(start) = settings.start_date {
        writeln!(out, "  start_date:      {start}")?;
    }
    if let Some(end) = settings.end_date {
        writeln!(out, "  end_date:        {end}")?;
    }
    Ok(())
}

/// Writer for a file output. `Table` falls back on the file extension.
fn report_adapter(format: OutputFormat, path: &Path) -> Box<dyn ReportPort> {
    let csv_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    match format {
        OutputFormat::Csv => Box::new(CsvReportAdapter::new()),
        OutputFormat::Table if csv_extension => Box::new(CsvReportAdapter::new()),
        OutputFormat::Json | OutputFormat::Table => Box::new(JsonReportAdapter::new()),
    }
}

fn emit_results(
    results: &[EvaluationResult],
    output: Option<&Path>,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), FundbenchError> {
    if let Some(path) = output {
        report_adapter(format, path).write_results(results, path)?;
        tracing::info!(path = %path.display(), "results written");
        return Ok(());
    }
    match format {
        OutputFormat::Table => out.write_all(render_results_table(results).as_bytes())?,
        OutputFormat::Json => writeln!(out, "{}", JsonReportAdapter::results_to_string(results)?)?,
        OutputFormat::Csv => CsvReportAdapter::write_results_to(results, out)?,
    }
    Ok(())
}

fn emit_series(
    series: &ValueSeries,
    output: Option<&Path>,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), FundbenchError> {
    if let Some(path) = output {
        report_adapter(format, path).write_series(series, path)?;
        tracing::info!(path = %path.display(), "series written");
        return Ok(());
    }
    match format {
        OutputFormat::Table => out.write_all(render_series_table(series).as_bytes())?,
        OutputFormat::Json => writeln!(out, "{}", JsonReportAdapter::series_to_string(series)?)?,
        OutputFormat::Csv => CsvReportAdapter::write_series_to(series, out)?,
    }
    Ok(())
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

pub fn render_results_table(results: &[EvaluationResult]) -> String {
    let mut table = format!(
        "{:<6} {:<10} {:<10} {:>6} {:>12} {:>12} {:>10} {:>10} {:>8} {:>9}\n",
        "Period", "Start", "End", "Obs", "Open", "Close", "Return", "Vol", "Sharpe", "MaxDD"
    );
    for r in results {
        table.push_str(&format!(
            "{:<6} {:<10} {:<10} {:>6} {:>12.4} {:>12.4} {:>10} {:>10} {:>8} {:>9}\n",
            r.period.label.as_str(),
            r.period.start_date,
            r.period.end_date,
            r.observation_count,
            r.open,
            r.close,
            pct(r.annualized_return),
            pct(r.annualized_volatility),
            ratio(r.sharpe_ratio),
            pct(r.max_drawdown),
        ));
    }
    table
}

pub fn render_series_table(series: &ValueSeries) -> String {
    let mut table = format!("{:<10} {:>14}\n", "Date", "Value");
    for point in series.points() {
        table.push_str(&format!("{:<10} {:>14.6}\n", point.date, point.value));
    }
    table
}

pub fn render_periods_table(periods: &[EvaluationPeriod]) -> String {
    let mut table = format!("{:<6} {:<10} {:<10}\n", "Period", "Start", "End");
    for p in periods {
        table.push_str(&format!(
            "{:<6} {:<10} {:<10}\n",
            p.label.as_str(),
            p.start_date,
            p.end_date
        ));
    }
    table
}

pub fn render_securities_table(securities: &[Security]) -> String {
    let mut table = format!(
        "{:<12} {:<10} {:<8} {:<6} {}\n",
        "Code", "Symbol", "Exchange", "Type", "Name"
    );
    for s in securities {
        table.push_str(&format!(
            "{:<12} {:<10} {:<8} {:<6} {}\n",
            s.code, s.symbol, s.exchange, s.security_type, s.name
        ));
    }
    table
}
