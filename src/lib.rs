//! # Department Financials Simulator
//!
//! A library for generating reproducible synthetic monthly financials per
//! department (Budget, Actual, Forecast, Variance) and rolling them up to
//! quarterly and yearly summaries.
//!
//! ## Core Concepts
//!
//! - **Decomposition**: Budget = (Base + Trend) × Seasonality; Actual adds Noise and a rare Shock
//! - **Single Stream**: Every random draw comes from one seeded stream in a fixed order,
//!   so the same seed always yields the same dataset
//! - **Rollups**: Forecast (trailing 3-month mean), Variance, YTD, quarterly and yearly grains,
//!   all computed on full-precision values
//! - **Export**: CSV and column-major JSON, rounded to 2 decimals at write time only
//!
//! ## Example
//!
//! ```rust,ignore
//! use department_financials_sim::*;
//!
//! let config = SimulationConfig {
//!     seed: 42,
//!     start_month: "2018-01".to_string(),
//!     end_month: "2018-12".to_string(),
//!     departments: vec![Department::Finance, Department::Sales],
//!     ..SimulationConfig::default()
//! };
//!
//! let output = simulate_financials(&config).unwrap();
//! assert_eq!(output.monthly.len(), 24);
//! write_outputs(&output, std::path::Path::new("data")).unwrap();
//! ```

pub mod calendar;
pub mod engine;
pub mod error;
pub mod export;
pub mod rng;
pub mod rollup;
pub mod sampler;
pub mod schema;
pub mod seasonality;
pub mod utils;

pub use calendar::{build_skeleton, Calendar, CalendarMonth, RowKey};
pub use engine::{
    budget_value, compose_row, trend_component, ComponentComposer, ComposedRow, Composition,
    DataQualityWarning,
};
pub use error::{Result, SimulationError};
pub use export::{round2, write_outputs, Table};
pub use rng::{RowDraws, SimulationStream};
pub use rollup::{aggregate, build_monthly, Grain, PeriodAggregate, FORECAST_WINDOW};
pub use sampler::{sample_parameters, DepartmentParameters, ParameterSampler, ParameterSet};
pub use schema::*;
pub use seasonality::{seasonal_bounds, seasonal_curve, seasonal_factor};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One row of the monthly fact table, keyed by (department, month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub department: Department,
    /// "YYYY-MM"
    pub month: String,
    /// 0-based position from the start of the simulated range
    pub month_index: u32,
    pub year: i32,
    pub month_of_year: u32,
    pub quarter: u32,
    pub quarter_period: String,
    pub year_period: String,

    pub base: f64,
    pub trend: f64,
    pub seasonality: f64,
    pub noise: f64,
    pub shock: f64,
    pub shock_flag: bool,

    pub budget: f64,
    pub actual: f64,
    pub forecast: f64,
    pub variance: f64,
    /// `None` when budget is exactly zero
    pub pct_variance: Option<f64>,

    pub ytd_budget: f64,
    pub ytd_actual: f64,
    pub ytd_variance: f64,
    pub ytd_pct_variance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub seed: u64,
    pub parameters: ParameterSet,
    pub monthly: Vec<MonthlyRecord>,
    pub quarterly: Vec<PeriodAggregate>,
    pub yearly: Vec<PeriodAggregate>,
    pub warnings: Vec<DataQualityWarning>,
    /// Whether the monthly export keeps the decomposition columns
    pub keep_components: bool,
}

pub struct FinancialSimulator;

impl FinancialSimulator {
    pub fn run(config: &SimulationConfig) -> Result<SimulationOutput> {
        validate_config(config)?;

        info!(
            "Simulating {} departments from {} to {} with seed {}",
            config.departments.len(),
            config.start_month,
            config.end_month,
            config.seed
        );

        let calendar = Calendar::from_labels(&config.start_month, &config.end_month)?;
        let skeleton = build_skeleton(&calendar, &config.departments);
        debug!(
            "Calendar has {} months; skeleton has {} rows",
            calendar.len(),
            skeleton.len()
        );

        let mut stream = SimulationStream::new(config.seed);
        let parameters = ParameterSampler::new(&config.departments, &config.parameter_ranges)?
            .sample(&mut stream);

        let composition = ComponentComposer::new(&parameters)
            .fail_on_data_quality(config.fail_on_data_quality)
            .compose(&skeleton, &mut stream)?;

        let monthly = build_monthly(composition.rows);
        let quarterly = aggregate(&monthly, Grain::Quarter);
        let yearly = aggregate(&monthly, Grain::Year);

        info!(
            "Generated {} monthly, {} quarterly and {} yearly rows ({} data quality warnings)",
            monthly.len(),
            quarterly.len(),
            yearly.len(),
            composition.warnings.len()
        );

        Ok(SimulationOutput {
            seed: config.seed,
            parameters,
            monthly,
            quarterly,
            yearly,
            warnings: composition.warnings,
            keep_components: config.keep_components,
        })
    }
}

pub fn simulate_financials(config: &SimulationConfig) -> Result<SimulationOutput> {
    FinancialSimulator::run(config)
}

/// Rejects invalid configuration before any random draw is made.
pub fn validate_config(config: &SimulationConfig) -> Result<()> {
    Calendar::from_labels(&config.start_month, &config.end_month)?;

    if config.departments.is_empty() {
        return Err(SimulationError::NoDepartments);
    }

    let mut seen = HashSet::new();
    for department in &config.departments {
        if !seen.insert(*department) {
            return Err(SimulationError::DuplicateDepartment(department.to_string()));
        }

        let ranges = config
            .parameter_ranges
            .get(department)
            .ok_or_else(|| SimulationError::MissingParameterRanges(department.to_string()))?;

        for (parameter, range) in ranges.named() {
            validate_range(*department, parameter, range)?;
        }
    }

    Ok(())
}

fn validate_range(
    department: Department,
    parameter: &'static str,
    range: ParameterRange,
) -> Result<()> {
    let invalid = |details: &str| SimulationError::InvalidParameterRange {
        department: department.to_string(),
        parameter,
        low: range.low,
        high: range.high,
        details: details.to_string(),
    };

    if !range.low.is_finite() || !range.high.is_finite() {
        return Err(invalid("bounds must be finite"));
    }
    if range.low > range.high {
        return Err(invalid("lower bound exceeds upper bound"));
    }

    match parameter {
        "base_level" if range.low <= 0.0 => Err(invalid("base level must be positive")),
        "season_amplitude" | "noise_sigma" | "shock_scale" if range.low < 0.0 => {
            Err(invalid("must be non-negative"))
        }
        "shock_probability" if range.low < 0.0 || range.high > 1.0 => {
            Err(invalid("probability must lie within [0, 1]"))
        }
        _ => Ok(()),
    }
}
