use crate::calendar::{CalendarMonth, RowKey};
use crate::error::{Result, SimulationError};
use crate::rng::{RowDraws, SimulationStream};
use crate::sampler::{DepartmentParameters, ParameterSet};
use crate::schema::Department;
use crate::seasonality::seasonal_factor;
use log::warn;
use serde::{Deserialize, Serialize};

/// Decomposition of one (department, month) before any rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedRow {
    pub department: Department,
    pub month: CalendarMonth,
    pub base: f64,
    pub trend: f64,
    /// Multiplicative factor, not an amount
    pub seasonality: f64,
    pub noise: f64,
    /// Zero unless `shock_flag` is set
    pub shock: f64,
    pub shock_flag: bool,
    pub budget: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityWarning {
    pub department: Department,
    pub month: String,
    pub budget: f64,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Composition {
    pub rows: Vec<ComposedRow>,
    pub warnings: Vec<DataQualityWarning>,
}

/// `base * ((1 + growth)^t − 1)`, exactly zero at `t = 0`.
pub fn trend_component(base_level: f64, growth_rate: f64, month_index: u32) -> f64 {
    base_level * ((1.0 + growth_rate).powi(month_index as i32) - 1.0)
}

pub fn budget_value(base_level: f64, trend: f64, seasonality: f64) -> f64 {
    (base_level + trend) * seasonality
}

/// Combines a department's parameters and one row's draws into its
/// components. Pure: all randomness arrives through `draws`.
pub fn compose_row(
    department: Department,
    month: &CalendarMonth,
    params: &DepartmentParameters,
    draws: RowDraws,
) -> ComposedRow {
    let base = params.base_level;
    let trend = trend_component(base, params.growth_rate, month.index);
    let seasonality = seasonal_factor(params.season_amplitude, params.season_phase, month.month);
    let budget = budget_value(base, trend, seasonality);

    let noise = draws.noise * params.noise_sigma * budget;
    let magnitude = draws.shock * params.shock_scale * budget + params.shock_location * budget;
    let shock = if draws.shock_flag { magnitude } else { 0.0 };

    // Finance actuals are never negative.
    let actual = (budget + noise + shock).max(0.0);

    ComposedRow {
        department,
        month: month.clone(),
        base,
        trend,
        seasonality,
        noise,
        shock,
        shock_flag: draws.shock_flag,
        budget,
        actual,
    }
}

pub struct ComponentComposer<'a> {
    params: &'a ParameterSet,
    fail_on_data_quality: bool,
}

impl<'a> ComponentComposer<'a> {
    pub fn new(params: &'a ParameterSet) -> Self {
        Self {
            params,
            fail_on_data_quality: false,
        }
    }

    pub fn fail_on_data_quality(mut self, fail: bool) -> Self {
        self.fail_on_data_quality = fail;
        self
    }

    /// Composes every row of `skeleton` in order, consuming three draws per
    /// row from `stream`.
    pub fn compose(
        &self,
        skeleton: &[RowKey],
        stream: &mut SimulationStream,
    ) -> Result<Composition> {
        let mut composition = Composition {
            rows: Vec::with_capacity(skeleton.len()),
            warnings: Vec::new(),
        };

        for key in skeleton {
            let params = self.params.get(&key.department).ok_or_else(|| {
                SimulationError::MissingParameterRanges(key.department.to_string())
            })?;

            let draws = stream.row_draws(params.shock_probability);
            let row = compose_row(key.department, &key.month, params, draws);

            if !(row.budget > 0.0 && row.budget.is_finite()) {
                if self.fail_on_data_quality {
                    return Err(SimulationError::DataQuality {
                        department: key.department.to_string(),
                        month: key.month.label(),
                        budget: row.budget,
                    });
                }

                let warning = DataQualityWarning {
                    department: key.department,
                    month: key.month.label(),
                    budget: row.budget,
                    message: format!(
                        "Budget {} is not positive; percent variance may be undefined",
                        row.budget
                    ),
                };
                warn!(
                    "Data quality warning for {} in {}: {}",
                    warning.department, warning.month, warning.message
                );
                composition.warnings.push(warning);
            }

            composition.rows.push(row);
        }

        Ok(composition)
    }
}
