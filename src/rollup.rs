use crate::engine::ComposedRow;
use crate::schema::Department;
use crate::MonthlyRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Current month plus up to two preceding months.
pub const FORECAST_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grain {
    Quarter,
    Year,
}

/// Summary of one department over one quarter or year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAggregate {
    pub department: Department,
    pub grain: Grain,
    /// "2018Q1" or "2018"
    pub period: String,
    pub year: i32,
    pub quarter: Option<u32>,
    /// Months of the period covered by the simulated range
    pub months: u32,
    pub budget: f64,
    pub actual: f64,
    pub forecast: f64,
    pub shock_count: u32,
    pub variance: f64,
    pub pct_variance: Option<f64>,
    pub shock_rate: f64,
}

/// `variance / base`, or `None` when the base is exactly zero.
pub fn pct_variance(variance: f64, base: f64) -> Option<f64> {
    if base == 0.0 {
        None
    } else {
        Some(variance / base)
    }
}

/// Trailing mean of `actual` per department. Rows of a department must be in
/// ascending month order; departments may interleave.
pub fn rolling_forecast(rows: &[ComposedRow]) -> Vec<f64> {
    let mut windows: BTreeMap<Department, VecDeque<f64>> = BTreeMap::new();

    rows.iter()
        .map(|row| {
            let window = windows.entry(row.department).or_default();
            if window.len() == FORECAST_WINDOW {
                window.pop_front();
            }
            window.push_back(row.actual);
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

/// Cumulative (budget, actual) per department, restarting every calendar year.
pub fn year_to_date(rows: &[ComposedRow]) -> Vec<(f64, f64)> {
    let mut running: BTreeMap<Department, (i32, f64, f64)> = BTreeMap::new();

    rows.iter()
        .map(|row| {
            let entry = running
                .entry(row.department)
                .or_insert((row.month.year, 0.0, 0.0));
            if entry.0 != row.month.year {
                *entry = (row.month.year, 0.0, 0.0);
            }
            entry.1 += row.budget;
            entry.2 += row.actual;
            (entry.1, entry.2)
        })
        .collect()
}

/// Attaches forecast, variance and YTD measures to composed rows.
pub fn build_monthly(rows: Vec<ComposedRow>) -> Vec<MonthlyRecord> {
    let forecasts = rolling_forecast(&rows);
    let ytd = year_to_date(&rows);

    rows.into_iter()
        .zip(forecasts)
        .zip(ytd)
        .map(|((row, forecast), (ytd_budget, ytd_actual))| {
            let variance = row.actual - row.budget;
            let ytd_variance = ytd_actual - ytd_budget;
            MonthlyRecord {
                department: row.department,
                month: row.month.label(),
                month_index: row.month.index,
                year: row.month.year,
                month_of_year: row.month.month,
                quarter: row.month.quarter,
                quarter_period: row.month.quarter_period(),
                year_period: row.month.year_period(),
                base: row.base,
                trend: row.trend,
                seasonality: row.seasonality,
                noise: row.noise,
                shock: row.shock,
                shock_flag: row.shock_flag,
                budget: row.budget,
                actual: row.actual,
                forecast,
                variance,
                pct_variance: pct_variance(variance, row.budget),
                ytd_budget,
                ytd_actual,
                ytd_variance,
                ytd_pct_variance: pct_variance(ytd_variance, ytd_budget),
            }
        })
        .collect()
}

/// Groups monthly records by (department, period) in first-seen order.
/// Variance figures are derived from the period sums.
pub fn aggregate(records: &[MonthlyRecord], grain: Grain) -> Vec<PeriodAggregate> {
    let mut aggregates: Vec<PeriodAggregate> = Vec::new();
    let mut index: HashMap<(Department, String), usize> = HashMap::new();

    for record in records {
        let (period, quarter) = match grain {
            Grain::Quarter => (record.quarter_period.clone(), Some(record.quarter)),
            Grain::Year => (record.year_period.clone(), None),
        };

        let slot = *index
            .entry((record.department, period.clone()))
            .or_insert_with(|| {
                aggregates.push(PeriodAggregate {
                    department: record.department,
                    grain,
                    period,
                    year: record.year,
                    quarter,
                    months: 0,
                    budget: 0.0,
                    actual: 0.0,
                    forecast: 0.0,
                    shock_count: 0,
                    variance: 0.0,
                    pct_variance: None,
                    shock_rate: 0.0,
                });
                aggregates.len() - 1
            });

        let agg = &mut aggregates[slot];
        agg.months += 1;
        agg.budget += record.budget;
        agg.actual += record.actual;
        agg.forecast += record.forecast;
        if record.shock_flag {
            agg.shock_count += 1;
        }
    }

    for agg in &mut aggregates {
        agg.variance = agg.actual - agg.budget;
        agg.pct_variance = pct_variance(agg.variance, agg.budget);
        agg.shock_rate = agg.shock_count as f64 / agg.months as f64;
    }

    aggregates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{build_skeleton, Calendar};

    fn rows(
        departments: &[Department],
        start: &str,
        end: &str,
        actual: impl Fn(Department, u32) -> f64,
    ) -> Vec<ComposedRow> {
        let calendar = Calendar::from_labels(start, end).unwrap();
        build_skeleton(&calendar, departments)
            .into_iter()
            .map(|key| {
                let budget = 100.0 + key.month.index as f64;
                ComposedRow {
                    department: key.department,
                    base: 100.0,
                    trend: key.month.index as f64,
                    seasonality: 1.0,
                    noise: 0.0,
                    shock: 0.0,
                    shock_flag: key.month.index % 4 == 0,
                    budget,
                    actual: actual(key.department, key.month.index),
                    month: key.month,
                }
            })
            .collect()
    }

    #[test]
    fn test_forecast_window_shrinks_at_start() {
        let input = rows(&[Department::Finance], "2018-01", "2018-05", |_, t| {
            (t as f64 + 1.0) * 10.0
        });
        let forecast = rolling_forecast(&input);

        assert_eq!(forecast[0], 10.0);
        assert_eq!(forecast[1], 15.0);
        assert_eq!(forecast[2], 20.0);
        assert_eq!(forecast[3], 30.0);
        assert_eq!(forecast[4], 40.0);
    }

    #[test]
    fn test_forecast_does_not_leak_across_departments() {
        let input = rows(
            &[Department::Finance, Department::Sales],
            "2018-01",
            "2018-03",
            |d, _| if d == Department::Finance { 1000.0 } else { 10.0 },
        );
        let forecast = rolling_forecast(&input);
        assert_eq!(forecast[3], 10.0);
        assert_eq!(forecast[4], 10.0);
        assert_eq!(forecast[5], 10.0);
    }

    #[test]
    fn test_forecast_is_causal() {
        let base = rows(&[Department::Hr], "2018-01", "2018-12", |_, t| 50.0 + t as f64);
        let before = rolling_forecast(&base);

        let mut bumped = base.clone();
        bumped[6].actual += 1_000.0;
        let after = rolling_forecast(&bumped);

        assert_eq!(&before[..6], &after[..6]);
        assert_ne!(before[6], after[6]);
    }

    #[test]
    fn test_ytd_resets_each_year() {
        let input = rows(&[Department::Sales], "2018-11", "2019-02", |_, _| 1.0);
        let ytd = year_to_date(&input);

        assert_eq!(ytd[0].0, input[0].budget);
        assert_eq!(ytd[1].0, input[0].budget + input[1].budget);
        assert_eq!(ytd[2].0, input[2].budget);
        assert_eq!(ytd[3], (input[2].budget + input[3].budget, 2.0));
    }

    #[test]
    fn test_monthly_variance_fields() {
        let input = rows(&[Department::Finance], "2018-01", "2018-02", |_, _| 110.0);
        let monthly = build_monthly(input);

        assert_eq!(monthly[0].variance, 10.0);
        assert_eq!(monthly[0].pct_variance, Some(0.1));
        assert_eq!(monthly[1].ytd_budget, 201.0);
        assert_eq!(monthly[1].ytd_actual, 220.0);
        assert_eq!(monthly[1].ytd_variance, 19.0);
        assert_eq!(monthly[1].quarter_period, "2018Q1");
    }

    #[test]
    fn test_zero_budget_has_no_pct_variance() {
        assert_eq!(pct_variance(5.0, 0.0), None);
        assert_eq!(pct_variance(-5.0, 50.0), Some(-0.1));
    }

    #[test]
    fn test_quarterly_aggregate_sums_months() {
        let input = rows(
            &[Department::Finance, Department::Hr],
            "2018-01",
            "2018-12",
            |_, t| 90.0 + t as f64,
        );
        let monthly = build_monthly(input);
        let quarters = aggregate(&monthly, Grain::Quarter);

        assert_eq!(quarters.len(), 8);
        let q2 = &quarters[1];
        assert_eq!(q2.department, Department::Finance);
        assert_eq!(q2.period, "2018Q2");
        assert_eq!(q2.quarter, Some(2));
        assert_eq!(q2.months, 3);
        assert_eq!(q2.budget, 103.0 + 104.0 + 105.0);
        assert_eq!(q2.actual, 93.0 + 94.0 + 95.0);
        assert_eq!(q2.variance, q2.actual - q2.budget);
        assert_eq!(q2.pct_variance, Some(q2.variance / q2.budget));
        // month index 4 is the only shock month in Q2
        assert_eq!(q2.shock_count, 1);
        assert!((q2.shock_rate - 1.0 / 3.0).abs() < 1e-12);

        assert_eq!(quarters[4].department, Department::Hr);
        assert_eq!(quarters[4].period, "2018Q1");
    }

    #[test]
    fn test_yearly_aggregate_partial_year() {
        let input = rows(&[Department::Operations], "2018-10", "2019-03", |_, _| 100.0);
        let monthly = build_monthly(input);
        let years = aggregate(&monthly, Grain::Year);

        assert_eq!(years.len(), 2);
        assert_eq!(years[0].period, "2018");
        assert_eq!(years[0].months, 3);
        assert_eq!(years[0].quarter, None);
        assert_eq!(years[1].months, 3);
        assert_eq!(years[1].actual, 300.0);
    }
}
