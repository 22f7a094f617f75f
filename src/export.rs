use crate::error::Result;
use crate::rollup::{Grain, PeriodAggregate};
use crate::{MonthlyRecord, SimulationOutput};
use csv::Writer;
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Rounds half away from zero to 2 decimal places. Values that round to
/// zero come back as `0.0`, never `-0.0`.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Exported variance ratio: the fraction itself, rounded to 2 dp.
fn ratio_2dp(value: Option<f64>) -> Cell {
    match value {
        Some(v) => Cell::Amount(round2(v)),
        None => Cell::Missing,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Flag(bool),
    /// Already rounded to 2 dp; rendered with two decimals
    Amount(f64),
    /// Unrounded factor or rate
    Ratio(f64),
    Missing,
}

impl Cell {
    fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Integer(i) => i.to_string(),
            Cell::Flag(b) => b.to_string(),
            Cell::Amount(x) => format!("{:.2}", x),
            Cell::Ratio(x) => x.to_string(),
            Cell::Missing => String::new(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Cell::Text(s) => Value::from(s.as_str()),
            Cell::Integer(i) => Value::from(*i),
            Cell::Flag(b) => Value::from(*b),
            Cell::Amount(x) | Cell::Ratio(x) => Value::from(*x),
            Cell::Missing => Value::Null,
        }
    }
}

/// Presentation copy of a dataset: ordered headers and typed cells.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Serialize)]
struct Column<'a> {
    name: &'a str,
    values: Vec<Value>,
}

#[derive(Serialize)]
struct ColumnarTable<'a> {
    row_count: usize,
    columns: Vec<Column<'a>>,
}

impl Table {
    pub fn monthly(records: &[MonthlyRecord], keep_components: bool) -> Self {
        let mut headers = vec![
            "Department",
            "Month",
            "MonthIndex",
            "Year",
            "Quarter",
            "MonthOfYear",
            "QuarterPeriod",
            "YearPeriod",
        ];
        if keep_components {
            headers.extend(["Base", "Trend", "Seasonality", "Noise", "Shock"]);
        }
        headers.extend([
            "ShockFlag",
            "Budget",
            "Actual",
            "Forecast",
            "Variance",
            "PctVariance",
            "YTD_Budget",
            "YTD_Actual",
            "YTD_Variance",
            "YTD_PctVariance",
        ]);

        let rows = records
            .iter()
            .map(|r| {
                let mut row = vec![
                    Cell::Text(r.department.to_string()),
                    Cell::Text(r.month.clone()),
                    Cell::Integer(r.month_index as i64),
                    Cell::Integer(r.year as i64),
                    Cell::Integer(r.quarter as i64),
                    Cell::Integer(r.month_of_year as i64),
                    Cell::Text(r.quarter_period.clone()),
                    Cell::Text(r.year_period.clone()),
                ];
                if keep_components {
                    row.extend([
                        Cell::Amount(round2(r.base)),
                        Cell::Amount(round2(r.trend)),
                        Cell::Ratio(r.seasonality),
                        Cell::Amount(round2(r.noise)),
                        Cell::Amount(round2(r.shock)),
                    ]);
                }
                row.extend([
                    Cell::Flag(r.shock_flag),
                    Cell::Amount(round2(r.budget)),
                    Cell::Amount(round2(r.actual)),
                    Cell::Amount(round2(r.forecast)),
                    Cell::Amount(round2(r.variance)),
                    ratio_2dp(r.pct_variance),
                    Cell::Amount(round2(r.ytd_budget)),
                    Cell::Amount(round2(r.ytd_actual)),
                    Cell::Amount(round2(r.ytd_variance)),
                    ratio_2dp(r.ytd_pct_variance),
                ]);
                row
            })
            .collect();

        Self { headers, rows }
    }

    pub fn periods(aggregates: &[PeriodAggregate]) -> Self {
        let quarterly = aggregates.iter().any(|a| a.grain == Grain::Quarter);

        let mut headers = vec!["Department", "Period", "Year"];
        if quarterly {
            headers.push("Quarter");
        }
        headers.extend([
            "Months",
            "Budget",
            "Actual",
            "Forecast",
            "Variance",
            "PctVariance",
            "ShockCount",
            "ShockRate",
        ]);

        let rows = aggregates
            .iter()
            .map(|a| {
                let mut row = vec![
                    Cell::Text(a.department.to_string()),
                    Cell::Text(a.period.clone()),
                    Cell::Integer(a.year as i64),
                ];
                if quarterly {
                    row.push(match a.quarter {
                        Some(q) => Cell::Integer(q as i64),
                        None => Cell::Missing,
                    });
                }
                row.extend([
                    Cell::Integer(a.months as i64),
                    Cell::Amount(round2(a.budget)),
                    Cell::Amount(round2(a.actual)),
                    Cell::Amount(round2(a.forecast)),
                    Cell::Amount(round2(a.variance)),
                    ratio_2dp(a.pct_variance),
                    Cell::Integer(a.shock_count as i64),
                    Cell::Ratio(a.shock_rate),
                ]);
                row
            })
            .collect();

        Self { headers, rows }
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut wtr = Writer::from_writer(vec![]);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(Cell::render))?;
        }

        let data = wtr
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        String::from_utf8(data)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
    }

    /// Column-major JSON: `{"row_count": n, "columns": [{"name", "values"}]}`.
    pub fn to_columnar_json(&self) -> Result<String> {
        let columns = self
            .headers
            .iter()
            .copied()
            .enumerate()
            .map(|(i, name)| Column {
                name,
                values: self.rows.iter().map(|row| row[i].to_json()).collect(),
            })
            .collect();

        let table = ColumnarTable {
            row_count: self.rows.len(),
            columns,
        };
        Ok(serde_json::to_string_pretty(&table)?)
    }
}

/// Renders the monthly, quarterly and yearly tables as CSV and columnar JSON
/// and writes them into `dir`. Nothing is written unless every artifact
/// rendered successfully.
pub fn write_outputs(output: &SimulationOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    let tables = [
        ("monthly", Table::monthly(&output.monthly, output.keep_components)),
        ("quarterly", Table::periods(&output.quarterly)),
        ("yearly", Table::periods(&output.yearly)),
    ];

    let mut artifacts = Vec::with_capacity(tables.len() * 2);
    for (name, table) in &tables {
        artifacts.push((dir.join(format!("{}.csv", name)), table.to_csv()?));
        artifacts.push((
            dir.join(format!("{}.columns.json", name)),
            table.to_columnar_json()?,
        ));
    }

    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(artifacts.len());
    for (path, contents) in artifacts {
        fs::write(&path, contents)?;
        info!("Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{simulate_financials, Department, SimulationConfig};

    fn small_output() -> SimulationOutput {
        let config = SimulationConfig {
            start_month: "2018-01".to_string(),
            end_month: "2018-06".to_string(),
            departments: vec![Department::Finance, Department::Marketing],
            ..SimulationConfig::default()
        };
        simulate_financials(&config).unwrap()
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.005_f64 * 1000.0), 1005.0);
        assert_eq!(round2(2.346), 2.35);
        assert_eq!(round2(-2.5551), -2.56);
        assert_eq!(round2(10.0), 10.0);
    }

    #[test]
    fn test_monthly_csv_shape() {
        let output = small_output();
        let csv = Table::monthly(&output.monthly, true).to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 1 + 12);
        assert!(lines[0].starts_with("Department,Month,MonthIndex"));
        assert!(lines[0].contains("Trend"));
        assert!(lines[1].starts_with("Finance,2018-01,0,2018,1,1,2018Q1,2018"));
    }

    #[test]
    fn test_components_dropped_when_not_kept() {
        let output = small_output();
        let kept = Table::monthly(&output.monthly, true);
        let dropped = Table::monthly(&output.monthly, false);

        assert_eq!(kept.headers.len(), dropped.headers.len() + 5);
        assert!(!dropped.headers.contains(&"Seasonality"));
        assert!(dropped.rows.iter().all(|r| r.len() == dropped.headers.len()));
    }

    #[test]
    fn test_amounts_rendered_with_two_decimals() {
        let output = small_output();
        let table = Table::monthly(&output.monthly, false);
        let budget_col = table.headers.iter().position(|h| *h == "Budget").unwrap();

        for row in &table.rows {
            let rendered = row[budget_col].render();
            let decimals = rendered.split('.').nth(1).unwrap();
            assert_eq!(decimals.len(), 2, "{}", rendered);
        }
    }

    #[test]
    fn test_round2_never_yields_negative_zero() {
        assert!(round2(-0.001).is_sign_positive());
        assert_eq!(Cell::Amount(round2(-0.004)).render(), "0.00");
        assert_eq!(Cell::Amount(round2(-0.005)).render(), "-0.01");
    }

    #[test]
    fn test_missing_pct_renders_empty() {
        assert_eq!(ratio_2dp(None).render(), "");
        assert_eq!(ratio_2dp(None).to_json(), Value::Null);
        assert_eq!(ratio_2dp(Some(0.123456)).render(), "0.12");
    }

    #[test]
    fn test_exported_pct_variance_is_rounded_fraction() {
        let output = small_output();
        let table = Table::monthly(&output.monthly, true);
        let pct_col = table
            .headers
            .iter()
            .position(|h| *h == "PctVariance")
            .unwrap();

        for (record, row) in output.monthly.iter().zip(&table.rows) {
            let expected = round2(record.variance / record.budget);
            assert_eq!(row[pct_col], Cell::Amount(expected));
        }
    }

    #[test]
    fn test_columnar_json_layout() {
        let output = small_output();
        let table = Table::periods(&output.quarterly);
        let json: Value = serde_json::from_str(&table.to_columnar_json().unwrap()).unwrap();

        assert_eq!(json["row_count"], 4);
        let columns = json["columns"].as_array().unwrap();
        assert_eq!(columns.len(), table.headers.len());
        assert_eq!(columns[0]["name"], "Department");
        assert_eq!(columns[0]["values"][0], "Finance");
        assert_eq!(columns[1]["values"][1], "2018Q2");
        assert_eq!(columns[3]["name"], "Quarter");
    }

    #[test]
    fn test_yearly_table_has_no_quarter_column() {
        let output = small_output();
        let table = Table::periods(&output.yearly);
        assert!(!table.headers.contains(&"Quarter"));
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_write_outputs_creates_all_artifacts() {
        let output = small_output();
        let dir = std::env::temp_dir().join(format!(
            "department-financials-sim-export-{}",
            std::process::id()
        ));

        let written = write_outputs(&output, &dir).unwrap();
        assert_eq!(written.len(), 6);
        for path in &written {
            assert!(path.exists(), "{} missing", path.display());
        }

        let monthly = fs::read_to_string(dir.join("monthly.csv")).unwrap();
        assert_eq!(monthly.lines().count(), 13);

        fs::remove_dir_all(&dir).unwrap();
    }
}
