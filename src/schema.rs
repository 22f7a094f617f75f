use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
pub enum Department {
    #[schemars(description = "Finance and accounting: steady, low-volatility cost centre")]
    Finance,

    #[serde(rename = "HR")]
    #[schemars(description = "Human resources: payroll-driven, slow growth")]
    Hr,

    #[schemars(description = "Sales: largest base, strong growth and pronounced seasonality")]
    Sales,

    #[schemars(description = "Operations: large base with moderate growth")]
    Operations,

    #[schemars(
        description = "Marketing: campaign-driven, highest seasonal swing and shock exposure"
    )]
    Marketing,
}

impl Department {
    pub const ALL: [Department; 5] = [
        Department::Finance,
        Department::Hr,
        Department::Sales,
        Department::Operations,
        Department::Marketing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Finance => "Finance",
            Department::Hr => "HR",
            Department::Sales => "Sales",
            Department::Operations => "Operations",
            Department::Marketing => "Marketing",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Department::ALL
            .iter()
            .copied()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown department: {}", s))
    }
}

/// Inclusive bounds for one uniformly drawn parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ParameterRange {
    pub low: f64,
    pub high: f64,
}

impl ParameterRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub const fn fixed(value: f64) -> Self {
        Self {
            low: value,
            high: value,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct DepartmentRanges {
    #[schemars(description = "Starting monthly spend before trend and seasonality. Must be > 0.")]
    pub base_level: ParameterRange,

    #[schemars(
        description = "Monthly compounding growth rate, e.g. 0.004 = 0.4% per month. May be negative."
    )]
    pub growth_rate: ParameterRange,

    #[schemars(
        description = "Relative amplitude of the 12-month sinusoidal seasonal curve. Must be >= 0."
    )]
    pub season_amplitude: ParameterRange,

    #[schemars(
        description = "Relative standard deviation of the noise applied to budget. Must be >= 0."
    )]
    pub noise_sigma: ParameterRange,

    #[schemars(description = "Per-month probability of a shock event, within [0, 1].")]
    pub shock_probability: ParameterRange,

    #[schemars(description = "Shock mean as a fraction of budget. May be negative.")]
    pub shock_location: ParameterRange,

    #[schemars(description = "Laplace scale of the shock as a fraction of budget. Must be >= 0.")]
    pub shock_scale: ParameterRange,
}

impl DepartmentRanges {
    /// Built-in range table used by the reference dataset.
    pub fn reference(department: Department) -> Self {
        match department {
            Department::Finance => Self {
                base_level: ParameterRange::new(80_000.0, 120_000.0),
                growth_rate: ParameterRange::new(0.001, 0.004),
                season_amplitude: ParameterRange::new(0.02, 0.08),
                noise_sigma: ParameterRange::new(0.01, 0.03),
                shock_probability: ParameterRange::new(0.01, 0.03),
                shock_location: ParameterRange::new(-0.05, 0.05),
                shock_scale: ParameterRange::new(0.05, 0.15),
            },
            Department::Hr => Self {
                base_level: ParameterRange::new(50_000.0, 80_000.0),
                growth_rate: ParameterRange::new(0.001, 0.003),
                season_amplitude: ParameterRange::new(0.02, 0.06),
                noise_sigma: ParameterRange::new(0.01, 0.03),
                shock_probability: ParameterRange::new(0.01, 0.02),
                shock_location: ParameterRange::new(-0.03, 0.03),
                shock_scale: ParameterRange::new(0.05, 0.10),
            },
            Department::Sales => Self {
                base_level: ParameterRange::new(200_000.0, 300_000.0),
                growth_rate: ParameterRange::new(0.003, 0.008),
                season_amplitude: ParameterRange::new(0.10, 0.25),
                noise_sigma: ParameterRange::new(0.03, 0.07),
                shock_probability: ParameterRange::new(0.02, 0.05),
                shock_location: ParameterRange::new(-0.10, 0.10),
                shock_scale: ParameterRange::new(0.10, 0.25),
            },
            Department::Operations => Self {
                base_level: ParameterRange::new(150_000.0, 220_000.0),
                growth_rate: ParameterRange::new(0.002, 0.005),
                season_amplitude: ParameterRange::new(0.05, 0.12),
                noise_sigma: ParameterRange::new(0.02, 0.05),
                shock_probability: ParameterRange::new(0.02, 0.04),
                shock_location: ParameterRange::new(-0.08, 0.08),
                shock_scale: ParameterRange::new(0.08, 0.20),
            },
            Department::Marketing => Self {
                base_level: ParameterRange::new(70_000.0, 110_000.0),
                growth_rate: ParameterRange::new(-0.001, 0.006),
                season_amplitude: ParameterRange::new(0.15, 0.30),
                noise_sigma: ParameterRange::new(0.04, 0.08),
                shock_probability: ParameterRange::new(0.03, 0.06),
                shock_location: ParameterRange::new(-0.10, 0.15),
                shock_scale: ParameterRange::new(0.10, 0.30),
            },
        }
    }

    /// The ranges paired with their names, in declaration order.
    pub fn named(&self) -> [(&'static str, ParameterRange); 7] {
        [
            ("base_level", self.base_level),
            ("growth_rate", self.growth_rate),
            ("season_amplitude", self.season_amplitude),
            ("noise_sigma", self.noise_sigma),
            ("shock_probability", self.shock_probability),
            ("shock_location", self.shock_location),
            ("shock_scale", self.shock_scale),
        ]
    }
}

pub fn reference_parameter_ranges() -> BTreeMap<Department, DepartmentRanges> {
    Department::ALL
        .iter()
        .map(|&d| (d, DepartmentRanges::reference(d)))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SimulationConfig {
    #[schemars(description = "Seed of the single random stream. Same seed, same dataset.")]
    pub seed: u64,

    #[schemars(description = "First simulated month, YYYY-MM (inclusive).")]
    pub start_month: String,

    #[schemars(description = "Last simulated month, YYYY-MM (inclusive).")]
    pub end_month: String,

    #[schemars(
        description = "Departments to simulate. The order here is the row order of every output table and the parameter draw order."
    )]
    pub departments: Vec<Department>,

    #[schemars(description = "Per-department bounds for every sampled parameter.")]
    pub parameter_ranges: BTreeMap<Department, DepartmentRanges>,

    #[schemars(
        description = "If true, the monthly export keeps the Base/Trend/Seasonality/Noise/Shock columns."
    )]
    pub keep_components: bool,

    #[schemars(
        description = "If true, a non-positive budget aborts the run instead of being reported."
    )]
    pub fail_on_data_quality: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start_month: "2018-01".to_string(),
            end_month: "2024-12".to_string(),
            departments: Department::ALL.to_vec(),
            parameter_ranges: reference_parameter_ranges(),
            keep_components: true,
            fail_on_data_quality: false,
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SimulationConfig)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
