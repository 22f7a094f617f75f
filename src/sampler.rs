use crate::error::{Result, SimulationError};
use crate::rng::SimulationStream;
use crate::schema::{Department, DepartmentRanges, ParameterRange};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generative parameters of one department, fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepartmentParameters {
    pub base_level: f64,
    pub growth_rate: f64,
    pub season_amplitude: f64,
    pub season_phase: f64,
    pub noise_sigma: f64,
    pub shock_probability: f64,
    pub shock_location: f64,
    pub shock_scale: f64,
}

pub type ParameterSet = BTreeMap<Department, DepartmentParameters>;

#[derive(Clone, Copy)]
enum Family {
    Range(fn(&DepartmentRanges) -> ParameterRange),
    Phase,
}

/// Draw order of the parameter families. Within a family, departments are
/// drawn in configured order. Reordering this table changes every dataset
/// produced from an existing seed.
const DRAW_ORDER: [Family; 8] = [
    Family::Range(|r| r.base_level),
    Family::Range(|r| r.growth_rate),
    Family::Range(|r| r.season_amplitude),
    Family::Phase,
    Family::Range(|r| r.noise_sigma),
    Family::Range(|r| r.shock_probability),
    Family::Range(|r| r.shock_location),
    Family::Range(|r| r.shock_scale),
];

pub struct ParameterSampler {
    departments: Vec<(Department, DepartmentRanges)>,
}

impl ParameterSampler {
    pub fn new(
        departments: &[Department],
        ranges: &BTreeMap<Department, DepartmentRanges>,
    ) -> Result<Self> {
        let departments = departments
            .iter()
            .map(|&d| {
                ranges
                    .get(&d)
                    .map(|r| (d, *r))
                    .ok_or_else(|| SimulationError::MissingParameterRanges(d.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { departments })
    }

    pub fn sample(&self, stream: &mut SimulationStream) -> ParameterSet {
        let mut draws: Vec<[f64; 8]> = vec![[0.0; 8]; self.departments.len()];

        for (slot, family) in DRAW_ORDER.iter().enumerate() {
            for (i, (_, ranges)) in self.departments.iter().enumerate() {
                draws[i][slot] = match family {
                    Family::Range(pick) => stream.uniform(pick(ranges)),
                    Family::Phase => stream.uniform_phase(),
                };
            }
        }

        let params: ParameterSet = self
            .departments
            .iter()
            .zip(draws)
            .map(|((department, _), d)| {
                (
                    *department,
                    DepartmentParameters {
                        base_level: d[0],
                        growth_rate: d[1],
                        season_amplitude: d[2],
                        season_phase: d[3],
                        noise_sigma: d[4],
                        shock_probability: d[5],
                        shock_location: d[6],
                        shock_scale: d[7],
                    },
                )
            })
            .collect();

        for (department, p) in &params {
            debug!("Sampled parameters for {}: {:?}", department, p);
        }

        params
    }
}

pub fn sample_parameters(
    stream: &mut SimulationStream,
    departments: &[Department],
    ranges: &BTreeMap<Department, DepartmentRanges>,
) -> Result<ParameterSet> {
    Ok(ParameterSampler::new(departments, ranges)?.sample(stream))
}
