use crate::{
    area::AreaCategory,
    context::{Context, DataPlugin},
    error::CampusError,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, path::Path};

/// Base infection rate per area category.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BaseRates {
    pub dorm: f64,
    pub classroom: f64,
    pub dining_hall: f64,
    pub outdoor: f64,
}

impl Default for BaseRates {
    fn default() -> Self {
        BaseRates {
            dorm: 0.2,
            classroom: 0.1,
            dining_hall: 0.15,
            outdoor: 0.05,
        }
    }
}

impl BaseRates {
    #[must_use]
    pub fn rate(&self, area: AreaCategory) -> f64 {
        match area {
            AreaCategory::Dorm => self.dorm,
            AreaCategory::Classroom => self.classroom,
            AreaCategory::DiningHall => self.dining_hall,
            AreaCategory::Outdoor => self.outdoor,
        }
    }

    pub fn set_rate(&mut self, area: AreaCategory, rate: f64) {
        match area {
            AreaCategory::Dorm => self.dorm = rate,
            AreaCategory::Classroom => self.classroom = rate,
            AreaCategory::DiningHall => self.dining_hall = rate,
            AreaCategory::Outdoor => self.outdoor = rate,
        }
    }

    pub fn validate(&self) -> Result<(), CampusError> {
        for area in AreaCategory::ALL {
            check_probability(&format!("base rate for {area}"), self.rate(area))?;
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    /// Side length of the square campus grid.
    pub grid_size: usize,
    /// Number of steps to run. The loop never stops early.
    pub num_time_steps: usize,
    /// Per-step probability that an infected cell recovers.
    pub recovery_prob: f64,
    /// Probability that any given cell is vaccinated.
    pub vaccination_rate: f64,
    pub base_rates: BaseRates,
    /// Number of synthetic examples the infection model is fit on.
    pub training_sample_count: usize,
    /// Base seed for every random stream in the run.
    pub seed: u64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            grid_size: 50,
            num_time_steps: 50,
            recovery_prob: 0.1,
            vaccination_rate: 0.3,
            base_rates: BaseRates::default(),
            training_sample_count: 10_000,
            seed: 42,
        }
    }
}

impl Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  grid_size: {}", self.grid_size)?;
        writeln!(f, "  num_time_steps: {}", self.num_time_steps)?;
        writeln!(f, "  recovery_prob: {}", self.recovery_prob)?;
        writeln!(f, "  vaccination_rate: {}", self.vaccination_rate)?;
        for area in AreaCategory::ALL {
            writeln!(f, "  base_rate[{area}]: {}", self.base_rates.rate(area))?;
        }
        writeln!(f, "  training_sample_count: {}", self.training_sample_count)?;
        write!(f, "  seed: {}", self.seed)
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), CampusError> {
        if self.grid_size == 0 {
            return Err(CampusError::InvalidConfiguration(
                "grid_size must be greater than 0".to_string(),
            ));
        }
        check_probability("recovery_prob", self.recovery_prob)?;
        check_probability("vaccination_rate", self.vaccination_rate)?;
        self.base_rates.validate()
    }

    /// Reads parameters from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, CampusError> {
        let text = std::fs::read_to_string(path)?;
        let params: Params = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }
}

pub(crate) fn check_probability(name: &str, value: f64) -> Result<(), CampusError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CampusError::InvalidConfiguration(format!(
            "{name} must be between 0 and 1, got {value}"
        )));
    }
    Ok(())
}

#[derive(Default)]
struct ParamsPlugin {
    params: Option<Params>,
}

impl DataPlugin for ParamsPlugin {
    fn init() -> Self {
        ParamsPlugin::default()
    }
}

pub trait ContextParamsExt {
    /// Validates `params` and stores them for the rest of the run.
    fn set_params(&mut self, params: Params) -> Result<(), CampusError>;

    /// Loads, validates and stores parameters from a JSON file.
    fn load_params(&mut self, path: &Path) -> Result<(), CampusError>;

    fn get_params(&self) -> Result<&Params, CampusError>;
}

impl ContextParamsExt for Context {
    fn set_params(&mut self, params: Params) -> Result<(), CampusError> {
        params.validate()?;
        info!("Running with parameters:\n{}", params);
        self.get_data_container_mut::<ParamsPlugin>().params = Some(params);
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<(), CampusError> {
        let params = Params::from_json_file(path)?;
        self.set_params(params)
    }

    fn get_params(&self) -> Result<&Params, CampusError> {
        self.get_data_container::<ParamsPlugin>()
            .and_then(|plugin| plugin.params.as_ref())
            .ok_or_else(|| CampusError::InvalidConfiguration("parameters have not been set".to_string()))
    }
}
