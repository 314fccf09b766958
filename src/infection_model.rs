use crate::{
    area::AreaCategory,
    error::CampusError,
    logistic::{sigmoid, FitOptions, LogisticRegression},
    params::BaseRates,
};
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Everything the infection model gets to see about a susceptible cell.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FeatureVector {
    pub base_rate: f64,
    /// Infected cells among the 8 Moore neighbors, 0 to 8.
    pub infected_neighbors: u8,
    pub vaccinated: bool,
}

impl FeatureVector {
    pub fn new(base_rate: f64, infected_neighbors: u8, vaccinated: bool) -> Self {
        FeatureVector {
            base_rate,
            infected_neighbors,
            vaccinated,
        }
    }

    #[must_use]
    pub fn to_array(&self) -> [f64; 3] {
        [
            self.base_rate,
            f64::from(self.infected_neighbors),
            if self.vaccinated { 1.0 } else { 0.0 },
        ]
    }
}

/// Maps a feature vector to the probability that the cell becomes infected
/// this step. Implementations must not change state between calls.
pub trait InfectionModel {
    fn predict_infection_probability(&self, features: &FeatureVector) -> f64;
}

impl<F> InfectionModel for F
where
    F: Fn(&FeatureVector) -> f64,
{
    fn predict_infection_probability(&self, features: &FeatureVector) -> f64 {
        self(features)
    }
}

// Coefficients of the log-odds the synthetic labels are drawn from.
const SYNTHETIC_INTERCEPT: f64 = -3.0;
const SYNTHETIC_BASE_RATE: f64 = 5.0;
const SYNTHETIC_NEIGHBOR: f64 = 0.5;
const SYNTHETIC_VACCINATED: f64 = -2.0;

/// The log-odds of infection used to label synthetic training examples.
#[must_use]
pub fn synthetic_log_odds(features: &FeatureVector) -> f64 {
    let [base_rate, neighbors, vaccinated] = features.to_array();
    SYNTHETIC_INTERCEPT
        + SYNTHETIC_BASE_RATE * base_rate
        + SYNTHETIC_NEIGHBOR * neighbors
        + SYNTHETIC_VACCINATED * vaccinated
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingSet {
    pub features: Vec<FeatureVector>,
    pub labels: Vec<bool>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|l| **l).count()
    }
}

/// Draws `num_samples` synthetic examples: a uniform area (looked up in
/// `base_rates`), a uniform neighbor count in `0..=8`, a fair-coin
/// vaccination flag, and a Bernoulli label from [`synthetic_log_odds`].
pub fn generate_training_data<R: Rng + ?Sized>(
    num_samples: usize,
    base_rates: &BaseRates,
    rng: &mut R,
) -> TrainingSet {
    let mut set = TrainingSet {
        features: Vec::with_capacity(num_samples),
        labels: Vec::with_capacity(num_samples),
    };
    for _ in 0..num_samples {
        let area = AreaCategory::ALL[rng.random_range(0..AreaCategory::ALL.len())];
        let features = FeatureVector::new(
            base_rates.rate(area),
            rng.random_range(0..=8),
            rng.random_bool(0.5),
        );
        let p = sigmoid(synthetic_log_odds(&features));
        set.labels.push(rng.random_bool(p));
        set.features.push(features);
    }
    set
}

/// A logistic regression fit on synthetic data. Read-only after training.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TrainedInfectionModel {
    pub regression: LogisticRegression<3>,
    pub training_samples: usize,
    pub positive_samples: usize,
}

impl TrainedInfectionModel {
    /// Fits a model to an existing training set.
    pub fn fit(set: &TrainingSet, options: &FitOptions) -> Result<Self, CampusError> {
        let positives = set.positives();
        if positives == 0 || positives == set.len() {
            return Err(CampusError::TrainingDataDegenerate {
                samples: set.len(),
                positives,
            });
        }

        let samples: Vec<[f64; 3]> = set.features.iter().map(FeatureVector::to_array).collect();
        let regression = LogisticRegression::fit(&samples, &set.labels, options)?;
        debug!(
            "fitted infection model: intercept {:.3}, weights {:?}",
            regression.intercept, regression.coefficients
        );

        Ok(TrainedInfectionModel {
            regression,
            training_samples: set.len(),
            positive_samples: positives,
        })
    }
}

impl InfectionModel for TrainedInfectionModel {
    fn predict_infection_probability(&self, features: &FeatureVector) -> f64 {
        self.regression.predict_proba(&features.to_array())
    }
}

/// Generates `num_samples` synthetic examples and fits the default model.
pub fn train_model<R: Rng + ?Sized>(
    num_samples: usize,
    base_rates: &BaseRates,
    rng: &mut R,
) -> Result<TrainedInfectionModel, CampusError> {
    train_model_with(num_samples, base_rates, &FitOptions::default(), rng)
}

pub fn train_model_with<R: Rng + ?Sized>(
    num_samples: usize,
    base_rates: &BaseRates,
    options: &FitOptions,
    rng: &mut R,
) -> Result<TrainedInfectionModel, CampusError> {
    let set = generate_training_data(num_samples, base_rates, rng);
    info!(
        "training infection model on {} samples ({} positive)",
        set.len(),
        set.positives()
    );
    TrainedInfectionModel::fit(&set, options)
}
