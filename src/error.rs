use std::fmt::{Display, Formatter};

/// Errors that stop a run before (or instead of) simulating.
///
/// Configuration and training problems are always reported before the first
/// simulation step executes. Boundary conditions inside a step (grid edges,
/// cells without neighbors) are handled structurally and never show up here.
#[derive(Debug)]
pub enum CampusError {
    /// A parameter is outside its allowed range.
    InvalidConfiguration(String),
    /// The synthetic training set contained a single class.
    TrainingDataDegenerate { samples: usize, positives: usize },
    /// The logistic regression solver could not produce finite coefficients.
    ModelFit(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
    Logging(String),
}

impl Display for CampusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CampusError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            CampusError::TrainingDataDegenerate { samples, positives } => write!(
                f,
                "insufficient class diversity for training: {positives} of {samples} samples are positive"
            ),
            CampusError::ModelFit(msg) => write!(f, "model fit failed: {msg}"),
            CampusError::Io(err) => write!(f, "io error: {err}"),
            CampusError::Json(err) => write!(f, "json error: {err}"),
            CampusError::Csv(err) => write!(f, "csv error: {err}"),
            CampusError::Logging(msg) => write!(f, "logging error: {msg}"),
        }
    }
}

impl std::error::Error for CampusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CampusError::Io(err) => Some(err),
            CampusError::Json(err) => Some(err),
            CampusError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CampusError {
    fn from(err: std::io::Error) -> Self {
        CampusError::Io(err)
    }
}

impl From<serde_json::Error> for CampusError {
    fn from(err: serde_json::Error) -> Self {
        CampusError::Json(err)
    }
}

impl From<csv::Error> for CampusError {
    fn from(err: csv::Error) -> Self {
        CampusError::Csv(err)
    }
}
