pub mod area;
pub mod context;
pub mod error;
pub mod exposure;
pub mod grid;
mod hashing;
pub mod health;
pub mod infection_model;
pub mod logging;
pub mod logistic;
pub mod model;
pub mod params;
pub mod random;
pub mod report;
pub mod simulation;

// All modules import `crate::TypeId` in case we want to change the underlying type of `TypeId`.
pub(crate) use std::any::TypeId;

// Replace with `typeid::of as type_of` if necessary.
#[inline(always)]
pub fn type_of<T: 'static>() -> TypeId {
    TypeId::of::<T>()
}

// `define_rng!` expands to `$crate::rand::...`.
pub use rand;

pub use area::{assign_areas, assign_vaccination, AreaCategory, CampusLayout};
pub use context::Context;
pub use error::CampusError;
pub use grid::{Grid, GridCoord};
pub use health::HealthStatus;
pub use infection_model::{train_model, FeatureVector, InfectionModel, TrainedInfectionModel};
pub use params::{BaseRates, ContextParamsExt, Params};
pub use random::ContextRandomExt;
pub use simulation::{count_infected_neighbors, Simulation, SimulationOutput, StateCounts, TimeSeries};
