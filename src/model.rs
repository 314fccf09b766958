use crate::{
    area::CampusLayout,
    context::Context,
    define_rng,
    error::CampusError,
    infection_model::{train_model, TrainedInfectionModel},
    params::{ContextParamsExt, Params},
    random::ContextRandomExt,
    simulation::{Simulation, SimulationOutput},
};
use log::info;

define_rng!(TrainingRng);
define_rng!(PopulationRng);
define_rng!(TransmissionRng);

/// Validates and stores `params`, then seeds the random streams.
pub fn setup(params: Params) -> Result<Context, CampusError> {
    let mut context = Context::new();
    let seed = params.seed;
    context.set_params(params)?;
    context.init_random(seed);
    Ok(context)
}

/// Trains the infection model and builds the campus for the parameters stored
/// in `context`. Nothing has been simulated yet when this returns.
pub fn prepare(context: &mut Context) -> Result<Simulation<TrainedInfectionModel>, CampusError> {
    let params = context.get_params()?.clone();

    let model = context.sample::<TrainingRng, _>(|rng| {
        train_model(params.training_sample_count, &params.base_rates, rng)
    })?;
    let layout = context.sample::<PopulationRng, _>(|rng| {
        CampusLayout::generate(params.grid_size, params.vaccination_rate, rng)
    });
    let vaccinated = layout.vaccinated.values().filter(|v| **v).count();
    info!(
        "campus of {0}x{0} cells, {1} vaccinated",
        params.grid_size, vaccinated
    );

    Simulation::new(layout, params.base_rates, model, params.recovery_prob)
}

/// Runs a full simulation: configuration and training errors are returned
/// before the first step.
pub fn run(params: Params) -> Result<SimulationOutput, CampusError> {
    let mut context = setup(params)?;
    let mut simulation = prepare(&mut context)?;
    let steps = context.get_params()?.num_time_steps;
    context.sample::<TransmissionRng, _>(|rng| {
        simulation.run(steps, rng);
    });
    Ok(simulation.into_output())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridCoord;

    fn small() -> Params {
        Params {
            grid_size: 10,
            num_time_steps: 5,
            recovery_prob: 0.0,
            training_sample_count: 2_000,
            ..Params::default()
        }
    }

    #[test]
    fn end_to_end_without_recovery() {
        let output = run(small()).unwrap();
        let series = &output.time_series;
        assert_eq!(series.len(), 5);
        assert!(output.final_states[GridCoord::new(5, 5)].is_infected());
        assert!(series.infected[0] >= 1);
        for counts in series.iter() {
            assert_eq!(counts.infected + counts.susceptible, 100);
            assert_eq!(counts.recovered, 0);
        }
    }

    #[test]
    fn same_seed_same_run() {
        let params = Params { grid_size: 20, num_time_steps: 15, ..small() };
        assert_eq!(run(params.clone()).unwrap(), run(params).unwrap());
    }

    #[test]
    fn different_seeds_differ() {
        let a = run(Params { grid_size: 20, num_time_steps: 15, seed: 1, ..small() }).unwrap();
        let b = run(Params { grid_size: 20, num_time_steps: 15, seed: 2, ..small() }).unwrap();
        assert_ne!(a.final_states, b.final_states);
    }

    #[test]
    fn invalid_configuration_stops_the_run() {
        let result = run(Params { vaccination_rate: 1.2, ..small() });
        assert!(matches!(result, Err(CampusError::InvalidConfiguration(_))));
    }

    #[test]
    fn degenerate_training_stops_the_run() {
        let result = run(Params { training_sample_count: 1, ..small() });
        assert!(matches!(result, Err(CampusError::TrainingDataDegenerate { .. })));
    }

    #[test]
    fn prepare_does_not_step() {
        let mut context = setup(small()).unwrap();
        let simulation = prepare(&mut context).unwrap();
        assert!(simulation.time_series().is_empty());
        assert_eq!(simulation.counts().infected, 1);
    }

    #[test]
    fn full_vaccination_layout() {
        let mut context = setup(Params { vaccination_rate: 1.0, ..small() }).unwrap();
        let simulation = prepare(&mut context).unwrap();
        assert!(simulation.layout().vaccinated.values().all(|v| *v));
    }
}
