/*!

The time-stepped state machine.

Each step runs in three phases:

 1. **Infection sweep.** Every susceptible cell is scored by the infection model using its area's
    base rate, its vaccination flag and the number of infected Moore neighbors *at the start of the
    step*. Cells that draw an infection go into a pending buffer; the grid is not touched during the
    sweep, so the result does not depend on visitation order.
 2. **Commit.** All pending infections are applied at once.
 3. **Recovery.** Every infected cell, including the ones infected in phase 2, recovers with
    probability `recovery_prob`.

Counts are recorded after phase 3. The loop always runs the configured number of steps, even after
the epidemic has died out.

*/

use crate::{
    area::{AreaCategory, CampusLayout},
    error::CampusError,
    grid::{Grid, GridCoord},
    health::HealthStatus,
    infection_model::{FeatureVector, InfectionModel},
    params::{check_probability, BaseRates},
};
use log::{debug, info};
use rand::{distr::Bernoulli, prelude::Distribution, Rng};
use serde::Serialize;

/// Number of cells in each state at one point in time.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize)]
pub struct StateCounts {
    pub susceptible: usize,
    pub infected: usize,
    pub recovered: usize,
}

impl StateCounts {
    pub fn tally(states: &Grid<HealthStatus>) -> Self {
        let mut counts = StateCounts::default();
        for status in states.values() {
            match status {
                HealthStatus::Susceptible => counts.susceptible += 1,
                HealthStatus::Infected => counts.infected += 1,
                HealthStatus::Recovered => counts.recovered += 1,
            }
        }
        counts
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.susceptible + self.infected + self.recovered
    }
}

/// Per-step counts, one entry appended after every step.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize)]
pub struct TimeSeries {
    pub susceptible: Vec<usize>,
    pub infected: Vec<usize>,
    pub recovered: Vec<usize>,
}

impl TimeSeries {
    pub fn record(&mut self, counts: StateCounts) {
        self.susceptible.push(counts.susceptible);
        self.infected.push(counts.infected);
        self.recovered.push(counts.recovered);
    }

    pub fn len(&self) -> usize {
        self.susceptible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.susceptible.is_empty()
    }

    pub fn get(&self, step: usize) -> Option<StateCounts> {
        Some(StateCounts {
            susceptible: *self.susceptible.get(step)?,
            infected: *self.infected.get(step)?,
            recovered: *self.recovered.get(step)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = StateCounts> + '_ {
        (0..self.len()).filter_map(|step| self.get(step))
    }
}

/// Everything the presentation layer needs once a run is over.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct SimulationOutput {
    pub final_states: Grid<HealthStatus>,
    pub areas: Grid<AreaCategory>,
    pub time_series: TimeSeries,
}

/// Number of infected cells in the Moore neighborhood of `(row, col)`.
/// Neighbors outside the grid are skipped; there is no wraparound.
pub fn count_infected_neighbors(states: &Grid<HealthStatus>, row: usize, col: usize) -> u8 {
    let mut count = 0;
    for neighbor in states.moore_neighbors(GridCoord::new(row, col)) {
        if states[neighbor].is_infected() {
            count += 1;
        }
    }
    count
}

/// The cell seeded with the first infection: the grid center, rounded down.
#[must_use]
pub fn seed_cell(grid_size: usize) -> GridCoord {
    GridCoord::new(grid_size / 2, grid_size / 2)
}

pub struct Simulation<M: InfectionModel> {
    layout: CampusLayout,
    base_rates: BaseRates,
    model: M,
    recovery: Bernoulli,
    states: Grid<HealthStatus>,
    time_series: TimeSeries,
    pending: Vec<GridCoord>,
}

impl<M: InfectionModel> Simulation<M> {
    /// Sets up a run with every cell susceptible except the grid center.
    pub fn new(
        layout: CampusLayout,
        base_rates: BaseRates,
        model: M,
        recovery_prob: f64,
    ) -> Result<Self, CampusError> {
        let grid_size = layout.grid_size();
        if grid_size == 0 {
            return Err(CampusError::InvalidConfiguration(
                "grid_size must be greater than 0".to_string(),
            ));
        }
        if layout.vaccinated.size() != grid_size {
            return Err(CampusError::InvalidConfiguration(format!(
                "vaccination grid is {}x{0} but the area grid is {grid_size}x{grid_size}",
                layout.vaccinated.size()
            )));
        }
        check_probability("recovery_prob", recovery_prob)?;
        base_rates.validate()?;
        let recovery = Bernoulli::new(recovery_prob)
            .map_err(|e| CampusError::InvalidConfiguration(format!("recovery_prob: {e}")))?;

        let mut states = Grid::filled(grid_size, HealthStatus::Susceptible);
        states[seed_cell(grid_size)] = HealthStatus::Infected;

        Ok(Simulation {
            layout,
            base_rates,
            model,
            recovery,
            states,
            time_series: TimeSeries::default(),
            pending: Vec::new(),
        })
    }

    /// Replaces the default center seed with infections at `cells`.
    pub fn with_initial_infections(mut self, cells: &[GridCoord]) -> Result<Self, CampusError> {
        if let Some(outside) = cells.iter().find(|c| !self.states.contains(**c)) {
            return Err(CampusError::InvalidConfiguration(format!(
                "initial infection {outside:?} is outside the grid"
            )));
        }
        for status in self.states.values_mut() {
            *status = HealthStatus::Susceptible;
        }
        for cell in cells {
            self.states[*cell] = HealthStatus::Infected;
        }
        Ok(self)
    }

    pub fn states(&self) -> &Grid<HealthStatus> {
        &self.states
    }

    pub fn layout(&self) -> &CampusLayout {
        &self.layout
    }

    pub fn time_series(&self) -> &TimeSeries {
        &self.time_series
    }

    pub fn counts(&self) -> StateCounts {
        StateCounts::tally(&self.states)
    }

    /// Features the model sees for `coord` given the current grid.
    pub fn features_at(&self, coord: GridCoord) -> FeatureVector {
        FeatureVector::new(
            self.base_rates.rate(self.layout.areas[coord]),
            count_infected_neighbors(&self.states, coord.row, coord.col),
            self.layout.vaccinated[coord],
        )
    }

    /// Advances the simulation by one step and records the resulting counts.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> StateCounts {
        self.pending.clear();
        for (coord, status) in self.states.iter() {
            if !status.is_susceptible() {
                continue;
            }
            let p = self.model.predict_infection_probability(&self.features_at(coord));
            if rng.random::<f64>() < p {
                self.pending.push(coord);
            }
        }

        let new_infections = self.pending.len();
        for coord in &self.pending {
            self.states[*coord] = HealthStatus::Infected;
        }

        let mut recoveries = 0;
        for status in self.states.values_mut() {
            if status.is_infected() && self.recovery.sample(rng) {
                *status = HealthStatus::Recovered;
                recoveries += 1;
            }
        }

        let counts = self.counts();
        self.time_series.record(counts);
        debug!(
            "step {}: {} new infections, {} recoveries, S={} I={} R={}",
            self.time_series.len(),
            new_infections,
            recoveries,
            counts.susceptible,
            counts.infected,
            counts.recovered
        );
        counts
    }

    /// Runs `steps` steps. Never stops early.
    pub fn run<R: Rng + ?Sized>(&mut self, steps: usize, rng: &mut R) -> &TimeSeries {
        for _ in 0..steps {
            self.step(rng);
        }
        let counts = self.counts();
        info!(
            "finished {} steps: S={} I={} R={}",
            self.time_series.len(),
            counts.susceptible,
            counts.infected,
            counts.recovered
        );
        &self.time_series
    }

    pub fn into_output(self) -> SimulationOutput {
        SimulationOutput {
            final_states: self.states,
            areas: self.layout.areas,
            time_series: self.time_series,
        }
    }
}
