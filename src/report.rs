/*!

Plain-data exports handed to the plotting side: a per-step CSV, the final grid as a CSV of state
codes, and a JSON run summary.

*/

use crate::{
    error::CampusError,
    grid::Grid,
    health::HealthStatus,
    params::Params,
    simulation::{SimulationOutput, StateCounts, TimeSeries},
};
use log::info;
use serde::Serialize;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

pub const TIME_SERIES_FILE: &str = "time_series.csv";
pub const FINAL_GRID_FILE: &str = "final_grid.csv";
pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Serialize)]
struct TimeSeriesRow {
    step: usize,
    susceptible: usize,
    infected: usize,
    recovered: usize,
}

/// Writes `step,susceptible,infected,recovered`, one row per step, steps numbered from 1.
pub fn write_time_series<W: Write>(writer: W, series: &TimeSeries) -> Result<(), CampusError> {
    let mut writer = csv::Writer::from_writer(writer);
    for (idx, counts) in series.iter().enumerate() {
        writer.serialize(TimeSeriesRow {
            step: idx + 1,
            susceptible: counts.susceptible,
            infected: counts.infected,
            recovered: counts.recovered,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one CSV row per grid row with the state code of every cell.
pub fn write_final_grid<W: Write>(writer: W, states: &Grid<HealthStatus>) -> Result<(), CampusError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    for row in states.rows() {
        writer.write_record(row.iter().map(|status| status.code().to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
pub struct RunSummary<'a> {
    pub params: &'a Params,
    pub steps: usize,
    pub final_counts: StateCounts,
    pub peak_infected: usize,
    /// First step (1-based) at which the infected count peaked.
    pub peak_step: Option<usize>,
}

impl<'a> RunSummary<'a> {
    pub fn new(params: &'a Params, output: &SimulationOutput) -> Self {
        let series = &output.time_series;
        let peak = series
            .infected
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, usize)>, (idx, &count)| match best {
                Some((_, top)) if top >= count => best,
                _ => Some((idx, count)),
            });
        RunSummary {
            params,
            steps: series.len(),
            final_counts: StateCounts::tally(&output.final_states),
            peak_infected: peak.map_or(0, |(_, count)| count),
            peak_step: peak.map(|(idx, _)| idx + 1),
        }
    }
}

pub fn write_summary<W: Write>(writer: W, summary: &RunSummary<'_>) -> Result<(), CampusError> {
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}

/// Writes all three reports into `dir`, creating it if needed.
pub fn write_reports(dir: &Path, params: &Params, output: &SimulationOutput) -> Result<Vec<PathBuf>, CampusError> {
    std::fs::create_dir_all(dir)?;

    let series_path = dir.join(TIME_SERIES_FILE);
    write_time_series(BufWriter::new(File::create(&series_path)?), &output.time_series)?;

    let grid_path = dir.join(FINAL_GRID_FILE);
    write_final_grid(BufWriter::new(File::create(&grid_path)?), &output.final_states)?;

    let summary_path = dir.join(SUMMARY_FILE);
    let mut summary_file = BufWriter::new(File::create(&summary_path)?);
    write_summary(&mut summary_file, &RunSummary::new(params, output))?;
    summary_file.flush()?;

    info!("wrote reports to {}", dir.display());
    Ok(vec![series_path, grid_path, summary_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::assign_areas;

    fn output() -> SimulationOutput {
        let mut time_series = TimeSeries::default();
        time_series.record(StateCounts { susceptible: 7, infected: 2, recovered: 0 });
        time_series.record(StateCounts { susceptible: 5, infected: 3, recovered: 1 });
        time_series.record(StateCounts { susceptible: 5, infected: 2, recovered: 2 });

        let final_states = Grid::from_fn(3, |c| match (c.row, c.col) {
            (0, 0) | (1, 1) => HealthStatus::Recovered,
            (2, _) => HealthStatus::Infected,
            _ => HealthStatus::Susceptible,
        });
        SimulationOutput {
            final_states,
            areas: assign_areas(3),
            time_series,
        }
    }

    #[test]
    fn time_series_csv() {
        let mut buffer = Vec::new();
        write_time_series(&mut buffer, &output().time_series).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "step,susceptible,infected,recovered\n1,7,2,0\n2,5,3,1\n3,5,2,2\n"
        );
    }

    #[test]
    fn final_grid_csv() {
        let mut buffer = Vec::new();
        write_final_grid(&mut buffer, &output().final_states).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "2,0,0\n0,2,0\n1,1,1\n");
    }

    #[test]
    fn summary_reports_peak() {
        let params = Params::default();
        let output = output();
        let summary = RunSummary::new(&params, &output);
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.peak_infected, 3);
        assert_eq!(summary.peak_step, Some(2));
        assert_eq!(summary.final_counts, StateCounts { susceptible: 4, infected: 3, recovered: 2 });

        let mut buffer = Vec::new();
        write_summary(&mut buffer, &summary).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["params"]["grid_size"], 50);
        assert_eq!(value["final_counts"]["recovered"], 2);
    }

    #[test]
    fn writes_all_reports() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("run");
        let paths = write_reports(&out_dir, &Params::default(), &output()).unwrap();
        assert_eq!(paths.len(), 3);
        for path in paths {
            assert!(path.exists(), "{}", path.display());
        }
        let grid = std::fs::read_to_string(out_dir.join(FINAL_GRID_FILE)).unwrap();
        assert_eq!(grid.lines().count(), 3);
    }
}
