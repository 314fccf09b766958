use campus_flu::{
    exposure::{ExposureHistory, ExposureOutcome},
    logging::{init_logging, LevelFilter},
    model,
    params::Params,
    report::write_reports,
    AreaCategory, CampusError, StateCounts,
};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;
use std::process::ExitCode;

/// Spatial flu simulation on a campus grid
#[derive(Parser)]
#[command(name = "campus-flu", version)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    /// Also write the log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the grid simulation and optionally write reports
    Simulate(SimulateArgs),
    /// Replay a sequence of area visits through the exposure calculator
    Exposure(ExposureArgs),
}

#[derive(Args)]
struct SimulateArgs {
    /// JSON parameter file; fields that are left out keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    grid_size: Option<usize>,

    /// Number of time steps
    #[arg(long)]
    steps: Option<usize>,

    #[arg(long)]
    recovery_prob: Option<f64>,

    #[arg(long)]
    vaccination_rate: Option<f64>,

    /// Number of synthetic samples to train the infection model on
    #[arg(long)]
    training_samples: Option<usize>,

    /// Directory for time_series.csv, final_grid.csv and summary.json
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl SimulateArgs {
    fn params(&self) -> Result<Params, CampusError> {
        let mut params = match &self.config {
            Some(path) => Params::from_json_file(path)?,
            None => Params::default(),
        };
        if let Some(seed) = self.seed {
            params.seed = seed;
        }
        if let Some(grid_size) = self.grid_size {
            params.grid_size = grid_size;
        }
        if let Some(steps) = self.steps {
            params.num_time_steps = steps;
        }
        if let Some(recovery_prob) = self.recovery_prob {
            params.recovery_prob = recovery_prob;
        }
        if let Some(vaccination_rate) = self.vaccination_rate {
            params.vaccination_rate = vaccination_rate;
        }
        if let Some(training_samples) = self.training_samples {
            params.training_sample_count = training_samples;
        }
        Ok(params)
    }
}

#[derive(Args)]
struct ExposureArgs {
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Areas visited, in order (dorm, class, dining, outside)
    #[arg(required = true)]
    visits: Vec<AreaCategory>,
}

fn simulate(args: &SimulateArgs) -> Result<(), CampusError> {
    let params = args.params()?;
    let output = model::run(params.clone())?;

    let StateCounts {
        susceptible,
        infected,
        recovered,
    } = StateCounts::tally(&output.final_states);
    info!("final state: S={susceptible} I={infected} R={recovered}");

    if let Some(dir) = &args.output_dir {
        for path in write_reports(dir, &params, &output)? {
            info!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn exposure(args: &ExposureArgs) {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut history = ExposureHistory::new();
    for (idx, area) in args.visits.iter().enumerate() {
        match history.visit(*area, &mut rng) {
            ExposureOutcome::Infected => println!("visit {}: {area}: caught the flu", idx + 1),
            ExposureOutcome::Healthy {
                cumulative_probability,
                ..
            } => println!(
                "visit {}: {area}: healthy, risk over last {} visits {:.2}%",
                idx + 1,
                history.window(),
                cumulative_probability * 100.0
            ),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.log_level, cli.log_file.as_deref()) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let result = match &cli.command {
        Command::Simulate(args) => simulate(args),
        Command::Exposure(args) => {
            exposure(args);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
