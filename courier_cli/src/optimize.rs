use std::{path::PathBuf, sync::Arc};

use clap::Args;
use courier_optimizer::{
    json::route_store::RouteStore,
    parsers::{json_parser::JsonParser, parser::DatasetParser},
    solver::{
        solver::Solver,
        solver_params::{OptimizerParams, Threads},
    },
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::{file_utils, tables};

#[derive(Args)]
pub struct OptimizeArgs {
    /// Problem file in the JSON input format
    #[arg(short = 'i', long)]
    input: PathBuf,

    #[arg(short, long)]
    population_size: Option<usize>,

    #[arg(short = 'g', long)]
    max_generations: Option<usize>,

    /// Generations without improvement before stopping
    #[arg(long)]
    stagnation_limit: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Threads used to evaluate a generation (default: all cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Route file to write. Defaults to a file in `COURIER_ROUTE_FOLDER`
    #[arg(short, long)]
    out: Option<PathBuf>,
}

impl OptimizeArgs {
    fn params(&self) -> OptimizerParams {
        let defaults = OptimizerParams::default();

        OptimizerParams {
            population_size: self.population_size.unwrap_or(defaults.population_size),
            max_generations: self.max_generations.unwrap_or(defaults.max_generations),
            stagnation_limit: self.stagnation_limit.unwrap_or(defaults.stagnation_limit),
            seed: self.seed.unwrap_or(defaults.seed),
            evaluation_threads: self.threads.map_or(Threads::Auto, Threads::Multi),
            ..defaults
        }
    }
}

pub fn run(args: OptimizeArgs) -> anyhow::Result<()> {
    info!("Optimizing {:?}", args.input);
    let problem = Arc::new(JsonParser.parse(&args.input)?);
    let params = args.params();
    let store = file_utils::route_store(&args.input, args.out.clone())?;

    let bar = Arc::new(ProgressBar::new(params.max_generations as u64));
    bar.set_style(ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len} {msg}")?);

    let mut solver = Solver::new(Arc::clone(&problem), params)?;
    let t_bar = Arc::clone(&bar);
    solver.on_generation(move |statistics| {
        t_bar.set_position(statistics.generation as u64);
        t_bar.set_message(format!("best {}", statistics.best));
    });

    let route = solver.solve()?;
    bar.finish_and_clear();

    let analysis = solver.analyze(&route.to_chromosome(&problem)?);
    if let Some(duration) = solver.statistics().duration() {
        info!(
            generations = solver.statistics().generations().len(),
            "Finished in {:.2}s",
            duration.as_secs_f64()
        );
    }

    store.save(&route)?;
    info!("Route saved to {}", store.path().display());

    println!("{}", tables::route_table(&route));
    println!("{}", tables::analysis_table(&analysis));

    Ok(())
}
