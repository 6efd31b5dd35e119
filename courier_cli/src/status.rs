use std::{path::PathBuf, sync::Arc};

use clap::Args;
use courier_optimizer::{
    json::route_store::RouteStore,
    parsers::{json_parser::JsonParser, parser::DatasetParser},
    simulation::delivery_simulator::DeliverySimulator,
};
use jiff::civil::Time;
use tracing::{info, warn};

use crate::{
    file_utils,
    parsers::{self, CorrectionArg},
    tables,
};

#[derive(Args)]
pub struct StatusArgs {
    /// Problem file the route was planned for
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Saved route. Defaults to the route planned for the input in `COURIER_ROUTE_FOLDER`
    #[arg(short, long)]
    route: Option<PathBuf>,

    /// Time of day to report, e.g. 10:25 (default: end of day)
    #[arg(short, long, value_parser = parsers::parse_time)]
    at: Option<Time>,

    /// Only report this package
    #[arg(short, long)]
    package: Option<u32>,

    /// Corrects a package address before reporting: `<package>=<address>@<time>`
    #[arg(long, value_parser = parsers::parse_correction)]
    correct: Option<CorrectionArg>,
}

pub fn run(args: StatusArgs) -> anyhow::Result<()> {
    let problem = Arc::new(JsonParser.parse(&args.input)?);
    let store = file_utils::route_store(&args.input, args.route)?;
    let route = store.load(&problem)?;

    let mut simulator = DeliverySimulator::new(Arc::clone(&problem), &route)?;

    if let Some(correction) = args.correct {
        simulator.apply_address_correction(
            correction.package,
            &correction.address,
            correction.effective_at,
        )?;
    }

    let at = args.at.unwrap_or_else(|| simulator.end_of_day());
    let delivered = simulator.advance_to(at)?;
    info!("{} packages delivered by {}", delivered.len(), at);

    if let Some(package) = args.package {
        let state = simulator.status_at(package, at)?;
        println!("{}", tables::packages_table(&[state]));
        return Ok(());
    }

    let snapshot = simulator.snapshot_at(at);
    println!("{}", tables::packages_table(&snapshot.packages));
    println!("{}", tables::trucks_table(&problem, &snapshot.trucks));
    println!("Total mileage at {}: {}", at, snapshot.total_mileage);

    if at >= simulator.end_of_day() {
        let recorded = simulator.recorded_distance();
        if (snapshot.total_mileage - recorded).value().abs() > 1e-6 {
            warn!(
                recorded = %recorded,
                replayed = %snapshot.total_mileage,
                "Replayed mileage differs from the recorded route"
            );
        }
    }

    Ok(())
}
