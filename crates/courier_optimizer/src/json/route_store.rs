use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    error::{CourierError, CourierResult},
    problem::delivery_problem::DeliveryProblem,
    solver::solution::finalized_route::FinalizedRoute,
};

pub const ROUTE_FOLDER_ENV_VAR: &str = "COURIER_ROUTE_FOLDER";

pub trait RouteStore {
    fn save(&self, route: &FinalizedRoute) -> CourierResult<()>;

    /// Loads a route and checks it against `problem`.
    fn load(&self, problem: &DeliveryProblem) -> CourierResult<FinalizedRoute>;
}

/// Stores one route as pretty-printed JSON.
pub struct JsonRouteStore {
    path: PathBuf,
}

impl JsonRouteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonRouteStore { path: path.into() }
    }

    /// A store named `name` inside the folder given by `COURIER_ROUTE_FOLDER`.
    pub fn from_env(name: &str) -> CourierResult<Self> {
        let folder_path = std::env::var(ROUTE_FOLDER_ENV_VAR).map_err(|_| {
            CourierError::InvalidParams(format!("{ROUTE_FOLDER_ENV_VAR} is not set"))
        })?;

        let folder = Path::new(&folder_path);
        if !folder.is_dir() {
            return Err(CourierError::InvalidParams(format!(
                "Path {folder_path} is not a directory"
            )));
        }

        Ok(JsonRouteStore::new(folder.join(format!("{name}.json"))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RouteStore for JsonRouteStore {
    fn save(&self, route: &FinalizedRoute) -> CourierResult<()> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::with_capacity(64 * 1024, file);
        serde_json::to_writer_pretty(&mut writer, route)?;
        writer.flush()?;

        debug!(path = %self.path.display(), "Saved route");
        Ok(())
    }

    fn load(&self, problem: &DeliveryProblem) -> CourierResult<FinalizedRoute> {
        let file = File::open(&self.path)?;
        let route: FinalizedRoute = serde_json::from_reader(BufReader::new(file))?;

        route.to_chromosome(problem)?;

        Ok(route)
    }
}
