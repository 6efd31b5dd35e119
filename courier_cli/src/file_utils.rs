use std::path::{Path, PathBuf};

use courier_optimizer::json::route_store::JsonRouteStore;

/// Routes are named after the problem file they were planned for.
pub fn route_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| format!("{}.route", stem.to_string_lossy()))
        .unwrap_or_else(|| String::from("route"))
}

/// The explicit route file if one is given, otherwise the route folder from the environment.
pub fn route_store(input: &Path, route: Option<PathBuf>) -> Result<JsonRouteStore, anyhow::Error> {
    match route {
        Some(path) => Ok(JsonRouteStore::new(path)),
        None => Ok(JsonRouteStore::from_env(&route_name(input))?),
    }
}
