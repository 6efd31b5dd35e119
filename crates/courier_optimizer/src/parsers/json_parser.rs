use std::{fs::File, io::BufReader, path::Path};

use tracing::instrument;

use crate::{
    error::CourierResult, json::types::JsonDeliveryProblem,
    problem::delivery_problem::DeliveryProblem,
};

use super::parser::DatasetParser;

/// Reads a problem file in the JSON input format.
pub struct JsonParser;

impl DatasetParser for JsonParser {
    #[instrument(skip_all, level = "debug")]
    fn parse<P: AsRef<Path>>(&self, file: P) -> CourierResult<DeliveryProblem> {
        let reader = BufReader::new(File::open(file)?);
        let input: JsonDeliveryProblem = serde_json::from_reader(reader)?;
        input.build_problem()
    }
}
