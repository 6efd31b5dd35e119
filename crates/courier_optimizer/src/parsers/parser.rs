use std::path::Path;

use crate::{error::CourierResult, problem::delivery_problem::DeliveryProblem};

pub trait DatasetParser {
    fn parse<P: AsRef<Path>>(&self, file: P) -> CourierResult<DeliveryProblem>;
}
