use crate::error::{CourierError, CourierResult};

#[derive(Clone, Debug)]
pub struct OptimizerParams {
    pub population_size: usize,
    pub max_generations: usize,
    /// Generations without a better best chromosome before the search stops.
    pub stagnation_limit: usize,

    /// Weight of one mile driven.
    pub distance_weight: f64,
    /// Weight of one minute a package arrives after its deadline.
    pub lateness_weight: f64,
    /// Weight of one violated hard constraint.
    pub violation_weight: f64,

    pub mutation_probability: f64,
    pub crossover_probability: f64,
    pub tournament_size: usize,
    /// Bounded retries for a mutation that finds nothing to change.
    pub max_mutation_attempts: usize,

    pub seed: u64,
    pub evaluation_threads: Threads,
}

#[derive(Clone, Debug)]
pub enum Threads {
    Single,
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => *num,
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            stagnation_limit: 75,
            distance_weight: 1.0,
            lateness_weight: 5.0,
            violation_weight: 1_000_000.0,
            mutation_probability: 0.25,
            crossover_probability: 0.9,
            tournament_size: 3,
            max_mutation_attempts: 10,
            seed: 2427121,
            evaluation_threads: Threads::Auto,
        }
    }
}

impl OptimizerParams {
    pub fn validate(&self) -> CourierResult<()> {
        if self.population_size == 0 {
            return Err(CourierError::InvalidParams(
                "population size must be at least 1".to_owned(),
            ));
        }

        if self.tournament_size == 0 {
            return Err(CourierError::InvalidParams(
                "tournament size must be at least 1".to_owned(),
            ));
        }

        for (name, probability) in [
            ("mutation probability", self.mutation_probability),
            ("crossover probability", self.crossover_probability),
        ] {
            if !(0.0..=1.0).contains(&probability) {
                return Err(CourierError::InvalidParams(format!(
                    "{name} must be within [0, 1], got {probability}"
                )));
            }
        }

        for (name, weight) in [
            ("distance weight", self.distance_weight),
            ("lateness weight", self.lateness_weight),
            ("violation weight", self.violation_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(CourierError::InvalidParams(format!(
                    "{name} must be a non-negative number, got {weight}"
                )));
            }
        }

        if let Threads::Multi(0) = self.evaluation_threads {
            return Err(CourierError::InvalidParams(
                "evaluation threads must be at least 1".to_owned(),
            ));
        }

        Ok(())
    }
}
