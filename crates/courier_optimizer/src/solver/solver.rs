use std::sync::Arc;

use jiff::Timestamp;
use parking_lot::{MappedRwLockReadGuard, RwLock};
use serde::Serialize;

use crate::{error::CourierResult, problem::delivery_problem::DeliveryProblem};

use super::{
    fitness::{FitnessWeights, analyze},
    genetic_algorithm::GeneticAlgorithm,
    score::FitnessAnalysis,
    solution::{
        chromosome::Chromosome, finalized_route::FinalizedRoute,
        population::EvaluatedChromosome,
    },
    solver_params::OptimizerParams,
    statistics::{GenerationStatistics, SearchStatistics},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SolverStatus {
    Pending,
    Running,
    Completed,
}

pub struct Solver {
    algorithm: GeneticAlgorithm,
    status: RwLock<SolverStatus>,
    created_at: Timestamp,
}

impl Solver {
    pub fn new(problem: Arc<DeliveryProblem>, params: OptimizerParams) -> CourierResult<Self> {
        Ok(Solver {
            algorithm: GeneticAlgorithm::new(params, problem)?,
            status: RwLock::new(SolverStatus::Pending),
            created_at: Timestamp::now(),
        })
    }

    pub fn on_best_chromosome<F>(&mut self, callback: F)
    where
        F: FnMut(&EvaluatedChromosome) + Send + Sync + 'static,
    {
        self.algorithm.on_best_chromosome(callback);
    }

    pub fn on_generation<F>(&mut self, callback: F)
    where
        F: FnMut(&GenerationStatistics) + Send + Sync + 'static,
    {
        self.algorithm.on_generation(callback);
    }

    pub fn solve(&self) -> CourierResult<FinalizedRoute> {
        *self.status.write() = SolverStatus::Running;
        let result = self.algorithm.run();
        *self.status.write() = SolverStatus::Completed;

        let best = result?;
        Ok(FinalizedRoute::from_chromosome(
            self.algorithm.problem(),
            &best.chromosome,
        ))
    }

    /// Same as [`Solver::solve`] but starting from the given assignment instead of the
    /// scheduler's.
    pub fn solve_from(&self, seed: Chromosome) -> CourierResult<FinalizedRoute> {
        *self.status.write() = SolverStatus::Running;
        let result = self.algorithm.run_from(seed);
        *self.status.write() = SolverStatus::Completed;

        let best = result?;
        Ok(FinalizedRoute::from_chromosome(
            self.algorithm.problem(),
            &best.chromosome,
        ))
    }

    pub fn stop(&self) {
        self.algorithm.stop();
    }

    pub fn status(&self) -> SolverStatus {
        *self.status.read()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn current_best_chromosome(
        &self,
    ) -> Option<MappedRwLockReadGuard<'_, EvaluatedChromosome>> {
        self.algorithm.best_chromosome()
    }

    pub fn statistics(&self) -> SearchStatistics {
        self.algorithm.statistics()
    }

    pub fn analyze(&self, chromosome: &Chromosome) -> FitnessAnalysis {
        analyze(
            self.algorithm.problem(),
            chromosome,
            &FitnessWeights::from(self.algorithm.params()),
        )
    }
}

/// Optimizes with default parameters apart from the given ones.
pub fn run_optimization(
    problem: Arc<DeliveryProblem>,
    population_size: usize,
    max_generations: usize,
    stagnation_limit: usize,
    seed: u64,
) -> CourierResult<FinalizedRoute> {
    let params = OptimizerParams {
        population_size,
        max_generations,
        stagnation_limit,
        seed,
        ..OptimizerParams::default()
    };

    Solver::new(problem, params)?.solve()
}

#[cfg(test)]
mod tests {
    use jiff::civil::time;

    use crate::{
        error::{CourierError, InfeasibilityReason},
        problem::{package::PackageIdx, package_note::PackageNote, truck::TruckIdx},
        solver::{fitness::planned_arrivals, solver_params::Threads},
        test_utils,
    };

    use super::*;

    fn small_params(seed: u64) -> OptimizerParams {
        OptimizerParams {
            population_size: 20,
            max_generations: 40,
            stagnation_limit: 15,
            seed,
            ..OptimizerParams::default()
        }
    }

    fn create_problem() -> Arc<DeliveryProblem> {
        let mut bundled = test_utils::package(3, 7);
        bundled.add_note(PackageNote::ShipWith(vec![9]));
        let mut pinned = test_utils::package(5, 2);
        pinned.add_note(PackageNote::Truck(vec![String::from("2")]));

        let mut packages = vec![
            test_utils::package(1, 4),
            test_utils::package_with_deadline(2, 9, time(9, 0, 0, 0)),
            bundled,
            test_utils::package(4, 1),
            pinned,
            test_utils::package(6, 8),
            test_utils::package(7, 3),
            test_utils::package(8, 6),
            test_utils::package(9, 5),
        ];
        packages.push(test_utils::package_with_deadline(10, 2, time(8, 30, 0, 0)));

        Arc::new(test_utils::create_problem(
            10,
            packages,
            vec![test_utils::truck("1", 6), test_utils::truck("2", 6)],
        ))
    }

    #[test]
    fn test_finalized_route_covers_every_package_once() {
        let problem = create_problem();
        let route = Solver::new(Arc::clone(&problem), small_params(1))
            .unwrap()
            .solve()
            .unwrap();

        let mut ids = route
            .routes
            .iter()
            .flat_map(|truck| truck.stops.iter())
            .flat_map(|stop| stop.packages.iter().copied())
            .collect::<Vec<_>>();
        ids.sort_unstable();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());

        let chromosome = route.to_chromosome(&problem).unwrap();
        assert!(chromosome.validate(&problem).is_ok());
    }

    #[test]
    fn test_group_rides_together_after_optimization() {
        let mut packages = (1..=32)
            .map(|id| test_utils::package(id, 1 + (id as usize % 9)))
            .collect::<Vec<_>>();
        packages[30].add_note(PackageNote::ShipWith(vec![32]));
        let problem = Arc::new(test_utils::create_problem(
            10,
            packages,
            vec![test_utils::truck("1", 16), test_utils::truck("2", 16)],
        ));

        let route = run_optimization(Arc::clone(&problem), 20, 40, 15, 5).unwrap();
        let chromosome = route.to_chromosome(&problem).unwrap();

        let carrier = chromosome.truck_of(PackageIdx::new(30));
        assert!(carrier.is_some());
        assert_eq!(carrier, chromosome.truck_of(PackageIdx::new(31)));
        assert_eq!(route.num_packages(), 32);
    }

    #[test]
    fn test_same_seed_same_route() {
        let problem = create_problem();

        let first = run_optimization(Arc::clone(&problem), 20, 40, 15, 7).unwrap();
        let second = run_optimization(Arc::clone(&problem), 20, 40, 15, 7).unwrap();
        assert_eq!(first, second);

        let single_threaded = Solver::new(
            Arc::clone(&problem),
            OptimizerParams {
                evaluation_threads: Threads::Single,
                ..small_params(7)
            },
        )
        .unwrap()
        .solve()
        .unwrap();
        assert_eq!(first, single_threaded);
    }

    #[test]
    fn test_best_fitness_never_increases() {
        let solver = Solver::new(create_problem(), small_params(3)).unwrap();
        solver.solve().unwrap();

        let statistics = solver.statistics();
        assert!(!statistics.generations().is_empty());
        for pair in statistics.generations().windows(2) {
            assert!(pair[1].best <= pair[0].best);
        }
        assert_eq!(solver.status(), SolverStatus::Completed);
    }

    #[test]
    fn test_late_deadline_package_is_moved_forward() {
        let mut truck = test_utils::truck("1", 16);
        truck.set_departure_time(time(8, 20, 0, 0));

        // Package C (id 3) must reach location 9 by 09:00.
        let problem = Arc::new(test_utils::create_problem(
            10,
            vec![
                test_utils::package(1, 1),
                test_utils::package(2, 2),
                test_utils::package_with_deadline(3, 9, time(9, 0, 0, 0)),
                test_utils::package(4, 3),
                test_utils::package(5, 4),
                test_utils::package(6, 5),
            ],
            vec![truck],
        ));

        // Zig-zag with C last: 17 miles before location 9, arriving at 09:16:40.
        let seed = Chromosome::new(vec![
            [0, 5, 1, 4, 3, 2].into_iter().map(PackageIdx::new).collect(),
        ]);

        let params = OptimizerParams {
            population_size: 40,
            max_generations: 150,
            stagnation_limit: 50,
            ..small_params(11)
        };
        let solver = Solver::new(Arc::clone(&problem), params).unwrap();
        let seed_analysis = solver.analyze(&seed);
        assert_eq!(seed_analysis.late_packages, 1);

        let route = solver.solve_from(seed).unwrap();
        let best = route.to_chromosome(&problem).unwrap();
        let best_analysis = solver.analyze(&best);

        assert!(best_analysis.total_score() < seed_analysis.total_score());
        let arrivals = planned_arrivals(&problem, &best);
        assert!(arrivals[2].is_some_and(|arrival| arrival <= time(9, 0, 0, 0)));
        assert_eq!(best.truck_of(PackageIdx::new(2)), Some(TruckIdx::new(0)));
    }

    #[test]
    fn test_infeasible_problem_is_reported() {
        let problem = Arc::new(test_utils::create_spread_problem(
            10,
            17,
            vec![test_utils::truck("1", 16)],
        ));

        let result = run_optimization(problem, 10, 10, 5, 1);
        assert!(matches!(
            result,
            Err(CourierError::InfeasibleConstraints(
                InfeasibilityReason::FleetOutOfRoom { .. }
            ))
        ));
    }

    #[test]
    fn test_invalid_seed_is_rejected() {
        let problem = create_problem();
        let solver = Solver::new(Arc::clone(&problem), small_params(1)).unwrap();

        let result = solver.solve_from(Chromosome::empty(problem.num_trucks()));
        assert!(matches!(result, Err(CourierError::InvalidRoute(_))));
    }
}
