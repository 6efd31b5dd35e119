use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use jiff::Timestamp;
use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock, RwLockReadGuard};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{Level, debug, info, instrument};

use crate::{
    error::CourierResult,
    problem::delivery_problem::DeliveryProblem,
    scheduler::priority_scheduler::schedule,
    selector::select_tournament::TournamentSelector,
    timer_debug,
};

use super::{
    fitness::{FitnessWeights, evaluate},
    operators::{crossover::crossover, mutation::mutate},
    solution::{
        chromosome::Chromosome,
        population::{EvaluatedChromosome, Population},
    },
    solver_params::OptimizerParams,
    statistics::{GenerationStatistics, SearchStatistics},
};

const MAX_SEED_PERTURBATIONS: usize = 5;

type BestChromosomeHandler = Arc<Mutex<dyn FnMut(&EvaluatedChromosome) + Send + Sync + 'static>>;
type GenerationHandler = Arc<Mutex<dyn FnMut(&GenerationStatistics) + Send + Sync + 'static>>;

pub struct GeneticAlgorithm {
    problem: Arc<DeliveryProblem>,
    params: OptimizerParams,
    weights: FitnessWeights,
    best_chromosome: RwLock<Option<EvaluatedChromosome>>,
    statistics: RwLock<SearchStatistics>,
    on_best_chromosome_handler: Option<BestChromosomeHandler>,
    on_generation_handler: Option<GenerationHandler>,
    is_stopped: Arc<AtomicBool>,
}

impl GeneticAlgorithm {
    pub fn new(params: OptimizerParams, problem: Arc<DeliveryProblem>) -> CourierResult<Self> {
        params.validate()?;

        Ok(GeneticAlgorithm {
            weights: FitnessWeights::from(&params),
            problem,
            params,
            best_chromosome: RwLock::new(None),
            statistics: RwLock::new(SearchStatistics::default()),
            on_best_chromosome_handler: None,
            on_generation_handler: None,
            is_stopped: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn problem(&self) -> &DeliveryProblem {
        &self.problem
    }

    pub fn params(&self) -> &OptimizerParams {
        &self.params
    }

    pub fn on_best_chromosome<F>(&mut self, callback: F)
    where
        F: FnMut(&EvaluatedChromosome) + Send + Sync + 'static,
    {
        self.on_best_chromosome_handler = Some(Arc::new(Mutex::new(callback)));
    }

    pub fn on_generation<F>(&mut self, callback: F)
    where
        F: FnMut(&GenerationStatistics) + Send + Sync + 'static,
    {
        self.on_generation_handler = Some(Arc::new(Mutex::new(callback)));
    }

    /// Requests the search to end after the current generation.
    pub fn stop(&self) {
        self.is_stopped.store(true, Ordering::Relaxed);
    }

    pub fn best_chromosome(&self) -> Option<MappedRwLockReadGuard<'_, EvaluatedChromosome>> {
        RwLockReadGuard::try_map(self.best_chromosome.read(), |best| best.as_ref()).ok()
    }

    pub fn statistics(&self) -> SearchStatistics {
        self.statistics.read().clone()
    }

    /// Runs the search from the priority scheduler's seed assignment.
    pub fn run(&self) -> CourierResult<EvaluatedChromosome> {
        let seed = timer_debug!("Seed assignment", schedule(&self.problem))?;
        self.run_from(seed)
    }

    /// Runs the search from a caller-provided seed, which must satisfy every hard constraint.
    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn run_from(&self, seed: Chromosome) -> CourierResult<EvaluatedChromosome> {
        seed.validate(&self.problem)?;

        let started_at = Timestamp::now();
        self.is_stopped.store(false, Ordering::Relaxed);
        self.statistics.write().clear();

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.params.evaluation_threads.number_of_threads())
            .build()?;
        let mut rng = SmallRng::seed_from_u64(self.params.seed);
        let selector = TournamentSelector::new(self.params.tournament_size);

        let mut population = timer_debug!(
            "Initial population",
            self.create_initial_population(&thread_pool, seed, &mut rng)
        );

        let mut best = match population.best() {
            Some(best) => best.clone(),
            None => unreachable!("the initial population always holds the seed"),
        };
        self.update_best(&best);
        self.record_generation(0, &population, &best, true);

        let mut generations_without_improvement = 0;
        let mut generation = 0;

        while generation < self.params.max_generations {
            if self.is_stopped.load(Ordering::Relaxed) {
                info!(generation, "Search stopped");
                break;
            }
            generation += 1;

            let offspring = self.breed(&population, &selector, &mut rng);
            let evaluated = self.evaluate_all(&thread_pool, offspring);

            let mut next = Population::new(self.params.population_size);
            next.add(best.clone());
            for individual in evaluated {
                next.add(individual);
            }
            population = next;

            let improved = population
                .best()
                .is_some_and(|candidate| candidate.fitness < best.fitness);

            if improved && let Some(candidate) = population.best() {
                best = candidate.clone();
                generations_without_improvement = 0;
                self.update_best(&best);
            } else {
                generations_without_improvement += 1;
            }

            self.record_generation(generation, &population, &best, improved);

            if generations_without_improvement >= self.params.stagnation_limit {
                debug!(generation, "Stagnation limit reached");
                break;
            }
        }

        let duration = Timestamp::now().duration_since(started_at);
        self.statistics.write().set_duration(duration);

        if let Err(error) = best.chromosome.validate(&self.problem) {
            panic!("The genetic algorithm produced an invalid route set: {error}");
        }

        info!(
            generations = generation,
            fitness = %best.fitness,
            ?duration,
            "Optimization finished"
        );

        Ok(best)
    }

    fn create_initial_population(
        &self,
        thread_pool: &rayon::ThreadPool,
        seed: Chromosome,
        rng: &mut SmallRng,
    ) -> Population {
        let mut candidates = Vec::with_capacity(self.params.population_size);

        for _ in 1..self.params.population_size {
            let perturbations = rng.random_range(1..=MAX_SEED_PERTURBATIONS);
            let mut variant = seed.clone();
            for _ in 0..perturbations {
                if let Some(mutated) = mutate(
                    &self.problem,
                    &variant,
                    self.params.max_mutation_attempts,
                    rng,
                ) {
                    variant = mutated;
                }
            }
            candidates.push(variant);
        }
        candidates.insert(0, seed);

        let mut population = Population::new(self.params.population_size);
        for individual in self.evaluate_all(thread_pool, candidates) {
            population.add(individual);
        }

        debug!(size = population.len(), "Initial population");
        population
    }

    /// Produces the non-elite part of the next generation. All draws come from the single
    /// seeded generator, so the offspring do not depend on the evaluation thread count.
    fn breed(
        &self,
        population: &Population,
        selector: &TournamentSelector,
        rng: &mut SmallRng,
    ) -> Vec<Chromosome> {
        let offspring_count = self.params.population_size.saturating_sub(1);
        let mut offspring = Vec::with_capacity(offspring_count);

        while offspring.len() < offspring_count {
            let (Some(first), Some(second)) = (
                population.select(selector, rng),
                population.select(selector, rng),
            ) else {
                break;
            };

            let mut child = if rng.random_bool(self.params.crossover_probability) {
                crossover(&self.problem, first, second, rng)
            } else {
                first.chromosome.clone()
            };

            if rng.random_bool(self.params.mutation_probability)
                && let Some(mutated) = mutate(
                    &self.problem,
                    &child,
                    self.params.max_mutation_attempts,
                    rng,
                )
            {
                child = mutated;
            }

            offspring.push(child);
        }

        offspring
    }

    fn evaluate_all(
        &self,
        thread_pool: &rayon::ThreadPool,
        chromosomes: Vec<Chromosome>,
    ) -> Vec<EvaluatedChromosome> {
        let problem = &self.problem;
        let weights = &self.weights;

        thread_pool.install(|| {
            chromosomes
                .into_par_iter()
                .map(|chromosome| EvaluatedChromosome {
                    fitness: evaluate(problem, &chromosome, weights),
                    chromosome,
                })
                .collect()
        })
    }

    fn update_best(&self, best: &EvaluatedChromosome) {
        *self.best_chromosome.write() = Some(best.clone());

        if let Some(callback) = &self.on_best_chromosome_handler {
            let mut guard = callback.lock();
            guard(best);
        }
    }

    fn record_generation(
        &self,
        generation: usize,
        population: &Population,
        best: &EvaluatedChromosome,
        improved: bool,
    ) {
        let statistics = GenerationStatistics {
            generation,
            best: best.fitness,
            mean: population.mean_fitness().unwrap_or(best.fitness),
            worst: population.worst().map_or(best.fitness, |worst| worst.fitness),
            improved,
        };

        debug!(
            generation,
            best = %statistics.best,
            mean = %statistics.mean,
            worst = %statistics.worst,
            "Generation"
        );

        self.statistics.write().add_generation(statistics);

        if let Some(callback) = &self.on_generation_handler {
            let mut guard = callback.lock();
            guard(&statistics);
        }
    }
}
