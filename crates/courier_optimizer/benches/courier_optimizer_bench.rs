use std::hint::black_box;

use courier_optimizer::{
    problem::{
        delivery_problem::{DeliveryProblem, DeliveryProblemBuilder},
        distance_matrix::DistanceMatrix,
        package::PackageBuilder,
        truck::TruckBuilder,
    },
    scheduler::priority_scheduler::schedule,
    solver::{
        fitness::{FitnessWeights, evaluate},
        operators::{crossover::crossover, mutation::mutate},
        solution::population::EvaluatedChromosome,
    },
};
use criterion::{Criterion, criterion_group, criterion_main};
use jiff::civil::time;
use rand::{Rng, SeedableRng, rngs::SmallRng};

const NUM_LOCATIONS: usize = 27;
const NUM_PACKAGES: u32 = 40;

fn create_problem() -> DeliveryProblem {
    let mut rng = SmallRng::seed_from_u64(7);
    let rows = (0..NUM_LOCATIONS)
        .map(|i| {
            (0..=i)
                .map(|j| {
                    if i == j {
                        0.0
                    } else {
                        rng.random_range(0.5..12.0)
                    }
                })
                .collect()
        })
        .collect();

    let mut builder = DeliveryProblemBuilder::default();
    builder
        .set_addresses(
            (0..NUM_LOCATIONS)
                .map(|index| format!("{index} State St"))
                .collect(),
        )
        .set_distance_matrix(DistanceMatrix::new(rows).unwrap())
        .set_hub("0 State St")
        .set_start_time(time(8, 0, 0, 0));

    for id in 1..=NUM_PACKAGES {
        let location = 1 + (id as usize * 7) % (NUM_LOCATIONS - 1);
        let mut package = PackageBuilder::new(id, format!("{location} State St"));
        if id % 5 == 0 {
            package.set_deadline(time(10, 30, 0, 0));
        }
        builder.add_package(package);
    }

    for id in ["1", "2", "3"] {
        let mut truck = TruckBuilder::new(id);
        truck.set_capacity(16);
        builder.add_truck(truck);
    }

    builder.build().unwrap()
}

fn fitness_benchmark(c: &mut Criterion) {
    let problem = create_problem();
    let chromosome = schedule(&problem).unwrap();
    let weights = FitnessWeights::default();

    c.bench_function("evaluate chromosome", |b| {
        b.iter(|| evaluate(black_box(&problem), black_box(&chromosome), &weights))
    });
}

fn crossover_benchmark(c: &mut Criterion) {
    let problem = create_problem();
    let weights = FitnessWeights::default();
    let mut rng = SmallRng::seed_from_u64(42);

    let seed = schedule(&problem).unwrap();
    let other = mutate(&problem, &seed, 10, &mut rng).unwrap_or_else(|| seed.clone());
    let first = EvaluatedChromosome {
        fitness: evaluate(&problem, &seed, &weights),
        chromosome: seed,
    };
    let second = EvaluatedChromosome {
        fitness: evaluate(&problem, &other, &weights),
        chromosome: other,
    };

    c.bench_function("segment crossover", |b| {
        b.iter(|| crossover(black_box(&problem), &first, &second, &mut rng))
    });
}

criterion_group!(benches, fitness_benchmark, crossover_benchmark);
criterion_main!(benches);
