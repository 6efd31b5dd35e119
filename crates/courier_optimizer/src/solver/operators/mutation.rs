use rand::{Rng, seq::IndexedRandom};
use tracing::warn;

use crate::{
    problem::{delivery_problem::DeliveryProblem, package::PackageIdx, truck::TruckIdx},
    solver::{fitness::count_violations, solution::chromosome::Chromosome},
};

use super::insertion::insert_block;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// Swaps two packages of one route.
    Swap,
    /// Moves a package, together with its ride-together group, to another position, possibly
    /// on another truck.
    Move,
    /// Reverses a sub-segment of one route.
    Inversion,
}

impl Mutation {
    const ALL: [Mutation; 3] = [Mutation::Swap, Mutation::Move, Mutation::Inversion];

    pub fn random(rng: &mut impl Rng) -> Mutation {
        Mutation::ALL[rng.random_range(0..Mutation::ALL.len())]
    }
}

fn random_route_of_length(
    chromosome: &Chromosome,
    min_length: usize,
    rng: &mut impl Rng,
) -> Option<TruckIdx> {
    let candidates = (0..chromosome.num_trucks())
        .map(TruckIdx::new)
        .filter(|&truck_id| chromosome.load(truck_id) >= min_length)
        .collect::<Vec<_>>();
    candidates.choose(rng).copied()
}

fn swap(chromosome: &Chromosome, rng: &mut impl Rng) -> Option<Chromosome> {
    let truck_id = random_route_of_length(chromosome, 2, rng)?;
    let length = chromosome.load(truck_id);

    let first = rng.random_range(0..length);
    let second = (first + rng.random_range(1..length)) % length;

    let mut mutated = chromosome.clone();
    mutated.route_mut(truck_id).swap(first, second);
    Some(mutated)
}

fn inversion(chromosome: &Chromosome, rng: &mut impl Rng) -> Option<Chromosome> {
    let truck_id = random_route_of_length(chromosome, 2, rng)?;
    let length = chromosome.load(truck_id);

    let start = rng.random_range(0..length - 1);
    let end = rng.random_range(start + 1..length);

    let mut mutated = chromosome.clone();
    mutated.route_mut(truck_id)[start..=end].reverse();
    Some(mutated)
}

fn move_unit(
    problem: &DeliveryProblem,
    chromosome: &Chromosome,
    rng: &mut impl Rng,
) -> Option<Chromosome> {
    if problem.num_packages() == 0 {
        return None;
    }

    let package_id = PackageIdx::new(rng.random_range(0..problem.num_packages()));
    let unit_id = problem.unit_of(package_id);
    let source = chromosome.truck_of(package_id)?;

    let members = chromosome
        .route(source)
        .iter()
        .copied()
        .filter(|&member| problem.unit_of(member) == unit_id)
        .collect::<Vec<_>>();

    let mut mutated = chromosome.clone();
    mutated.remove_packages(&members);

    let targets = problem
        .compatible_trucks(unit_id)
        .filter(|&truck_id| {
            mutated.load(truck_id) + members.len() <= problem.truck(truck_id).capacity()
        })
        .collect::<Vec<_>>();
    let &target = targets.choose(rng)?;

    let position = rng.random_range(0..=mutated.load(target));
    insert_block(mutated.route_mut(target), position, &members);
    Some(mutated)
}

pub fn apply_mutation(
    problem: &DeliveryProblem,
    chromosome: &Chromosome,
    mutation: Mutation,
    rng: &mut impl Rng,
) -> Option<Chromosome> {
    match mutation {
        Mutation::Swap => swap(chromosome, rng),
        Mutation::Move => move_unit(problem, chromosome, rng),
        Mutation::Inversion => inversion(chromosome, rng),
    }
}

/// Applies one random mutation. Attempts that change nothing or break a hard constraint are
/// discarded, after `max_attempts` of them the chromosome is left as is (`None`).
pub fn mutate(
    problem: &DeliveryProblem,
    chromosome: &Chromosome,
    max_attempts: usize,
    rng: &mut impl Rng,
) -> Option<Chromosome> {
    for _ in 0..max_attempts {
        let mutation = Mutation::random(rng);
        let Some(mutated) = apply_mutation(problem, chromosome, mutation, rng) else {
            continue;
        };

        if mutated.is_identical(chromosome) {
            continue;
        }

        if count_violations(problem, &mutated) > 0 {
            warn!(?mutation, "Discarding infeasible mutation");
            continue;
        }

        return Some(mutated);
    }

    None
}
