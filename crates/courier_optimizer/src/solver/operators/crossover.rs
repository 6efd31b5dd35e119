use rand::{Rng, seq::IndexedRandom};

use crate::{
    problem::{
        delivery_problem::DeliveryProblem, load_unit::UnitIdx, package::PackageIdx,
        truck::TruckIdx,
    },
    solver::solution::{chromosome::Chromosome, population::EvaluatedChromosome},
};

use super::insertion::{best_insertion, insert_block, insert_unit};

/// Transplants a contiguous segment of one truck of `first` into the same truck of a copy of
/// `second`. Falls back to a copy of the fitter parent when the child cannot be repaired.
pub fn crossover(
    problem: &DeliveryProblem,
    first: &EvaluatedChromosome,
    second: &EvaluatedChromosome,
    rng: &mut impl Rng,
) -> Chromosome {
    match segment_crossover(problem, &first.chromosome, &second.chromosome, rng) {
        Some(child) => child,
        None if first.fitness <= second.fitness => first.chromosome.clone(),
        None => second.chromosome.clone(),
    }
}

/// The segment keeps its order and lands at its cheapest position. Ride-together companions
/// follow it, and units pushed out for capacity are re-inserted at their cheapest feasible
/// position on another truck.
pub fn segment_crossover(
    problem: &DeliveryProblem,
    first: &Chromosome,
    second: &Chromosome,
    rng: &mut impl Rng,
) -> Option<Chromosome> {
    let trucks = (0..first.num_trucks())
        .map(TruckIdx::new)
        .filter(|&truck_id| !first.route(truck_id).is_empty())
        .collect::<Vec<_>>();
    let &truck_id = trucks.choose(rng)?;

    let route = first.route(truck_id);
    let start = rng.random_range(0..route.len());
    let end = rng.random_range(start..route.len());

    let mut block = route[start..=end].to_vec();
    for &package_id in &route[start..=end] {
        for &companion in problem.unit(problem.unit_of(package_id)).packages() {
            if !block.contains(&companion) {
                block.push(companion);
            }
        }
    }

    let capacity = problem.truck(truck_id).capacity();
    if block.len() > capacity
        || block
            .iter()
            .any(|&package_id| !problem.is_package_compatible(package_id, truck_id))
    {
        return None;
    }

    let mut child = second.clone();
    child.remove_packages(&block);

    let (position, _) = best_insertion(problem, child.route(truck_id), &block);
    insert_block(child.route_mut(truck_id), position, &block);

    let mut evicted: Vec<UnitIdx> = Vec::new();
    while child.load(truck_id) > capacity {
        let mut candidates = child
            .route(truck_id)
            .iter()
            .filter(|package_id| !block.contains(package_id))
            .map(|&package_id| problem.unit_of(package_id))
            .collect::<Vec<_>>();
        candidates.sort_unstable();
        candidates.dedup();
        candidates.retain(|&unit_id| {
            problem
                .compatible_trucks(unit_id)
                .any(|other| other != truck_id)
        });

        let &unit_id = candidates.choose(rng)?;
        child.remove_packages(problem.unit(unit_id).packages());
        evicted.push(unit_id);
    }

    for unit_id in evicted {
        let packages: &[PackageIdx] = problem.unit(unit_id).packages();
        insert_unit(
            problem,
            &mut child,
            packages,
            problem
                .compatible_trucks(unit_id)
                .filter(|&other| other != truck_id),
        )?;
    }

    Some(child)
}
