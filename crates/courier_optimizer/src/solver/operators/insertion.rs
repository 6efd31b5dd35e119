use crate::{
    problem::{
        delivery_problem::DeliveryProblem, location::LocationIdx, miles::Miles,
        package::PackageIdx, truck::TruckIdx,
    },
    solver::solution::chromosome::Chromosome,
};

fn location_before(problem: &DeliveryProblem, route: &[PackageIdx], position: usize) -> LocationIdx {
    if position == 0 {
        problem.hub()
    } else {
        problem.planned_location(route[position - 1])
    }
}

fn location_at(problem: &DeliveryProblem, route: &[PackageIdx], position: usize) -> LocationIdx {
    route
        .get(position)
        .map_or(problem.hub(), |&package_id| problem.planned_location(package_id))
}

/// Extra miles driven when `block` is delivered, in order, right before `route[position]`.
pub fn insertion_delta(
    problem: &DeliveryProblem,
    route: &[PackageIdx],
    position: usize,
    block: &[PackageIdx],
) -> Miles {
    let (Some(&first), Some(&last)) = (block.first(), block.last()) else {
        return Miles::ZERO;
    };

    let previous = location_before(problem, route, position);
    let next = location_at(problem, route, position);

    let internal = block
        .windows(2)
        .map(|pair| {
            problem.travel_distance(
                problem.planned_location(pair[0]),
                problem.planned_location(pair[1]),
            )
        })
        .sum::<Miles>();

    problem.travel_distance(previous, problem.planned_location(first))
        + internal
        + problem.travel_distance(problem.planned_location(last), next)
        - problem.travel_distance(previous, next)
}

/// Cheapest position for `block`, earliest position on ties.
pub fn best_insertion(
    problem: &DeliveryProblem,
    route: &[PackageIdx],
    block: &[PackageIdx],
) -> (usize, Miles) {
    (0..=route.len())
        .map(|position| (position, insertion_delta(problem, route, position, block)))
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .unwrap_or((0, Miles::ZERO))
}

pub fn insert_block(route: &mut Vec<PackageIdx>, position: usize, block: &[PackageIdx]) {
    route.splice(position..position, block.iter().copied());
}

/// Inserts a unit's packages one by one at their cheapest positions, on whichever candidate
/// truck with enough room ends up cheapest overall. Returns the chosen truck.
pub fn insert_unit(
    problem: &DeliveryProblem,
    chromosome: &mut Chromosome,
    packages: &[PackageIdx],
    candidates: impl Iterator<Item = TruckIdx>,
) -> Option<TruckIdx> {
    let mut best: Option<(TruckIdx, Vec<PackageIdx>, Miles)> = None;

    for truck_id in candidates {
        if chromosome.load(truck_id) + packages.len() > problem.truck(truck_id).capacity() {
            continue;
        }

        let mut route = chromosome.route(truck_id).to_vec();
        let mut total = Miles::ZERO;
        for &package_id in packages {
            let (position, delta) = best_insertion(problem, &route, &[package_id]);
            route.insert(position, package_id);
            total += delta;
        }

        if best.as_ref().is_none_or(|(_, _, best_total)| total < *best_total) {
            best = Some((truck_id, route, total));
        }
    }

    let (truck_id, route, _) = best?;
    *chromosome.route_mut(truck_id) = route;
    Some(truck_id)
}
