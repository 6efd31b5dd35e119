use crate::problem::{
    delivery_problem::DeliveryProblem, location::LocationIdx, package::PackageIdx,
};

/// Delivery order within one truck: packages with a deadline first, by deadline, then the
/// rest chained nearest-neighbour from the last deadline stop. Packages sharing a location end
/// up adjacent since they are zero miles apart.
pub fn order_route(problem: &DeliveryProblem, packages: &[PackageIdx]) -> Vec<PackageIdx> {
    let (mut with_deadline, mut remaining): (Vec<PackageIdx>, Vec<PackageIdx>) = packages
        .iter()
        .partition(|&&package_id| problem.package(package_id).has_deadline());

    with_deadline.sort_by_key(|&package_id| {
        let package = problem.package(package_id);
        (package.deadline(), package.id())
    });

    let mut route = Vec::with_capacity(packages.len());
    let mut current: LocationIdx = problem.hub();

    for package_id in with_deadline {
        current = problem.planned_location(package_id);
        route.push(package_id);
    }

    remaining.sort_by_key(|&package_id| problem.package(package_id).id());
    while !remaining.is_empty() {
        let nearest = remaining
            .iter()
            .enumerate()
            .min_by(|&(_, &a), &(_, &b)| {
                problem
                    .travel_distance(current, problem.planned_location(a))
                    .cmp(&problem.travel_distance(current, problem.planned_location(b)))
            })
            .map(|(position, _)| position)
            .unwrap_or(0);

        let package_id = remaining.remove(nearest);
        current = problem.planned_location(package_id);
        route.push(package_id);
    }

    route
}
