use comfy_table::{Table, presets::UTF8_FULL};
use courier_optimizer::{
    problem::delivery_problem::DeliveryProblem,
    simulation::{
        delivery_simulator::{PackageState, TruckState},
        timeline::TruckPosition,
    },
    solver::{score::FitnessAnalysis, solution::finalized_route::FinalizedRoute},
};

fn format_time(time: Option<jiff::civil::Time>) -> String {
    time.map_or_else(String::new, |time| time.strftime("%H:%M:%S").to_string())
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table
}

pub fn route_table(route: &FinalizedRoute) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Truck", "Departs", "Stops", "Packages"]);

    for truck_route in &route.routes {
        let packages = truck_route
            .stops
            .iter()
            .flat_map(|stop| stop.packages.iter())
            .map(|id| id.to_string())
            .collect::<Vec<_>>();

        table.add_row(vec![
            truck_route.truck.clone(),
            format_time(Some(truck_route.departure_time)),
            truck_route.stops.len().to_string(),
            packages.join(", "),
        ]);
    }

    table
}

pub fn analysis_table(analysis: &FitnessAnalysis) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Measure", "Value"]);

    table.add_row(vec![
        String::from("Total distance"),
        format!("{:.2} mi", analysis.total_miles),
    ]);
    table.add_row(vec![
        String::from("Late packages"),
        analysis.late_packages.to_string(),
    ]);
    table.add_row(vec![
        String::from("Late minutes"),
        format!("{:.1}", analysis.late_minutes),
    ]);
    table.add_row(vec![
        String::from("Violations"),
        analysis.violations.to_string(),
    ]);
    table.add_row(vec![
        String::from("Fitness"),
        analysis.total_score().to_string(),
    ]);

    table
}

pub fn packages_table(packages: &[PackageState]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Package",
        "Address",
        "Deadline",
        "Truck",
        "Status",
        "Delivered at",
    ]);

    for state in packages {
        let delivered_at = match format_time(state.delivered_at) {
            time if state.is_late() => format!("{time} (late)"),
            time => time,
        };

        table.add_row(vec![
            state.package.to_string(),
            state.address.clone(),
            format_time(state.deadline),
            state.truck.clone().unwrap_or_default(),
            state.status.to_string(),
            delivered_at,
        ]);
    }

    table
}

pub fn trucks_table(problem: &DeliveryProblem, trucks: &[TruckState]) -> Table {
    let address = |location_id| {
        problem
            .address_book()
            .location(location_id)
            .map(|location| location.address().to_owned())
            .unwrap_or_default()
    };

    let mut table = new_table();
    table.set_header(vec!["Truck", "Position", "Departed", "Aboard", "Odometer"]);

    for state in trucks {
        let position = match state.position {
            TruckPosition::AtHub => String::from("Hub"),
            TruckPosition::At(location_id) => address(location_id),
            TruckPosition::Driving { from, to } => {
                format!("{} -> {}", address(from), address(to))
            }
        };

        table.add_row(vec![
            state.truck.clone(),
            position,
            state
                .departure_times
                .iter()
                .map(|time| format_time(Some(*time)))
                .collect::<Vec<_>>()
                .join(", "),
            state.packages_aboard.to_string(),
            state.odometer.to_string(),
        ]);
    }

    table
}
