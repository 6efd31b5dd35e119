use std::ops::{Bound, RangeBounds};

use jiff::civil::Time;
use serde::Serialize;
use smallvec::SmallVec;

use crate::problem::{
    delivery_problem::DeliveryProblem, location::LocationIdx, miles::Miles, package::PackageIdx,
    truck::TruckIdx,
};

pub type StopPackages = SmallVec<[PackageIdx; 4]>;

/// One drive between two locations. Packages in `delivered` are handed over on arrival.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leg {
    pub from: LocationIdx,
    pub to: LocationIdx,
    pub depart_at: Time,
    pub arrive_at: Time,
    pub distance: Miles,
    /// Odometer when the leg starts.
    pub odometer: Miles,
    pub delivered: StopPackages,
}

impl Leg {
    fn odometer_at(&self, time: Time) -> Miles {
        if time <= self.depart_at {
            return self.odometer;
        }

        if time >= self.arrive_at {
            return self.odometer + self.distance;
        }

        let elapsed = self.depart_at.duration_until(time).as_secs_f64();
        let total = self.depart_at.duration_until(self.arrive_at).as_secs_f64();
        self.odometer + self.distance * (elapsed / total)
    }
}

/// Where a truck is at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TruckPosition {
    AtHub,
    At(LocationIdx),
    Driving { from: LocationIdx, to: LocationIdx },
}

/// The drive of one truck over the day, from its hub departure back to the hub.
#[derive(Debug, Clone, Serialize)]
pub struct TruckTimeline {
    truck_id: TruckIdx,
    departure_time: Time,
    legs: Vec<Leg>,
}

fn drive(
    problem: &DeliveryProblem,
    truck_id: TruckIdx,
    start: (LocationIdx, Time, Miles),
    stops: Vec<(LocationIdx, StopPackages)>,
) -> Vec<Leg> {
    let speed = problem.truck(truck_id).speed();
    let (mut location, mut time, mut odometer) = start;
    let mut legs = Vec::with_capacity(stops.len() + 1);

    let hub = problem.hub();
    let returns = !stops.is_empty() || location != hub;
    let destinations = stops
        .into_iter()
        .chain(returns.then(|| (hub, StopPackages::new())));

    for (to, delivered) in destinations {
        let distance = problem.travel_distance(location, to);
        let arrive_at = time.saturating_add(distance / speed);

        legs.push(Leg {
            from: location,
            to,
            depart_at: time,
            arrive_at,
            distance,
            odometer,
            delivered,
        });

        location = to;
        time = arrive_at;
        odometer += distance;
    }

    legs
}

impl TruckTimeline {
    pub fn new(
        problem: &DeliveryProblem,
        truck_id: TruckIdx,
        stops: Vec<(LocationIdx, StopPackages)>,
    ) -> Self {
        let departure_time = problem.departure_time(truck_id);
        let legs = drive(
            problem,
            truck_id,
            (problem.hub(), departure_time, Miles::ZERO),
            stops,
        );

        TruckTimeline {
            truck_id,
            departure_time,
            legs,
        }
    }

    pub fn truck_id(&self) -> TruckIdx {
        self.truck_id
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// A truck with nothing to deliver never leaves the hub.
    pub fn leaves_hub(&self) -> bool {
        !self.legs.is_empty()
    }

    pub fn departure_time(&self) -> Time {
        self.departure_time
    }

    pub fn has_departed(&self, time: Time) -> bool {
        self.leaves_hub() && time >= self.departure_time
    }

    /// Arrival back at the hub.
    pub fn end_time(&self) -> Time {
        self.legs
            .last()
            .map_or(self.departure_time, |leg| leg.arrive_at)
    }

    pub fn total_distance(&self) -> Miles {
        self.legs
            .last()
            .map_or(Miles::ZERO, |leg| leg.odometer + leg.distance)
    }

    pub fn odometer_at(&self, time: Time) -> Miles {
        match self.legs.iter().find(|leg| time < leg.arrive_at) {
            Some(leg) => leg.odometer_at(time),
            None => self.total_distance(),
        }
    }

    pub fn position_at(&self, time: Time) -> TruckPosition {
        let Some(first) = self.legs.first() else {
            return TruckPosition::AtHub;
        };

        if time <= first.depart_at {
            return TruckPosition::AtHub;
        }

        match self.legs.iter().find(|leg| time < leg.arrive_at) {
            Some(leg) if time > leg.depart_at => TruckPosition::Driving {
                from: leg.from,
                to: leg.to,
            },
            Some(leg) => TruckPosition::At(leg.from),
            None => TruckPosition::AtHub,
        }
    }

    pub fn delivered_at(&self, package_id: PackageIdx) -> Option<Time> {
        self.legs
            .iter()
            .find(|leg| leg.delivered.contains(&package_id))
            .map(|leg| leg.arrive_at)
    }

    /// Destination of the leg that will deliver the package.
    pub fn delivery_location(&self, package_id: PackageIdx) -> Option<LocationIdx> {
        self.legs
            .iter()
            .find(|leg| leg.delivered.contains(&package_id))
            .map(|leg| leg.to)
    }

    /// Packages carried at `time`: everything loaded at departure and not yet handed over.
    pub fn packages_aboard_at(&self, time: Time) -> usize {
        if !self.has_departed(time) {
            return 0;
        }

        self.legs
            .iter()
            .filter(|leg| leg.arrive_at > time)
            .map(|leg| leg.delivered.len())
            .sum()
    }

    /// Packages handed over within `window`.
    pub fn deliveries_between(
        &self,
        window: (Bound<Time>, Bound<Time>),
    ) -> impl Iterator<Item = (Time, PackageIdx)> + '_ {
        self.legs
            .iter()
            .filter(move |leg| window.contains(&leg.arrive_at))
            .flat_map(|leg| {
                leg.delivered
                    .iter()
                    .map(move |&package_id| (leg.arrive_at, package_id))
            })
    }

    /// Sends `package_id` to `location_id` from `at` on. Legs already under way at `at` keep
    /// running, the package is dropped from them, and the stops still ahead are re-planned by
    /// cheapest insertion of the new destination. A stop already heading to that location
    /// takes the package instead.
    pub(crate) fn redirect(
        &mut self,
        problem: &DeliveryProblem,
        package_id: PackageIdx,
        location_id: LocationIdx,
        at: Time,
    ) {
        for leg in self.legs.iter_mut() {
            leg.delivered.retain(|candidate| *candidate != package_id);
        }

        let kept = self.legs.iter().take_while(|leg| leg.depart_at < at).count();
        let hub = problem.hub();

        let start = match kept.checked_sub(1).map(|index| &self.legs[index]) {
            Some(leg) => (leg.to, leg.arrive_at, leg.odometer + leg.distance),
            None => (hub, self.departure_time, Miles::ZERO),
        };

        let upcoming = if kept < self.legs.len() {
            self.legs.len() - 1
        } else {
            kept
        };
        let mut stops = self.legs[kept..upcoming]
            .iter()
            .filter(|leg| !leg.delivered.is_empty())
            .map(|leg| (leg.to, leg.delivered.clone()))
            .collect::<Vec<_>>();

        if let Some((_, packages)) = stops
            .iter_mut()
            .find(|(stop_location, _)| *stop_location == location_id)
        {
            packages.push(package_id);
        } else {
            let position = (0..=stops.len())
                .min_by(|&a, &b| {
                    let delta = |position: usize| {
                        let previous = if position == 0 {
                            start.0
                        } else {
                            stops[position - 1].0
                        };
                        let next = stops.get(position).map_or(hub, |stop| stop.0);
                        problem.travel_distance(previous, location_id)
                            + problem.travel_distance(location_id, next)
                            - problem.travel_distance(previous, next)
                    };
                    delta(a).cmp(&delta(b))
                })
                .unwrap_or(0);
            stops.insert(position, (location_id, SmallVec::from_elem(package_id, 1)));
        }

        self.legs.truncate(kept);
        let rest = drive(problem, self.truck_id, start, stops);
        self.legs.extend(rest);
    }
}
