use std::{
    ops::{Bound, RangeBounds},
    sync::Arc,
};

use jiff::civil::Time;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    error::{CourierError, CourierResult},
    problem::{
        delivery_problem::DeliveryProblem,
        location::LocationIdx,
        miles::Miles,
        package::{PackageIdx, PackageStatus},
        truck::TruckIdx,
    },
    solver::solution::{chromosome::Chromosome, finalized_route::FinalizedRoute},
};

use super::timeline::{TruckPosition, TruckTimeline};

/// The one-time destination change of a package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressChange {
    pub effective_at: Time,
    pub location_id: LocationIdx,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageState {
    pub package: u32,
    pub status: PackageStatus,
    pub delivered_at: Option<Time>,
    pub truck: Option<String>,
    pub address: String,
    pub deadline: Option<Time>,
}

impl PackageState {
    pub fn is_late(&self) -> bool {
        matches!(
            (self.delivered_at, self.deadline),
            (Some(delivered_at), Some(deadline)) if delivered_at > deadline
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TruckState {
    pub truck: String,
    pub position: TruckPosition,
    pub odometer: Miles,
    /// Hub departures that happened at or before the queried time.
    pub departure_times: Vec<Time>,
    pub packages_aboard: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FleetSnapshot {
    pub time: Time,
    pub trucks: Vec<TruckState>,
    pub packages: Vec<PackageState>,
    pub total_mileage: Miles,
}

/// Truck timelines of a route with the problem's scheduled address correction folded in.
#[derive(Debug, Clone)]
pub(crate) struct Replay {
    timelines: Vec<TruckTimeline>,
    carriers: Vec<Option<TruckIdx>>,
    address_changes: Vec<Option<AddressChange>>,
}

impl Replay {
    pub(crate) fn new(problem: &DeliveryProblem, chromosome: &Chromosome) -> Self {
        let timelines = (0..problem.num_trucks())
            .map(TruckIdx::new)
            .map(|truck_id| {
                let stops = chromosome
                    .stops(problem, truck_id)
                    .into_iter()
                    .map(|stop| (stop.location_id, stop.packages))
                    .collect();
                TruckTimeline::new(problem, truck_id, stops)
            })
            .collect();

        let mut replay = Replay {
            timelines,
            carriers: chromosome.assignments(problem.num_packages()),
            address_changes: vec![None; problem.num_packages()],
        };

        if let Some(correction) = problem.address_correction() {
            let change = AddressChange {
                effective_at: correction.effective_at(),
                location_id: correction.location_id(),
                address: correction.address().to_owned(),
            };

            if let Err(error) = replay.redirect(problem, correction.package(), change) {
                warn!(%error, "Ignoring scheduled address correction");
            }
        }

        replay
    }

    /// Miles driven by the whole fleet once every truck is back at the hub.
    pub(crate) fn total_distance(&self) -> Miles {
        self.timelines
            .iter()
            .map(|timeline| timeline.total_distance())
            .sum()
    }

    fn redirect(
        &mut self,
        problem: &DeliveryProblem,
        package_id: PackageIdx,
        change: AddressChange,
    ) -> CourierResult<()> {
        let package = problem.package(package_id).id();

        if self.address_changes[package_id.get()].is_some() {
            return Err(CourierError::AlreadyApplied(package));
        }

        let truck_id =
            self.carriers[package_id.get()].ok_or(CourierError::UnknownPackage(package))?;
        let timeline = &mut self.timelines[truck_id.get()];

        if let Some(delivered_at) = timeline.delivered_at(package_id)
            && delivered_at <= change.effective_at
        {
            return Err(CourierError::AlreadyDelivered {
                package,
                delivered_at,
            });
        }

        if timeline.delivery_location(package_id) != Some(change.location_id) {
            timeline.redirect(problem, package_id, change.location_id, change.effective_at);
        }

        self.address_changes[package_id.get()] = Some(change);

        Ok(())
    }
}

/// Replays a finalized route over the day. The clock only moves forward; queries are pure
/// functions of the replay and may ask about any time.
pub struct DeliverySimulator {
    problem: Arc<DeliveryProblem>,
    replay: Replay,
    current_time: Time,
    /// Whether `current_time` has been reported by [`DeliverySimulator::advance_to`].
    has_advanced: bool,
    recorded_distance: Miles,
}

impl DeliverySimulator {
    pub fn new(problem: Arc<DeliveryProblem>, route: &FinalizedRoute) -> CourierResult<Self> {
        let chromosome = route.to_chromosome(&problem)?;
        let mut simulator = DeliverySimulator::from_chromosome(problem, &chromosome)?;
        simulator.recorded_distance = route.total_distance;
        Ok(simulator)
    }

    pub fn from_chromosome(
        problem: Arc<DeliveryProblem>,
        chromosome: &Chromosome,
    ) -> CourierResult<Self> {
        chromosome.validate(&problem)?;

        let replay = Replay::new(&problem, chromosome);

        let current_time = replay
            .timelines
            .iter()
            .filter(|timeline| timeline.leaves_hub())
            .map(|timeline| timeline.departure_time())
            .min()
            .map_or(problem.start_time(), |earliest| {
                earliest.min(problem.start_time())
            });

        Ok(DeliverySimulator {
            recorded_distance: replay.total_distance(),
            replay,
            current_time,
            has_advanced: false,
            problem,
        })
    }

    pub fn problem(&self) -> &DeliveryProblem {
        &self.problem
    }

    pub fn current_time(&self) -> Time {
        self.current_time
    }

    /// Total distance the loaded route was recorded with.
    pub fn recorded_distance(&self) -> Miles {
        self.recorded_distance
    }

    pub fn timelines(&self) -> &[TruckTimeline] {
        &self.replay.timelines
    }

    /// When the last truck is back at the hub.
    pub fn end_of_day(&self) -> Time {
        self.replay
            .timelines
            .iter()
            .map(|timeline| timeline.end_time())
            .max()
            .map_or(self.current_time, |latest| latest.max(self.current_time))
    }

    pub fn address_change(&self, package_id: PackageIdx) -> Option<&AddressChange> {
        self.replay.address_changes.get(package_id.get())?.as_ref()
    }

    /// Moves the clock forward and returns the ids of the packages delivered on the way, in
    /// delivery order.
    pub fn advance_to(&mut self, time: Time) -> CourierResult<Vec<u32>> {
        if time < self.current_time {
            return Err(CourierError::InvalidTimeOrder {
                requested: time,
                current: self.current_time,
            });
        }

        let from = if self.has_advanced {
            Bound::Excluded(self.current_time)
        } else {
            Bound::Included(self.current_time)
        };
        let window = (from, Bound::Included(time));

        let mut deliveries = self
            .replay
            .timelines
            .iter()
            .flat_map(|timeline| timeline.deliveries_between(window))
            .collect::<Vec<_>>();
        deliveries.sort_by_key(|&(delivered_at, _)| delivered_at);

        for (index, change) in self.replay.address_changes.iter().enumerate() {
            if let Some(change) = change
                && window.contains(&change.effective_at)
            {
                info!(
                    package = self.problem.package(PackageIdx::new(index)).id(),
                    address = %change.address,
                    at = %change.effective_at,
                    "Address correction took effect"
                );
            }
        }

        self.current_time = time;
        self.has_advanced = true;

        Ok(deliveries
            .into_iter()
            .map(|(_, package_id)| self.problem.package(package_id).id())
            .collect())
    }

    /// Sends a package to a new address from `effective_at` on. The carrying truck keeps the
    /// legs it has already started and re-plans the rest.
    pub fn apply_address_correction(
        &mut self,
        package: u32,
        address: &str,
        effective_at: Time,
    ) -> CourierResult<()> {
        let package_id = self.problem.package_idx(package)?;
        let location = self.problem.resolve(address)?;
        let change = AddressChange {
            effective_at,
            location_id: location.id(),
            address: location.address().to_owned(),
        };

        if effective_at < self.current_time {
            return Err(CourierError::InvalidTimeOrder {
                requested: effective_at,
                current: self.current_time,
            });
        }

        self.replay.redirect(&self.problem, package_id, change)?;

        info!(package, address, at = %effective_at, "Address correction applied");

        Ok(())
    }

    fn package_state(&self, package_id: PackageIdx, time: Time) -> PackageState {
        let package = self.problem.package(package_id);
        let carrier = self.replay.carriers[package_id.get()];
        let timeline = carrier.map(|truck_id| &self.replay.timelines[truck_id.get()]);

        let delivered_at = timeline
            .and_then(|timeline| timeline.delivered_at(package_id))
            .filter(|&delivered_at| delivered_at <= time);

        let status = match timeline {
            _ if delivered_at.is_some() => PackageStatus::Delivered,
            Some(timeline) if timeline.has_departed(time) => PackageStatus::OnTruck,
            _ => PackageStatus::AtHub,
        };

        let address = match self.address_change(package_id) {
            Some(change) if change.effective_at <= time => change.address.clone(),
            _ => package.address().to_owned(),
        };

        PackageState {
            package: package.id(),
            status,
            delivered_at,
            truck: carrier.map(|truck_id| self.problem.truck(truck_id).external_id().to_owned()),
            address,
            deadline: package.deadline(),
        }
    }

    pub fn status_at(&self, package: u32, time: Time) -> CourierResult<PackageState> {
        let package_id = self.problem.package_idx(package)?;
        Ok(self.package_state(package_id, time))
    }

    pub fn total_mileage_at(&self, time: Time) -> Miles {
        self.replay
            .timelines
            .iter()
            .map(|timeline| timeline.odometer_at(time))
            .sum()
    }

    fn timeline_state(&self, timeline: &TruckTimeline, time: Time) -> TruckState {
        TruckState {
            truck: self
                .problem
                .truck(timeline.truck_id())
                .external_id()
                .to_owned(),
            position: timeline.position_at(time),
            odometer: timeline.odometer_at(time),
            departure_times: timeline
                .has_departed(time)
                .then(|| timeline.departure_time())
                .into_iter()
                .collect(),
            packages_aboard: timeline.packages_aboard_at(time),
        }
    }

    pub fn truck_state_at(&self, truck: &str, time: Time) -> CourierResult<TruckState> {
        let truck_id = self.problem.truck_idx(truck)?;
        Ok(self.timeline_state(&self.replay.timelines[truck_id.get()], time))
    }

    pub fn snapshot_at(&self, time: Time) -> FleetSnapshot {
        FleetSnapshot {
            time,
            trucks: self
                .replay.timelines
                .iter()
                .map(|timeline| self.timeline_state(timeline, time))
                .collect(),
            packages: (0..self.problem.num_packages())
                .map(|index| self.package_state(PackageIdx::new(index), time))
                .collect(),
            total_mileage: self.total_mileage_at(time),
        }
    }
}
