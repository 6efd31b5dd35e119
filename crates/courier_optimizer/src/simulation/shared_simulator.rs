use std::sync::Arc;

use jiff::civil::Time;
use parking_lot::{RwLock, RwLockReadGuard};

use crate::{error::CourierResult, problem::miles::Miles};

use super::delivery_simulator::{DeliverySimulator, FleetSnapshot, PackageState, TruckState};

/// A simulator shared between threads. Clock moves and corrections take the write lock, queries
/// take the read lock.
#[derive(Clone)]
pub struct SharedSimulator {
    inner: Arc<RwLock<DeliverySimulator>>,
}

impl SharedSimulator {
    pub fn new(simulator: DeliverySimulator) -> Self {
        SharedSimulator {
            inner: Arc::new(RwLock::new(simulator)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, DeliverySimulator> {
        self.inner.read()
    }

    pub fn current_time(&self) -> Time {
        self.inner.read().current_time()
    }

    pub fn advance_to(&self, time: Time) -> CourierResult<Vec<u32>> {
        self.inner.write().advance_to(time)
    }

    pub fn apply_address_correction(
        &self,
        package: u32,
        address: &str,
        effective_at: Time,
    ) -> CourierResult<()> {
        self.inner
            .write()
            .apply_address_correction(package, address, effective_at)
    }

    pub fn status_at(&self, package: u32, time: Time) -> CourierResult<PackageState> {
        self.inner.read().status_at(package, time)
    }

    pub fn total_mileage_at(&self, time: Time) -> Miles {
        self.inner.read().total_mileage_at(time)
    }

    pub fn truck_state_at(&self, truck: &str, time: Time) -> CourierResult<TruckState> {
        self.inner.read().truck_state_at(truck, time)
    }

    pub fn snapshot_at(&self, time: Time) -> FleetSnapshot {
        self.inner.read().snapshot_at(time)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::package::PackageStatus, scheduler::priority_scheduler::schedule, test_utils,
    };

    use super::*;

    #[test]
    fn test_readers_and_writer() {
        let problem = Arc::new(test_utils::create_spread_problem(
            10,
            20,
            vec![test_utils::truck("1", 16), test_utils::truck("2", 16)],
        ));
        let chromosome = schedule(&problem).unwrap();
        let simulator = SharedSimulator::new(
            DeliverySimulator::from_chromosome(problem.clone(), &chromosome).unwrap(),
        );
        let end_of_day = simulator.read().end_of_day();
        let start_time = problem.start_time();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let reader = simulator.clone();
                scope.spawn(move || {
                    for id in 1..=20 {
                        let state = reader.status_at(id, end_of_day).unwrap();
                        assert_eq!(state.status, PackageStatus::Delivered);
                    }
                });
            }

            let writer = simulator.clone();
            scope.spawn(move || {
                writer.advance_to(start_time).unwrap();
                writer.advance_to(end_of_day).unwrap();
            });
        });

        assert_eq!(simulator.current_time(), end_of_day);
        assert_eq!(
            simulator.total_mileage_at(end_of_day),
            simulator.read().recorded_distance()
        );
    }
}
