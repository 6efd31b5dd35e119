use jiff::civil::Time;
use serde::Serialize;

use crate::define_index_newtype;

use super::mph::Mph;

define_index_newtype!(TruckIdx, Truck);

pub const DEFAULT_TRUCK_CAPACITY: usize = 16;

/// One hub departure of a vehicle. A vehicle going out twice in a day appears as two trucks.
#[derive(Serialize, Debug, Clone)]
pub struct Truck {
    external_id: String,
    capacity: usize,
    speed: Mph,
    departure_time: Option<Time>,
}

impl Truck {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn speed(&self) -> Mph {
        self.speed
    }

    /// Configured departure, `None` meaning the start of the day.
    pub fn departure_time(&self) -> Option<Time> {
        self.departure_time
    }
}

#[derive(Clone)]
pub struct TruckBuilder {
    external_id: String,
    capacity: Option<usize>,
    speed: Option<Mph>,
    departure_time: Option<Time>,
}

impl TruckBuilder {
    pub fn new(external_id: impl Into<String>) -> Self {
        TruckBuilder {
            external_id: external_id.into(),
            capacity: None,
            speed: None,
            departure_time: None,
        }
    }

    pub fn set_capacity(&mut self, capacity: usize) -> &mut TruckBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_speed(&mut self, speed: Mph) -> &mut TruckBuilder {
        self.speed = Some(speed);
        self
    }

    pub fn set_departure_time(&mut self, departure_time: Time) -> &mut TruckBuilder {
        self.departure_time = Some(departure_time);
        self
    }

    pub fn build(self) -> Truck {
        Truck {
            external_id: self.external_id,
            capacity: self.capacity.unwrap_or(DEFAULT_TRUCK_CAPACITY),
            speed: self.speed.unwrap_or_default(),
            departure_time: self.departure_time,
        }
    }
}
