use jiff::civil::Time;
use serde::Serialize;

use crate::define_index_newtype;

use super::{package::PackageIdx, truck::TruckIdx};

define_index_newtype!(UnitIdx, LoadUnit);

/// Packages that must ride the same truck, merged over their `BUNDLE` notes. A package
/// without companions is a unit of one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadUnit {
    pub(crate) packages: Vec<PackageIdx>,
    /// Trucks allowed by every member's `TRUCK` notes, sorted. `None` when no member has one.
    pub(crate) allowed_trucks: Option<Vec<TruckIdx>>,
    pub(crate) available_at: Option<Time>,
    pub(crate) earliest_deadline: Option<Time>,
}

impl LoadUnit {
    pub fn packages(&self) -> &[PackageIdx] {
        &self.packages
    }

    pub fn size(&self) -> usize {
        self.packages.len()
    }

    pub fn allowed_trucks(&self) -> Option<&[TruckIdx]> {
        self.allowed_trucks.as_deref()
    }

    /// The only truck the unit may ride.
    pub fn pinned_truck(&self) -> Option<TruckIdx> {
        match self.allowed_trucks() {
            Some([truck]) => Some(*truck),
            _ => None,
        }
    }

    pub fn allows(&self, truck_id: TruckIdx) -> bool {
        self.allowed_trucks()
            .is_none_or(|trucks| trucks.binary_search(&truck_id).is_ok())
    }

    /// The members' `TRUCK` notes share no truck.
    pub fn has_conflicting_pins(&self) -> bool {
        self.allowed_trucks().is_some_and(|trucks| trucks.is_empty())
    }

    /// Latest time any member reaches the hub.
    pub fn available_at(&self) -> Option<Time> {
        self.available_at
    }

    pub fn earliest_deadline(&self) -> Option<Time> {
        self.earliest_deadline
    }
}
