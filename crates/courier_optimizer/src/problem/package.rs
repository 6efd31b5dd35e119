use std::fmt;

use jiff::civil::Time;
use serde::{Deserialize, Serialize};

use crate::{define_index_newtype, error::CourierResult};

use super::{address_book::AddressBook, location::LocationIdx, package_note::PackageNote};

define_index_newtype!(PackageIdx, Package);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageStatus {
    AtHub,
    OnTruck,
    Delivered,
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageStatus::AtHub => write!(f, "At hub"),
            PackageStatus::OnTruck => write!(f, "En route"),
            PackageStatus::Delivered => write!(f, "Delivered"),
        }
    }
}

/// A package as loaded from the package list. Runtime status lives in the simulator, the
/// destination recorded here is the one known before any correction.
#[derive(Serialize, Debug, Clone)]
pub struct Package {
    id: u32,
    location_id: LocationIdx,
    address: String,
    deadline: Option<Time>,
    weight: f64,
    notes: Vec<PackageNote>,
}

impl Package {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn deadline(&self) -> Option<Time> {
        self.deadline
    }

    pub fn has_deadline(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn notes(&self) -> &[PackageNote] {
        &self.notes
    }

    /// Truck ids of every `TRUCK` note. A package with several notes may only ride a truck
    /// named by all of them.
    pub fn truck_restrictions(&self) -> impl Iterator<Item = &[String]> + '_ {
        self.notes.iter().filter_map(|note| match note {
            PackageNote::Truck(trucks) => Some(trucks.as_slice()),
            _ => None,
        })
    }

    pub fn ship_with(&self) -> impl Iterator<Item = u32> + '_ {
        self.notes
            .iter()
            .filter_map(|note| match note {
                PackageNote::ShipWith(ids) => Some(ids.iter().copied()),
                _ => None,
            })
            .flatten()
    }

    /// Latest of the `DELAY` notes, if any.
    pub fn available_at(&self) -> Option<Time> {
        self.notes
            .iter()
            .filter_map(|note| match note {
                PackageNote::AvailableAt(time) => Some(*time),
                _ => None,
            })
            .max()
    }

    pub fn is_address_pending(&self) -> bool {
        self.notes.contains(&PackageNote::AddressPending)
    }
}

#[derive(Clone)]
pub struct PackageBuilder {
    id: u32,
    address: String,
    deadline: Option<Time>,
    weight: Option<f64>,
    notes: Vec<PackageNote>,
}

impl PackageBuilder {
    pub fn new(id: u32, address: impl Into<String>) -> Self {
        PackageBuilder {
            id,
            address: address.into(),
            deadline: None,
            weight: None,
            notes: Vec::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn set_deadline(&mut self, deadline: Time) -> &mut PackageBuilder {
        self.deadline = Some(deadline);
        self
    }

    pub fn set_weight(&mut self, weight: f64) -> &mut PackageBuilder {
        self.weight = Some(weight);
        self
    }

    pub fn add_note(&mut self, note: PackageNote) -> &mut PackageBuilder {
        self.notes.push(note);
        self
    }

    pub fn set_notes(&mut self, notes: Vec<PackageNote>) -> &mut PackageBuilder {
        self.notes = notes;
        self
    }

    /// Resolves the destination against the address book.
    pub fn build(self, address_book: &AddressBook) -> CourierResult<Package> {
        let location = address_book.resolve(&self.address)?;

        Ok(Package {
            id: self.id,
            location_id: location.id(),
            address: location.address().to_owned(),
            deadline: self.deadline,
            weight: self.weight.unwrap_or(0.0),
            notes: self.notes,
        })
    }
}
