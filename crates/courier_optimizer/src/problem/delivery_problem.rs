use fxhash::FxHashMap;
use jiff::civil::{Time, time};
use tracing::debug;

use crate::{
    error::{CourierError, CourierResult, InfeasibilityReason},
    utils::{disjoint_set::DisjointSet, enumerate_idx::EnumerateIdx},
};

use super::{
    address_book::AddressBook,
    address_correction::AddressCorrection,
    distance_matrix::DistanceMatrix,
    load_unit::{LoadUnit, UnitIdx},
    location::{Location, LocationIdx},
    miles::Miles,
    package::{Package, PackageBuilder, PackageIdx},
    truck::{Truck, TruckBuilder, TruckIdx},
};

pub const DEFAULT_START_TIME: Time = time(8, 0, 0, 0);

/// Everything known about the day before the first truck leaves. Immutable once built, runtime
/// state belongs to the simulator.
pub struct DeliveryProblem {
    address_book: AddressBook,
    distances: DistanceMatrix,
    hub: LocationIdx,
    start_time: Time,
    packages: Vec<Package>,
    trucks: Vec<Truck>,
    address_correction: Option<AddressCorrection>,
    package_index: FxHashMap<u32, PackageIdx>,

    units: Vec<LoadUnit>,
    package_units: Vec<UnitIdx>,
    precomputed_available_at: Vec<Option<Time>>,
    precomputed_unit_compatibilities: Vec<bool>,
}

impl DeliveryProblem {
    pub fn address_book(&self) -> &AddressBook {
        &self.address_book
    }

    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    pub fn hub(&self) -> LocationIdx {
        self.hub
    }

    pub fn start_time(&self) -> Time {
        self.start_time
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package(&self, package_id: PackageIdx) -> &Package {
        &self.packages[package_id]
    }

    pub fn num_packages(&self) -> usize {
        self.packages.len()
    }

    pub fn trucks(&self) -> &[Truck] {
        &self.trucks
    }

    pub fn truck(&self, truck_id: TruckIdx) -> &Truck {
        &self.trucks[truck_id]
    }

    pub fn num_trucks(&self) -> usize {
        self.trucks.len()
    }

    pub fn address_correction(&self) -> Option<&AddressCorrection> {
        self.address_correction.as_ref()
    }

    pub fn units(&self) -> &[LoadUnit] {
        &self.units
    }

    pub fn unit(&self, unit_id: UnitIdx) -> &LoadUnit {
        &self.units[unit_id]
    }

    pub fn unit_of(&self, package_id: PackageIdx) -> UnitIdx {
        self.package_units[package_id.get()]
    }

    /// Resolves an external package id.
    pub fn package_idx(&self, id: u32) -> CourierResult<PackageIdx> {
        self.package_index
            .get(&id)
            .copied()
            .ok_or(CourierError::UnknownPackage(id))
    }

    /// Resolves an external truck id.
    pub fn truck_idx(&self, external_id: &str) -> CourierResult<TruckIdx> {
        self.trucks
            .iter()
            .position(|truck| truck.external_id() == external_id)
            .map(TruckIdx::new)
            .ok_or_else(|| CourierError::UnknownTruck(external_id.to_owned()))
    }

    pub fn resolve(&self, address: &str) -> CourierResult<&Location> {
        self.address_book.resolve(address)
    }

    pub fn distance(&self, from: LocationIdx, to: LocationIdx) -> CourierResult<Miles> {
        self.distances.distance(from, to)
    }

    #[inline(always)]
    pub fn travel_distance(&self, from: LocationIdx, to: LocationIdx) -> Miles {
        self.distances.travel_distance(from, to)
    }

    pub fn departure_time(&self, truck_id: TruckIdx) -> Time {
        self.trucks[truck_id]
            .departure_time()
            .unwrap_or(self.start_time)
    }

    /// When the package is at the hub and ready to be loaded: the latest of its `DELAY` notes
    /// and, for a package waiting on its address, the correction time.
    pub fn available_at(&self, package_id: PackageIdx) -> Option<Time> {
        self.precomputed_available_at[package_id.get()]
    }

    /// Destination used when planning. A package held for its address correction is planned
    /// straight to the corrected address.
    pub fn planned_location(&self, package_id: PackageIdx) -> LocationIdx {
        match &self.address_correction {
            Some(correction)
                if correction.package == package_id
                    && self.packages[package_id].is_address_pending() =>
            {
                correction.location_id
            }
            _ => self.packages[package_id].location_id(),
        }
    }

    pub fn is_unit_compatible(&self, unit_id: UnitIdx, truck_id: TruckIdx) -> bool {
        self.precomputed_unit_compatibilities[unit_id.get() * self.trucks.len() + truck_id.get()]
    }

    pub fn is_package_compatible(&self, package_id: PackageIdx, truck_id: TruckIdx) -> bool {
        self.is_unit_compatible(self.unit_of(package_id), truck_id)
    }

    pub fn compatible_trucks(&self, unit_id: UnitIdx) -> impl Iterator<Item = TruckIdx> + '_ {
        (0..self.trucks.len())
            .map(TruckIdx::new)
            .filter(move |&truck_id| self.is_unit_compatible(unit_id, truck_id))
    }

    fn precompute_available_at(
        packages: &[Package],
        address_correction: Option<&AddressCorrection>,
    ) -> CourierResult<Vec<Option<Time>>> {
        packages
            .iter()
            .enumerate_idx()
            .map(|(package_id, package): (PackageIdx, _)| {
                let delay = package.available_at();
                if !package.is_address_pending() {
                    return Ok(delay);
                }

                match address_correction {
                    Some(correction) if correction.package == package_id => {
                        Ok(delay.max(Some(correction.effective_at)))
                    }
                    _ => Err(InfeasibilityReason::MissingAddressCorrection {
                        package: package.id(),
                    }
                    .into()),
                }
            })
            .collect()
    }

    /// Sorted indices of the trucks named by one `TRUCK` note.
    fn resolve_trucks(
        trucks: &[Truck],
        package: &Package,
        external_ids: &[String],
    ) -> Result<Vec<TruckIdx>, InfeasibilityReason> {
        let mut truck_ids = external_ids
            .iter()
            .map(|external_id| {
                trucks
                    .iter()
                    .position(|truck| truck.external_id() == external_id.as_str())
                    .map(TruckIdx::new)
                    .ok_or_else(|| InfeasibilityReason::UnknownPinnedTruck {
                        package: package.id(),
                        truck: external_id.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        truck_ids.sort_unstable();
        truck_ids.dedup();
        Ok(truck_ids)
    }

    fn precompute_units(
        packages: &[Package],
        package_index: &FxHashMap<u32, PackageIdx>,
        trucks: &[Truck],
        available_at: &[Option<Time>],
    ) -> CourierResult<(Vec<LoadUnit>, Vec<UnitIdx>)> {
        let mut disjoint_set = DisjointSet::new(packages.len());

        for (index, package) in packages.iter().enumerate() {
            for companion in package.ship_with() {
                let companion_index = package_index
                    .get(&companion)
                    .ok_or(CourierError::UnknownPackage(companion))?;
                disjoint_set.union(index, companion_index.get());
            }
        }

        let mut package_units = vec![UnitIdx::default(); packages.len()];
        let mut units = Vec::with_capacity(disjoint_set.num_components());

        for (index, members) in disjoint_set.components().into_iter().enumerate() {
            let unit_id = UnitIdx::new(index);
            let mut allowed_trucks: Option<Vec<TruckIdx>> = None;
            for &member in &members {
                let package = &packages[member];
                for restriction in package.truck_restrictions() {
                    let truck_ids = DeliveryProblem::resolve_trucks(trucks, package, restriction)?;
                    allowed_trucks = Some(match allowed_trucks {
                        Some(allowed) => allowed
                            .into_iter()
                            .filter(|truck_id| truck_ids.binary_search(truck_id).is_ok())
                            .collect(),
                        None => truck_ids,
                    });
                }
                package_units[member] = unit_id;
            }

            units.push(LoadUnit {
                available_at: members.iter().filter_map(|&member| available_at[member]).max(),
                earliest_deadline: members
                    .iter()
                    .filter_map(|&member| packages[member].deadline())
                    .min(),
                packages: members.into_iter().map(PackageIdx::new).collect(),
                allowed_trucks,
            });
        }

        Ok((units, package_units))
    }

    fn precompute_unit_compatibilities(
        units: &[LoadUnit],
        trucks: &[Truck],
        start_time: Time,
    ) -> Vec<bool> {
        let mut compatibilities = vec![false; units.len() * trucks.len()];

        for (unit_index, unit) in units.iter().enumerate() {
            for (index, truck) in trucks.iter().enumerate() {
                let truck_index = TruckIdx::new(index);
                let departure = truck.departure_time().unwrap_or(start_time);
                let pinned_ok = unit.allows(truck_index);
                let available_ok = unit
                    .available_at
                    .is_none_or(|available_at| departure >= available_at);

                compatibilities[unit_index * trucks.len() + truck_index.get()] =
                    pinned_ok && available_ok;
            }
        }

        compatibilities
    }
}

#[derive(Default)]
pub struct DeliveryProblemBuilder {
    addresses: Option<Vec<String>>,
    distances: Option<DistanceMatrix>,
    hub: Option<String>,
    start_time: Option<Time>,
    packages: Vec<PackageBuilder>,
    trucks: Vec<TruckBuilder>,
    address_correction: Option<(u32, String, Time)>,
}

impl DeliveryProblemBuilder {
    pub fn set_addresses(&mut self, addresses: Vec<String>) -> &mut DeliveryProblemBuilder {
        self.addresses = Some(addresses);
        self
    }

    pub fn set_distance_matrix(&mut self, distances: DistanceMatrix) -> &mut DeliveryProblemBuilder {
        self.distances = Some(distances);
        self
    }

    /// Hub address, defaults to the first address of the table.
    pub fn set_hub(&mut self, hub: impl Into<String>) -> &mut DeliveryProblemBuilder {
        self.hub = Some(hub.into());
        self
    }

    pub fn set_start_time(&mut self, start_time: Time) -> &mut DeliveryProblemBuilder {
        self.start_time = Some(start_time);
        self
    }

    pub fn add_package(&mut self, package: PackageBuilder) -> &mut DeliveryProblemBuilder {
        self.packages.push(package);
        self
    }

    pub fn set_packages(&mut self, packages: Vec<PackageBuilder>) -> &mut DeliveryProblemBuilder {
        self.packages = packages;
        self
    }

    pub fn add_truck(&mut self, truck: TruckBuilder) -> &mut DeliveryProblemBuilder {
        self.trucks.push(truck);
        self
    }

    pub fn set_trucks(&mut self, trucks: Vec<TruckBuilder>) -> &mut DeliveryProblemBuilder {
        self.trucks = trucks;
        self
    }

    pub fn set_address_correction(
        &mut self,
        package: u32,
        address: impl Into<String>,
        effective_at: Time,
    ) -> &mut DeliveryProblemBuilder {
        self.address_correction = Some((package, address.into(), effective_at));
        self
    }

    pub fn build(self) -> CourierResult<DeliveryProblem> {
        let addresses = self.addresses.ok_or_else(|| {
            CourierError::InvalidDistanceMatrix("no addresses were provided".to_owned())
        })?;
        let distances = self.distances.ok_or_else(|| {
            CourierError::InvalidDistanceMatrix("no distances were provided".to_owned())
        })?;

        if addresses.len() != distances.num_locations() {
            return Err(CourierError::InvalidDistanceMatrix(format!(
                "{} addresses for a {n}x{n} table",
                addresses.len(),
                n = distances.num_locations()
            )));
        }

        let address_book = AddressBook::new(&addresses)?;
        let hub = match &self.hub {
            Some(hub) => address_book.resolve(hub)?.id(),
            None => LocationIdx::new(0),
        };
        let start_time = self.start_time.unwrap_or(DEFAULT_START_TIME);

        let packages = self
            .packages
            .into_iter()
            .map(|package| package.build(&address_book))
            .collect::<CourierResult<Vec<_>>>()?;

        let mut package_index: FxHashMap<u32, PackageIdx> = FxHashMap::default();
        for (package_id, package) in packages.iter().enumerate_idx() {
            if package_index.insert(package.id(), package_id).is_some() {
                return Err(CourierError::InvalidParams(format!(
                    "package id {} is used more than once",
                    package.id()
                )));
            }
        }

        let trucks = self
            .trucks
            .into_iter()
            .map(TruckBuilder::build)
            .collect::<Vec<_>>();

        for (index, truck) in trucks.iter().enumerate() {
            let speed = truck.speed().value();
            if !speed.is_finite() || speed <= 0.0 {
                return Err(CourierError::InvalidParams(format!(
                    "truck {} has speed {speed}, it must be a positive number of miles per hour",
                    truck.external_id()
                )));
            }

            if trucks[..index]
                .iter()
                .any(|other| other.external_id() == truck.external_id())
            {
                return Err(CourierError::InvalidParams(format!(
                    "truck id {} is used more than once",
                    truck.external_id()
                )));
            }
        }

        let address_correction = match self.address_correction {
            Some((package, address, effective_at)) => {
                let package_id = *package_index
                    .get(&package)
                    .ok_or(CourierError::UnknownPackage(package))?;
                let location = address_book.resolve(&address)?;

                Some(AddressCorrection {
                    package: package_id,
                    location_id: location.id(),
                    address: location.address().to_owned(),
                    effective_at,
                })
            }
            None => None,
        };

        let precomputed_available_at =
            DeliveryProblem::precompute_available_at(&packages, address_correction.as_ref())?;

        let (units, package_units) = DeliveryProblem::precompute_units(
            &packages,
            &package_index,
            &trucks,
            &precomputed_available_at,
        )?;

        let precomputed_unit_compatibilities =
            DeliveryProblem::precompute_unit_compatibilities(&units, &trucks, start_time);

        debug!(
            packages = packages.len(),
            trucks = trucks.len(),
            units = units.len(),
            "Built delivery problem"
        );

        Ok(DeliveryProblem {
            address_book,
            distances,
            hub,
            start_time,
            packages,
            trucks,
            address_correction,
            package_index,
            units,
            package_units,
            precomputed_available_at,
            precomputed_unit_compatibilities,
        })
    }
}
