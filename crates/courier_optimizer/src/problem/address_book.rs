use fxhash::FxHashMap;

use crate::{
    error::{CourierError, CourierResult},
    utils::enumerate_idx::EnumerateIdx,
};

use super::location::{Location, LocationIdx, standardize_address};

/// Resolves addresses to locations. Built once from the distance table rows and never mutated.
#[derive(Debug, Clone)]
pub struct AddressBook {
    locations: Vec<Location>,
    by_address: FxHashMap<String, LocationIdx>,
}

impl AddressBook {
    pub fn new<S: AsRef<str>>(addresses: &[S]) -> CourierResult<Self> {
        let locations = addresses
            .iter()
            .enumerate_idx()
            .map(|(id, address)| Location::new(id, address.as_ref()))
            .collect::<Vec<_>>();

        let mut by_address = FxHashMap::default();
        for location in &locations {
            if by_address
                .insert(location.address().to_owned(), location.id())
                .is_some()
            {
                return Err(CourierError::InvalidDistanceMatrix(format!(
                    "address '{}' appears more than once",
                    location.address()
                )));
            }
        }

        Ok(AddressBook {
            locations,
            by_address,
        })
    }

    /// Resolves a free-form address to its location after standardization.
    pub fn resolve(&self, address: &str) -> CourierResult<&Location> {
        let standardized = standardize_address(address);
        self.by_address
            .get(&standardized)
            .map(|&id| &self.locations[id])
            .ok_or(CourierError::UnknownLocation(standardized))
    }

    pub fn location(&self, id: LocationIdx) -> CourierResult<&Location> {
        self.locations
            .get(id.get())
            .ok_or_else(|| CourierError::UnknownLocation(format!("#{id}")))
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_format_insensitive() {
        let book = AddressBook::new(&["4001 South 700 East", "1060 Dalton Ave S"]).unwrap();

        let first = book.resolve("4001 s 700 e").unwrap();
        let second = book.resolve("4001  SOUTH 700 EAST").unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(first.id(), LocationIdx::new(0));

        assert_eq!(
            book.resolve("1060 dalton ave south").unwrap().id(),
            LocationIdx::new(1)
        );
    }

    #[test]
    fn test_resolve_unknown_address() {
        let book = AddressBook::new(&["4001 South 700 East"]).unwrap();
        assert!(matches!(
            book.resolve("177 W Price Ave"),
            Err(CourierError::UnknownLocation(address)) if address == "177 West Price Ave"
        ));
        assert!(book.location(LocationIdx::new(4)).is_err());
    }

    #[test]
    fn test_duplicate_addresses_are_rejected() {
        let result = AddressBook::new(&["300 State St", "300 state st"]);
        assert!(matches!(
            result,
            Err(CourierError::InvalidDistanceMatrix(_))
        ));
    }
}
