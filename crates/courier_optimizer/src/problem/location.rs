use serde::Serialize;

use crate::define_index_newtype;

define_index_newtype!(LocationIdx, Location);

/// A delivery address known to the distance table. `id` is also the row of the address in the
/// distance matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    id: LocationIdx,
    address: String,
}

impl Location {
    pub fn new(id: LocationIdx, address: &str) -> Self {
        Location {
            id,
            address: standardize_address(address),
        }
    }

    pub fn id(&self) -> LocationIdx {
        self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.id, self.address)
    }
}

fn expand_abbreviation(word: &str) -> Option<&'static str> {
    match word.trim_end_matches('.').to_ascii_lowercase().as_str() {
        "n" => Some("North"),
        "s" => Some("South"),
        "e" => Some("East"),
        "w" => Some("West"),
        "sta" => Some("Station"),
        _ => None,
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Normalizes an address so that different spellings of the same place compare equal:
/// whitespace is collapsed, cardinal directions and `Sta` are spelled out and every word is
/// title-cased. Applying it twice yields the same string.
pub fn standardize_address(address: &str) -> String {
    address
        .split_whitespace()
        .map(|word| match expand_abbreviation(word) {
            Some(expanded) => expanded.to_owned(),
            None => title_case(word),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardize_address() {
        assert_eq!(
            standardize_address("  4580 s 2300   E "),
            "4580 South 2300 East"
        );
        assert_eq!(
            standardize_address("600 E 900 South"),
            "600 East 900 South"
        );
        assert_eq!(
            standardize_address("2010 W 500 S"),
            "2010 West 500 South"
        );
        assert_eq!(
            standardize_address("3365 s 900 w"),
            "3365 South 900 West"
        );
        assert_eq!(
            standardize_address("1330 2100 S Sta"),
            "1330 2100 South Station"
        );
        assert_eq!(standardize_address("HUB"), "Hub");
    }

    #[test]
    fn test_standardize_address_is_idempotent() {
        let addresses = [
            "195 W Oakland Ave",
            "2530 S 500 E",
            "5383 South 900 East #104",
            "  410   S State St ",
        ];

        for address in addresses {
            let once = standardize_address(address);
            assert_eq!(standardize_address(&once), once);
        }
    }
}
