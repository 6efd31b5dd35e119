use std::{fmt, str::FromStr};

use jiff::civil::Time;
use serde::{Deserialize, Serialize};

use crate::error::CourierError;

/// Constraint annotation attached to a package, written as `BUNDLE[13, 15]`, `TRUCK[1, 2]`,
/// `DELAY[09:05:00]` or `INVALID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PackageNote {
    /// Must ride on the same truck as the listed packages.
    ShipWith(Vec<u32>),
    /// May only ride on one of the trucks with these external ids.
    Truck(Vec<String>),
    /// Not at the hub before this time.
    AvailableAt(Time),
    /// The recorded address is wrong until the scheduled correction takes effect.
    AddressPending,
}

fn split_arguments(note: &str) -> Option<(&str, &str)> {
    let (name, rest) = note.split_once('[')?;
    let arguments = rest.strip_suffix(']')?;
    Some((name.trim(), arguments.trim()))
}

impl FromStr for PackageNote {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let note = s.trim();
        let invalid = || CourierError::InvalidPackageNote(note.to_owned());

        if note.eq_ignore_ascii_case("INVALID") {
            return Ok(PackageNote::AddressPending);
        }

        let (name, arguments) = split_arguments(note).ok_or_else(invalid)?;
        if arguments.is_empty() {
            return Err(invalid());
        }

        match name.to_ascii_uppercase().as_str() {
            "BUNDLE" => arguments
                .split(',')
                .map(|id| id.trim().parse::<u32>().map_err(|_| invalid()))
                .collect::<Result<Vec<_>, _>>()
                .map(PackageNote::ShipWith),
            "TRUCK" => arguments
                .split(',')
                .map(|id| match id.trim() {
                    "" => Err(invalid()),
                    id => Ok(id.to_owned()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(PackageNote::Truck),
            "DELAY" => arguments
                .parse::<Time>()
                .map(PackageNote::AvailableAt)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for PackageNote {
    type Error = CourierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for PackageNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageNote::ShipWith(ids) => {
                let ids = ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "BUNDLE[{ids}]")
            }
            PackageNote::Truck(trucks) => write!(f, "TRUCK[{}]", trucks.join(", ")),
            PackageNote::AvailableAt(time) => write!(f, "DELAY[{time}]"),
            PackageNote::AddressPending => write!(f, "INVALID"),
        }
    }
}

impl From<PackageNote> for String {
    fn from(note: PackageNote) -> Self {
        note.to_string()
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::time;

    use super::*;

    #[test]
    fn test_parse_notes() {
        assert_eq!(
            "BUNDLE[13, 15]".parse::<PackageNote>().unwrap(),
            PackageNote::ShipWith(vec![13, 15])
        );
        assert_eq!(
            " truck[2] ".parse::<PackageNote>().unwrap(),
            PackageNote::Truck(vec![String::from("2")])
        );
        assert_eq!(
            "TRUCK[1, 2]".parse::<PackageNote>().unwrap(),
            PackageNote::Truck(vec![String::from("1"), String::from("2")])
        );
        assert_eq!(
            "DELAY[09:05:00]".parse::<PackageNote>().unwrap(),
            PackageNote::AvailableAt(time(9, 5, 0, 0))
        );
        assert_eq!(
            "INVALID".parse::<PackageNote>().unwrap(),
            PackageNote::AddressPending
        );
    }

    #[test]
    fn test_parse_invalid_notes() {
        for note in ["", "BUNDLE[]", "BUNDLE[a, 2]", "DELAY[soon]", "FRAGILE[1]", "TRUCK 2", "TRUCK[1,,2]"] {
            assert!(
                matches!(
                    note.parse::<PackageNote>(),
                    Err(CourierError::InvalidPackageNote(_))
                ),
                "{note} should be rejected"
            );
        }
    }

    #[test]
    fn test_serde_uses_text_form() {
        let notes: Vec<PackageNote> =
            serde_json::from_str(r#"["BUNDLE[1,2]", "DELAY[10:20]", "TRUCK[1,2]"]"#).unwrap();
        assert_eq!(
            notes,
            vec![
                PackageNote::ShipWith(vec![1, 2]),
                PackageNote::AvailableAt(time(10, 20, 0, 0)),
                PackageNote::Truck(vec![String::from("1"), String::from("2")])
            ]
        );

        let json = serde_json::to_string(&notes).unwrap();
        assert_eq!(json, r#"["BUNDLE[1, 2]","DELAY[10:20:00]","TRUCK[1, 2]"]"#);
    }
}
