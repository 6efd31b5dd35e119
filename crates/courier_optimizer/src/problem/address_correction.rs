use jiff::civil::Time;
use serde::Serialize;

use super::{location::LocationIdx, package::PackageIdx};

/// The one scheduled change of destination of the day: from `effective_at` on, `package` must
/// be delivered to `location_id` instead.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AddressCorrection {
    pub(crate) package: PackageIdx,
    pub(crate) location_id: LocationIdx,
    pub(crate) address: String,
    pub(crate) effective_at: Time,
}

impl AddressCorrection {
    pub fn package(&self) -> PackageIdx {
        self.package
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn effective_at(&self) -> Time {
        self.effective_at
    }
}
