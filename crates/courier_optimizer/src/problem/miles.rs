use std::{
    iter::Sum,
    ops::{Add, AddAssign, Div, Mul, Sub, SubAssign},
};

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::problem::mph::Mph;

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Miles(f64);

impl Miles {
    pub const ZERO: Miles = Miles(0.0);

    pub fn new(value: f64) -> Self {
        Miles(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Rounded to hundredths of a mile, which is how distances are reported.
    pub fn round(&self) -> Miles {
        Miles((self.0 * 100.0).round() / 100.0)
    }
}

impl Eq for Miles {}

impl PartialOrd for Miles {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Miles {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::fmt::Display for Miles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} mi", self.0)
    }
}

impl From<f64> for Miles {
    fn from(value: f64) -> Self {
        Miles::new(value)
    }
}

impl Add for Miles {
    type Output = Miles;

    fn add(self, other: Miles) -> Miles {
        Miles(self.0 + other.0)
    }
}

impl AddAssign for Miles {
    fn add_assign(&mut self, other: Miles) {
        self.0 += other.0;
    }
}

impl Sub for Miles {
    type Output = Miles;

    fn sub(self, other: Miles) -> Miles {
        Miles(self.0 - other.0)
    }
}

impl SubAssign for Miles {
    fn sub_assign(&mut self, other: Miles) {
        self.0 -= other.0;
    }
}

impl Mul<f64> for Miles {
    type Output = Miles;

    fn mul(self, scalar: f64) -> Miles {
        Miles(self.0 * scalar)
    }
}

/// Driving time for a distance at a constant speed.
impl Div<Mph> for Miles {
    type Output = SignedDuration;

    fn div(self, speed: Mph) -> SignedDuration {
        let seconds = self.0 * 3600.0 / speed.value();
        SignedDuration::from_secs_f64(seconds)
    }
}

impl Div<Miles> for Miles {
    type Output = f64;

    fn div(self, other: Miles) -> f64 {
        self.0 / other.0
    }
}

impl Sum for Miles {
    fn sum<I: Iterator<Item = Miles>>(iter: I) -> Miles {
        iter.fold(Miles::ZERO, |acc, x| acc + x)
    }
}
