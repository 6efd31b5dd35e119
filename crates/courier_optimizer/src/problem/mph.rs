use serde::{Deserialize, Serialize};

/// Average speed in miles per hour.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Mph(f64);

impl Mph {
    pub fn new(value: f64) -> Self {
        Mph(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Mph {
    fn default() -> Self {
        Mph(18.0)
    }
}
