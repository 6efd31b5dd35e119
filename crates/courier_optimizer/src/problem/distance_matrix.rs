use std::sync::Arc;

use crate::error::{CourierError, CourierResult};

use super::{location::LocationIdx, miles::Miles};

/// Symmetric road distances between every pair of locations, stored flat so that the entry
/// for a pair lives at `from * num_locations + to`.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    distances: Arc<Vec<f64>>,
    num_locations: usize,
}

impl DistanceMatrix {
    /// Builds the matrix from table rows. Row `i` either holds all `n` distances or only the
    /// lower triangle up to and including the diagonal (`i + 1` values), in which case it is
    /// mirrored.
    pub fn new(rows: Vec<Vec<f64>>) -> CourierResult<Self> {
        let num_locations = rows.len();
        if num_locations == 0 {
            return Err(CourierError::InvalidDistanceMatrix(
                "the table has no rows".to_owned(),
            ));
        }

        let mut distances = vec![f64::NAN; num_locations * num_locations];

        for (i, row) in rows.iter().enumerate() {
            let lower_triangular = row.len() == i + 1 && row.len() != num_locations;
            if row.len() != num_locations && !lower_triangular {
                return Err(CourierError::InvalidDistanceMatrix(format!(
                    "row {i} has {} values, expected {num_locations} or {}",
                    row.len(),
                    i + 1
                )));
            }

            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(CourierError::InvalidDistanceMatrix(format!(
                        "distance ({i}, {j}) must be a non-negative number, got {value}"
                    )));
                }

                distances[i * num_locations + j] = value;
                if lower_triangular {
                    distances[j * num_locations + i] = value;
                }
            }
        }

        for i in 0..num_locations {
            if distances[i * num_locations + i] != 0.0 {
                return Err(CourierError::InvalidDistanceMatrix(format!(
                    "distance ({i}, {i}) must be zero"
                )));
            }

            for j in (i + 1)..num_locations {
                let forward = distances[i * num_locations + j];
                let backward = distances[j * num_locations + i];

                if forward.is_nan() || backward.is_nan() {
                    return Err(CourierError::InvalidDistanceMatrix(format!(
                        "distance ({i}, {j}) is missing"
                    )));
                }

                if forward != backward {
                    return Err(CourierError::InvalidDistanceMatrix(format!(
                        "distance ({i}, {j}) is {forward} but ({j}, {i}) is {backward}"
                    )));
                }
            }
        }

        Ok(DistanceMatrix {
            distances: Arc::new(distances),
            num_locations,
        })
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }

    #[inline(always)]
    fn index(&self, from: LocationIdx, to: LocationIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    /// Unchecked lookup used on hot paths once locations come from the problem itself.
    #[inline(always)]
    pub fn travel_distance(&self, from: LocationIdx, to: LocationIdx) -> Miles {
        Miles::new(self.distances[self.index(from, to)])
    }

    pub fn distance(&self, from: LocationIdx, to: LocationIdx) -> CourierResult<Miles> {
        for location in [from, to] {
            if location.get() >= self.num_locations {
                return Err(CourierError::UnknownLocation(format!("#{location}")));
            }
        }

        Ok(self.travel_distance(from, to))
    }
}
