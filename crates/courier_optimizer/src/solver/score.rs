use std::{
    cmp::Ordering,
    fmt, iter,
    ops::{Add, AddAssign, Div, Mul, Sub},
};

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Fitness of a chromosome, lower is better. Any hard score means a violated hard
/// constraint, the soft score weighs distance against lateness.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub hard_score: f64,
    pub soft_score: f64,
}

impl Score {
    pub const MAX: Score = Score {
        hard_score: f64::MAX,
        soft_score: f64::MAX,
    };

    pub const ZERO: Score = Score {
        hard_score: 0.0,
        soft_score: 0.0,
    };

    pub fn new(hard_score: f64, soft_score: f64) -> Self {
        Score {
            hard_score,
            soft_score,
        }
    }

    pub fn hard(hard_score: f64) -> Self {
        Score {
            hard_score,
            soft_score: 0.0,
        }
    }

    pub fn soft(soft_score: f64) -> Self {
        Score {
            hard_score: 0.0,
            soft_score,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.hard_score > 0.0
    }
}

impl Eq for Score {}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hard_score
            .total_cmp(&other.hard_score)
            .then_with(|| self.soft_score.total_cmp(&other.soft_score))
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}hard/{:.2}soft", self.hard_score, self.soft_score)
    }
}

impl iter::Sum for Score {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Score::ZERO, |acc, score| acc + score)
    }
}

impl Add<Score> for Score {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Score {
            hard_score: self.hard_score + other.hard_score,
            soft_score: self.soft_score + other.soft_score,
        }
    }
}

impl AddAssign<Score> for Score {
    fn add_assign(&mut self, other: Score) {
        self.hard_score += other.hard_score;
        self.soft_score += other.soft_score;
    }
}

impl Sub<Score> for Score {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Score {
            hard_score: self.hard_score - other.hard_score,
            soft_score: self.soft_score - other.soft_score,
        }
    }
}

impl Mul<f64> for Score {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Score {
            hard_score: self.hard_score * scalar,
            soft_score: self.soft_score * scalar,
        }
    }
}

impl Div<f64> for Score {
    type Output = Self;

    fn div(self, divisor: f64) -> Self::Output {
        Score {
            hard_score: self.hard_score / divisor,
            soft_score: self.soft_score / divisor,
        }
    }
}

/// Breakdown of a fitness into its named components.
#[derive(Default, Clone, Debug, Serialize)]
pub struct FitnessAnalysis {
    pub scores: FxHashMap<&'static str, Score>,
    pub total_miles: f64,
    pub late_minutes: f64,
    pub late_packages: usize,
    pub violations: usize,
}

impl FitnessAnalysis {
    pub fn total_score(&self) -> Score {
        self.scores.values().copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_addition() {
        let result = Score::hard(10.0) + Score::soft(5.0);
        assert_eq!(result.hard_score, 10.0);
        assert_eq!(result.soft_score, 5.0);
    }

    #[test]
    fn test_score_sum() {
        let scores = vec![Score::hard(10.0), Score::soft(5.0), Score::hard(-3.0)];
        let total: Score = scores.into_iter().sum();
        assert_eq!(total, Score::new(7.0, 5.0));
    }

    #[test]
    fn test_score_cmp() {
        let violated = Score::new(1_000_000.0, 10.0);
        let long = Score::soft(150.0);
        let short = Score::soft(80.5);

        assert!(short < long);
        assert!(long < violated);
        assert!(Score::new(0.0, 1e9) < Score::new(1.0, 0.0));
        assert_eq!(
            [violated, long, short].iter().min(),
            Some(&short)
        );
        assert!(violated.is_failure());
        assert!(!long.is_failure());
    }
}
