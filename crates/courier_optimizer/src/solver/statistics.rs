use jiff::SignedDuration;
use serde::Serialize;

use super::score::Score;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationStatistics {
    pub generation: usize,
    /// Best fitness found so far, never increases.
    pub best: Score,
    pub mean: Score,
    pub worst: Score,
    pub improved: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchStatistics {
    generations: Vec<GenerationStatistics>,
    duration: Option<SignedDuration>,
}

impl SearchStatistics {
    pub fn add_generation(&mut self, statistics: GenerationStatistics) {
        self.generations.push(statistics);
    }

    pub fn generations(&self) -> &[GenerationStatistics] {
        &self.generations
    }

    pub fn last(&self) -> Option<&GenerationStatistics> {
        self.generations.last()
    }

    pub fn set_duration(&mut self, duration: SignedDuration) {
        self.duration = Some(duration);
    }

    pub fn duration(&self) -> Option<SignedDuration> {
        self.duration
    }

    pub fn clear(&mut self) {
        self.generations.clear();
        self.duration = None;
    }
}
