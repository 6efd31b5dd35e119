use rand::seq::IteratorRandom;

use crate::solver::solution::population::EvaluatedChromosome;

use super::select_chromosome::SelectChromosome;

/// Samples `size` distinct individuals uniformly and keeps the fittest.
pub struct TournamentSelector {
    size: usize,
}

impl TournamentSelector {
    pub fn new(size: usize) -> Self {
        TournamentSelector { size: size.max(1) }
    }
}

impl SelectChromosome for TournamentSelector {
    fn select_chromosome<'r>(
        &self,
        individuals: &'r [EvaluatedChromosome],
        rng: &mut impl rand::Rng,
    ) -> Option<&'r EvaluatedChromosome> {
        if individuals.len() <= 1 {
            return individuals.first();
        }

        individuals
            .iter()
            .choose_multiple(rng, self.size)
            .into_iter()
            .min_by_key(|individual| individual.fitness)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use crate::solver::{score::Score, solution::chromosome::Chromosome};

    use super::*;

    fn individuals(fitnesses: &[f64]) -> Vec<EvaluatedChromosome> {
        fitnesses
            .iter()
            .map(|&fitness| EvaluatedChromosome {
                chromosome: Chromosome::empty(1),
                fitness: Score::soft(fitness),
            })
            .collect()
    }

    #[test]
    fn test_full_tournament_picks_best() {
        let individuals = individuals(&[4.0, 1.0, 3.0, 2.0]);
        let selector = TournamentSelector::new(4);
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..10 {
            let selected = selector.select_chromosome(&individuals, &mut rng);
            assert_eq!(selected.map(|s| s.fitness), Some(Score::soft(1.0)));
        }
    }

    #[test]
    fn test_tournament_never_picks_worst() {
        let individuals = individuals(&[4.0, 1.0, 3.0, 2.0]);
        let selector = TournamentSelector::new(2);
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..50 {
            let selected = selector.select_chromosome(&individuals, &mut rng);
            assert!(selected.is_some_and(|s| s.fitness < Score::soft(4.0)));
        }
    }

    #[test]
    fn test_empty_and_single() {
        let selector = TournamentSelector::new(3);
        let mut rng = SmallRng::seed_from_u64(7);

        assert!(selector.select_chromosome(&[], &mut rng).is_none());
        let single = individuals(&[9.0]);
        assert!(selector.select_chromosome(&single, &mut rng).is_some());
    }
}
