use crate::{
    selector::select_chromosome::SelectChromosome,
    solver::score::Score,
};

use super::chromosome::Chromosome;

#[derive(Clone, Debug)]
pub struct EvaluatedChromosome {
    pub chromosome: Chromosome,
    pub fitness: Score,
}

/// One generation, kept sorted from best to worst fitness.
pub struct Population {
    population_size: usize,
    individuals: Vec<EvaluatedChromosome>,
}

impl Population {
    pub fn new(population_size: usize) -> Self {
        Population {
            population_size,
            individuals: Vec::with_capacity(population_size),
        }
    }

    pub fn individuals(&self) -> &[EvaluatedChromosome] {
        &self.individuals
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.individuals.len() >= self.population_size
    }

    pub fn best(&self) -> Option<&EvaluatedChromosome> {
        self.individuals.first()
    }

    pub fn worst(&self) -> Option<&EvaluatedChromosome> {
        self.individuals.last()
    }

    pub fn mean_fitness(&self) -> Option<Score> {
        if self.individuals.is_empty() {
            return None;
        }

        let total = self
            .individuals
            .iter()
            .map(|individual| individual.fitness)
            .sum::<Score>();
        Some(total / self.individuals.len() as f64)
    }

    pub fn select(
        &self,
        selector: &impl SelectChromosome,
        rng: &mut impl rand::Rng,
    ) -> Option<&EvaluatedChromosome> {
        selector.select_chromosome(&self.individuals, rng)
    }

    /// Inserts at its rank. Duplicates are rejected to keep the generation varied, and the
    /// worst individual falls off once the population is full.
    pub fn add(&mut self, individual: EvaluatedChromosome) -> bool {
        let is_duplicate = self.individuals.iter().any(|existing| {
            existing.fitness == individual.fitness
                && existing.chromosome.is_identical(&individual.chromosome)
        });

        if is_duplicate {
            return false;
        }

        let position = match self
            .individuals
            .binary_search_by(|existing| existing.fitness.cmp(&individual.fitness))
        {
            Ok(position) | Err(position) => position,
        };

        if position >= self.population_size {
            return false;
        }

        self.individuals.insert(position, individual);
        self.individuals.truncate(self.population_size);
        true
    }
}
