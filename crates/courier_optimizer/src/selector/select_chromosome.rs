use crate::solver::solution::population::EvaluatedChromosome;

pub trait SelectChromosome {
    fn select_chromosome<'r>(
        &self,
        individuals: &'r [EvaluatedChromosome],
        rng: &mut impl rand::Rng,
    ) -> Option<&'r EvaluatedChromosome>;
}
