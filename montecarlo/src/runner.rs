use oja_core::{OjaLearner, SampleSource, WeightVector};
use rand::{SeedableRng, rngs::StdRng};

use crate::{descriptor::ExperimentDescriptor, error::Result};

/// Runs one repetition: draws `batches` fresh batches and fits a single
/// learner on each of them in turn.
///
/// Samples are never reused across batches, the weights are carried over.
///
/// # Returns
/// The final weights, owned by the caller.
///
/// # Errors
/// Any validation error from the learner. Nothing is retried.
pub fn run<S: SampleSource>(descriptor: &ExperimentDescriptor<S>) -> Result<WeightVector> {
    let setup = descriptor.setup();
    let mut oja = OjaLearner::new(setup.initial_weights(), setup.ndim())?;
    let mut rng = StdRng::seed_from_u64(descriptor.seed());

    for _ in 0..descriptor.batches() {
        let batch = setup.source().sample(setup.batch_size(), &mut rng);
        oja.fit(batch.view(), descriptor.alpha())?;
    }

    Ok(oja.into_weights())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ndarray::{Array1, Array2, array};
    use oja_core::{MlError, MultivariateNormal};
    use rand::Rng;

    use super::*;
    use crate::{descriptor::ExperimentSetup, error::ExperimentError};

    fn setup(batch_size: usize) -> Arc<ExperimentSetup> {
        let source = MultivariateNormal::equicorrelated(2, 0.7).unwrap();
        Arc::new(ExperimentSetup::new(array![0.0, 1.0], 2, source, batch_size))
    }

    /// Emits a fixed row regardless of the generator.
    struct ConstSource(Array1<f64>);

    impl SampleSource for ConstSource {
        fn ndim(&self) -> usize {
            self.0.len()
        }

        fn sample<R: Rng + ?Sized>(&self, n: usize, _rng: &mut R) -> Array2<f64> {
            Array2::from_shape_fn((n, self.0.len()), |(_, j)| self.0[j])
        }
    }

    #[test]
    fn same_descriptor_is_bit_identical() {
        let descriptor = ExperimentDescriptor::new(setup(500), 0.01, 3, 1234);

        let a = run(&descriptor).unwrap();
        let b = run(&descriptor.clone()).unwrap();

        assert_eq!(a.len(), 2);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn different_seeds_diverge() {
        let a = run(&ExperimentDescriptor::new(setup(500), 0.01, 2, 1)).unwrap();
        let b = run(&ExperimentDescriptor::new(setup(500), 0.01, 2, 2)).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn zero_alpha_returns_initial_weights() {
        let descriptor = ExperimentDescriptor::new(setup(1000), 0.0, 5, 99);
        assert_eq!(run(&descriptor).unwrap(), array![0.0, 1.0]);
    }

    #[test]
    fn zero_batches_returns_initial_weights() {
        let descriptor = ExperimentDescriptor::new(setup(1000), 0.5, 0, 99);
        assert_eq!(run(&descriptor).unwrap(), array![0.0, 1.0]);
    }

    #[test]
    fn weights_carry_over_between_batches() {
        // A constant sample makes every batch identical, so two batches of
        // one sample must equal a single fit over both samples.
        let source = ConstSource(array![1.0, 2.0]);
        let setup = Arc::new(ExperimentSetup::new(array![0.0, 1.0], 2, source, 1));
        let got = run(&ExperimentDescriptor::new(setup, 0.1, 2, 0)).unwrap();

        let mut oja = OjaLearner::new(array![0.0, 1.0].view(), 2).unwrap();
        oja.fit(array![[1.0, 2.0], [1.0, 2.0]].view(), 0.1).unwrap();

        assert_eq!(got, oja.into_weights());
    }

    #[test]
    fn initial_weight_mismatch_propagates() {
        let source = MultivariateNormal::equicorrelated(2, 0.3).unwrap();
        let setup = Arc::new(ExperimentSetup::new(array![0.0, 1.0, 0.0], 2, source, 10));

        let err = run(&ExperimentDescriptor::new(setup, 0.1, 1, 0)).unwrap_err();
        assert!(matches!(
            err,
            ExperimentError::Validation(MlError::ShapeMismatch { what: "initial weights", .. })
        ));
    }

    #[test]
    fn sample_width_mismatch_propagates() {
        let source = MultivariateNormal::equicorrelated(3, 0.3).unwrap();
        let setup = Arc::new(ExperimentSetup::new(array![0.0, 1.0], 2, source, 10));

        let err = run(&ExperimentDescriptor::new(setup, 0.1, 1, 0)).unwrap_err();
        assert!(matches!(
            err,
            ExperimentError::Validation(MlError::ShapeMismatch { what: "batch", got: 3, expected: 2 })
        ));
    }
}
