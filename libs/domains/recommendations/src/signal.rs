//! Vector arithmetic for the composer.
//!
//! Every vector that crosses a module boundary here is either L2-normalized
//! or explicitly `NoSignal`; a literal all-zero vector never leaks out, so
//! callers cannot mistake "nothing learned" for a learned zero.

use tracing::warn;

/// Outcome of a vector computation
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// A unit-norm vector carrying usable preference information
    Vector(Vec<f32>),
    /// Nothing to learn from: no rows, zero total weight, or a degraded source
    NoSignal,
}

impl Signal {
    /// Normalize an accumulated vector into a signal.
    ///
    /// A zero-norm input collapses to `NoSignal`.
    pub fn normalized(mut vector: Vec<f32>) -> Self {
        if l2_normalize(&mut vector) {
            Signal::Vector(vector)
        } else {
            Signal::NoSignal
        }
    }

    pub fn vector(&self) -> Option<&[f32]> {
        match self {
            Signal::Vector(vector) => Some(vector),
            Signal::NoSignal => None,
        }
    }

    pub fn is_no_signal(&self) -> bool {
        matches!(self, Signal::NoSignal)
    }
}

/// Euclidean norm
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|v| v * v).sum::<f32>().sqrt()
}

/// Scale `vector` to unit norm in place.
///
/// Returns `false` and leaves the input untouched when the norm is zero.
pub fn l2_normalize(vector: &mut [f32]) -> bool {
    let norm = l2_norm(vector);
    if norm == 0.0 {
        return false;
    }
    for v in vector.iter_mut() {
        *v /= norm;
    }
    true
}

/// Combine weighted signals into one unit-norm vector.
///
/// Components that are `NoSignal` or whose length differs from `dimensions`
/// do not contribute, and their weight is excluded from the normalizing
/// total. All contributions filtered out, or a zero total weight, yields
/// `NoSignal`.
pub fn combine_vectors(components: Vec<(Signal, f32)>, dimensions: usize) -> Signal {
    let mut sum = vec![0.0f32; dimensions];
    let mut total_weight = 0.0f32;

    for (signal, weight) in components {
        let Signal::Vector(vector) = signal else {
            continue;
        };
        if vector.len() != dimensions {
            warn!(
                expected = dimensions,
                actual = vector.len(),
                "Skipping component with mismatched dimensions"
            );
            continue;
        }

        total_weight += weight;
        for (acc, v) in sum.iter_mut().zip(vector.iter()) {
            *acc += v * weight;
        }
    }

    if total_weight == 0.0 {
        return Signal::NoSignal;
    }

    for v in sum.iter_mut() {
        *v /= total_weight;
    }
    Signal::normalized(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn assert_unit_norm(signal: &Signal) {
        let Signal::Vector(vector) = signal else {
            panic!("expected a vector, got NoSignal");
        };
        assert!((l2_norm(vector) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_normalized_produces_unit_norm() {
        let signal = Signal::normalized(vec![3.0, 4.0]);
        assert_unit_norm(&signal);
        assert_eq!(signal.vector().unwrap(), &[0.6, 0.8]);
    }

    #[test]
    fn test_normalized_zero_vector_is_no_signal() {
        assert!(Signal::normalized(vec![0.0, 0.0, 0.0]).is_no_signal());
        assert!(Signal::normalized(vec![]).is_no_signal());
    }

    #[test]
    fn test_combine_weights_components() {
        let combined = combine_vectors(
            vec![
                (Signal::Vector(vec![1.0, 0.0]), 0.5),
                (Signal::Vector(vec![0.0, 1.0]), 0.5),
            ],
            2,
        );

        // Equal weights pull the result onto the diagonal
        let expected = std::f32::consts::FRAC_1_SQRT_2;
        let Signal::Vector(vector) = combined else {
            panic!("expected a vector");
        };
        assert!((vector[0] - expected).abs() < EPSILON);
        assert!((vector[1] - expected).abs() < EPSILON);
    }

    #[test]
    fn test_combine_is_deterministic() {
        let components = || {
            vec![
                (Signal::Vector(vec![0.8, 0.6, 0.0]), 0.5),
                (Signal::Vector(vec![0.0, 1.0, 0.0]), 0.3),
                (Signal::NoSignal, 0.2),
                (Signal::Vector(vec![0.0, 0.0, 1.0]), 0.1),
            ]
        };

        let first = combine_vectors(components(), 3);
        let second = combine_vectors(components(), 3);
        assert_eq!(first, second);
        assert_unit_norm(&first);
    }

    #[test]
    fn test_combine_zero_total_weight_is_no_signal() {
        let combined = combine_vectors(vec![(Signal::NoSignal, 0.5), (Signal::NoSignal, 0.3)], 3);
        assert!(combined.is_no_signal());

        assert!(combine_vectors(vec![], 3).is_no_signal());
    }

    #[test]
    fn test_combine_skips_mismatched_dimensions() {
        let combined = combine_vectors(
            vec![
                (Signal::Vector(vec![1.0, 0.0]), 0.5),
                (Signal::Vector(vec![1.0, 1.0, 1.0]), 0.3),
            ],
            2,
        );

        // Only the two-dimensional component survives
        assert_eq!(combined.vector().unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn test_combine_all_mismatched_is_no_signal() {
        let combined = combine_vectors(vec![(Signal::Vector(vec![1.0, 1.0, 1.0]), 0.5)], 2);
        assert!(combined.is_no_signal());
    }
}
