//! Sizing an externally owned population to exactly `lambda`.

use crate::error::Result;
use crate::types::Candidate;

/// Truncates `population` to its first `lambda` members, or pads it with
/// unevaluated candidates produced by `sample`.
///
/// # Errors
///
/// Propagates the first error returned by `sample`; candidates added before
/// the failure stay in the population.
pub fn reconcile<V, F>(population: &mut Vec<Candidate<V>>, lambda: usize, mut sample: F) -> Result<()>
where
    F: FnMut() -> Result<Vec<f64>>,
{
    let before = population.len();
    if before > lambda {
        population.truncate(lambda);
    } else {
        population.reserve(lambda - before);
        while population.len() < lambda {
            population.push(Candidate::new(sample()?));
        }
    }
    if before != lambda {
        trace_debug!(before, lambda, "reconciled population size");
    }
    Ok(())
}
