//! Shape checks shared by the agents and the orchestrator.

use babble_core::GameError;
use ndarray::ArrayView2;

/// `m` must be `[batch, features]`.
pub(crate) fn check_features(
    input: &str,
    m: ArrayView2<'_, f32>,
    batch: usize,
    features: usize,
) -> Result<(), GameError> {
    let (rows, cols) = m.dim();
    if rows != batch {
        return Err(GameError::BatchMismatch {
            input: input.to_string(),
            expected: batch,
            found: rows,
        });
    }
    if cols != features {
        return Err(GameError::FeatureMismatch {
            input: input.to_string(),
            expected: features,
            found: cols,
        });
    }
    Ok(())
}

/// A layer handed to an agent constructor must have the configured shape.
pub(crate) fn check_layer(
    layer: &str,
    expected: (usize, usize),
    found: (usize, usize),
) -> Result<(), GameError> {
    if expected != found {
        return Err(GameError::ShapeMismatch {
            what: "layer",
            reason: format!("{layer}: shape {found:?}, expected {expected:?}"),
        });
    }
    Ok(())
}
