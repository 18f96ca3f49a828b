//! Loss and accuracy over probability tensors.

use candle_core::Tensor;

use crate::error::{KinbagError, Result};

/// Mean binary cross-entropy between probabilities and 0/1 targets, both
/// [batch, relations]. Probabilities must already be strictly inside (0, 1).
pub fn binary_cross_entropy(probs: &Tensor, targets: &Tensor) -> Result<Tensor> {
    let pos = (targets * probs.log()?)?;
    let neg = (targets.affine(-1.0, 1.0)? * probs.affine(-1.0, 1.0)?.log()?)?;
    Ok((pos + neg)?.neg()?.mean_all()?)
}

/// Count of outputs whose thresholded prediction equals the target, and the
/// total number of outputs.
pub fn accuracy(probs: &Tensor, targets: &Tensor, threshold: f32) -> Result<(usize, usize)> {
    let probs = probs.flatten_all()?.to_vec1::<f32>()?;
    let targets = targets.flatten_all()?.to_vec1::<f32>()?;

    let correct = probs
        .iter()
        .zip(&targets)
        .filter(|(p, y)| {
            let predicted = if **p >= threshold { 1.0 } else { 0.0 };
            predicted == **y
        })
        .count();

    Ok((correct, probs.len()))
}

/// Read a scalar loss, failing if it is NaN or infinite.
pub fn ensure_finite(loss: &Tensor, epoch: usize, batch: usize) -> Result<f32> {
    let value = loss.to_scalar::<f32>()?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(KinbagError::NonFiniteLoss { epoch, batch })
    }
}
