use anyhow::{Result, bail};
use candle_core::{DType, Tensor};

/// Mean of the hidden states over unmasked tokens, then L2-normalized.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]`; the result is `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _tokens, hidden_dim) = match hidden.dims() {
        [b, t, h] => (*b, *t, *h),
        other => bail!("hidden shape must be [B,T,H], got {:?}", other),
    };

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_3d = mask.unsqueeze(2)?;
    let mask_broadcast = mask_3d.broadcast_as(hidden.shape())?;
    let summed = (hidden * &mask_broadcast)?.sum(1)?;
    // clamp so an all-masked row yields zeros rather than NaN
    let counts = mask.sum(1)?.unsqueeze(1)?.to_dtype(summed.dtype())?.clamp(1e-9f32, f32::MAX)?;
    let mean = summed.broadcast_div(&counts)?;

    let eps_val = match hidden.dtype() { DType::F16 => 1e-6f32, _ => 1e-12f32 };
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?;
    let norm = (norm + f64::from(eps_val))?;
    let pooled = mean.broadcast_div(&norm)?;
    if pooled.dims() != [batch, hidden_dim] {
        bail!("pooled shape {:?} != [{}, {}]", pooled.dims(), batch, hidden_dim);
    }
    Ok(pooled)
}
