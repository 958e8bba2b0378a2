/// Downmix interleaved multi-channel audio to mono by averaging channels per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

/// Write `mono` into `out` as interleaved frames, copying each sample to every channel.
///
/// Writes `min(mono.len(), out.len() / channels)` frames and returns that count.
pub fn upmix_into(mono: &[f32], channels: usize, out: &mut [f32]) -> usize {
    let channels = channels.max(1);
    let frames = mono.len().min(out.len() / channels);
    for (frame, &sample) in out.chunks_exact_mut(channels).zip(mono).take(frames) {
        frame.fill(sample);
    }
    frames
}

/// Linear-interpolation resampling of mono audio between two rates.
///
/// Returns the input unchanged when the rates match.
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || samples.is_empty() || source_rate == 0 {
        return samples.to_vec();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_count = (samples.len() as f64 * ratio) as usize;
    (0..output_count)
        .map(|i| {
            let position = i as f64 / ratio;
            let index = position as usize;
            let fraction = (position - index as f64) as f32;
            match (samples.get(index), samples.get(index + 1)) {
                (Some(a), Some(b)) => a * (1.0 - fraction) + b * fraction,
                (Some(a), None) => *a,
                _ => 0.0,
            }
        })
        .collect()
}
