/// Bounded FIFO between the capture and render sides of a duplex stream.
///
/// Capacity is the latency budget: when a write would exceed it, the oldest
/// samples are discarded so the inverted signal never lags the noise by more
/// than `capacity` samples. Reads pad underruns with silence.
#[derive(Debug)]
pub struct SampleFifo {
    buffer: Vec<f32>,
    write_index: usize,
    read_index: usize,
    available: usize,
}

impl SampleFifo {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_index: 0,
            read_index: 0,
            available: 0,
        }
    }

    /// Queue `samples`, dropping the oldest queued samples on overflow.
    /// Returns how many samples were dropped.
    pub fn write(&mut self, samples: &[f32]) -> usize {
        let capacity = self.capacity();
        let mut dropped = 0;

        let samples = if samples.len() > capacity {
            dropped += samples.len() - capacity;
            &samples[samples.len() - capacity..]
        } else {
            samples
        };

        let overflow = (self.available + samples.len()).saturating_sub(capacity);
        if overflow > 0 {
            self.read_index = (self.read_index + overflow) % capacity;
            self.available -= overflow;
            dropped += overflow;
        }

        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % capacity;
        }
        self.available += samples.len();
        dropped
    }

    /// Fill `out` from the queue, padding any shortfall with silence.
    /// Returns the number of queued samples consumed.
    pub fn read_into(&mut self, out: &mut [f32]) -> usize {
        let capacity = self.capacity();
        let to_read = out.len().min(self.available);
        for (i, slot) in out.iter_mut().enumerate().take(to_read) {
            *slot = self.buffer[(self.read_index + i) % capacity];
        }
        out[to_read..].fill(0.0);

        self.read_index = (self.read_index + to_read) % capacity;
        self.available -= to_read;
        to_read
    }

    pub fn len(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    pub fn clear(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.available = 0;
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

/// The newest `capacity` input samples, kept for telemetry.
#[derive(Debug)]
pub struct AnalysisWindow {
    buffer: Vec<f32>,
    write_index: usize,
    filled: usize,
}

impl AnalysisWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_index: 0,
            filled: 0,
        }
    }

    pub fn push(&mut self, samples: &[f32]) {
        let capacity = self.buffer.len();
        let samples = &samples[samples.len().saturating_sub(capacity)..];
        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % capacity;
        }
        self.filled = (self.filled + samples.len()).min(capacity);
    }

    /// Copy of the retained samples, oldest first.
    pub fn snapshot(&self) -> Vec<f32> {
        let capacity = self.buffer.len();
        let start = (self.write_index + capacity - self.filled) % capacity;
        (0..self.filled)
            .map(|i| self.buffer[(start + i) % capacity])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn clear(&mut self) {
        self.write_index = 0;
        self.filled = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_write_then_read() {
        let mut fifo = SampleFifo::new(8);
        fifo.write(&[1.0, 2.0, 3.0]);

        let mut out = [0.0; 3];
        assert_eq!(fifo.read_into(&mut out), 3);
        assert_eq!(out, [1.0, 2.0, 3.0]);
        assert!(fifo.is_empty());
    }

    #[test]
    fn fifo_underrun_pads_with_silence() {
        let mut fifo = SampleFifo::new(8);
        fifo.write(&[0.5, 0.25]);

        let mut out = [9.0; 4];
        assert_eq!(fifo.read_into(&mut out), 2);
        assert_eq!(out, [0.5, 0.25, 0.0, 0.0]);
    }

    #[test]
    fn fifo_overflow_drops_oldest_to_cap_latency() {
        let mut fifo = SampleFifo::new(4);
        fifo.write(&[1.0, 2.0, 3.0, 4.0]);
        let dropped = fifo.write(&[5.0, 6.0]);

        assert_eq!(dropped, 2);
        assert_eq!(fifo.len(), 4);
        let mut out = [0.0; 4];
        fifo.read_into(&mut out);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn fifo_oversized_write_keeps_tail() {
        let mut fifo = SampleFifo::new(3);
        let dropped = fifo.write(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(dropped, 2);
        let mut out = [0.0; 3];
        fifo.read_into(&mut out);
        assert_eq!(out, [3.0, 4.0, 5.0]);
    }

    #[test]
    fn fifo_wraps_around() {
        let mut fifo = SampleFifo::new(4);
        fifo.write(&[1.0, 2.0, 3.0]);
        let mut skip = [0.0; 2];
        fifo.read_into(&mut skip);
        fifo.write(&[4.0, 5.0, 6.0]);

        let mut out = [0.0; 4];
        assert_eq!(fifo.read_into(&mut out), 4);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn window_keeps_newest_samples_in_order() {
        let mut window = AnalysisWindow::new(4);
        window.push(&[1.0, 2.0, 3.0]);
        assert_eq!(window.snapshot(), vec![1.0, 2.0, 3.0]);

        window.push(&[4.0, 5.0]);
        assert_eq!(window.snapshot(), vec![2.0, 3.0, 4.0, 5.0]);

        window.push(&[6.0, 7.0, 8.0, 9.0, 10.0]);
        assert_eq!(window.snapshot(), vec![7.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn window_clear_empties_snapshot() {
        let mut window = AnalysisWindow::new(4);
        window.push(&[1.0]);
        window.clear();
        assert!(window.is_empty());
        assert!(window.snapshot().is_empty());
    }
}
