/*
Delay Line
==========

A circular buffer that remembers the last N input samples. Writing advances
the head; reading looks back a (possibly fractional) number of samples.

  write ──→ [ x[n] | x[n-1] | x[n-2] | ... | x[n-N+1] ]
                      ↑ read(1)   ↑ read(2)

Fractional reads use linear interpolation between the two neighbouring
samples, which is what lets a chorus sweep its delay smoothly instead of
stepping (stepping produces audible zipper noise).

The buffer is allocated once in `new`; `write`/`read` never allocate.
*/

pub struct DelayLine {
    buffer: Box<[f32]>,
    write_pos: usize,
}

impl DelayLine {
    /// Create a delay line able to look back up to `max_delay_samples`.
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            // +2 keeps room for the interpolation neighbour at maximum delay
            buffer: vec![0.0; max_delay_samples.max(1) + 2].into_boxed_slice(),
            write_pos: 0,
        }
    }

    /// Longest delay (in samples) this line can produce.
    pub fn max_delay(&self) -> usize {
        self.buffer.len() - 2
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Read the sample written `delay_samples` writes ago.
    ///
    /// A delay of 1.0 returns the most recently written sample.
    #[inline]
    pub fn read_interpolated(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(1.0, self.max_delay() as f32);
        let whole = delay.floor();
        let frac = delay - whole;
        let whole = whole as usize;

        let newer = (self.write_pos + len - whole) % len;
        let older = (newer + len - 1) % len;

        self.buffer[newer] + (self.buffer[older] - self.buffer[newer]) * frac
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
