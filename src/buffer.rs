//! Multi-channel sample blocks shared by voices and effects.
//!
//! Storage is channel-major: one contiguous `Vec<f32>` per channel. Every
//! operation that touches samples applies to all channels alike, so a voice or
//! effect never needs to know how many channels the host opened.

use thiserror::Error;

/// A requested region does not fit inside the buffer.
///
/// Raised at the boundary (before any rendering starts) so the per-sample hot
/// path can assume valid ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("region {start}..{end} exceeds buffer of {frames} frames")]
    OutOfRange {
        start: usize,
        end: usize,
        frames: usize,
    },
    #[error("buffer has no channels")]
    NoChannels,
    #[error("buffer has {got} channels but effects were prepared for {prepared}")]
    ChannelMismatch { prepared: usize, got: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    frames: usize,
}

impl AudioBuffer {
    /// Allocate a silent buffer. Call this outside the audio callback.
    pub fn new(num_channels: usize, num_frames: usize) -> Self {
        Self {
            channels: vec![vec![0.0; num_frames]; num_channels],
            frames: num_frames,
        }
    }

    /// Build a buffer from per-channel sample vectors.
    ///
    /// Channels shorter than the longest one are padded with silence.
    pub fn from_channels(channels: Vec<Vec<f32>>) -> Self {
        let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
        let channels = channels
            .into_iter()
            .map(|mut ch| {
                ch.resize(frames, 0.0);
                ch
            })
            .collect();
        Self { channels, frames }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_frames(&self) -> usize {
        self.frames
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.channels.iter_mut().map(Vec::as_mut_slice)
    }

    /// Mutable access to two distinct channels at once (stereo processing).
    pub fn channel_pair_mut(&mut self, left: usize, right: usize) -> (&mut [f32], &mut [f32]) {
        assert!(left < right, "channel pair must be ordered");
        let (head, tail) = self.channels.split_at_mut(right);
        (&mut head[left], &mut tail[0])
    }

    /// Sum `value` into one sample. Never overwrites.
    #[inline]
    pub fn add_sample(&mut self, channel: usize, frame: usize, value: f32) {
        self.channels[channel][frame] += value;
    }

    /// Sum `value` into the same frame of every channel.
    #[inline]
    pub fn add_to_all_channels(&mut self, frame: usize, value: f32) {
        for channel in &mut self.channels {
            channel[frame] += value;
        }
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Zero `len` frames starting at `start` in every channel.
    pub fn clear_region(&mut self, start: usize, len: usize) {
        let end = (start + len).min(self.frames);
        for channel in &mut self.channels {
            channel[start.min(end)..end].fill(0.0);
        }
    }

    /// Validate that `start..start + len` lies inside the buffer.
    pub fn check_region(&self, start: usize, len: usize) -> Result<(), BufferError> {
        if self.channels.is_empty() {
            return Err(BufferError::NoChannels);
        }
        let end = start.checked_add(len).ok_or(BufferError::OutOfRange {
            start,
            end: usize::MAX,
            frames: self.frames,
        })?;
        if end > self.frames {
            return Err(BufferError::OutOfRange {
                start,
                end,
                frames: self.frames,
            });
        }
        Ok(())
    }

    /// Largest absolute sample value across all channels.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    /// Copy the first `frames` frames into an interleaved slice (cpal layout).
    ///
    /// When the output has more channels than the buffer, the extra output
    /// channels repeat the last buffer channel. Returns the number of frames
    /// written.
    pub fn interleave_into(&self, out: &mut [f32], out_channels: usize, frames: usize) -> usize {
        if out_channels == 0 || self.channels.is_empty() {
            return 0;
        }
        let frames = frames.min(self.frames).min(out.len() / out_channels);
        let last = self.channels.len() - 1;
        for (i, frame) in out.chunks_exact_mut(out_channels).take(frames).enumerate() {
            for (ch, slot) in frame.iter_mut().enumerate() {
                *slot = self.channels[ch.min(last)][i];
            }
        }
        frames
    }
}
