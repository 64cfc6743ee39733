//! Keyframe Tracks
//!
//! Time-sorted keyframe storage with cursor-accelerated sampling: playback
//! advances a cursor so the common case is an O(1) neighbor scan, with a
//! binary-search fallback for scrubs and loop resets.

use glam::{Quat, Vec3};

/// Values a track can interpolate.
pub trait Interpolatable: Copy {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }
}

impl Interpolatable for Quat {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        // nlerp with neighborhood correction.
        let end = if start.dot(end) < 0.0 { -end } else { end };
        (start + (end - start) * t).normalize()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    Step,
}

/// Per-track sampling state. Invalidated implicitly: an out-of-range cursor
/// falls back to binary search and re-seats itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

const MAX_SCAN_OFFSET: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct KeyframeTrack<T: Interpolatable> {
    /// Keyframe times, sorted ascending within `[0, clip duration]`.
    pub times: Vec<f32>,
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        assert_eq!(
            times.len(),
            values.len(),
            "Keyframe track times/values mismatch"
        );
        Self {
            times,
            values,
            interpolation,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The time of the last keyframe, 0 for an empty track.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Samples the track at `time`, resuming from `cursor`.
    ///
    /// Sampling clamps outside the keyframe range: before the first key the
    /// first value is returned, past the last key the last value.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Option<T> {
        if self.times.is_empty() {
            return None;
        }

        let len = self.times.len();
        if len == 1 {
            return Some(self.values[0]);
        }

        let i = cursor.last_index.min(len - 1);
        let t_curr = self.times[i];

        let found = if time >= t_curr {
            // Forward scan from the cursor.
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    if time >= self.times[len - 1] {
                        res = Some(len - 1);
                    }
                    break;
                }
                if time < self.times[idx + 1] {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            // Backward scan (reverse playback).
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                if i < offset {
                    break;
                }
                let idx = i - offset;
                if time >= self.times[idx] {
                    res = Some(idx);
                    break;
                }
            }
            res
        };

        let index = found.unwrap_or_else(|| {
            // Large jump; global binary search.
            let next = self.times.partition_point(|&t| t <= time);
            next.saturating_sub(1)
        });
        cursor.last_index = index;

        Some(self.sample_at_frame(index, time))
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> T {
        let len = self.times.len();
        if index >= len - 1 {
            return self.values[len - 1];
        }

        match self.interpolation {
            InterpolationMode::Step => self.values[index],
            InterpolationMode::Linear => {
                let t0 = self.times[index];
                let t1 = self.times[index + 1];
                let dt = t1 - t0;
                let t = if dt > 1e-6 {
                    ((time - t0) / dt).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                T::interpolate_linear(self.values[index], self.values[index + 1], t)
            }
        }
    }
}
