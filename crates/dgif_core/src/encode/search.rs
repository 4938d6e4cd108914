//! Width search and acceptance rules for the size-fitting loop.

use serde::{Deserialize, Serialize};

use crate::models::{EncoderBackend, OutputProfile};

/// First relative width change (+60%).
pub const INITIAL_STEP: f64 = 0.60;

/// Multiplicative search over output width.
///
/// The step grows the width while outputs are too small, and flips sign
/// and halves each time the output overshoots the limit or the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthSearch {
    pub width: u32,
    pub step: f64,
}

impl WidthSearch {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            step: INITIAL_STEP,
        }
    }

    /// Next width to try after an attempt produced `size` bytes.
    pub fn next(&mut self, size: u64, limit: u64, exceeds: impl Fn(u32) -> bool) -> u32 {
        if size >= limit || exceeds(self.width) {
            if self.step > 0.0 {
                self.step = -(self.step / 2.0);
            }
        } else if self.step < 0.0 {
            self.step = self.step.abs() / 2.0;
        }

        let next = (self.width as f64 * (1.0 + self.step)).floor() as u32;
        self.width = next.max(1);
        self.width
    }
}

/// Geometry the encoder is fitting into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncodeTarget {
    pub source_width: u32,
    pub source_height: u32,
    pub profile: OutputProfile,
    pub fps: u32,
    pub backend: EncoderBackend,
}

impl EncodeTarget {
    /// Whether `width` would upscale the source on either axis.
    pub fn exceeds_source(&self, width: u32) -> bool {
        width >= self.source_width
            || (width as f64 * self.profile.height_scale).round() as u32 > self.source_height
    }

    /// The largest width that still fits inside the source.
    pub fn is_source_bound(&self, width: u32) -> bool {
        !self.exceeds_source(width)
            && self.exceeds_source(width + self.profile.width_margin(self.backend))
    }

    /// Whether an attempt is good enough to stop searching.
    pub fn accepts(&self, size: u64, width: u32) -> bool {
        self.profile.in_band(size) || (self.profile.fits(size) && self.is_source_bound(width))
    }
}
