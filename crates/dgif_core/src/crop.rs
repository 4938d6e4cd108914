//! Aspect correction: the crop window that makes a source match a profile.

use serde::{Deserialize, Serialize};

use crate::models::{CropMode, OutputProfile};

/// Aspects closer than this are treated as equal.
const ASPECT_TOLERANCE: f64 = 1e-6;

/// Axis along which the crop window can slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CropAxis {
    X,
    Y,
}

/// Size of the largest target-aspect window that fits in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropGeometry {
    pub source_width: u32,
    pub source_height: u32,
    pub width: u32,
    pub height: u32,
    pub axis: CropAxis,
}

/// A positioned crop window, ready for `crop=w:h:x:y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl CropGeometry {
    /// Window for a source, or None when the aspect already matches.
    pub fn for_target(source_width: u32, source_height: u32, profile: &OutputProfile) -> Option<Self> {
        if !needs_crop(source_width, source_height, profile) {
            return None;
        }

        let source_aspect = source_height as f64 / source_width as f64;
        let target_aspect = profile.aspect();

        let (width, height, axis) = if source_aspect > target_aspect {
            let h = (source_width as f64 * target_aspect).floor() as u32;
            (source_width, h.clamp(1, source_height), CropAxis::Y)
        } else {
            let w = (source_height as f64 / target_aspect).floor() as u32;
            (w.clamp(1, source_width), source_height, CropAxis::X)
        };

        Some(Self {
            source_width,
            source_height,
            width,
            height,
            axis,
        })
    }

    /// Largest allowed (x, y) offsets.
    pub fn max_offset(&self) -> (u32, u32) {
        (
            self.source_width.saturating_sub(self.width),
            self.source_height.saturating_sub(self.height),
        )
    }

    /// Window centred on both axes.
    pub fn centered(&self) -> CropWindow {
        let (max_x, max_y) = self.max_offset();
        self.window(max_x / 2, max_y / 2)
    }

    /// Window at the given offsets, clamped to the source. A missing offset is centred.
    pub fn with_offsets(&self, x: Option<u32>, y: Option<u32>) -> CropWindow {
        let (max_x, max_y) = self.max_offset();
        self.window(
            x.map_or(max_x / 2, |x| x.min(max_x)),
            y.map_or(max_y / 2, |y| y.min(max_y)),
        )
    }

    /// Window for a crop mode; `Stretch` never crops.
    pub fn for_mode(&self, mode: CropMode) -> Option<CropWindow> {
        match mode {
            CropMode::Stretch => None,
            CropMode::Auto => Some(self.centered()),
            CropMode::Manual { x, y } => Some(self.with_offsets(x, y)),
        }
    }

    fn window(&self, x: u32, y: u32) -> CropWindow {
        CropWindow {
            width: self.width,
            height: self.height,
            x,
            y,
        }
    }
}

/// Whether the source aspect differs from the profile's.
pub fn needs_crop(source_width: u32, source_height: u32, profile: &OutputProfile) -> bool {
    if source_width == 0 || source_height == 0 {
        return false;
    }
    let source_aspect = source_height as f64 / source_width as f64;
    (source_aspect - profile.aspect()).abs() > ASPECT_TOLERANCE
}

/// Reduced `w:h` label of the profile's aspect (`"1:1"`, `"5:2"`).
pub fn ratio_label(profile: &OutputProfile) -> String {
    let w = (profile.width_scale * 1000.0).round() as u64;
    let h = (profile.height_scale * 1000.0).round() as u64;
    let d = gcd(w, h).max(1);
    format!("{}:{}", w / d, h / d)
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
