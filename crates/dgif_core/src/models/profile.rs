//! Per-kind output profiles.
//!
//! A profile captures everything the encoder needs to know about a target
//! asset: byte budget, acceptable size band, aspect ratio, starting frame
//! size and container.

use serde::{Deserialize, Serialize};

use super::enums::{Container, EncoderBackend, OutputKind};
use crate::config::LimitSettings;

/// Stickers must be shorter than this.
pub const STICKER_MAX_DURATION_SECS: f64 = 5.0;

/// Encoding constraints for one output kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputProfile {
    pub kind: OutputKind,
    /// Hard upper bound on output size in bytes (exclusive).
    pub size_limit: u64,
    /// Output is "close enough" once it exceeds `size_limit * lower_band`.
    pub lower_band: f64,
    /// Aspect ratio width component.
    pub width_scale: f64,
    /// Aspect ratio height component.
    pub height_scale: f64,
    /// Frame size of the first encode attempt.
    pub initial_width: u32,
    pub initial_height: u32,
    pub container: Container,
    /// Gifski gives better quality for the large outputs when installed.
    pub prefers_gifski: bool,
    /// Maximum source duration, if the platform enforces one.
    pub max_duration_secs: Option<f64>,
}

impl OutputProfile {
    /// Built-in profile for a kind.
    pub fn for_kind(kind: OutputKind) -> Self {
        match kind {
            OutputKind::Emote => Self {
                kind,
                size_limit: 256_000,
                lower_band: 0.95,
                width_scale: 1.0,
                height_scale: 1.0,
                initial_width: 110,
                initial_height: 100,
                container: Container::Gif,
                prefers_gifski: false,
                max_duration_secs: None,
            },
            OutputKind::Sticker => Self {
                kind,
                size_limit: 500_000,
                lower_band: 0.95,
                width_scale: 1.0,
                height_scale: 1.0,
                initial_width: 200,
                initial_height: 200,
                container: Container::Apng,
                prefers_gifski: false,
                max_duration_secs: Some(STICKER_MAX_DURATION_SECS),
            },
            OutputKind::Pfp | OutputKind::ServerIcon => Self {
                kind,
                size_limit: 8_000_000,
                lower_band: 0.85,
                width_scale: 1.0,
                height_scale: 1.0,
                initial_width: 500,
                initial_height: 500,
                container: Container::Gif,
                prefers_gifski: true,
                max_duration_secs: None,
            },
            OutputKind::Banner => Self {
                kind,
                size_limit: 10_000_000,
                lower_band: 0.85,
                width_scale: 1.0,
                height_scale: 0.4,
                initial_width: 800,
                initial_height: 320,
                container: Container::Gif,
                prefers_gifski: true,
                max_duration_secs: None,
            },
        }
    }

    /// Profile for a kind with configured limit overrides applied.
    pub fn resolve(kind: OutputKind, limits: &LimitSettings) -> Self {
        let profile = Self::for_kind(kind);
        match limits.override_for(kind) {
            Some(limit) => profile.with_size_limit(limit),
            None => profile,
        }
    }

    /// Replace the byte limit.
    pub fn with_size_limit(mut self, size_limit: u64) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Target aspect as height / width.
    pub fn aspect(&self) -> f64 {
        self.height_scale / self.width_scale
    }

    /// Smallest size that is accepted without further searching.
    pub fn lower_bound(&self) -> f64 {
        self.size_limit as f64 * self.lower_band
    }

    /// Whether a size falls in the accepted band.
    pub fn in_band(&self, size: u64) -> bool {
        (size as f64) > self.lower_bound() && size < self.size_limit
    }

    /// Whether a size is under the hard limit.
    pub fn fits(&self, size: u64) -> bool {
        size < self.size_limit
    }

    /// Width step used to decide the frame can't grow any further.
    pub fn width_margin(&self, backend: EncoderBackend) -> u32 {
        match backend {
            EncoderBackend::Gifski if self.kind != OutputKind::Emote => 20,
            _ => 1,
        }
    }

    /// Height that matches a width under this profile's aspect.
    pub fn height_for_width(&self, width: u32) -> u32 {
        ((width as f64 * self.height_scale).round() as u32).max(1)
    }

    /// Extension of the produced file.
    pub fn extension(&self) -> &'static str {
        self.container.extension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emote_profile_values() {
        let p = OutputProfile::for_kind(OutputKind::Emote);
        assert_eq!(p.size_limit, 256_000);
        assert_eq!((p.initial_width, p.initial_height), (110, 100));
        assert_eq!(p.extension(), "gif");
        assert!(!p.prefers_gifski);
    }

    #[test]
    fn sticker_is_apng_with_duration_limit() {
        let p = OutputProfile::for_kind(OutputKind::Sticker);
        assert_eq!(p.container, Container::Apng);
        assert_eq!(p.extension(), "png");
        assert_eq!(p.max_duration_secs, Some(5.0));
    }

    #[test]
    fn banner_aspect() {
        let p = OutputProfile::for_kind(OutputKind::Banner);
        assert!((p.aspect() - 0.4).abs() < 1e-9);
        assert_eq!(p.height_for_width(800), 320);
        assert_eq!(p.height_for_width(1), 1);
    }

    #[test]
    fn band_is_exclusive_on_both_ends() {
        let p = OutputProfile::for_kind(OutputKind::Emote);
        assert!(!p.in_band(256_000));
        assert!(p.in_band(255_999));
        assert!(!p.in_band(243_200)); // exactly 95%
        assert!(p.in_band(243_201));
    }

    #[test]
    fn width_margin_depends_on_backend() {
        let pfp = OutputProfile::for_kind(OutputKind::Pfp);
        assert_eq!(pfp.width_margin(EncoderBackend::Gifski), 20);
        assert_eq!(pfp.width_margin(EncoderBackend::Ffmpeg), 1);
        let emote = OutputProfile::for_kind(OutputKind::Emote);
        assert_eq!(emote.width_margin(EncoderBackend::Gifski), 1);
    }

    #[test]
    fn resolve_applies_overrides() {
        let limits = LimitSettings {
            emote: 512_000,
            ..LimitSettings::default()
        };
        assert_eq!(OutputProfile::resolve(OutputKind::Emote, &limits).size_limit, 512_000);
        assert_eq!(OutputProfile::resolve(OutputKind::Pfp, &limits).size_limit, 8_000_000);
    }
}
