//! Canvas geometry and timing.

use serde::{Deserialize, Serialize};

/// Composition geometry and frame timing of a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Width of the composition space.
    #[serde(default)]
    pub base_width: u32,
    /// Height of the composition space.
    #[serde(default)]
    pub base_height: u32,
    /// Width of the scaled output.
    #[serde(default)]
    pub output_width: u32,
    /// Height of the scaled output.
    #[serde(default)]
    pub output_height: u32,
    /// Frame rate numerator.
    #[serde(default)]
    pub fps_num: u32,
    /// Frame rate denominator.
    #[serde(default)]
    pub fps_den: u32,
}

impl Default for VideoInfo {
    fn default() -> Self {
        Self::new(1920, 1080, 30, 1)
    }
}

impl VideoInfo {
    /// Creates video info with identical base and output sizes.
    #[must_use]
    pub const fn new(width: u32, height: u32, fps_num: u32, fps_den: u32) -> Self {
        Self {
            base_width: width,
            base_height: height,
            output_width: width,
            output_height: height,
            fps_num,
            fps_den,
        }
    }

    /// Sets a different scaled output size.
    #[must_use]
    pub const fn with_output_size(mut self, width: u32, height: u32) -> Self {
        self.output_width = width;
        self.output_height = height;
        self
    }

    /// Returns true if every dimension and both rate terms are non-zero.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.base_width > 0
            && self.base_height > 0
            && self.output_width > 0
            && self.output_height > 0
            && self.fps_num > 0
            && self.fps_den > 0
    }

    /// Returns the frame rate as a float, or 0.0 when the denominator is zero.
    #[must_use]
    pub fn fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let video = VideoInfo::default();
        assert!(video.is_valid());
        assert_eq!(video.output_width, 1920);
    }

    #[test]
    fn test_zeroed_is_invalid() {
        let video = VideoInfo::new(0, 0, 0, 0);
        assert!(!video.is_valid());
        assert!(video.fps().abs() < f64::EPSILON);
    }

    #[test]
    fn test_ntsc_rate() {
        let video = VideoInfo::new(1280, 720, 30000, 1001).with_output_size(640, 360);
        assert!((video.fps() - 29.97).abs() < 0.01);
        assert_eq!(video.output_height, 360);
        assert_eq!(video.base_height, 720);
    }

    #[test]
    fn test_deserialize_missing_fields_default_to_zero() {
        let video: VideoInfo = serde_json::from_str(r#"{"base_width": 640}"#).unwrap();
        assert_eq!(video.base_width, 640);
        assert_eq!(video.fps_den, 0);
    }
}
