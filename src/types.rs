// src/types.rs
//
// Small value types shared across the training configuration.
//
// All three are written in documents as fixed-length integer sequences
// ([C, H, W], [top, bottom], [lower, upper]) and carry named fields on
// the Rust side.

use serde::{Deserialize, Serialize};

/// Expected tensor shape of one sensor frame, channels first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 3]", into = "[u32; 3]")]
pub struct SensorShape {
    pub channels: u32,
    pub height: u32,
    pub width: u32,
}

impl SensorShape {
    pub fn new(channels: u32, height: u32, width: u32) -> Self {
        Self {
            channels,
            height,
            width,
        }
    }

    /// Elements in one frame of this shape.
    pub fn element_count(&self) -> u64 {
        self.channels as u64 * self.height as u64 * self.width as u64
    }
}

impl From<[u32; 3]> for SensorShape {
    fn from(v: [u32; 3]) -> Self {
        Self {
            channels: v[0],
            height: v[1],
            width: v[2],
        }
    }
}

impl From<SensorShape> for [u32; 3] {
    fn from(s: SensorShape) -> Self {
        [s.channels, s.height, s.width]
    }
}

/// Vertical crop bounds on the raw camera frame (row indices, top < bottom).
///
/// The crop runs before resizing to the declared sensor shape, so these
/// bounds are independent of the SENSORS heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct ImageCut {
    pub top: u32,
    pub bottom: u32,
}

impl ImageCut {
    /// Rows kept by the crop.
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

impl From<[u32; 2]> for ImageCut {
    fn from(v: [u32; 2]) -> Self {
        Self {
            top: v[0],
            bottom: v[1],
        }
    }
}

impl From<ImageCut> for [u32; 2] {
    fn from(c: ImageCut) -> Self {
        [c.top, c.bottom]
    }
}

/// Inclusive bounds on the frame distance between members of a positive
/// pair, consumed by the external contrastive sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct ThresholdRange {
    pub lower: u32,
    pub upper: u32,
}

impl ThresholdRange {
    pub fn contains(&self, distance: u32) -> bool {
        distance >= self.lower && distance <= self.upper
    }
}

impl From<[u32; 2]> for ThresholdRange {
    fn from(v: [u32; 2]) -> Self {
        Self {
            lower: v[0],
            upper: v[1],
        }
    }
}

impl From<ThresholdRange> for [u32; 2] {
    fn from(r: ThresholdRange) -> Self {
        [r.lower, r.upper]
    }
}
