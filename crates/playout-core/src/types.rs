//! Common types for the compositing stage
//!
//! This module contains the fundamental frame and format types shared by the
//! stage, its layers, and the producer/consumer seams.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transform::Transform;

/// Index of a layer within a stage. Negative indices are legal and sort
/// below zero in the per-tick output map.
pub type LayerIndex = i32;

/// Playback state for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Video format descriptor handed to the render pass once per tick
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFormat {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frames per second
    pub fps: f64,
}

impl VideoFormat {
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self { width, height, fps }
    }

    /// 1080p at 50 Hz
    pub fn hd1080p50() -> Self {
        Self::new(1920, 1080, 50.0)
    }

    /// 720p at 50 Hz
    pub fn hd720p50() -> Self {
        Self::new(1280, 720, 50.0)
    }

    /// PAL SD at 25 Hz
    pub fn pal() -> Self {
        Self::new(720, 576, 25.0)
    }

    /// Duration of one video period
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }
}

impl std::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}p{:.2}", self.width, self.height, self.fps)
    }
}

/// Decoded image payload, shared by every holder of a frame
#[derive(Debug)]
pub struct ImageFrame {
    pub width: u32,
    pub height: u32,
    /// Packed pixel data; layout is a contract between producer and mixer
    pub data: Vec<u8>,
}

/// Frame payload: either nothing or a shared image
#[derive(Debug, Clone, Default)]
pub enum FrameContent {
    #[default]
    Empty,
    Image(Arc<ImageFrame>),
}

impl PartialEq for FrameContent {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Image(a), Self::Image(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A frame ready for downstream mixing: a payload plus the geometric
/// transform the mixer applies when compositing it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawFrame {
    content: FrameContent,
    transform: Transform,
}

impl DrawFrame {
    /// The empty frame: no payload, identity transform
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_image(image: Arc<ImageFrame>) -> Self {
        Self {
            content: FrameContent::Image(image),
            transform: Transform::IDENTITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.content, FrameContent::Empty)
    }

    pub fn content(&self) -> &FrameContent {
        &self.content
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Replace the frame's transform, consuming the frame
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}
