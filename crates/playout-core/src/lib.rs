//! Playout core - per-channel compositing stage
//!
//! The stage is the single-writer coordinator of one output channel: it
//! owns the sparse layer table, serializes external commands onto a
//! dedicated executor, tweens layer transforms, fans rendered frames out
//! to route consumers, hit-tests pointer events, and assembles the
//! index-to-frame map the downstream mixer composites every video period.

pub mod config;
pub mod consumer;
pub mod deferred;
pub mod error;
pub mod executor;
pub mod interaction;
pub mod layer;
pub mod monitor;
pub mod producer;
pub mod stage;
pub mod transform;
pub mod tween;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::StageConfig;
pub use consumer::{ConsumerHandle, FrameConsumer, RouteMode, RouteToken};
pub use deferred::DeferredStage;
pub use error::{StageError, StageResult};
pub use executor::{CompletionHandle, Executor, TaskPriority};
pub use interaction::InteractionEvent;
pub use monitor::{EventValue, MonitorEvent, MonitorSubject};
pub use producer::{EmptyProducer, FrameProducer, ProducerHandle};
pub use stage::{Stage, StageGuard, StageInfo, TransformUpdate};
pub use transform::{Ease, Transform, Vec2};
pub use tween::TweenedTransform;
pub use types::{DrawFrame, FrameContent, ImageFrame, LayerIndex, PlayState, VideoFormat};
