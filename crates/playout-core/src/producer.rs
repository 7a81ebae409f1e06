//! Frame producer seam
//!
//! Producers are the opaque sources a layer draws frames from. They are
//! shared by reference count: the foreground and background slots, and any
//! caller that obtained a handle before a promotion, all keep the producer
//! alive until the last holder releases it.

use std::sync::{Arc, OnceLock};

use crate::error::{StageError, StageResult};
use crate::interaction::InteractionEvent;
use crate::types::{DrawFrame, VideoFormat};

/// Shared handle to a producer
pub type ProducerHandle = Arc<dyn FrameProducer>;

/// A source that yields one frame per render tick.
///
/// `receive` is expected to complete well within one video period; a
/// producer that blocks longer stalls its whole channel. Implementations
/// manage their own interior state, so all methods take `&self`.
pub trait FrameProducer: Send + Sync {
    /// Yield the next frame for the given format
    fn receive(&self, format: &VideoFormat) -> StageResult<DrawFrame>;

    /// Forward a command-protocol call to the producer
    fn call(&self, params: &[String]) -> StageResult<String> {
        let _ = params;
        Err(StageError::UnsupportedCall(self.name().to_string()))
    }

    /// Whether the producer's content covers the given point of its unit
    /// coordinate space, for interaction hit-testing
    fn collides(&self, x: f64, y: f64) -> bool {
        let _ = (x, y);
        false
    }

    /// Deliver a pointer event that hit this producer's content
    fn on_interaction(&self, event: &InteractionEvent) {
        let _ = event;
    }

    fn name(&self) -> &str;

    /// True only for the empty producer
    fn is_empty(&self) -> bool {
        false
    }
}

/// The producer loaded into every vacant slot; yields empty frames forever
pub struct EmptyProducer;

impl EmptyProducer {
    /// Shared handle to the process-wide empty producer
    pub fn handle() -> ProducerHandle {
        static EMPTY: OnceLock<ProducerHandle> = OnceLock::new();
        EMPTY.get_or_init(|| Arc::new(EmptyProducer)).clone()
    }
}

impl FrameProducer for EmptyProducer {
    fn receive(&self, _format: &VideoFormat) -> StageResult<DrawFrame> {
        Ok(DrawFrame::empty())
    }

    fn name(&self) -> &str {
        "empty"
    }

    fn is_empty(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_producer() {
        let producer = EmptyProducer::handle();
        assert!(producer.is_empty());
        assert!(producer.receive(&VideoFormat::pal()).unwrap().is_empty());
        assert!(!producer.collides(0.5, 0.5));
        assert!(matches!(
            producer.call(&["PLAY".to_string()]),
            Err(StageError::UnsupportedCall(_))
        ));
    }

    #[test]
    fn test_empty_handle_is_shared() {
        assert!(Arc::ptr_eq(&EmptyProducer::handle(), &EmptyProducer::handle()));
    }
}
