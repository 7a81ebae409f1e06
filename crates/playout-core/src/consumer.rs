//! Route consumer seam
//!
//! Routes tap a layer's output and copy frames to side-channel consumers.
//! A consumer is shared between the route table and any in-flight send.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::StageResult;
use crate::types::DrawFrame;

/// Shared handle to a route consumer
pub type ConsumerHandle = Arc<dyn FrameConsumer>;

/// An opaque sink receiving a copy of a layer's frame each tick
pub trait FrameConsumer: Send + Sync {
    /// Deliver one frame. Failures are logged by the render pass and do
    /// not abort the tick.
    fn send(&self, frame: DrawFrame) -> StageResult<()>;

    fn name(&self) -> &str {
        "consumer"
    }
}

/// Which of the layer's frames a route receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMode {
    /// The raw foreground frame, before the stage's own transform
    Foreground,
    /// A frame drawn from the background producer
    Background,
    /// The background frame while a background is staged, else foreground
    NextProducer,
}

/// Caller-supplied identity for a route, used to remove it again.
///
/// Tokens compare and hash by identity; two calls to [`RouteToken::new`]
/// never produce equal tokens, while clones of one token stay equal.
#[derive(Clone)]
pub struct RouteToken(Arc<()>);

impl RouteToken {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Arc::new(()))
    }
}

impl PartialEq for RouteToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RouteToken {}

impl Hash for RouteToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl std::fmt::Debug for RouteToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RouteToken({:p})", Arc::as_ptr(&self.0))
    }
}

/// One attached route: its mode and its sink
#[derive(Clone)]
pub struct RouteEntry {
    pub mode: RouteMode,
    pub consumer: ConsumerHandle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_tokens_compare_by_identity() {
        let a = RouteToken::new();
        let b = RouteToken::new();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_token_as_map_key() {
        let token = RouteToken::new();
        let mut map = HashMap::new();
        map.insert(token.clone(), 1);
        assert_eq!(map.remove(&token), Some(1));
        assert!(map.is_empty());
    }
}
