//! Pointer interaction buffering and hit-testing
//!
//! Events arrive from arbitrary threads through the stage's executor and
//! are buffered here. At the top of each render pass the buffer is flushed:
//! each event is hit-tested against the layers in descending index order
//! (topmost first) and delivered to the first layer whose content covers
//! the point. Events that hit nothing are dropped.

use std::collections::BTreeMap;

use crate::layer::Layer;
use crate::types::LayerIndex;

/// Pointer events buffered between ticks before the oldest are dropped
pub const DEFAULT_INTERACTION_CAPACITY: usize = 256;

/// A pointer event in normalized channel coordinates.
///
/// Coordinates are in the channel's unit space on arrival; delivery
/// translates them into the hit layer's unit space.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    PointerMoved { x: f64, y: f64 },
    PointerPressed { x: f64, y: f64, button: u8 },
    PointerReleased { x: f64, y: f64, button: u8 },
    WheelScrolled { x: f64, y: f64, delta: f64 },
}

impl InteractionEvent {
    pub fn position(&self) -> (f64, f64) {
        match *self {
            Self::PointerMoved { x, y }
            | Self::PointerPressed { x, y, .. }
            | Self::PointerReleased { x, y, .. }
            | Self::WheelScrolled { x, y, .. } => (x, y),
        }
    }

    /// The same event re-addressed to a different coordinate space
    pub fn with_position(&self, x: f64, y: f64) -> Self {
        match *self {
            Self::PointerMoved { .. } => Self::PointerMoved { x, y },
            Self::PointerPressed { button, .. } => Self::PointerPressed { x, y, button },
            Self::PointerReleased { button, .. } => Self::PointerReleased { x, y, button },
            Self::WheelScrolled { delta, .. } => Self::WheelScrolled { x, y, delta },
        }
    }
}

/// Per-stage buffer of pending pointer events
pub struct InteractionAggregator {
    buffer: Vec<InteractionEvent>,
    capacity: usize,
}

impl InteractionAggregator {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INTERACTION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::new(),
            capacity,
        }
    }

    /// Queue an event for the next flush. The oldest event is dropped once
    /// the buffer is full.
    pub fn offer(&mut self, event: InteractionEvent) {
        if self.buffer.len() >= self.capacity {
            self.buffer.remove(0);
            log::debug!("[interaction] buffer full, dropping oldest event");
        }
        self.buffer.push(event);
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Hit-test and deliver every buffered event against `layers`
    pub fn flush(&mut self, layers: &BTreeMap<LayerIndex, Layer>) {
        for event in self.buffer.drain(..) {
            let (x, y) = event.position();
            // Topmost layer first.
            for layer in layers.values().rev() {
                let transform = layer.tween().fetch();
                let Some((lx, ly)) = transform.invert_point(x, y) else {
                    continue;
                };
                if (0.0..=1.0).contains(&lx)
                    && (0.0..=1.0).contains(&ly)
                    && layer.collides(lx, ly)
                {
                    layer.on_interaction(&event.with_position(lx, ly));
                    break;
                }
            }
        }
    }
}

impl Default for InteractionAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_and_retarget() {
        let event = InteractionEvent::PointerPressed {
            x: 0.5,
            y: 0.25,
            button: 0,
        };
        assert_eq!(event.position(), (0.5, 0.25));
        assert_eq!(
            event.with_position(0.1, 0.2),
            InteractionEvent::PointerPressed {
                x: 0.1,
                y: 0.2,
                button: 0
            }
        );
    }

    #[test]
    fn test_offer_drops_oldest_beyond_capacity() {
        let mut aggregator = InteractionAggregator::with_capacity(2);
        aggregator.offer(InteractionEvent::PointerMoved { x: 0.1, y: 0.0 });
        aggregator.offer(InteractionEvent::PointerMoved { x: 0.2, y: 0.0 });
        aggregator.offer(InteractionEvent::PointerMoved { x: 0.3, y: 0.0 });
        assert_eq!(aggregator.pending(), 2);
        assert_eq!(aggregator.buffer[0].position().0, 0.2);
    }

    #[test]
    fn test_flush_without_layers_drops_events() {
        let mut aggregator = InteractionAggregator::new();
        aggregator.offer(InteractionEvent::PointerMoved { x: 0.5, y: 0.5 });
        aggregator.flush(&BTreeMap::new());
        assert_eq!(aggregator.pending(), 0);
    }
}
