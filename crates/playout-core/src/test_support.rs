//! Shared test doubles for producer and consumer seams

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use crate::consumer::FrameConsumer;
use crate::error::{StageError, StageResult};
use crate::interaction::InteractionEvent;
use crate::producer::FrameProducer;
use crate::types::{DrawFrame, ImageFrame, VideoFormat};

/// Scriptable producer: counts advances, can fail or panic on demand, and
/// records interaction delivery.
pub struct TestProducer {
    name: String,
    frames: AtomicUsize,
    fail_next: AtomicBool,
    panic_on_receive: AtomicBool,
    hit: AtomicBool,
    last_frame: Mutex<Option<DrawFrame>>,
    interactions: Mutex<Vec<InteractionEvent>>,
    receive_threads: Mutex<Vec<ThreadId>>,
}

impl TestProducer {
    pub fn arc(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            frames: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
            panic_on_receive: AtomicBool::new(false),
            hit: AtomicBool::new(true),
            last_frame: Mutex::new(None),
            interactions: Mutex::new(Vec::new()),
            receive_threads: Mutex::new(Vec::new()),
        })
    }

    pub fn frames_produced(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn fail_next_receive(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn set_panic_on_receive(&self) {
        self.panic_on_receive.store(true, Ordering::SeqCst);
    }

    /// Whether `collides` reports a hit anywhere in the unit square
    pub fn set_hit(&self, hit: bool) {
        self.hit.store(hit, Ordering::SeqCst);
    }

    pub fn last_frame(&self) -> Option<DrawFrame> {
        self.last_frame.lock().clone()
    }

    pub fn interactions(&self) -> Vec<InteractionEvent> {
        self.interactions.lock().clone()
    }

    pub fn receive_threads(&self) -> Vec<ThreadId> {
        self.receive_threads.lock().clone()
    }
}

impl FrameProducer for TestProducer {
    fn receive(&self, format: &VideoFormat) -> StageResult<DrawFrame> {
        self.receive_threads.lock().push(thread::current().id());
        if self.panic_on_receive.load(Ordering::SeqCst) {
            panic!("test producer `{}` panicked in receive", self.name);
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StageError::producer(&self.name, "synthetic failure"));
        }
        let n = self.frames.fetch_add(1, Ordering::SeqCst) + 1;
        let frame = DrawFrame::from_image(Arc::new(ImageFrame {
            width: format.width,
            height: format.height,
            data: n.to_le_bytes().to_vec(),
        }));
        *self.last_frame.lock() = Some(frame.clone());
        Ok(frame)
    }

    fn call(&self, params: &[String]) -> StageResult<String> {
        Ok(format!("{}:{}", self.name, params.join(" ")))
    }

    fn collides(&self, _x: f64, _y: f64) -> bool {
        self.hit.load(Ordering::SeqCst)
    }

    fn on_interaction(&self, event: &InteractionEvent) {
        self.interactions.lock().push(event.clone());
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Consumer that records every frame it is sent
pub struct CollectingConsumer {
    name: String,
    frames: Mutex<Vec<DrawFrame>>,
    fail: AtomicBool,
}

impl CollectingConsumer {
    pub fn arc(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            frames: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        })
    }

    pub fn sent(&self) -> Vec<DrawFrame> {
        self.frames.lock().clone()
    }

    pub fn fail_sends(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

impl FrameConsumer for CollectingConsumer {
    fn send(&self, frame: DrawFrame) -> StageResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StageError::consumer(&self.name, "synthetic send failure"));
        }
        self.frames.lock().push(frame);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
