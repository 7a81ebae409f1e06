//! Layer - one slot of a stage's composition
//!
//! A layer holds the currently-playing foreground producer, an optionally
//! staged background producer, the playback state machine, and the tween
//! animating its transform. All mutation happens on the owning stage's
//! executor.

use std::time::Instant;

use crate::interaction::InteractionEvent;
use crate::monitor::MonitorSubject;
use crate::producer::{EmptyProducer, ProducerHandle};
use crate::tween::TweenedTransform;
use crate::types::{DrawFrame, LayerIndex, PlayState, VideoFormat};

pub struct Layer {
    index: LayerIndex,
    foreground: ProducerHandle,
    background: ProducerHandle,
    play_state: PlayState,
    /// Remaining ticks until a staged load promotes itself
    auto_play: Option<u32>,
    tween: TweenedTransform,
    /// Frame repeated while paused, or held after a preview pull
    held_frame: DrawFrame,
    /// One frame is pulled on the next receive after a preview
    preview_pending: bool,
    /// When the foreground last produced a frame
    last_frame_at: Option<Instant>,
    monitor: MonitorSubject,
}

impl Layer {
    pub fn new(index: LayerIndex) -> Self {
        Self {
            index,
            foreground: EmptyProducer::handle(),
            background: EmptyProducer::handle(),
            play_state: PlayState::Stopped,
            auto_play: None,
            tween: TweenedTransform::default(),
            held_frame: DrawFrame::empty(),
            preview_pending: false,
            last_frame_at: None,
            monitor: MonitorSubject::new(format!("/layer/{index}")),
        }
    }

    /// Stage a producer. With `preview` it is promoted immediately and one
    /// frame is pulled on the next tick; with `auto_play` the promotion
    /// fires by itself after that many ticks.
    pub fn load(&mut self, producer: ProducerHandle, preview: bool, auto_play: Option<u32>) {
        self.background = producer;
        self.auto_play = auto_play;
        if preview {
            self.preview();
        }
    }

    /// Promote the staged background, discarding the prior foreground, and
    /// start playing. Without a staged background this resumes the current
    /// foreground; an empty slot stays stopped.
    pub fn play(&mut self) {
        if !self.background.is_empty() {
            self.foreground = std::mem::replace(&mut self.background, EmptyProducer::handle());
            self.held_frame = DrawFrame::empty();
            self.preview_pending = false;
            self.last_frame_at = None;
            self.auto_play = None;
        }
        // A layer is never Playing without a foreground producer.
        if self.foreground.is_empty() {
            self.play_state = PlayState::Stopped;
            return;
        }
        self.play_state = PlayState::Playing;
    }

    /// Promote the staged background and hold on its first frame
    pub fn preview(&mut self) {
        if !self.background.is_empty() {
            self.foreground = std::mem::replace(&mut self.background, EmptyProducer::handle());
        }
        self.play_state = PlayState::Stopped;
        self.held_frame = DrawFrame::empty();
        self.preview_pending = true;
        self.auto_play = None;
    }

    pub fn pause(&mut self) {
        if self.play_state == PlayState::Playing {
            self.play_state = PlayState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.play_state == PlayState::Paused {
            self.play_state = PlayState::Playing;
        }
    }

    /// Stop advancing and yield empty frames. The foreground is retained.
    pub fn stop(&mut self) {
        self.play_state = PlayState::Stopped;
        self.held_frame = DrawFrame::empty();
        self.preview_pending = false;
        self.auto_play = None;
    }

    /// Produce this tick's frame pair: the raw frame for route fan-out and
    /// the transformed frame for the mixer. Advances the tween once.
    pub fn receive(&mut self, format: &VideoFormat) -> (DrawFrame, DrawFrame) {
        if let Some(remaining) = self.auto_play {
            if remaining == 0 {
                self.auto_play = None;
                self.play();
            } else {
                self.auto_play = Some(remaining - 1);
            }
        }

        let transform = self.tween.fetch_advance();

        let raw = match self.play_state {
            PlayState::Playing => match self.foreground.receive(format) {
                Ok(frame) => {
                    self.held_frame = frame.clone();
                    self.last_frame_at = Some(Instant::now());
                    frame
                }
                Err(err) => {
                    log::warn!(
                        "[layer {}] producer `{}` failed: {err}",
                        self.index,
                        self.foreground.name()
                    );
                    self.monitor
                        .post("/event/error", vec![err.to_string().into()]);
                    DrawFrame::empty()
                }
            },
            PlayState::Paused => self.held_frame.clone(),
            PlayState::Stopped => {
                if self.preview_pending {
                    self.preview_pending = false;
                    match self.foreground.receive(format) {
                        Ok(frame) => {
                            self.held_frame = frame;
                            self.last_frame_at = Some(Instant::now());
                        }
                        Err(err) => {
                            log::warn!(
                                "[layer {}] preview pull from `{}` failed: {err}",
                                self.index,
                                self.foreground.name()
                            );
                            self.monitor
                                .post("/event/error", vec![err.to_string().into()]);
                        }
                    }
                }
                self.held_frame.clone()
            }
        };

        let transformed = raw.clone().with_transform(transform);
        (raw, transformed)
    }

    /// Draw a frame from the staged background for background-mode routes
    pub fn receive_background(&mut self, format: &VideoFormat) -> DrawFrame {
        if self.background.is_empty() {
            return DrawFrame::empty();
        }
        match self.background.receive(format) {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!(
                    "[layer {}] background producer `{}` failed: {err}",
                    self.index,
                    self.background.name()
                );
                DrawFrame::empty()
            }
        }
    }

    pub fn has_background(&self) -> bool {
        !self.background.is_empty()
    }

    pub fn foreground(&self) -> ProducerHandle {
        self.foreground.clone()
    }

    pub fn background(&self) -> ProducerHandle {
        self.background.clone()
    }

    pub fn play_state(&self) -> PlayState {
        self.play_state
    }

    pub fn auto_play_remaining(&self) -> Option<u32> {
        self.auto_play
    }

    pub fn tween(&self) -> &TweenedTransform {
        &self.tween
    }

    pub fn tween_mut(&mut self) -> &mut TweenedTransform {
        &mut self.tween
    }

    pub fn set_tween(&mut self, tween: TweenedTransform) {
        self.tween = tween;
    }

    /// Milliseconds since the foreground last produced a frame
    pub fn frame_age_millis(&self) -> Option<u64> {
        self.last_frame_at
            .map(|at| u64::try_from(at.elapsed().as_millis()).unwrap_or(u64::MAX))
    }

    pub fn collides(&self, x: f64, y: f64) -> bool {
        self.foreground.collides(x, y)
    }

    pub fn on_interaction(&self, event: &InteractionEvent) {
        self.foreground.on_interaction(event);
    }

    pub fn monitor_output(&self) -> &MonitorSubject {
        &self.monitor
    }
}
