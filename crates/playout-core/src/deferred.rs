//! Batch-deferred stage facade
//!
//! Presents the stage's command surface but records every command onto a
//! private executor whose first task blocks on a latch. Releasing the latch
//! replays the recorded commands against the live stage in submission
//! order, so a batch of commands lands between two ticks as one unit.
//! Dropping an unreleased facade releases the latch too; recorded commands
//! still replay while its executor drains.

use crate::executor::{CompletionHandle, Executor, TaskPriority};
use crate::producer::ProducerHandle;
use crate::stage::{LayerDelayInfo, LayerInfo, Stage, StageDelayInfo, StageInfo, TransformUpdate};
use crate::transform::{Ease, Transform};
use crate::types::LayerIndex;

use crate::error::StageResult;

pub struct DeferredStage {
    stage: Stage,
    // Declared ahead of the executor: dropping the sender unblocks the
    // latch task before the executor joins its worker.
    latch: flume::Sender<()>,
    executor: Executor,
}

impl DeferredStage {
    pub fn new(stage: &Stage, index: usize) -> Self {
        let executor = Executor::new(format!("batch-stage-{index}"));
        let (latch_tx, latch_rx) = flume::bounded::<()>(1);
        let _ = executor.submit(TaskPriority::High, move || {
            let _ = latch_rx.recv();
            Ok(())
        });
        Self {
            stage: stage.clone(),
            latch: latch_tx,
            executor,
        }
    }

    /// Release the latch and let the recorded commands replay. Idempotent.
    pub fn release(&self) {
        let _ = self.latch.try_send(());
    }

    fn record<T, F>(&self, command: F) -> CompletionHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&Stage) -> CompletionHandle<T> + Send + 'static,
    {
        let stage = self.stage.clone();
        self.executor
            .submit(TaskPriority::High, move || command(&stage).wait())
    }

    pub fn load(
        &self,
        index: LayerIndex,
        producer: ProducerHandle,
        preview: bool,
        auto_play: Option<u32>,
    ) -> CompletionHandle<()> {
        self.record(move |stage| stage.load(index, producer, preview, auto_play))
    }

    pub fn play(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.record(move |stage| stage.play(index))
    }

    pub fn preview(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.record(move |stage| stage.preview(index))
    }

    pub fn pause(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.record(move |stage| stage.pause(index))
    }

    pub fn resume(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.record(move |stage| stage.resume(index))
    }

    pub fn stop(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.record(move |stage| stage.stop(index))
    }

    pub fn clear(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.record(move |stage| stage.clear(index))
    }

    pub fn clear_all(&self) -> CompletionHandle<()> {
        self.record(move |stage| stage.clear_all())
    }

    pub fn call(&self, index: LayerIndex, params: Vec<String>) -> CompletionHandle<String> {
        self.record(move |stage| stage.call(index, params))
    }

    pub fn apply_transform<F>(
        &self,
        index: LayerIndex,
        transform: F,
        duration_frames: u32,
        easing: Ease,
    ) -> CompletionHandle<()>
    where
        F: FnOnce(Transform) -> StageResult<Transform> + Send + 'static,
    {
        self.record(move |stage| stage.apply_transform(index, transform, duration_frames, easing))
    }

    pub fn apply_transforms(&self, updates: Vec<TransformUpdate>) -> CompletionHandle<()> {
        self.record(move |stage| stage.apply_transforms(updates))
    }

    pub fn clear_transforms(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.record(move |stage| stage.clear_transforms(index))
    }

    pub fn clear_all_transforms(&self) -> CompletionHandle<()> {
        self.record(move |stage| stage.clear_all_transforms())
    }

    pub fn get_current_transform(&self, index: LayerIndex) -> CompletionHandle<Transform> {
        self.record(move |stage| stage.get_current_transform(index))
    }

    pub fn foreground(&self, index: LayerIndex) -> CompletionHandle<ProducerHandle> {
        self.record(move |stage| stage.foreground(index))
    }

    pub fn background(&self, index: LayerIndex) -> CompletionHandle<ProducerHandle> {
        self.record(move |stage| stage.background(index))
    }

    pub fn info(&self) -> CompletionHandle<StageInfo> {
        self.record(|stage| stage.info())
    }

    pub fn layer_info(&self, index: LayerIndex) -> CompletionHandle<LayerInfo> {
        self.record(move |stage| stage.layer_info(index))
    }

    pub fn delay_info(&self) -> CompletionHandle<StageDelayInfo> {
        self.record(|stage| stage.delay_info())
    }

    pub fn layer_delay_info(&self, index: LayerIndex) -> CompletionHandle<LayerDelayInfo> {
        self.record(move |stage| stage.layer_delay_info(index))
    }

    pub fn swap_layers(&self, other: &DeferredStage, swap_transforms: bool) -> CompletionHandle<()> {
        let other_stage = other.stage.clone();
        self.record(move |stage| stage.swap_layers(&other_stage, swap_transforms))
    }

    pub fn swap_layer(
        &self,
        index: LayerIndex,
        other_index: LayerIndex,
        swap_transforms: bool,
    ) -> CompletionHandle<()> {
        self.record(move |stage| stage.swap_layer(index, other_index, swap_transforms))
    }

    pub fn swap_layer_with(
        &self,
        other: &DeferredStage,
        index: LayerIndex,
        other_index: LayerIndex,
        swap_transforms: bool,
    ) -> CompletionHandle<()> {
        // Poke the other facade's executor so its latch is observed for
        // locking before the swap is recorded on this side.
        let _ = other.executor.submit(TaskPriority::High, || Ok(()));
        let other_stage = other.stage.clone();
        self.record(move |stage| {
            stage.swap_layer_with(&other_stage, index, other_index, swap_transforms)
        })
    }
}
