//! Stage - the per-channel compositing coordinator
//!
//! A stage owns the sparse layer table for one output channel and ties
//! together the command executor, the per-tick render pass, the route
//! table, and the interaction aggregator. External commands arrive on
//! arbitrary threads and are serialized onto the stage's single worker;
//! the render pass runs there too at the higher priority band, so a tick
//! always sees a consistent snapshot of layer state.

use parking_lot::{Mutex, MutexGuard};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crate::config::StageConfig;
use crate::consumer::{ConsumerHandle, RouteEntry, RouteMode, RouteToken};
use crate::error::StageResult;
use crate::executor::{CompletionHandle, Executor, TaskPriority};
use crate::interaction::{InteractionAggregator, InteractionEvent};
use crate::layer::Layer;
use crate::monitor::MonitorSubject;
use crate::producer::ProducerHandle;
use crate::transform::{Ease, Transform};
use crate::tween::TweenedTransform;
use crate::types::{DrawFrame, LayerIndex, PlayState, VideoFormat};

/// Transform update callback; the returned transform becomes the tween's
/// new destination.
pub type TransformFn = Box<dyn FnOnce(Transform) -> StageResult<Transform> + Send>;

/// One entry of an atomically-applied transform batch
pub struct TransformUpdate {
    pub index: LayerIndex,
    pub transform: TransformFn,
    pub duration_frames: u32,
    pub easing: Ease,
}

/// Snapshot of one layer for `info`
#[derive(Debug, Clone, Serialize)]
pub struct LayerInfo {
    pub index: LayerIndex,
    pub foreground: String,
    pub background: String,
    pub play_state: PlayState,
    pub auto_play_remaining: Option<u32>,
}

/// Snapshot of the whole stage for `info`
#[derive(Debug, Clone, Serialize)]
pub struct StageInfo {
    pub channel_index: usize,
    pub layers: Vec<LayerInfo>,
}

/// Per-layer frame-age report for `delay_info`
#[derive(Debug, Clone, Serialize)]
pub struct LayerDelayInfo {
    pub index: LayerIndex,
    pub foreground: String,
    /// Milliseconds since the foreground last produced a frame
    pub frame_age_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageDelayInfo {
    pub channel_index: usize,
    pub layers: Vec<LayerDelayInfo>,
}

type RouteMap = HashMap<RouteToken, RouteEntry>;

struct StageState {
    layers: BTreeMap<LayerIndex, Layer>,
    /// A layer index may carry routes without existing in `layers`; such
    /// route-only layers still appear in the per-tick output as empty.
    routes: BTreeMap<LayerIndex, RouteMap>,
    aggregator: InteractionAggregator,
}

struct StageInner {
    channel_index: usize,
    monitor: MonitorSubject,
    state: Mutex<StageState>,
    executor: Executor,
}

/// The per-channel compositing stage. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Stage {
    inner: Arc<StageInner>,
}

impl Stage {
    /// Channel indices must be distinct across live stages; the
    /// cross-stage swap rendezvous orders executors by them.
    pub fn new(channel_index: usize) -> Self {
        Self::with_config(channel_index, StageConfig::default())
    }

    pub fn with_config(channel_index: usize, config: StageConfig) -> Self {
        Self {
            inner: Arc::new(StageInner {
                channel_index,
                monitor: MonitorSubject::with_capacity("", config.monitor_capacity),
                state: Mutex::new(StageState {
                    layers: BTreeMap::new(),
                    routes: BTreeMap::new(),
                    aggregator: InteractionAggregator::with_capacity(config.interaction_capacity),
                }),
                executor: Executor::new(format!("stage-{channel_index}")),
            }),
        }
    }

    pub fn channel_index(&self) -> usize {
        self.inner.channel_index
    }

    /// The stage's event sink; subscribe here for monitor events
    pub fn monitor_output(&self) -> &MonitorSubject {
        &self.inner.monitor
    }

    // ─── Layer commands ──────────────────────────────────────────────

    /// Stage `producer` on layer `index`. With `preview` the first frame is
    /// shown immediately; with `auto_play` playback starts by itself after
    /// that many ticks.
    pub fn load(
        &self,
        index: LayerIndex,
        producer: ProducerHandle,
        preview: bool,
        auto_play: Option<u32>,
    ) -> CompletionHandle<()> {
        self.inner
            .monitor
            .post(&format!("/layer/{index}/event/load"), vec![true.into()]);
        self.schedule(move |state, inner| {
            get_layer(state, &inner.monitor, index).load(producer, preview, auto_play);
            Ok(())
        })
    }

    pub fn play(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.inner
            .monitor
            .post(&format!("/layer/{index}/event/play"), vec![true.into()]);
        self.schedule(move |state, inner| {
            get_layer(state, &inner.monitor, index).play();
            Ok(())
        })
    }

    pub fn preview(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.schedule(move |state, inner| {
            get_layer(state, &inner.monitor, index).preview();
            Ok(())
        })
    }

    pub fn pause(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.inner
            .monitor
            .post(&format!("/layer/{index}/event/pause"), vec![true.into()]);
        self.schedule(move |state, inner| {
            get_layer(state, &inner.monitor, index).pause();
            Ok(())
        })
    }

    pub fn resume(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.inner
            .monitor
            .post(&format!("/layer/{index}/event/resume"), vec![true.into()]);
        self.schedule(move |state, inner| {
            get_layer(state, &inner.monitor, index).resume();
            Ok(())
        })
    }

    pub fn stop(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.inner
            .monitor
            .post(&format!("/layer/{index}/event/stop"), vec![true.into()]);
        self.schedule(move |state, inner| {
            get_layer(state, &inner.monitor, index).stop();
            Ok(())
        })
    }

    /// Remove the layer at `index`. Routes attached to the index survive.
    pub fn clear(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.inner
            .monitor
            .post(&format!("/layer/{index}/event/clear"), vec![true.into()]);
        self.schedule(move |state, _| {
            state.layers.remove(&index);
            Ok(())
        })
    }

    /// Remove every layer. Routes survive.
    pub fn clear_all(&self) -> CompletionHandle<()> {
        self.inner.monitor.post("/event/clear", vec![true.into()]);
        self.schedule(move |state, _| {
            state.layers.clear();
            Ok(())
        })
    }

    // ─── Transforms ──────────────────────────────────────────────────

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
        self.schedule(move |state, inner| {
            let layer = get_layer(state, &inner.monitor, index);
            let source = layer.tween().fetch();
            let destination = transform(layer.tween().destination())?;
            layer.set_tween(TweenedTransform::new(
                source,
                destination,
                duration_frames,
                easing,
            ));
            Ok(())
        })
    }

    /// Apply a batch of transform updates as one executor task, so no tick
    /// observes the batch half-applied. An error aborts the remainder.
    pub fn apply_transforms(&self, updates: Vec<TransformUpdate>) -> CompletionHandle<()> {
        self.schedule(move |state, inner| {
            for update in updates {
                let layer = get_layer(state, &inner.monitor, update.index);
                let source = layer.tween().fetch();
                let destination = (update.transform)(layer.tween().destination())?;
                layer.set_tween(TweenedTransform::new(
                    source,
                    destination,
                    update.duration_frames,
                    update.easing,
                ));
            }
            Ok(())
        })
    }

    pub fn clear_transforms(&self, index: LayerIndex) -> CompletionHandle<()> {
        self.schedule(move |state, inner| {
            get_layer(state, &inner.monitor, index).set_tween(TweenedTransform::default());
            Ok(())
        })
    }

    pub fn clear_all_transforms(&self) -> CompletionHandle<()> {
        self.schedule(move |state, _| {
            for layer in state.layers.values_mut() {
                layer.set_tween(TweenedTransform::default());
            }
            Ok(())
        })
    }

    /// The transform a tick would currently see; does not advance the tween
    pub fn get_current_transform(&self, index: LayerIndex) -> CompletionHandle<Transform> {
        self.schedule(move |state, inner| {
            Ok(get_layer(state, &inner.monitor, index).tween().fetch())
        })
    }

    // ─── Producer access ─────────────────────────────────────────────

    pub fn foreground(&self, index: LayerIndex) -> CompletionHandle<ProducerHandle> {
        self.schedule(move |state, inner| Ok(get_layer(state, &inner.monitor, index).foreground()))
    }

    pub fn background(&self, index: LayerIndex) -> CompletionHandle<ProducerHandle> {
        self.schedule(move |state, inner| Ok(get_layer(state, &inner.monitor, index).background()))
    }

    /// Forward `params` to the foreground producer's call capability
    pub fn call(&self, index: LayerIndex, params: Vec<String>) -> CompletionHandle<String> {
        self.schedule(move |state, inner| {
            let producer = get_layer(state, &inner.monitor, index).foreground();
            producer.call(&params)
        })
    }

    // ─── Info ────────────────────────────────────────────────────────

    pub fn info(&self) -> CompletionHandle<StageInfo> {
        let channel_index = self.inner.channel_index;
        self.schedule(move |state, _| {
            Ok(StageInfo {
                channel_index,
                layers: state
                    .layers
                    .iter()
                    .map(|(index, layer)| layer_info(*index, layer))
                    .collect(),
            })
        })
    }

    pub fn layer_info(&self, index: LayerIndex) -> CompletionHandle<LayerInfo> {
        self.schedule(move |state, inner| {
            Ok(layer_info(index, get_layer(state, &inner.monitor, index)))
        })
    }

    pub fn delay_info(&self) -> CompletionHandle<StageDelayInfo> {
        let channel_index = self.inner.channel_index;
        self.schedule(move |state, _| {
            Ok(StageDelayInfo {
                channel_index,
                layers: state
                    .layers
                    .iter()
                    .map(|(index, layer)| layer_delay_info(*index, layer))
                    .collect(),
            })
        })
    }

    pub fn layer_delay_info(&self, index: LayerIndex) -> CompletionHandle<LayerDelayInfo> {
        self.schedule(move |state, inner| {
            Ok(layer_delay_info(index, get_layer(state, &inner.monitor, index)))
        })
    }

    // ─── Routes ──────────────────────────────────────────────────────

    /// Attach a side-channel consumer to `index`. The handle may be
    /// dropped; await it to order the route against a subsequent render.
    pub fn add_route(
        &self,
        token: RouteToken,
        index: LayerIndex,
        mode: RouteMode,
        consumer: ConsumerHandle,
    ) -> CompletionHandle<()> {
        let handle = self.schedule(move |state, _| {
            state
                .routes
                .entry(index)
                .or_default()
                .insert(token, RouteEntry { mode, consumer });
            Ok(())
        });
        self.inner.monitor.post("/event/add", vec![true.into()]);
        handle
    }

    /// Remove the route identified by `token`. Idempotent.
    pub fn remove_route(&self, token: RouteToken, index: LayerIndex) -> CompletionHandle<()> {
        let handle = self.schedule(move |state, _| {
            if let Some(entries) = state.routes.get_mut(&index) {
                entries.remove(&token);
                if entries.is_empty() {
                    state.routes.remove(&index);
                }
            }
            Ok(())
        });
        self.inner.monitor.post("/event/remove", vec![true.into()]);
        handle
    }

    // ─── Interaction ─────────────────────────────────────────────────

    /// Queue a pointer event for hit-testing at the next tick
    pub fn on_interaction(&self, event: InteractionEvent) {
        let _ = self.schedule(move |state, _| {
            state.aggregator.offer(event);
            Ok(())
        });
    }

    // ─── Swaps ───────────────────────────────────────────────────────

    /// Swap the entire layer tables of two stages. With
    /// `swap_transforms = false` the tweens stay with their index.
    pub fn swap_layers(&self, other: &Stage, swap_transforms: bool) -> CompletionHandle<()> {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return CompletionHandle::ready(Ok(()));
        }
        self.inner.monitor.post("/event/swap", vec![true.into()]);

        let a = self.inner.clone();
        let b = other.inner.clone();
        self.invoke_both(other, move || {
            let (mut state_a, mut state_b) = lock_both(&a, &b);

            for layer in state_a.layers.values() {
                layer.monitor_output().detach_parent();
            }
            for layer in state_b.layers.values() {
                layer.monitor_output().detach_parent();
            }

            mem::swap(&mut state_a.layers, &mut state_b.layers);

            for layer in state_a.layers.values() {
                layer.monitor_output().attach_parent(&a.monitor);
            }
            for layer in state_b.layers.values() {
                layer.monitor_output().attach_parent(&b.monitor);
            }

            if !swap_transforms {
                // Tweens belong to the index, not the content.
                let indices: BTreeSet<LayerIndex> = state_a
                    .layers
                    .keys()
                    .chain(state_b.layers.keys())
                    .copied()
                    .collect();
                for index in indices {
                    let layer_a = get_layer(&mut state_a, &a.monitor, index);
                    let layer_b = get_layer(&mut state_b, &b.monitor, index);
                    mem::swap(layer_a.tween_mut(), layer_b.tween_mut());
                }
            }
            Ok(())
        })
    }

    /// Swap two layers of this stage in place
    pub fn swap_layer(
        &self,
        index: LayerIndex,
        other_index: LayerIndex,
        swap_transforms: bool,
    ) -> CompletionHandle<()> {
        self.inner.monitor.post(
            &format!("/layer/{index}/event/swap"),
            vec![index.into(), other_index.into()],
        );
        if index == other_index {
            return CompletionHandle::ready(Ok(()));
        }
        self.schedule(move |state, inner| {
            let mut layer_a = take_or_create(state, &inner.monitor, index);
            let mut layer_b = take_or_create(state, &inner.monitor, other_index);
            if !swap_transforms {
                mem::swap(layer_a.tween_mut(), layer_b.tween_mut());
            }
            state.layers.insert(index, layer_b);
            state.layers.insert(other_index, layer_a);
            Ok(())
        })
    }

    /// Swap one layer between two stages. The moved layers' event sinks
    /// are reparented to the stage that receives them.
    pub fn swap_layer_with(
        &self,
        other: &Stage,
        index: LayerIndex,
        other_index: LayerIndex,
        swap_transforms: bool,
    ) -> CompletionHandle<()> {
        // Delegation posts the intra-stage event itself.
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return self.swap_layer(index, other_index, swap_transforms);
        }
        self.inner.monitor.post(
            &format!("/layer/{index}/event/swaptransforms"),
            vec![index.into(), other_index.into()],
        );

        let a = self.inner.clone();
        let b = other.inner.clone();
        self.invoke_both(other, move || {
            let (mut state_a, mut state_b) = lock_both(&a, &b);
            let mut layer_a = take_or_create(&mut state_a, &a.monitor, index);
            let mut layer_b = take_or_create(&mut state_b, &b.monitor, other_index);

            layer_a.monitor_output().detach_parent();
            layer_b.monitor_output().detach_parent();

            if !swap_transforms {
                mem::swap(layer_a.tween_mut(), layer_b.tween_mut());
            }

            layer_a.monitor_output().attach_parent(&b.monitor);
            layer_b.monitor_output().attach_parent(&a.monitor);

            state_a.layers.insert(index, layer_b);
            state_b.layers.insert(other_index, layer_a);
            Ok(())
        })
    }

    /// Rendezvous two executors without a third synchronization domain:
    /// the lower-indexed executor parks inside a blocking invoke while the
    /// fused task runs on the higher one. The deterministic global order
    /// keeps opposing cross-stage swaps deadlock-free.
    fn invoke_both(
        &self,
        other: &Stage,
        func: impl FnOnce() -> StageResult<()> + Send + 'static,
    ) -> CompletionHandle<()> {
        if other.inner.channel_index < self.inner.channel_index {
            let inner = self.inner.clone();
            other
                .inner
                .executor
                .submit(TaskPriority::High, move || {
                    inner.executor.invoke(TaskPriority::High, func)
                })
        } else {
            let other_inner = other.inner.clone();
            self.inner.executor.submit(TaskPriority::High, move || {
                other_inner.executor.invoke(TaskPriority::High, func)
            })
        }
    }

    // ─── Render pass ─────────────────────────────────────────────────

    /// Produce one tick: drive every active layer, fan frames out to the
    /// attached routes, and return the per-index map for the mixer.
    pub fn render(
        &self,
        format: &VideoFormat,
    ) -> StageResult<BTreeMap<LayerIndex, DrawFrame>> {
        let timer = Instant::now();
        let inner = self.inner.clone();
        let tick_format = format.clone();
        let frames = self.inner.executor.invoke(TaskPriority::Higher, move || {
            let mut state = inner.state.lock();
            Ok(render_pass(&mut state, &tick_format))
        })?;

        let elapsed = timer.elapsed().as_secs_f64();
        let period = format.frame_period().as_secs_f64();
        self.inner
            .monitor
            .post("/profiler/time", vec![elapsed.into(), period.into()]);
        self.inner.monitor.post(
            "/profiler/produce-time",
            vec![(elapsed / period * 0.5).into()],
        );
        if elapsed > period {
            log::warn!(
                "[stage {}] performance warning, produce blocked for {:.1} ms (period {:.1} ms)",
                self.inner.channel_index,
                elapsed * 1e3,
                period * 1e3
            );
        }

        Ok(frames)
    }

    // ─── Off-executor access ─────────────────────────────────────────

    /// Pin the stage for coherent off-executor reads. Executor tasks that
    /// touch layer state block while the guard is held, so keep it short,
    /// and never acquire another stage's guard while holding one.
    pub fn lock(&self) -> StageGuard<'_> {
        StageGuard {
            state: self.inner.state.lock(),
        }
    }

    fn schedule<T, F>(&self, task: F) -> CompletionHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut StageState, &StageInner) -> StageResult<T> + Send + 'static,
    {
        let inner = self.inner.clone();
        self.inner.executor.submit(TaskPriority::High, move || {
            let mut state = inner.state.lock();
            task(&mut *state, &inner)
        })
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("channel_index", &self.inner.channel_index)
            .finish_non_exhaustive()
    }
}

/// Scoped read access to a pinned stage
pub struct StageGuard<'a> {
    state: MutexGuard<'a, StageState>,
}

impl StageGuard<'_> {
    pub fn layer_indices(&self) -> Vec<LayerIndex> {
        self.state.layers.keys().copied().collect()
    }

    pub fn play_state(&self, index: LayerIndex) -> Option<PlayState> {
        self.state.layers.get(&index).map(|layer| layer.play_state())
    }

    pub fn current_transform(&self, index: LayerIndex) -> Option<Transform> {
        self.state
            .layers
            .get(&index)
            .map(|layer| layer.tween().fetch())
    }

    pub fn has_background(&self, index: LayerIndex) -> bool {
        self.state
            .layers
            .get(&index)
            .is_some_and(|layer| layer.has_background())
    }

    pub fn route_count(&self, index: LayerIndex) -> usize {
        self.state.routes.get(&index).map_or(0, |entries| entries.len())
    }
}

fn layer_info(index: LayerIndex, layer: &Layer) -> LayerInfo {
    LayerInfo {
        index,
        foreground: layer.foreground().name().to_string(),
        background: layer.background().name().to_string(),
        play_state: layer.play_state(),
        auto_play_remaining: layer.auto_play_remaining(),
    }
}

fn layer_delay_info(index: LayerIndex, layer: &Layer) -> LayerDelayInfo {
    LayerDelayInfo {
        index,
        foreground: layer.foreground().name().to_string(),
        frame_age_ms: layer.frame_age_millis(),
    }
}

fn get_layer<'a>(
    state: &'a mut StageState,
    monitor: &MonitorSubject,
    index: LayerIndex,
) -> &'a mut Layer {
    state.layers.entry(index).or_insert_with(|| {
        let layer = Layer::new(index);
        layer.monitor_output().attach_parent(monitor);
        layer
    })
}

fn take_or_create(state: &mut StageState, monitor: &MonitorSubject, index: LayerIndex) -> Layer {
    state.layers.remove(&index).unwrap_or_else(|| {
        let layer = Layer::new(index);
        layer.monitor_output().attach_parent(monitor);
        layer
    })
}

fn lock_both<'a>(
    a: &'a StageInner,
    b: &'a StageInner,
) -> (MutexGuard<'a, StageState>, MutexGuard<'a, StageState>) {
    if a.channel_index <= b.channel_index {
        let guard_a = a.state.lock();
        let guard_b = b.state.lock();
        (guard_a, guard_b)
    } else {
        let guard_b = b.state.lock();
        let guard_a = a.state.lock();
        (guard_a, guard_b)
    }
}

struct RenderJob<'a> {
    index: LayerIndex,
    layer: Option<&'a mut Layer>,
    routes: Option<&'a RouteMap>,
}

fn render_pass(state: &mut StageState, format: &VideoFormat) -> BTreeMap<LayerIndex, DrawFrame> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let StageState {
            layers,
            routes,
            aggregator,
        } = state;

        // Active indices: every layer plus every index with routes. Seeding
        // the map up front keeps the parallel writes on distinct keys.
        let mut output: BTreeMap<LayerIndex, DrawFrame> = BTreeMap::new();
        for index in layers.keys() {
            output.insert(*index, DrawFrame::empty());
        }
        for (index, entries) in routes.iter() {
            if !entries.is_empty() {
                output.entry(*index).or_insert_with(DrawFrame::empty);
            }
        }

        aggregator.flush(layers);

        let route_only: Vec<LayerIndex> = routes
            .iter()
            .filter(|(index, entries)| !entries.is_empty() && !layers.contains_key(*index))
            .map(|(index, _)| *index)
            .collect();

        let mut jobs: Vec<RenderJob<'_>> = layers
            .iter_mut()
            .map(|(index, layer)| RenderJob {
                index: *index,
                layer: Some(layer),
                routes: routes.get(index),
            })
            .collect();
        for index in route_only {
            jobs.push(RenderJob {
                index,
                layer: None,
                routes: routes.get(&index),
            });
        }

        let rendered: Vec<(LayerIndex, DrawFrame)> = jobs
            .into_par_iter()
            .map(|job| {
                let index = job.index;
                (index, render_layer(job, format))
            })
            .collect();

        for (index, frame) in rendered {
            output.insert(index, frame);
        }
        output
    }));

    match result {
        Ok(output) => output,
        Err(_) => {
            // Safety net: one wedged layer must not keep missing the frame
            // deadline for the whole channel.
            state.layers.clear();
            log::error!("render pass panicked; layer table cleared");
            BTreeMap::new()
        }
    }
}

fn render_layer(job: RenderJob<'_>, format: &VideoFormat) -> DrawFrame {
    let RenderJob {
        index,
        mut layer,
        routes,
    } = job;

    let (raw, transformed) = match layer.as_deref_mut() {
        Some(layer) => layer.receive(format),
        None => (DrawFrame::empty(), DrawFrame::empty()),
    };

    if let Some(entries) = routes {
        if !entries.is_empty() {
            let any_background = entries
                .values()
                .any(|entry| entry.mode != RouteMode::Foreground);
            let (background_frame, has_background) = match (any_background, layer) {
                (true, Some(layer)) => (layer.receive_background(format), layer.has_background()),
                _ => (DrawFrame::empty(), false),
            };

            let entries: Vec<&RouteEntry> = entries.values().collect();
            entries.into_par_iter().for_each(|entry| {
                let frame = if entry.mode == RouteMode::Background
                    || (entry.mode == RouteMode::NextProducer && has_background)
                {
                    background_frame.clone()
                } else {
                    raw.clone()
                };
                if let Err(err) = entry.consumer.send(frame) {
                    log::warn!(
                        "[route] consumer `{}` failed on layer {index}: {err}",
                        entry.consumer.name()
                    );
                }
            });
        }
    }

    transformed
}
