// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The graphics context and its per-context binding state.
//!
//! A [`GraphicsContext`] owns a native context and everything that must be tracked alongside
//! it:
//!
//! - the pipeline that is currently bound, and whether the last bind was graphics or compute;
//! - the stack used by the push/pop pipeline commands;
//! - a cache of the last value committed for each kind of state, so that setting a value that is
//!   already current doesn't reach the native API.
//!
//! All of this lives behind one mutex. Command buffers lock it once for their whole execution, so
//! the binding state only ever changes from the thread that is executing commands.

use crate::{
    native::{Api, NativeContext, ProgramHandle, ShaderHandle},
    pipeline::{
        compute::{ComputePipeline, ComputePipelineCreateInfo},
        graphics::{
            input_assembly::PrimitiveTopology, GraphicsPipeline, GraphicsPipelineCreateInfo,
            PipelineCreationError,
        },
        state::{StateKind, StateValue},
        PipelineBindPoint,
    },
};
use parking_lot::{Mutex, MutexGuard};
use std::{
    fmt::{Debug, Error as FmtError, Formatter},
    mem,
    num::NonZeroU64,
    sync::{Arc, Weak},
};

/// Parameters to create a new `GraphicsContext`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphicsContextCreateInfo {
    /// Whether committing a state value that is already current is skipped.
    ///
    /// Turn this off when other code changes the native state behind the context's back, or
    /// call [`GraphicsContext::invalidate_state_cache`] after such changes.
    ///
    /// The default value is `true`.
    pub elide_redundant_state: bool,

    /// Maximum depth of the pipeline stack. Pushes beyond it are dropped with a warning.
    ///
    /// The default value is `None`, meaning unlimited.
    pub max_pipeline_stack_depth: Option<usize>,

    /// A name for the context, used in log messages.
    ///
    /// The default value is `None`.
    pub label: Option<String>,

    #[cfg_attr(feature = "serde", serde(skip, default = "crate::non_exhaustive"))]
    pub _ne: crate::NonExhaustive,
}

impl Default for GraphicsContextCreateInfo {
    #[inline]
    fn default() -> Self {
        Self {
            elide_redundant_state: true,
            max_pipeline_stack_depth: None,
            label: None,
            _ne: crate::NonExhaustive(()),
        }
    }
}

/// A native graphics context, together with its binding state.
pub struct GraphicsContext {
    state: Mutex<ContextState>,
    // Objects dropped while the state was locked, deleted at the next lock.
    pending_releases: Mutex<Vec<NativeObject>>,
    api: Api,
    id: NonZeroU64,
    label: Option<String>,
}

impl GraphicsContext {
    /// Wraps `native` into a new context.
    pub fn new(
        native: impl NativeContext + 'static,
        create_info: GraphicsContextCreateInfo,
    ) -> Arc<GraphicsContext> {
        let GraphicsContextCreateInfo {
            elide_redundant_state,
            max_pipeline_stack_depth,
            label,
            _ne: _,
        } = create_info;

        let api = native.api();
        let id = Self::next_id();
        log::debug!(
            "creating {:?} graphics context {} ({})",
            api,
            id,
            label.as_deref().unwrap_or("unnamed"),
        );

        Arc::new(GraphicsContext {
            state: Mutex::new(ContextState {
                native: Box::new(native),
                elide_redundant_state,
                render_states: RenderStates::new(),
                bound_graphics: None,
                bound_compute: None,
                last_bound: PipelineBindPoint::Graphics,
                pipeline_stack: Vec::new(),
                max_pipeline_stack_depth,
                topology: PrimitiveTopology::default(),
            }),
            pending_releases: Mutex::new(Vec::new()),
            api,
            id,
            label,
        })
    }

    /// Returns the native API of this context.
    #[inline]
    pub fn api(&self) -> Api {
        self.api
    }

    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Creates a graphics pipeline, optionally deriving from a parentable `parent`.
    pub fn create_graphics_pipeline(
        self: &Arc<Self>,
        create_info: GraphicsPipelineCreateInfo,
        parent: Option<&Arc<GraphicsPipeline>>,
    ) -> Result<Arc<GraphicsPipeline>, PipelineCreationError> {
        GraphicsPipeline::new(self.clone(), create_info, parent)
    }

    /// Creates a graphics pipeline that other pipelines can derive from.
    pub fn create_parentable_graphics_pipeline(
        self: &Arc<Self>,
        create_info: GraphicsPipelineCreateInfo,
    ) -> Result<Arc<GraphicsPipeline>, PipelineCreationError> {
        GraphicsPipeline::new_parentable(self.clone(), create_info)
    }

    /// Creates a compute pipeline.
    pub fn create_compute_pipeline(
        self: &Arc<Self>,
        create_info: ComputePipelineCreateInfo,
    ) -> Result<Arc<ComputePipeline>, PipelineCreationError> {
        ComputePipeline::new(self.clone(), create_info)
    }

    /// Returns the graphics pipeline that is currently bound, if it is still alive.
    pub fn bound_graphics_pipeline(&self) -> Option<Arc<GraphicsPipeline>> {
        self.lock_state().bound_graphics()
    }

    /// Returns the compute pipeline that is currently bound, if it is still alive.
    pub fn bound_compute_pipeline(&self) -> Option<Arc<ComputePipeline>> {
        self.lock_state().bound_compute()
    }

    /// Returns whether the last pipeline bound was a graphics or a compute pipeline.
    pub fn last_bound_bind_point(&self) -> PipelineBindPoint {
        self.lock_state().last_bound
    }

    /// Returns the number of entries on the pipeline stack.
    pub fn pipeline_stack_depth(&self) -> usize {
        self.lock_state().pipeline_stack.len()
    }

    /// Forgets the cached native state. The next value committed for every kind of state reaches
    /// the native API, even if it matches what was committed before.
    pub fn invalidate_state_cache(&self) {
        self.lock_state().invalidate_state_cache();
    }

    /// Locks the binding state, first deleting any object released in the meantime.
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, ContextState> {
        let mut state = self.state.lock();
        self.process_releases(&mut state);
        state
    }

    /// Schedules a native object for deletion. The deletion happens right away unless the state
    /// is locked, in which case it happens the next time it is locked.
    pub(crate) fn release(&self, object: NativeObject) {
        self.pending_releases.lock().push(object);

        if let Some(mut state) = self.state.try_lock() {
            self.process_releases(&mut state);
        }
    }

    fn process_releases(&self, state: &mut ContextState) {
        let pending = mem::take(&mut *self.pending_releases.lock());

        for object in pending {
            match object {
                NativeObject::Shader(shader) => state.native.delete_shader(shader),
                NativeObject::Program(program) => {
                    state.render_states.forget_program(program);
                    state.native.delete_program(program);
                }
            }
        }
    }
}

crate::impl_id_counter!(GraphicsContext);

impl Debug for GraphicsContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.debug_struct("GraphicsContext")
            .field("id", &self.id)
            .field("api", &self.api)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl PartialEq for GraphicsContext {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GraphicsContext {}

/// A native object whose deletion was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NativeObject {
    Shader(ShaderHandle),
    Program(ProgramHandle),
}

/// A pipeline saved on the pipeline stack.
#[derive(Clone, Debug)]
pub(crate) enum SavedPipeline {
    Graphics(Weak<GraphicsPipeline>),
    Compute(Weak<ComputePipeline>),
}

/// The mutable state of a context. Only accessed through [`GraphicsContext::lock_state`].
pub(crate) struct ContextState {
    native: Box<dyn NativeContext>,
    elide_redundant_state: bool,
    render_states: RenderStates,
    pub(crate) bound_graphics: Option<Weak<GraphicsPipeline>>,
    pub(crate) bound_compute: Option<Weak<ComputePipeline>>,
    pub(crate) last_bound: PipelineBindPoint,
    pub(crate) pipeline_stack: Vec<Option<SavedPipeline>>,
    pub(crate) max_pipeline_stack_depth: Option<usize>,
    pub(crate) topology: PrimitiveTopology,
}

impl ContextState {
    #[inline]
    pub(crate) fn native_mut(&mut self) -> &mut dyn NativeContext {
        &mut *self.native
    }

    /// Makes `value` current, unless the cache says it already is.
    pub(crate) fn commit(&mut self, value: &StateValue) {
        if self.render_states.update(value) == StateCacherOutcome::AlreadyOk
            && self.elide_redundant_state
        {
            return;
        }

        value.apply(&mut *self.native);
    }

    pub(crate) fn invalidate_state_cache(&mut self) {
        self.render_states.invalidate();
    }

    pub(crate) fn bound_graphics(&self) -> Option<Arc<GraphicsPipeline>> {
        self.bound_graphics.as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn bound_compute(&self) -> Option<Arc<ComputePipeline>> {
        self.bound_compute.as_ref().and_then(Weak::upgrade)
    }
}

/// Outcome of a state cache update.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum StateCacherOutcome {
    /// The caller needs to perform the state change on the native context.
    NeedChange,
    /// The state change is not necessary.
    AlreadyOk,
}

/// Keeps track of the last value committed for each kind of state.
///
/// Programs are tracked by handle so that the cache doesn't keep them alive.
#[derive(Debug)]
struct RenderStates {
    // `None` if unknown, `Some(None)` if no program is current.
    program: Option<Option<ProgramHandle>>,
    values: [Option<StateValue>; StateKind::COUNT],
}

impl RenderStates {
    fn new() -> Self {
        RenderStates {
            program: None,
            values: Default::default(),
        }
    }

    fn invalidate(&mut self) {
        *self = RenderStates::new();
    }

    /// A deleted program's handle may be reused by the next program that gets linked.
    fn forget_program(&mut self, program: ProgramHandle) {
        if self.program == Some(Some(program)) {
            self.program = None;
        }
    }

    /// Records `value` as current and returns whether it already was.
    fn update(&mut self, value: &StateValue) -> StateCacherOutcome {
        if let StateValue::ShaderProgram(program) = value {
            let handle = program.as_ref().map(|program| program.handle());

            return if self.program == Some(handle) {
                StateCacherOutcome::AlreadyOk
            } else {
                self.program = Some(handle);
                StateCacherOutcome::NeedChange
            };
        }

        let slot = &mut self.values[value.kind().index()];

        if slot.as_ref() == Some(value) {
            StateCacherOutcome::AlreadyOk
        } else {
            *slot = Some(value.clone());
            StateCacherOutcome::NeedChange
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GraphicsContextCreateInfo;
    use crate::{
        native::{recording::NativeCall, Api},
        pipeline::{graphics::rasterization::CullMode, state::StateValue, PipelineBindPoint},
    };

    #[test]
    fn redundant_values_are_elided() {
        let (context, log) = recording_context!();

        {
            let mut state = context.lock_state();
            state.commit(&StateValue::CullFace(CullMode::Back));
            state.commit(&StateValue::CullFace(CullMode::Back));
            state.commit(&StateValue::CullFace(CullMode::None));
        }

        assert_eq!(
            log.calls(),
            [
                NativeCall::SetCullMode(CullMode::Back),
                NativeCall::SetCullMode(CullMode::None),
            ],
        );
    }

    #[test]
    fn invalidated_cache_recommits() {
        let (context, log) = recording_context!();

        context
            .lock_state()
            .commit(&StateValue::DepthTest(true));
        context.invalidate_state_cache();
        context
            .lock_state()
            .commit(&StateValue::DepthTest(true));

        assert_eq!(log.calls().len(), 2);
    }

    #[test]
    fn elision_can_be_disabled() {
        let (context, log) = recording_context!(GraphicsContextCreateInfo {
            elide_redundant_state: false,
            ..Default::default()
        });

        for _ in 0..3 {
            context.lock_state().commit(&StateValue::ScissorTest(false));
        }

        assert_eq!(log.calls().len(), 3);
    }

    #[test]
    fn fresh_context() {
        let (context, _log) = recording_context!(GraphicsContextCreateInfo {
            label: Some("main".to_owned()),
            ..Default::default()
        });

        assert_eq!(context.api(), Api::Headless);
        assert_eq!(context.label(), Some("main"));
        assert!(context.bound_graphics_pipeline().is_none());
        assert!(context.bound_compute_pipeline().is_none());
        assert_eq!(context.last_bound_bind_point(), PipelineBindPoint::Graphics);
        assert_eq!(context.pipeline_stack_depth(), 0);
    }
}
