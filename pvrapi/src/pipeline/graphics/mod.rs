// Copyright (c) 2017 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! A pipeline that performs graphics processing operations.
//!
//! Unlike a compute pipeline, which performs general-purpose work, a graphics pipeline is geared
//! specifically towards doing graphical processing. To that end, it consists of several shaders,
//! with additional state and glue logic in between.
//!
//! A graphics pipeline is described by a [`GraphicsPipelineCreateInfo`], which groups the
//! configuration by aspect: one type per module of this one. When the pipeline is created, every
//! aspect decomposes itself into [state units](crate::pipeline::state). Without a parent, every
//! unit is kept. With a parent, only the units whose value differs from the parent's description
//! are kept; the rest is represented by their absence, since the parent's units are still current
//! when the child is bound after it.
//!
//! Vertex input, topology and shaders are not split into units. A pipeline that leaves them
//! unspecified takes them from its parent.

pub use self::creation_error::PipelineCreationError;
use self::{
    color_blend::ColorBlendState, depth_stencil::DepthStencilState,
    input_assembly::InputAssemblyState, input_assembly::PrimitiveTopology,
    rasterization::RasterizationState, shader_stage::PipelineShaderStage,
    vertex_input::VertexInputAttributeDescription, vertex_input::VertexInputBindingDescription,
    vertex_input::VertexInputState, viewport::ViewportState,
};
use crate::{
    context::{ContextState, GraphicsContext},
    pipeline::{
        layout::PipelineLayout,
        state::{StateContainer, StateKind, StateValue},
        Pipeline, PipelineBindPoint,
    },
    shader::{Shader, ShaderProgram, ShaderStage},
    ContextOwned,
};
use std::{
    fmt::{Debug, Error as FmtError, Formatter},
    num::NonZeroU64,
    sync::Arc,
};

pub mod color_blend;
mod creation_error;
pub mod depth_stencil;
pub mod input_assembly;
pub mod rasterization;
pub mod shader_stage;
pub mod vertex_input;
pub mod viewport;

/// Parameters to create a new `GraphicsPipeline`.
#[derive(Clone, Debug)]
pub struct GraphicsPipelineCreateInfo {
    /// The vertex shader.
    ///
    /// Required unless the pipeline has a parent.
    pub vertex_shader: PipelineShaderStage,

    /// The fragment shader.
    ///
    /// Required unless the pipeline has a parent.
    pub fragment_shader: PipelineShaderStage,

    /// The vertex input state.
    ///
    /// The default value is empty, which inherits the parent's.
    pub vertex_input_state: VertexInputState,

    /// The input assembly state.
    pub input_assembly_state: InputAssemblyState,

    /// The rasterization state.
    pub rasterization_state: RasterizationState,

    /// The depth and stencil state.
    pub depth_stencil_state: DepthStencilState,

    /// The color blend state.
    pub color_blend_state: ColorBlendState,

    /// The viewport and scissor state.
    pub viewport_state: ViewportState,

    /// The layout of the pipeline.
    ///
    /// If `None`, the parent's layout is used, or an empty layout if there is no parent.
    ///
    /// The default value is `None`.
    pub layout: Option<Arc<PipelineLayout>>,

    pub _ne: crate::NonExhaustive,
}

impl Default for GraphicsPipelineCreateInfo {
    #[inline]
    fn default() -> Self {
        Self {
            vertex_shader: PipelineShaderStage::default(),
            fragment_shader: PipelineShaderStage::default(),
            vertex_input_state: VertexInputState::default(),
            input_assembly_state: InputAssemblyState::default(),
            rasterization_state: RasterizationState::default(),
            depth_stencil_state: DepthStencilState::default(),
            color_blend_state: ColorBlendState::default(),
            viewport_state: ViewportState::default(),
            layout: None,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl GraphicsPipelineCreateInfo {
    /// Returns a `GraphicsPipelineCreateInfo` with the given shaders and default state.
    #[inline]
    pub fn new(vertex_shader: Arc<Shader>, fragment_shader: Arc<Shader>) -> Self {
        Self {
            vertex_shader: PipelineShaderStage::new(vertex_shader),
            fragment_shader: PipelineShaderStage::new(fragment_shader),
            ..Default::default()
        }
    }

    #[inline]
    pub fn vertex_shader(mut self, shader: Arc<Shader>) -> Self {
        self.vertex_shader = PipelineShaderStage::new(shader);
        self
    }

    #[inline]
    pub fn fragment_shader(mut self, shader: Arc<Shader>) -> Self {
        self.fragment_shader = PipelineShaderStage::new(shader);
        self
    }

    #[inline]
    pub fn vertex_input_state(mut self, state: VertexInputState) -> Self {
        self.vertex_input_state = state;
        self
    }

    #[inline]
    pub fn input_assembly_state(mut self, state: InputAssemblyState) -> Self {
        self.input_assembly_state = state;
        self
    }

    #[inline]
    pub fn rasterization_state(mut self, state: RasterizationState) -> Self {
        self.rasterization_state = state;
        self
    }

    #[inline]
    pub fn depth_stencil_state(mut self, state: DepthStencilState) -> Self {
        self.depth_stencil_state = state;
        self
    }

    #[inline]
    pub fn color_blend_state(mut self, state: ColorBlendState) -> Self {
        self.color_blend_state = state;
        self
    }

    #[inline]
    pub fn viewport_state(mut self, state: ViewportState) -> Self {
        self.viewport_state = state;
        self
    }

    #[inline]
    pub fn layout(mut self, layout: Arc<PipelineLayout>) -> Self {
        self.layout = Some(layout);
        self
    }
}

/// Defines how the implementation should perform a draw operation.
pub struct GraphicsPipeline {
    context: Arc<GraphicsContext>,
    id: NonZeroU64,
    parent: Option<Arc<GraphicsPipeline>>,
    parentable: bool,
    states: StateContainer,
    layout: Arc<PipelineLayout>,
    // Children diff against this description.
    create_info: GraphicsPipelineCreateInfo,
}

impl GraphicsPipeline {
    /// Creates a graphics pipeline, optionally deriving from `parent`.
    ///
    /// `parent` must have been created with [`GraphicsPipeline::new_parentable`].
    pub fn new(
        context: Arc<GraphicsContext>,
        create_info: GraphicsPipelineCreateInfo,
        parent: Option<&Arc<GraphicsPipeline>>,
    ) -> Result<Arc<GraphicsPipeline>, PipelineCreationError> {
        Self::new_inner(context, create_info, parent, false)
    }

    /// Creates a graphics pipeline that other pipelines can derive from.
    pub fn new_parentable(
        context: Arc<GraphicsContext>,
        create_info: GraphicsPipelineCreateInfo,
    ) -> Result<Arc<GraphicsPipeline>, PipelineCreationError> {
        Self::new_inner(context, create_info, None, true)
    }

    fn new_inner(
        context: Arc<GraphicsContext>,
        create_info: GraphicsPipelineCreateInfo,
        parent: Option<&Arc<GraphicsPipeline>>,
        parentable: bool,
    ) -> Result<Arc<GraphicsPipeline>, PipelineCreationError> {
        let states = Self::create_states(&context, &create_info, parent).map_err(|err| {
            log::error!("failed to create graphics pipeline: {}", err);
            err
        })?;

        let layout = create_info
            .layout
            .clone()
            .or_else(|| parent.map(|parent| parent.layout.clone()))
            .unwrap_or_else(|| Arc::new(PipelineLayout::empty()));

        let pipeline = GraphicsPipeline {
            context,
            id: Self::next_id(),
            parent: parent.cloned(),
            parentable,
            states,
            layout,
            create_info,
        };

        log::debug!(
            "created graphics pipeline {}{} with {} state units{}",
            pipeline.id,
            if parentable { " (parentable)" } else { "" },
            pipeline.states.len(),
            match &pipeline.parent {
                Some(parent) => format!(", parent {}", parent.id),
                None => String::new(),
            },
        );

        Ok(Arc::new(pipeline))
    }

    fn create_states(
        context: &Arc<GraphicsContext>,
        create_info: &GraphicsPipelineCreateInfo,
        parent: Option<&Arc<GraphicsPipeline>>,
    ) -> Result<StateContainer, PipelineCreationError> {
        if let Some(parent) = parent {
            if !parent.parentable {
                return Err(PipelineCreationError::ParentNotParentable);
            }

            if !Arc::ptr_eq(&parent.context, context) {
                return Err(PipelineCreationError::ContextMismatch);
            }
        }

        let parent_info = parent.map(|parent| &parent.create_info);
        let mut states = StateContainer::new();

        create_info.vertex_shader.create_state_objects(
            &mut states,
            parent_info.map(|info| &info.vertex_shader),
            ShaderStage::Vertex,
        )?;
        create_info.fragment_shader.create_state_objects(
            &mut states,
            parent_info.map(|info| &info.fragment_shader),
            ShaderStage::Fragment,
        )?;
        create_info
            .vertex_input_state
            .create_state_objects(&mut states, parent_info.map(|info| &info.vertex_input_state));
        create_info.input_assembly_state.create_state_objects(
            &mut states,
            parent_info.map(|info| &info.input_assembly_state),
        );
        create_info.rasterization_state.create_state_objects(
            &mut states,
            parent_info.map(|info| &info.rasterization_state),
        );
        create_info.depth_stencil_state.create_state_objects(
            &mut states,
            parent_info.map(|info| &info.depth_stencil_state),
        );
        create_info
            .color_blend_state
            .create_state_objects(&mut states, parent_info.map(|info| &info.color_blend_state));
        create_info
            .viewport_state
            .create_state_objects(&mut states, parent_info.map(|info| &info.viewport_state));

        // A pipeline that brings any shader of its own gets its own program.
        if parent.is_none()
            || create_info.vertex_shader.is_specified()
            || create_info.fragment_shader.is_specified()
        {
            let program = Self::link_program(context, &states)?;
            states.push(StateValue::ShaderProgram(Some(program)));
        }

        states.link_parents(|kind| Self::inherited_value(parent, kind));

        Ok(states)
    }

    fn link_program(
        context: &Arc<GraphicsContext>,
        states: &StateContainer,
    ) -> Result<Arc<ShaderProgram>, PipelineCreationError> {
        let vertex_shader = states
            .vertex_shader()
            .ok_or(PipelineCreationError::MissingShaderStage {
                stage: ShaderStage::Vertex,
            })?;
        let fragment_shader = states
            .fragment_shader()
            .ok_or(PipelineCreationError::MissingShaderStage {
                stage: ShaderStage::Fragment,
            })?;

        for shader in [vertex_shader, fragment_shader] {
            if !Arc::ptr_eq(shader.context(), context) {
                return Err(PipelineCreationError::ContextMismatch);
            }
        }

        ShaderProgram::link(context, [vertex_shader.clone(), fragment_shader.clone()])
            .map_err(PipelineCreationError::LinkFailed)
    }

    /// Returns the value of `kind` in the nearest ancestor that has a unit for it.
    fn inherited_value(
        mut ancestor: Option<&Arc<GraphicsPipeline>>,
        kind: StateKind,
    ) -> Option<StateValue> {
        while let Some(pipeline) = ancestor {
            if let Some(unit) = pipeline.states.get(kind) {
                return Some(unit.value().clone());
            }

            ancestor = pipeline.parent.as_ref();
        }

        None
    }

    /// Returns an identifier that is unique among all graphics pipelines of the process.
    #[inline]
    pub fn id(&self) -> NonZeroU64 {
        self.id
    }

    /// Returns the parent of this pipeline, if any.
    #[inline]
    pub fn parent(&self) -> Option<&Arc<GraphicsPipeline>> {
        self.parent.as_ref()
    }

    /// Returns whether other pipelines can derive from this one.
    #[inline]
    pub fn is_parentable(&self) -> bool {
        self.parentable
    }

    /// Returns the state units and inherited state of this pipeline.
    #[inline]
    pub fn states(&self) -> &StateContainer {
        &self.states
    }

    /// Returns the description this pipeline was created from.
    #[inline]
    pub fn create_info(&self) -> &GraphicsPipelineCreateInfo {
        &self.create_info
    }

    /// Returns the program used by this pipeline, which may be its parent's.
    pub fn program(&self) -> Option<&Arc<ShaderProgram>> {
        self.states
            .program()
            .or_else(|| self.parent.as_ref().and_then(|parent| parent.program()))
    }

    /// Returns the location of a uniform in this pipeline's program, or `None` if it isn't
    /// active.
    pub fn uniform_location(&self, name: &str) -> Option<i32> {
        self.program()
            .and_then(|program| program.uniform_location(name))
    }

    /// Returns the locations of several uniforms, in the same order as `names`.
    pub fn uniform_locations(&self, names: &[&str]) -> Vec<Option<i32>> {
        match self.program() {
            Some(program) => program.uniform_locations(names),
            None => vec![None; names.len()],
        }
    }

    /// Returns the location of a vertex attribute in this pipeline's program, or `None` if it
    /// isn't active.
    pub fn attribute_location(&self, name: &str) -> Option<i32> {
        self.program()
            .and_then(|program| program.attribute_location(name))
    }

    /// Returns the locations of several vertex attributes, in the same order as `names`.
    pub fn attribute_locations(&self, names: &[&str]) -> Vec<Option<i32>> {
        match self.program() {
            Some(program) => program.attribute_locations(names),
            None => vec![None; names.len()],
        }
    }

    /// Returns the description of a vertex buffer binding.
    #[inline]
    pub fn vertex_input_binding(&self, binding: u32) -> Option<&VertexInputBindingDescription> {
        self.states.vertex_input_binding(binding)
    }

    /// Returns the attributes read from a vertex buffer binding.
    #[inline]
    pub fn vertex_attributes(&self, binding: u32) -> Option<&[VertexInputAttributeDescription]> {
        self.states.vertex_attributes(binding)
    }

    /// Returns the number of attributes read from a vertex buffer binding.
    #[inline]
    pub fn num_attributes(&self, binding: u32) -> usize {
        self.vertex_attributes(binding).map_or(0, <[_]>::len)
    }

    /// Returns the primitive topology.
    #[inline]
    pub fn topology(&self) -> PrimitiveTopology {
        self.states.topology()
    }

    /// Sets the state of every ancestor, root first, then the state of this pipeline.
    pub(crate) fn set_all(&self, state: &mut ContextState) {
        if let Some(parent) = &self.parent {
            parent.set_all(state);
        }

        self.set_from_parent(state);
    }

    /// Sets the units of this pipeline, assuming the parent's state is current.
    #[inline]
    pub(crate) fn set_from_parent(&self, state: &mut ContextState) {
        self.states.set_all(state);
    }

    /// Restores the parent's value for every unit of this pipeline.
    #[inline]
    pub(crate) fn unset_to_parent(&self, state: &mut ContextState) {
        self.states.unset_all(state);
    }

    /// Makes the program and vertex input of this pipeline current.
    pub(crate) fn bind_program_and_vertex_input(&self, state: &mut ContextState) {
        state.commit(&StateValue::ShaderProgram(self.program().cloned()));
        state.native_mut().set_vertex_input(self.states.vertex_input());
        state.topology = self.states.topology();
    }
}

crate::impl_id_counter!(GraphicsPipeline);

impl Pipeline for GraphicsPipeline {
    #[inline]
    fn bind_point(&self) -> PipelineBindPoint {
        PipelineBindPoint::Graphics
    }

    #[inline]
    fn layout(&self) -> &Arc<PipelineLayout> {
        &self.layout
    }
}

impl ContextOwned for GraphicsPipeline {
    #[inline]
    fn context(&self) -> &Arc<GraphicsContext> {
        &self.context
    }
}

impl Debug for GraphicsPipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.debug_struct("GraphicsPipeline")
            .field("id", &self.id)
            .field("parent", &self.parent.as_ref().map(|parent| parent.id))
            .field("parentable", &self.parentable)
            .field("states", &self.states.units())
            .finish_non_exhaustive()
    }
}

impl PartialEq for GraphicsPipeline {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GraphicsPipeline {}
