// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! A pipeline that performs general-purpose operations.
//!
//! A compute pipeline is relatively simple to create, requiring only a single shader, the
//! *compute shader*. It has no fixed-function state: binding it only makes its program current,
//! and leaves the state of the bound graphics pipeline alone.

use super::{graphics::PipelineCreationError, layout::PipelineLayout, Pipeline, PipelineBindPoint};
use crate::{
    context::{ContextState, GraphicsContext},
    pipeline::state::StateValue,
    shader::{Shader, ShaderProgram, ShaderStage},
    ContextOwned,
};
use std::{
    fmt::{Debug, Error as FmtError, Formatter},
    num::NonZeroU64,
    sync::Arc,
};

/// A pipeline object that describes how to perform compute operations.
pub struct ComputePipeline {
    context: Arc<GraphicsContext>,
    id: NonZeroU64,
    program: Arc<ShaderProgram>,
    layout: Arc<PipelineLayout>,
}

impl ComputePipeline {
    /// Creates a new `ComputePipeline`.
    pub fn new(
        context: Arc<GraphicsContext>,
        create_info: ComputePipelineCreateInfo,
    ) -> Result<Arc<ComputePipeline>, PipelineCreationError> {
        let ComputePipelineCreateInfo {
            shader,
            layout,
            _ne: _,
        } = create_info;

        let program = Self::link_program(&context, shader).map_err(|err| {
            log::error!("failed to create compute pipeline: {}", err);
            err
        })?;

        let pipeline = ComputePipeline {
            context,
            id: Self::next_id(),
            program,
            layout: layout.unwrap_or_else(|| Arc::new(PipelineLayout::empty())),
        };
        log::debug!("created compute pipeline {}", pipeline.id);

        Ok(Arc::new(pipeline))
    }

    fn link_program(
        context: &Arc<GraphicsContext>,
        shader: Option<Arc<Shader>>,
    ) -> Result<Arc<ShaderProgram>, PipelineCreationError> {
        let shader = shader.ok_or(PipelineCreationError::MissingShaderStage {
            stage: ShaderStage::Compute,
        })?;

        if shader.stage() != ShaderStage::Compute {
            return Err(PipelineCreationError::WrongShaderStage {
                expected: ShaderStage::Compute,
                provided: shader.stage(),
            });
        }

        if !Arc::ptr_eq(shader.context(), context) {
            return Err(PipelineCreationError::ContextMismatch);
        }

        ShaderProgram::link(context, [shader]).map_err(PipelineCreationError::LinkFailed)
    }

    /// Returns an identifier that is unique among all compute pipelines of the process.
    #[inline]
    pub fn id(&self) -> NonZeroU64 {
        self.id
    }

    /// Returns the linked compute program.
    #[inline]
    pub fn program(&self) -> &Arc<ShaderProgram> {
        &self.program
    }

    /// Returns the location of a uniform, or `None` if it isn't active.
    #[inline]
    pub fn uniform_location(&self, name: &str) -> Option<i32> {
        self.program.uniform_location(name)
    }

    /// Returns the locations of several uniforms, in the same order as `names`.
    #[inline]
    pub fn uniform_locations(&self, names: &[&str]) -> Vec<Option<i32>> {
        self.program.uniform_locations(names)
    }

    pub(crate) fn bind_program(&self, state: &mut ContextState) {
        state.commit(&StateValue::ShaderProgram(Some(self.program.clone())));
    }
}

crate::impl_id_counter!(ComputePipeline);

impl Pipeline for ComputePipeline {
    #[inline]
    fn bind_point(&self) -> PipelineBindPoint {
        PipelineBindPoint::Compute
    }

    #[inline]
    fn layout(&self) -> &Arc<PipelineLayout> {
        &self.layout
    }
}

impl ContextOwned for ComputePipeline {
    #[inline]
    fn context(&self) -> &Arc<GraphicsContext> {
        &self.context
    }
}

impl Debug for ComputePipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.debug_struct("ComputePipeline")
            .field("id", &self.id)
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ComputePipeline {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComputePipeline {}

/// Parameters to create a new `ComputePipeline`.
#[derive(Clone, Debug)]
pub struct ComputePipelineCreateInfo {
    /// The compute shader.
    ///
    /// There is no default value.
    pub shader: Option<Arc<Shader>>,

    /// The pipeline layout to use.
    ///
    /// The default value is `None`, which uses an empty layout.
    pub layout: Option<Arc<PipelineLayout>>,

    pub _ne: crate::NonExhaustive,
}

impl Default for ComputePipelineCreateInfo {
    #[inline]
    fn default() -> Self {
        Self {
            shader: None,
            layout: None,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl ComputePipelineCreateInfo {
    /// Returns a `ComputePipelineCreateInfo` with the specified `shader`.
    #[inline]
    pub fn new(shader: Arc<Shader>) -> Self {
        Self {
            shader: Some(shader),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ComputePipelineCreateInfo;
    use crate::{
        native::recording::NativeCall,
        pipeline::{graphics::PipelineCreationError, Pipeline, PipelineBindPoint},
        shader::{Shader, ShaderCreateInfo, ShaderStage},
    };

    #[test]
    fn create_and_bind() {
        let (context, log) = recording_context!();
        log.define_uniform("u_count", 4);
        let cs = Shader::new(
            context.clone(),
            ShaderCreateInfo::new(ShaderStage::Compute, b"void main() {}"),
        )
        .unwrap();

        let pipeline = context
            .create_compute_pipeline(ComputePipelineCreateInfo::new(cs))
            .unwrap();
        assert_eq!(pipeline.bind_point(), PipelineBindPoint::Compute);
        assert!(pipeline.layout().set_layouts().is_empty());
        assert_eq!(pipeline.uniform_location("u_count"), Some(4));
        assert_eq!(pipeline.uniform_locations(&["u_none"]), [None]);

        log.clear();
        crate::pipeline::binder::bind_compute(&mut context.lock_state(), &pipeline);
        assert_eq!(
            log.calls(),
            [NativeCall::UseProgram(Some(pipeline.program().handle()))],
        );
        assert_eq!(context.last_bound_bind_point(), PipelineBindPoint::Compute);
        assert_eq!(context.bound_compute_pipeline(), Some(pipeline));
    }

    #[test]
    fn missing_shader() {
        let (context, _log) = recording_context!();

        let err = context
            .create_compute_pipeline(ComputePipelineCreateInfo::default())
            .unwrap_err();
        assert_eq!(
            err,
            PipelineCreationError::MissingShaderStage {
                stage: ShaderStage::Compute,
            },
        );
    }

    #[test]
    fn graphics_shader_rejected() {
        let (context, _log) = recording_context!();
        let (vs, _fs) = shaders!(context);

        let err = context
            .create_compute_pipeline(ComputePipelineCreateInfo::new(vs))
            .unwrap_err();
        assert_eq!(
            err,
            PipelineCreationError::WrongShaderStage {
                expected: ShaderStage::Compute,
                provided: ShaderStage::Vertex,
            },
        );
    }
}
