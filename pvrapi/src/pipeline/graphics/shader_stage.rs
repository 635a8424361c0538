// Copyright (c) 2017 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The programmable stages of a graphics pipeline.

use super::PipelineCreationError;
use crate::{
    pipeline::state::StateContainer,
    shader::{Shader, ShaderStage},
};
use std::sync::Arc;

/// The shader used for one stage of a graphics pipeline.
#[derive(Clone, Debug, Default)]
pub struct PipelineShaderStage {
    /// The shader to use. `None` inherits the parent pipeline's shader for this stage.
    ///
    /// The default value is `None`.
    pub shader: Option<Arc<Shader>>,
}

impl PipelineShaderStage {
    /// Uses `shader` for this stage.
    #[inline]
    pub fn new(shader: Arc<Shader>) -> Self {
        PipelineShaderStage {
            shader: Some(shader),
        }
    }

    /// Returns whether this pipeline provides its own shader for the stage.
    #[inline]
    pub fn is_specified(&self) -> bool {
        self.shader.is_some()
    }

    /// Stores the shader of `stage` in the container, falling back to the parent's.
    ///
    /// Shaders are not diffed; whether a new program is linked is decided by the pipeline.
    pub fn create_state_objects(
        &self,
        container: &mut StateContainer,
        parent: Option<&Self>,
        stage: ShaderStage,
    ) -> Result<(), PipelineCreationError> {
        if let Some(shader) = &self.shader {
            if shader.stage() != stage {
                return Err(PipelineCreationError::WrongShaderStage {
                    expected: stage,
                    provided: shader.stage(),
                });
            }
        }

        let shader = self
            .shader
            .clone()
            .or_else(|| parent.and_then(|parent| parent.shader.clone()));

        match stage {
            ShaderStage::Vertex => container.vertex_shader = shader,
            ShaderStage::Fragment => container.fragment_shader = shader,
            ShaderStage::Compute => container.compute_shader = shader,
        }

        Ok(())
    }
}
