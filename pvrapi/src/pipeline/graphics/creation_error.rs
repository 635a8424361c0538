// Copyright (c) 2017 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use crate::shader::ShaderStage;
use thiserror::Error;

/// Error that can happen when creating a pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PipelineCreationError {
    /// A shader stage was not provided, and there is no parent to inherit it from.
    #[error("no {stage:?} shader was provided and there is no parent pipeline to inherit one from")]
    MissingShaderStage { stage: ShaderStage },

    /// A shader was provided for a stage it wasn't compiled for.
    #[error("a {provided:?} shader was provided for the {expected:?} stage")]
    WrongShaderStage {
        expected: ShaderStage,
        provided: ShaderStage,
    },

    /// The parent pipeline was not created as parentable.
    #[error("the parent pipeline was not created as parentable")]
    ParentNotParentable,

    /// A parent pipeline or a shader belongs to another context.
    #[error("the parent pipeline or a shader belongs to a different graphics context")]
    ContextMismatch,

    /// The native context failed to link the program.
    #[error("failed to link the shader program: {0}")]
    LinkFailed(String),
}
