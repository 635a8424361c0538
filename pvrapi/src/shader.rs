// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Shader objects and linked programs.
//!
//! A [`Shader`] is one compiled stage. Shaders are linked into a [`ShaderProgram`] when a pipeline
//! is created; the program is what gets bound, and it answers uniform and attribute location
//! queries. Compilation itself is left to the native context.

use crate::{
    cache::OnceCache,
    context::{GraphicsContext, NativeObject},
    native::{ProgramHandle, ShaderHandle},
    ContextOwned,
};
use smallvec::SmallVec;
use std::{
    fmt::{Debug, Error as FmtError, Formatter},
    hash::{Hash, Hasher},
    num::NonZeroU64,
    sync::Arc,
};
use thiserror::Error;

/// A programmable stage of a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl From<ShaderStage> for ash::vk::ShaderStageFlags {
    #[inline]
    fn from(val: ShaderStage) -> Self {
        match val {
            ShaderStage::Vertex => ash::vk::ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => ash::vk::ShaderStageFlags::FRAGMENT,
            ShaderStage::Compute => ash::vk::ShaderStageFlags::COMPUTE,
        }
    }
}

/// Parameters to create a new `Shader`.
#[derive(Clone, Debug)]
pub struct ShaderCreateInfo<'a> {
    /// The stage the shader is compiled for.
    pub stage: ShaderStage,

    /// Source or binary code, in whatever form the native context accepts.
    pub code: &'a [u8],

    pub _ne: crate::NonExhaustive,
}

impl<'a> ShaderCreateInfo<'a> {
    /// Returns a `ShaderCreateInfo` with the specified `stage` and `code`.
    #[inline]
    pub fn new(stage: ShaderStage, code: &'a [u8]) -> Self {
        Self {
            stage,
            code,
            _ne: crate::NonExhaustive(()),
        }
    }
}

/// Error that can happen when creating a shader.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ShaderCreationError {
    /// The code is empty.
    #[error("the shader code is empty")]
    EmptyCode,

    /// The native context rejected the code.
    #[error("failed to compile {stage:?} shader: {log}")]
    CompileFailed { stage: ShaderStage, log: String },
}

/// A compiled shader stage.
pub struct Shader {
    context: Arc<GraphicsContext>,
    handle: ShaderHandle,
    id: NonZeroU64,
    stage: ShaderStage,
}

impl Shader {
    /// Compiles a shader on `context`.
    pub fn new(
        context: Arc<GraphicsContext>,
        create_info: ShaderCreateInfo<'_>,
    ) -> Result<Arc<Shader>, ShaderCreationError> {
        let ShaderCreateInfo {
            stage,
            code,
            _ne: _,
        } = create_info;

        if code.is_empty() {
            return Err(ShaderCreationError::EmptyCode);
        }

        let handle = context
            .lock_state()
            .native_mut()
            .create_shader(stage, code)
            .map_err(|log| {
                log::error!("failed to compile {:?} shader: {}", stage, log);
                ShaderCreationError::CompileFailed { stage, log }
            })?;

        Ok(Arc::new(Shader {
            context,
            handle,
            id: Self::next_id(),
            stage,
        }))
    }

    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    pub fn handle(&self) -> ShaderHandle {
        self.handle
    }
}

crate::impl_id_counter!(Shader);

impl Drop for Shader {
    #[inline]
    fn drop(&mut self) {
        self.context.release(NativeObject::Shader(self.handle));
    }
}

impl ContextOwned for Shader {
    #[inline]
    fn context(&self) -> &Arc<GraphicsContext> {
        &self.context
    }
}

impl Debug for Shader {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.debug_struct("Shader")
            .field("id", &self.id)
            .field("stage", &self.stage)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// A set of shaders linked into one native program.
pub struct ShaderProgram {
    context: Arc<GraphicsContext>,
    handle: ProgramHandle,
    id: NonZeroU64,
    shaders: SmallVec<[Arc<Shader>; 2]>,
    uniform_locations: OnceCache<String, Option<i32>>,
    attribute_locations: OnceCache<String, Option<i32>>,
}

impl ShaderProgram {
    /// Links `shaders` into a program. On failure, returns the linker log.
    pub(crate) fn link(
        context: &Arc<GraphicsContext>,
        shaders: impl IntoIterator<Item = Arc<Shader>>,
    ) -> Result<Arc<ShaderProgram>, String> {
        let shaders: SmallVec<[Arc<Shader>; 2]> = shaders.into_iter().collect();
        let handles: SmallVec<[ShaderHandle; 2]> =
            shaders.iter().map(|shader| shader.handle).collect();

        let handle = context.lock_state().native_mut().link_program(&handles)?;

        Ok(Arc::new(ShaderProgram {
            context: context.clone(),
            handle,
            id: Self::next_id(),
            shaders,
            uniform_locations: OnceCache::new(),
            attribute_locations: OnceCache::new(),
        }))
    }

    /// Returns the native program.
    #[inline]
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Returns the shaders that were linked.
    #[inline]
    pub fn shaders(&self) -> &[Arc<Shader>] {
        &self.shaders
    }

    /// Returns the location of a uniform, or `None` if the program has no active uniform with
    /// that name.
    pub fn uniform_location(&self, name: &str) -> Option<i32> {
        self.uniform_locations.get_or_insert(name, || {
            let location = self
                .context
                .lock_state()
                .native_mut()
                .uniform_location(self.handle, name);

            if location.is_none() {
                log::debug!(
                    "uniform `{}` is not active in program {:?}",
                    name,
                    self.handle,
                );
            }

            (name.to_owned(), location)
        })
    }

    /// Returns the locations of several uniforms, in the same order as `names`.
    pub fn uniform_locations(&self, names: &[&str]) -> Vec<Option<i32>> {
        names
            .iter()
            .map(|name| self.uniform_location(name))
            .collect()
    }

    /// Returns the location of a vertex attribute, or `None` if the program has no active
    /// attribute with that name.
    pub fn attribute_location(&self, name: &str) -> Option<i32> {
        self.attribute_locations.get_or_insert(name, || {
            let location = self
                .context
                .lock_state()
                .native_mut()
                .attribute_location(self.handle, name);

            if location.is_none() {
                log::debug!(
                    "attribute `{}` is not active in program {:?}",
                    name,
                    self.handle,
                );
            }

            (name.to_owned(), location)
        })
    }

    /// Returns the locations of several vertex attributes, in the same order as `names`.
    pub fn attribute_locations(&self, names: &[&str]) -> Vec<Option<i32>> {
        names
            .iter()
            .map(|name| self.attribute_location(name))
            .collect()
    }
}

crate::impl_id_counter!(ShaderProgram);

impl Drop for ShaderProgram {
    #[inline]
    fn drop(&mut self) {
        self.context.release(NativeObject::Program(self.handle));
    }
}

impl ContextOwned for ShaderProgram {
    #[inline]
    fn context(&self) -> &Arc<GraphicsContext> {
        &self.context
    }
}

impl PartialEq for ShaderProgram {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ShaderProgram {}

impl Hash for ShaderProgram {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for ShaderProgram {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.debug_struct("ShaderProgram")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("shaders", &self.shaders)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{Shader, ShaderCreateInfo, ShaderCreationError, ShaderProgram, ShaderStage};
    use crate::native::recording::NativeCall;

    #[test]
    fn empty_code() {
        let (context, _log) = recording_context!();
        assert_eq!(
            Shader::new(context, ShaderCreateInfo::new(ShaderStage::Vertex, &[])).unwrap_err(),
            ShaderCreationError::EmptyCode,
        );
    }

    #[test]
    fn compile_failure() {
        let (context, _log) = recording_context!();
        let err = Shader::new(
            context,
            ShaderCreateInfo::new(ShaderStage::Fragment, b"#error broken"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ShaderCreationError::CompileFailed {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
    }

    #[test]
    fn uniform_lookups_are_cached() {
        let (context, log) = recording_context!();
        log.define_uniform("u_mvp", 3);

        let vs = Shader::new(
            context.clone(),
            ShaderCreateInfo::new(ShaderStage::Vertex, b"void main() {}"),
        )
        .unwrap();
        let fs = Shader::new(
            context.clone(),
            ShaderCreateInfo::new(ShaderStage::Fragment, b"void main() {}"),
        )
        .unwrap();
        let program = ShaderProgram::link(&context, [vs, fs]).unwrap();

        log.clear();
        assert_eq!(
            program.uniform_locations(&["u_mvp", "u_unused", "u_mvp"]),
            [Some(3), None, Some(3)],
        );
        let lookups = log
            .calls()
            .into_iter()
            .filter(|call| matches!(call, NativeCall::UniformLocation { .. }))
            .count();
        assert_eq!(lookups, 2);
        assert_eq!(program.attribute_location("a_position"), None);
    }

    #[test]
    fn dropped_program_is_deleted() {
        let (context, log) = recording_context!();
        let vs = Shader::new(
            context.clone(),
            ShaderCreateInfo::new(ShaderStage::Vertex, b"void main() {}"),
        )
        .unwrap();
        let program = ShaderProgram::link(&context, [vs]).unwrap();
        let handle = program.handle();

        drop(program);
        assert!(log.calls().contains(&NativeCall::DeleteProgram(handle)));
        assert!(log
            .calls()
            .iter()
            .any(|call| matches!(call, NativeCall::DeleteShader(_))));
    }
}
