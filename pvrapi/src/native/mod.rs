// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The interface to the native graphics API.
//!
//! Everything above this module talks to the GPU through [`NativeContext`]. Each method issues
//! one state change or one object operation, and state changes never fail. Redundant calls are
//! filtered out before they reach this trait, so implementations should forward every call they
//! receive.

use crate::{
    pipeline::graphics::{
        color_blend::{BlendFactors, BlendOps, ColorComponents},
        depth_stencil::{CompareOp, StencilCompare, StencilFaces, StencilOps},
        input_assembly::PrimitiveTopology,
        rasterization::{CullMode, DepthBias, FrontFace},
        vertex_input::VertexInputState,
    },
    shader::ShaderStage,
};

pub mod gles;
pub mod recording;
pub mod vulkan;

/// The native API behind a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Api {
    OpenGLES,
    Vulkan,
    /// No GPU. Calls are logged and emulated.
    Headless,
}

/// Native name of a compiled shader object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// Native name of a linked program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Native name of a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// A native graphics context.
///
/// A context is only ever driven from one thread at a time. It is stored behind a mutex in
/// [`GraphicsContext`](crate::context::GraphicsContext), which is why it must be `Send`.
pub trait NativeContext: Send {
    /// Returns which API this context talks to.
    fn api(&self) -> Api;

    fn set_depth_test(&mut self, enable: bool);

    fn set_depth_write(&mut self, enable: bool);

    fn set_depth_compare_op(&mut self, compare_op: CompareOp);

    /// Enables depth biasing with the given factors, or disables it for `None`.
    fn set_depth_bias(&mut self, depth_bias: Option<DepthBias>);

    /// Sets the value that clearing the depth buffer writes.
    fn set_depth_clear_value(&mut self, depth: f32);

    fn set_stencil_test(&mut self, enable: bool);

    /// Sets the value that clearing the stencil buffer writes.
    fn set_stencil_clear_value(&mut self, stencil: u32);

    fn set_stencil_ops(&mut self, faces: StencilFaces, ops: StencilOps);

    fn set_stencil_compare(&mut self, faces: StencilFaces, compare: StencilCompare);

    /// Sets which bits of the stencil buffer the stencil operations of `faces` may write.
    fn set_stencil_write_mask(&mut self, faces: StencilFaces, mask: u32);

    /// Sets which faces are culled. [`CullMode::None`] disables culling.
    fn set_cull_mode(&mut self, cull_mode: CullMode);

    fn set_front_face(&mut self, front_face: FrontFace);

    fn set_blend_enable(&mut self, enable: bool);

    fn set_blend_factors(&mut self, factors: BlendFactors);

    fn set_blend_ops(&mut self, ops: BlendOps);

    fn set_color_write_mask(&mut self, mask: ColorComponents);

    fn set_scissor_test(&mut self, enable: bool);

    /// Creates a shader object from source or binary code. On failure, returns the compiler log.
    fn create_shader(&mut self, stage: ShaderStage, code: &[u8]) -> Result<ShaderHandle, String>;

    fn delete_shader(&mut self, shader: ShaderHandle);

    /// Links shader objects into a program. On failure, returns the linker log.
    fn link_program(&mut self, shaders: &[ShaderHandle]) -> Result<ProgramHandle, String>;

    fn delete_program(&mut self, program: ProgramHandle);

    /// Makes `program` current, or unbinds any program for `None`.
    fn use_program(&mut self, program: Option<ProgramHandle>);

    /// Returns the location of an active uniform, or `None` if the program has no active
    /// uniform with that name.
    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<i32>;

    /// Returns the location of an active vertex attribute, or `None` if there is none.
    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<i32>;

    /// Sets the vertex layout that subsequent vertex buffer binds are interpreted with.
    fn set_vertex_input(&mut self, vertex_input: &VertexInputState);

    fn bind_vertex_buffer(&mut self, binding: u32, buffer: BufferHandle, offset: u64);

    fn draw(
        &mut self,
        topology: PrimitiveTopology,
        first_vertex: u32,
        vertex_count: u32,
        instance_count: u32,
    );

    fn dispatch(&mut self, group_counts: [u32; 3]);
}
