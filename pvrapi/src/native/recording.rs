// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! A native context that records calls instead of talking to a GPU.
//!
//! Every call is appended to a [`CallLog`], and its effect is applied to an emulated
//! [`NativeState`]. The log handle is shared, so it can be inspected after the recorder has been
//! moved into a [`GraphicsContext`](crate::context::GraphicsContext).
//!
//! Shader code starting with `#error` fails to compile, with the code as the compiler log.

use super::{Api, BufferHandle, NativeContext, ProgramHandle, ShaderHandle};
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
use foldhash::HashMap;
use parking_lot::Mutex;
use std::{collections::BTreeMap, sync::Arc};

/// One call made on a [`RecordingNative`].
#[derive(Clone, Debug, PartialEq)]
pub enum NativeCall {
    SetDepthTest(bool),
    SetDepthWrite(bool),
    SetDepthCompareOp(CompareOp),
    SetDepthBias(Option<DepthBias>),
    SetDepthClearValue(f32),
    SetStencilTest(bool),
    SetStencilClearValue(u32),
    SetStencilOps(StencilFaces, StencilOps),
    SetStencilCompare(StencilFaces, StencilCompare),
    SetStencilWriteMask(StencilFaces, u32),
    SetCullMode(CullMode),
    SetFrontFace(FrontFace),
    SetBlendEnable(bool),
    SetBlendFactors(BlendFactors),
    SetBlendOps(BlendOps),
    SetColorWriteMask(ColorComponents),
    SetScissorTest(bool),
    CreateShader(ShaderStage, ShaderHandle),
    DeleteShader(ShaderHandle),
    LinkProgram(ProgramHandle),
    DeleteProgram(ProgramHandle),
    UseProgram(Option<ProgramHandle>),
    UniformLocation {
        program: ProgramHandle,
        name: String,
    },
    AttributeLocation {
        program: ProgramHandle,
        name: String,
    },
    SetVertexInput(VertexInputState),
    BindVertexBuffer {
        binding: u32,
        buffer: BufferHandle,
        offset: u64,
    },
    Draw {
        topology: PrimitiveTopology,
        first_vertex: u32,
        vertex_count: u32,
        instance_count: u32,
    },
    Dispatch([u32; 3]),
}

impl NativeCall {
    /// Returns whether this call changes fixed-function or program state, as opposed to creating
    /// objects, querying them or drawing.
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            NativeCall::SetDepthTest(_)
                | NativeCall::SetDepthWrite(_)
                | NativeCall::SetDepthCompareOp(_)
                | NativeCall::SetDepthBias(_)
                | NativeCall::SetDepthClearValue(_)
                | NativeCall::SetStencilTest(_)
                | NativeCall::SetStencilClearValue(_)
                | NativeCall::SetStencilOps(..)
                | NativeCall::SetStencilCompare(..)
                | NativeCall::SetStencilWriteMask(..)
                | NativeCall::SetCullMode(_)
                | NativeCall::SetFrontFace(_)
                | NativeCall::SetBlendEnable(_)
                | NativeCall::SetBlendFactors(_)
                | NativeCall::SetBlendOps(_)
                | NativeCall::SetColorWriteMask(_)
                | NativeCall::SetScissorTest(_)
                | NativeCall::UseProgram(_)
        )
    }
}

/// The emulated state of a [`RecordingNative`].
///
/// The default value is the state of a freshly created native context.
#[derive(Clone, Debug, PartialEq)]
pub struct NativeState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare_op: CompareOp,
    pub depth_bias: Option<DepthBias>,
    pub depth_clear_value: f32,
    pub stencil_test: bool,
    pub stencil_clear_value: u32,
    pub stencil_ops_front: StencilOps,
    pub stencil_ops_back: StencilOps,
    pub stencil_compare_front: StencilCompare,
    pub stencil_compare_back: StencilCompare,
    pub stencil_write_mask_front: u32,
    pub stencil_write_mask_back: u32,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub blend_enable: bool,
    pub blend_factors: BlendFactors,
    pub blend_ops: BlendOps,
    pub color_write_mask: ColorComponents,
    pub scissor_test: bool,
    pub program: Option<ProgramHandle>,
    pub vertex_input: VertexInputState,
    pub vertex_buffers: BTreeMap<u32, (BufferHandle, u64)>,
}

impl Default for NativeState {
    fn default() -> Self {
        NativeState {
            depth_test: false,
            depth_write: true,
            depth_compare_op: CompareOp::Less,
            depth_bias: None,
            depth_clear_value: 1.0,
            stencil_test: false,
            stencil_clear_value: 0,
            stencil_ops_front: StencilOps::default(),
            stencil_ops_back: StencilOps::default(),
            stencil_compare_front: StencilCompare::default(),
            stencil_compare_back: StencilCompare::default(),
            stencil_write_mask_front: u32::MAX,
            stencil_write_mask_back: u32::MAX,
            cull_mode: CullMode::None,
            front_face: FrontFace::CounterClockwise,
            blend_enable: false,
            blend_factors: BlendFactors::default(),
            blend_ops: BlendOps::default(),
            color_write_mask: ColorComponents::all(),
            scissor_test: false,
            program: None,
            vertex_input: VertexInputState::default(),
            vertex_buffers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<NativeCall>,
    state: NativeState,
    uniforms: HashMap<String, i32>,
    attributes: HashMap<String, i32>,
    last_handle: u32,
}

impl Recording {
    fn next_handle(&mut self) -> u32 {
        self.last_handle += 1;
        self.last_handle
    }
}

/// Shared handle to the calls and state of a [`RecordingNative`].
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    inner: Arc<Mutex<Recording>>,
}

impl CallLog {
    /// Returns a copy of the calls recorded so far.
    pub fn calls(&self) -> Vec<NativeCall> {
        self.inner.lock().calls.clone()
    }

    /// Returns the calls recorded so far and clears them.
    pub fn take_calls(&self) -> Vec<NativeCall> {
        std::mem::take(&mut self.inner.lock().calls)
    }

    /// Clears the recorded calls. The emulated state is kept.
    pub fn clear(&self) {
        self.inner.lock().calls.clear();
    }

    /// Returns a copy of the emulated state.
    pub fn state(&self) -> NativeState {
        self.inner.lock().state.clone()
    }

    /// Makes every program report `name` as an active uniform at `location`.
    pub fn define_uniform(&self, name: &str, location: i32) {
        self.inner
            .lock()
            .uniforms
            .insert(name.to_owned(), location);
    }

    /// Makes every program report `name` as an active attribute at `location`.
    pub fn define_attribute(&self, name: &str, location: i32) {
        self.inner
            .lock()
            .attributes
            .insert(name.to_owned(), location);
    }

    fn record(&self, call: NativeCall, apply: impl FnOnce(&mut NativeState)) {
        let mut inner = self.inner.lock();
        apply(&mut inner.state);
        inner.calls.push(call);
    }
}

/// A native context that records and emulates calls.
#[derive(Debug, Default)]
pub struct RecordingNative {
    log: CallLog,
}

impl RecordingNative {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the log, which stays valid after `self` is moved into a context.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

fn for_faces<T: Copy>(faces: StencilFaces, front: &mut T, back: &mut T, value: T) {
    match faces {
        StencilFaces::Front => *front = value,
        StencilFaces::Back => *back = value,
        StencilFaces::FrontAndBack => {
            *front = value;
            *back = value;
        }
    }
}

impl NativeContext for RecordingNative {
    fn api(&self) -> Api {
        Api::Headless
    }

    fn set_depth_test(&mut self, enable: bool) {
        self.log
            .record(NativeCall::SetDepthTest(enable), |s| s.depth_test = enable);
    }

    fn set_depth_write(&mut self, enable: bool) {
        self.log
            .record(NativeCall::SetDepthWrite(enable), |s| s.depth_write = enable);
    }

    fn set_depth_compare_op(&mut self, compare_op: CompareOp) {
        self.log.record(NativeCall::SetDepthCompareOp(compare_op), |s| {
            s.depth_compare_op = compare_op
        });
    }

    fn set_depth_bias(&mut self, depth_bias: Option<DepthBias>) {
        self.log
            .record(NativeCall::SetDepthBias(depth_bias), |s| s.depth_bias = depth_bias);
    }

    fn set_depth_clear_value(&mut self, depth: f32) {
        self.log
            .record(NativeCall::SetDepthClearValue(depth), |s| s.depth_clear_value = depth);
    }

    fn set_stencil_test(&mut self, enable: bool) {
        self.log
            .record(NativeCall::SetStencilTest(enable), |s| s.stencil_test = enable);
    }

    fn set_stencil_clear_value(&mut self, stencil: u32) {
        self.log.record(NativeCall::SetStencilClearValue(stencil), |s| {
            s.stencil_clear_value = stencil
        });
    }

    fn set_stencil_ops(&mut self, faces: StencilFaces, ops: StencilOps) {
        self.log.record(NativeCall::SetStencilOps(faces, ops), |s| {
            for_faces(faces, &mut s.stencil_ops_front, &mut s.stencil_ops_back, ops)
        });
    }

    fn set_stencil_compare(&mut self, faces: StencilFaces, compare: StencilCompare) {
        self.log
            .record(NativeCall::SetStencilCompare(faces, compare), |s| {
                for_faces(
                    faces,
                    &mut s.stencil_compare_front,
                    &mut s.stencil_compare_back,
                    compare,
                )
            });
    }

    fn set_stencil_write_mask(&mut self, faces: StencilFaces, mask: u32) {
        self.log
            .record(NativeCall::SetStencilWriteMask(faces, mask), |s| {
                for_faces(
                    faces,
                    &mut s.stencil_write_mask_front,
                    &mut s.stencil_write_mask_back,
                    mask,
                )
            });
    }

    fn set_cull_mode(&mut self, cull_mode: CullMode) {
        self.log
            .record(NativeCall::SetCullMode(cull_mode), |s| s.cull_mode = cull_mode);
    }

    fn set_front_face(&mut self, front_face: FrontFace) {
        self.log
            .record(NativeCall::SetFrontFace(front_face), |s| s.front_face = front_face);
    }

    fn set_blend_enable(&mut self, enable: bool) {
        self.log
            .record(NativeCall::SetBlendEnable(enable), |s| s.blend_enable = enable);
    }

    fn set_blend_factors(&mut self, factors: BlendFactors) {
        self.log
            .record(NativeCall::SetBlendFactors(factors), |s| s.blend_factors = factors);
    }

    fn set_blend_ops(&mut self, ops: BlendOps) {
        self.log
            .record(NativeCall::SetBlendOps(ops), |s| s.blend_ops = ops);
    }

    fn set_color_write_mask(&mut self, mask: ColorComponents) {
        self.log
            .record(NativeCall::SetColorWriteMask(mask), |s| s.color_write_mask = mask);
    }

    fn set_scissor_test(&mut self, enable: bool) {
        self.log
            .record(NativeCall::SetScissorTest(enable), |s| s.scissor_test = enable);
    }

    fn create_shader(&mut self, stage: ShaderStage, code: &[u8]) -> Result<ShaderHandle, String> {
        if code.starts_with(b"#error") {
            return Err(String::from_utf8_lossy(code).into_owned());
        }

        let handle = ShaderHandle(self.log.inner.lock().next_handle());
        self.log
            .record(NativeCall::CreateShader(stage, handle), |_| ());

        Ok(handle)
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.log.record(NativeCall::DeleteShader(shader), |_| ());
    }

    fn link_program(&mut self, shaders: &[ShaderHandle]) -> Result<ProgramHandle, String> {
        if shaders.is_empty() {
            return Err("no shaders attached".to_owned());
        }

        let handle = ProgramHandle(self.log.inner.lock().next_handle());
        self.log.record(NativeCall::LinkProgram(handle), |_| ());

        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.log.record(NativeCall::DeleteProgram(program), |s| {
            if s.program == Some(program) {
                s.program = None;
            }
        });
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.log
            .record(NativeCall::UseProgram(program), |s| s.program = program);
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<i32> {
        let location = self.log.inner.lock().uniforms.get(name).copied();
        self.log.record(
            NativeCall::UniformLocation {
                program,
                name: name.to_owned(),
            },
            |_| (),
        );

        location
    }

    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<i32> {
        let location = self.log.inner.lock().attributes.get(name).copied();
        self.log.record(
            NativeCall::AttributeLocation {
                program,
                name: name.to_owned(),
            },
            |_| (),
        );

        location
    }

    fn set_vertex_input(&mut self, vertex_input: &VertexInputState) {
        self.log
            .record(NativeCall::SetVertexInput(vertex_input.clone()), |s| {
                s.vertex_input = vertex_input.clone()
            });
    }

    fn bind_vertex_buffer(&mut self, binding: u32, buffer: BufferHandle, offset: u64) {
        self.log.record(
            NativeCall::BindVertexBuffer {
                binding,
                buffer,
                offset,
            },
            |s| {
                s.vertex_buffers.insert(binding, (buffer, offset));
            },
        );
    }

    fn draw(
        &mut self,
        topology: PrimitiveTopology,
        first_vertex: u32,
        vertex_count: u32,
        instance_count: u32,
    ) {
        self.log.record(
            NativeCall::Draw {
                topology,
                first_vertex,
                vertex_count,
                instance_count,
            },
            |_| (),
        );
    }

    fn dispatch(&mut self, group_counts: [u32; 3]) {
        self.log.record(NativeCall::Dispatch(group_counts), |_| ());
    }
}
