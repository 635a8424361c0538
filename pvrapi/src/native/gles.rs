// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! OpenGL ES backend.
//!
//! This module doesn't load OpenGL ES itself. Implement [`GlFunctions`] on top of whatever loader
//! the application already uses (EGL plus a function table, `glow`, ...) and wrap it in a
//! [`GlesNative`]. Every method of `GlFunctions` maps to exactly one GL entry point, named after
//! it.
//!
//! Requires OpenGL ES 3.0 for instanced draws and integer attributes, and OpenGL ES 3.1 for
//! compute dispatches.

use super::{Api, BufferHandle, NativeContext, ProgramHandle, ShaderHandle};
use crate::{
    pipeline::graphics::{
        color_blend::{BlendFactor, BlendFactors, BlendOp, BlendOps, ColorComponents},
        depth_stencil::{CompareOp, StencilCompare, StencilFaces, StencilOp, StencilOps},
        input_assembly::PrimitiveTopology,
        rasterization::{CullMode, DepthBias, FrontFace},
        vertex_input::{ComponentType, VertexFormat, VertexInputRate, VertexInputState},
    },
    shader::ShaderStage,
};
use std::collections::BTreeSet;

pub type GLenum = u32;
pub type GLuint = u32;
pub type GLint = i32;
pub type GLsizei = i32;
pub type GLfloat = f32;

/// The OpenGL ES constants used by this backend.
pub mod consts {
    use super::GLenum;

    pub const ZERO: GLenum = 0;
    pub const ONE: GLenum = 1;

    pub const POINTS: GLenum = 0x0000;
    pub const LINES: GLenum = 0x0001;
    pub const LINE_STRIP: GLenum = 0x0003;
    pub const TRIANGLES: GLenum = 0x0004;
    pub const TRIANGLE_STRIP: GLenum = 0x0005;
    pub const TRIANGLE_FAN: GLenum = 0x0006;

    pub const NEVER: GLenum = 0x0200;
    pub const LESS: GLenum = 0x0201;
    pub const EQUAL: GLenum = 0x0202;
    pub const LEQUAL: GLenum = 0x0203;
    pub const GREATER: GLenum = 0x0204;
    pub const NOTEQUAL: GLenum = 0x0205;
    pub const GEQUAL: GLenum = 0x0206;
    pub const ALWAYS: GLenum = 0x0207;

    pub const SRC_COLOR: GLenum = 0x0300;
    pub const ONE_MINUS_SRC_COLOR: GLenum = 0x0301;
    pub const SRC_ALPHA: GLenum = 0x0302;
    pub const ONE_MINUS_SRC_ALPHA: GLenum = 0x0303;
    pub const DST_ALPHA: GLenum = 0x0304;
    pub const ONE_MINUS_DST_ALPHA: GLenum = 0x0305;
    pub const DST_COLOR: GLenum = 0x0306;
    pub const ONE_MINUS_DST_COLOR: GLenum = 0x0307;
    pub const SRC_ALPHA_SATURATE: GLenum = 0x0308;
    pub const CONSTANT_COLOR: GLenum = 0x8001;
    pub const ONE_MINUS_CONSTANT_COLOR: GLenum = 0x8002;
    pub const CONSTANT_ALPHA: GLenum = 0x8003;
    pub const ONE_MINUS_CONSTANT_ALPHA: GLenum = 0x8004;

    pub const FUNC_ADD: GLenum = 0x8006;
    pub const MIN: GLenum = 0x8007;
    pub const MAX: GLenum = 0x8008;
    pub const FUNC_SUBTRACT: GLenum = 0x800A;
    pub const FUNC_REVERSE_SUBTRACT: GLenum = 0x800B;

    pub const FRONT: GLenum = 0x0404;
    pub const BACK: GLenum = 0x0405;
    pub const FRONT_AND_BACK: GLenum = 0x0408;
    pub const CW: GLenum = 0x0900;
    pub const CCW: GLenum = 0x0901;

    pub const CULL_FACE: GLenum = 0x0B44;
    pub const DEPTH_TEST: GLenum = 0x0B71;
    pub const STENCIL_TEST: GLenum = 0x0B90;
    pub const BLEND: GLenum = 0x0BE2;
    pub const SCISSOR_TEST: GLenum = 0x0C11;
    pub const POLYGON_OFFSET_FILL: GLenum = 0x8037;

    pub const INVERT: GLenum = 0x150A;
    pub const KEEP: GLenum = 0x1E00;
    pub const REPLACE: GLenum = 0x1E01;
    pub const INCR: GLenum = 0x1E02;
    pub const DECR: GLenum = 0x1E03;
    pub const INCR_WRAP: GLenum = 0x8507;
    pub const DECR_WRAP: GLenum = 0x8508;

    pub const UNSIGNED_BYTE: GLenum = 0x1401;
    pub const SHORT: GLenum = 0x1402;
    pub const INT: GLenum = 0x1404;
    pub const UNSIGNED_INT: GLenum = 0x1405;
    pub const FLOAT: GLenum = 0x1406;
    pub const HALF_FLOAT: GLenum = 0x140B;

    pub const ARRAY_BUFFER: GLenum = 0x8892;

    pub const FRAGMENT_SHADER: GLenum = 0x8B30;
    pub const VERTEX_SHADER: GLenum = 0x8B31;
    pub const COMPUTE_SHADER: GLenum = 0x91B9;
}

/// The OpenGL ES entry points used by [`GlesNative`].
///
/// Implementations are expected to call into a context that is current on the calling thread.
/// Query functions return what GL returns, including `0` and `-1` for failures.
pub trait GlFunctions: Send {
    fn enable(&mut self, cap: GLenum);
    fn disable(&mut self, cap: GLenum);
    fn depth_mask(&mut self, flag: bool);
    fn depth_func(&mut self, func: GLenum);
    fn polygon_offset(&mut self, factor: GLfloat, units: GLfloat);
    fn stencil_op_separate(&mut self, face: GLenum, sfail: GLenum, dpfail: GLenum, dppass: GLenum);
    fn stencil_func_separate(&mut self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint);
    fn stencil_mask_separate(&mut self, face: GLenum, mask: GLuint);
    fn clear_depthf(&mut self, depth: GLfloat);
    fn clear_stencil(&mut self, stencil: GLint);
    fn cull_face(&mut self, mode: GLenum);
    fn front_face(&mut self, mode: GLenum);
    fn blend_func_separate(
        &mut self,
        src_rgb: GLenum,
        dst_rgb: GLenum,
        src_alpha: GLenum,
        dst_alpha: GLenum,
    );
    fn blend_equation_separate(&mut self, mode_rgb: GLenum, mode_alpha: GLenum);
    fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool);

    fn create_shader(&mut self, ty: GLenum) -> GLuint;
    fn shader_source(&mut self, shader: GLuint, source: &[u8]);
    fn compile_shader(&mut self, shader: GLuint);
    /// `glGetShaderiv(shader, GL_COMPILE_STATUS)`.
    fn compile_status(&mut self, shader: GLuint) -> bool;
    fn get_shader_info_log(&mut self, shader: GLuint) -> String;
    fn delete_shader(&mut self, shader: GLuint);

    fn create_program(&mut self) -> GLuint;
    fn attach_shader(&mut self, program: GLuint, shader: GLuint);
    fn link_program(&mut self, program: GLuint);
    /// `glGetProgramiv(program, GL_LINK_STATUS)`.
    fn link_status(&mut self, program: GLuint) -> bool;
    fn get_program_info_log(&mut self, program: GLuint) -> String;
    fn delete_program(&mut self, program: GLuint);
    fn use_program(&mut self, program: GLuint);
    fn get_uniform_location(&mut self, program: GLuint, name: &str) -> GLint;
    fn get_attrib_location(&mut self, program: GLuint, name: &str) -> GLint;

    fn bind_buffer(&mut self, target: GLenum, buffer: GLuint);
    fn enable_vertex_attrib_array(&mut self, index: GLuint);
    fn disable_vertex_attrib_array(&mut self, index: GLuint);
    fn vertex_attrib_pointer(
        &mut self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    );
    fn vertex_attrib_i_pointer(
        &mut self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        stride: GLsizei,
        offset: usize,
    );
    fn vertex_attrib_divisor(&mut self, index: GLuint, divisor: GLuint);

    fn draw_arrays(&mut self, mode: GLenum, first: GLint, count: GLsizei);
    fn draw_arrays_instanced(
        &mut self,
        mode: GLenum,
        first: GLint,
        count: GLsizei,
        instance_count: GLsizei,
    );
    fn dispatch_compute(&mut self, x: GLuint, y: GLuint, z: GLuint);
}

/// A [`NativeContext`] that drives OpenGL ES.
#[derive(Debug)]
pub struct GlesNative<G> {
    gl: G,
    vertex_input: VertexInputState,
    enabled_attributes: BTreeSet<u32>,
}

impl<G: GlFunctions> GlesNative<G> {
    pub fn new(gl: G) -> Self {
        GlesNative {
            gl,
            vertex_input: VertexInputState::default(),
            enabled_attributes: BTreeSet::new(),
        }
    }

    /// Returns the function table.
    #[inline]
    pub fn functions(&self) -> &G {
        &self.gl
    }

    fn set_capability(&mut self, cap: GLenum, enable: bool) {
        if enable {
            self.gl.enable(cap);
        } else {
            self.gl.disable(cap);
        }
    }
}

impl<G: GlFunctions> NativeContext for GlesNative<G> {
    fn api(&self) -> Api {
        Api::OpenGLES
    }

    fn set_depth_test(&mut self, enable: bool) {
        self.set_capability(consts::DEPTH_TEST, enable);
    }

    fn set_depth_write(&mut self, enable: bool) {
        self.gl.depth_mask(enable);
    }

    fn set_depth_compare_op(&mut self, compare_op: CompareOp) {
        self.gl.depth_func(compare_op.into());
    }

    fn set_depth_bias(&mut self, depth_bias: Option<DepthBias>) {
        // GLES has no depth bias clamp.
        match depth_bias {
            Some(depth_bias) => {
                self.gl.enable(consts::POLYGON_OFFSET_FILL);
                self.gl
                    .polygon_offset(depth_bias.slope_factor, depth_bias.constant_factor);
            }
            None => self.gl.disable(consts::POLYGON_OFFSET_FILL),
        }
    }

    fn set_depth_clear_value(&mut self, depth: f32) {
        self.gl.clear_depthf(depth);
    }

    fn set_stencil_test(&mut self, enable: bool) {
        self.set_capability(consts::STENCIL_TEST, enable);
    }

    fn set_stencil_clear_value(&mut self, stencil: u32) {
        self.gl.clear_stencil(stencil as GLint);
    }

    fn set_stencil_ops(&mut self, faces: StencilFaces, ops: StencilOps) {
        self.gl.stencil_op_separate(
            faces.into(),
            ops.fail_op.into(),
            ops.depth_fail_op.into(),
            ops.pass_op.into(),
        );
    }

    fn set_stencil_compare(&mut self, faces: StencilFaces, compare: StencilCompare) {
        self.gl.stencil_func_separate(
            faces.into(),
            compare.compare_op.into(),
            compare.reference as GLint,
            compare.compare_mask,
        );
    }

    fn set_stencil_write_mask(&mut self, faces: StencilFaces, mask: u32) {
        self.gl.stencil_mask_separate(faces.into(), mask);
    }

    fn set_cull_mode(&mut self, cull_mode: CullMode) {
        let face = match cull_mode {
            CullMode::None => {
                self.gl.disable(consts::CULL_FACE);
                return;
            }
            CullMode::Front => consts::FRONT,
            CullMode::Back => consts::BACK,
            CullMode::FrontAndBack => consts::FRONT_AND_BACK,
        };

        self.gl.enable(consts::CULL_FACE);
        self.gl.cull_face(face);
    }

    fn set_front_face(&mut self, front_face: FrontFace) {
        self.gl.front_face(match front_face {
            FrontFace::CounterClockwise => consts::CCW,
            FrontFace::Clockwise => consts::CW,
        });
    }

    fn set_blend_enable(&mut self, enable: bool) {
        self.set_capability(consts::BLEND, enable);
    }

    fn set_blend_factors(&mut self, factors: BlendFactors) {
        self.gl.blend_func_separate(
            factors.src_color.into(),
            factors.dst_color.into(),
            factors.src_alpha.into(),
            factors.dst_alpha.into(),
        );
    }

    fn set_blend_ops(&mut self, ops: BlendOps) {
        self.gl
            .blend_equation_separate(ops.color.into(), ops.alpha.into());
    }

    fn set_color_write_mask(&mut self, mask: ColorComponents) {
        let [r, g, b, a] = mask.to_rgba();
        self.gl.color_mask(r, g, b, a);
    }

    fn set_scissor_test(&mut self, enable: bool) {
        self.set_capability(consts::SCISSOR_TEST, enable);
    }

    fn create_shader(&mut self, stage: ShaderStage, code: &[u8]) -> Result<ShaderHandle, String> {
        let ty = match stage {
            ShaderStage::Vertex => consts::VERTEX_SHADER,
            ShaderStage::Fragment => consts::FRAGMENT_SHADER,
            ShaderStage::Compute => consts::COMPUTE_SHADER,
        };

        let shader = self.gl.create_shader(ty);
        if shader == 0 {
            return Err(format!("glCreateShader failed for a {:?} shader", stage));
        }

        self.gl.shader_source(shader, code);
        self.gl.compile_shader(shader);

        if !self.gl.compile_status(shader) {
            let info_log = self.gl.get_shader_info_log(shader);
            self.gl.delete_shader(shader);
            return Err(info_log);
        }

        Ok(ShaderHandle(shader))
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.gl.delete_shader(shader.0);
    }

    fn link_program(&mut self, shaders: &[ShaderHandle]) -> Result<ProgramHandle, String> {
        let program = self.gl.create_program();
        if program == 0 {
            return Err("glCreateProgram failed".to_owned());
        }

        for shader in shaders {
            self.gl.attach_shader(program, shader.0);
        }
        self.gl.link_program(program);

        if !self.gl.link_status(program) {
            let info_log = self.gl.get_program_info_log(program);
            self.gl.delete_program(program);
            return Err(info_log);
        }

        Ok(ProgramHandle(program))
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.gl.delete_program(program.0);
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.gl.use_program(program.map_or(0, |program| program.0));
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<i32> {
        Some(self.gl.get_uniform_location(program.0, name)).filter(|&location| location >= 0)
    }

    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<i32> {
        Some(self.gl.get_attrib_location(program.0, name)).filter(|&location| location >= 0)
    }

    fn set_vertex_input(&mut self, vertex_input: &VertexInputState) {
        let locations: BTreeSet<u32> = vertex_input
            .attributes
            .values()
            .flatten()
            .map(|attribute| attribute.location)
            .collect();

        for &location in self.enabled_attributes.difference(&locations) {
            self.gl.disable_vertex_attrib_array(location);
        }
        self.enabled_attributes.retain(|location| locations.contains(location));

        self.vertex_input = vertex_input.clone();
    }

    fn bind_vertex_buffer(&mut self, binding: u32, buffer: BufferHandle, offset: u64) {
        let (Some(description), Some(attributes)) = (
            self.vertex_input.bindings.get(&binding),
            self.vertex_input.attributes.get(&binding),
        ) else {
            log::warn!(
                "vertex buffer bound to binding {}, which the current vertex input doesn't use",
                binding,
            );
            return;
        };

        self.gl.bind_buffer(consts::ARRAY_BUFFER, buffer.0 as GLuint);

        let stride = description.stride as GLsizei;
        let divisor = match description.input_rate {
            VertexInputRate::Vertex => 0,
            VertexInputRate::Instance { divisor } => divisor,
        };

        for attribute in attributes {
            let location = attribute.location;
            let size = attribute.format.components() as GLint;
            let ty = component_type(attribute.format);
            let pointer = offset as usize + attribute.offset as usize;

            if self.enabled_attributes.insert(location) {
                self.gl.enable_vertex_attrib_array(location);
            }

            if is_integer(attribute.format) {
                self.gl
                    .vertex_attrib_i_pointer(location, size, ty, stride, pointer);
            } else {
                self.gl.vertex_attrib_pointer(
                    location,
                    size,
                    ty,
                    attribute.format.normalized(),
                    stride,
                    pointer,
                );
            }

            self.gl.vertex_attrib_divisor(location, divisor);
        }
    }

    fn draw(
        &mut self,
        topology: PrimitiveTopology,
        first_vertex: u32,
        vertex_count: u32,
        instance_count: u32,
    ) {
        let mode = topology.into();

        if instance_count == 1 {
            self.gl
                .draw_arrays(mode, first_vertex as GLint, vertex_count as GLsizei);
        } else {
            self.gl.draw_arrays_instanced(
                mode,
                first_vertex as GLint,
                vertex_count as GLsizei,
                instance_count as GLsizei,
            );
        }
    }

    fn dispatch(&mut self, group_counts: [u32; 3]) {
        let [x, y, z] = group_counts;
        self.gl.dispatch_compute(x, y, z);
    }
}

fn component_type(format: VertexFormat) -> GLenum {
    match format.component_type() {
        ComponentType::Float32 => consts::FLOAT,
        ComponentType::Float16 => consts::HALF_FLOAT,
        ComponentType::Uint8 => consts::UNSIGNED_BYTE,
        ComponentType::Int16 => consts::SHORT,
        ComponentType::Uint32 => consts::UNSIGNED_INT,
        ComponentType::Int32 => consts::INT,
    }
}

/// Integer formats that are read as integers in the shader.
fn is_integer(format: VertexFormat) -> bool {
    !format.normalized()
        && !matches!(
            format.component_type(),
            ComponentType::Float32 | ComponentType::Float16
        )
}

impl From<CompareOp> for GLenum {
    #[inline]
    fn from(val: CompareOp) -> Self {
        match val {
            CompareOp::Never => consts::NEVER,
            CompareOp::Less => consts::LESS,
            CompareOp::Equal => consts::EQUAL,
            CompareOp::LessOrEqual => consts::LEQUAL,
            CompareOp::Greater => consts::GREATER,
            CompareOp::NotEqual => consts::NOTEQUAL,
            CompareOp::GreaterOrEqual => consts::GEQUAL,
            CompareOp::Always => consts::ALWAYS,
        }
    }
}

impl From<StencilOp> for GLenum {
    #[inline]
    fn from(val: StencilOp) -> Self {
        match val {
            StencilOp::Keep => consts::KEEP,
            StencilOp::Zero => consts::ZERO,
            StencilOp::Replace => consts::REPLACE,
            StencilOp::IncrementAndClamp => consts::INCR,
            StencilOp::DecrementAndClamp => consts::DECR,
            StencilOp::Invert => consts::INVERT,
            StencilOp::IncrementAndWrap => consts::INCR_WRAP,
            StencilOp::DecrementAndWrap => consts::DECR_WRAP,
        }
    }
}

impl From<StencilFaces> for GLenum {
    #[inline]
    fn from(val: StencilFaces) -> Self {
        match val {
            StencilFaces::Front => consts::FRONT,
            StencilFaces::Back => consts::BACK,
            StencilFaces::FrontAndBack => consts::FRONT_AND_BACK,
        }
    }
}

impl From<BlendFactor> for GLenum {
    #[inline]
    fn from(val: BlendFactor) -> Self {
        match val {
            BlendFactor::Zero => consts::ZERO,
            BlendFactor::One => consts::ONE,
            BlendFactor::SrcColor => consts::SRC_COLOR,
            BlendFactor::OneMinusSrcColor => consts::ONE_MINUS_SRC_COLOR,
            BlendFactor::DstColor => consts::DST_COLOR,
            BlendFactor::OneMinusDstColor => consts::ONE_MINUS_DST_COLOR,
            BlendFactor::SrcAlpha => consts::SRC_ALPHA,
            BlendFactor::OneMinusSrcAlpha => consts::ONE_MINUS_SRC_ALPHA,
            BlendFactor::DstAlpha => consts::DST_ALPHA,
            BlendFactor::OneMinusDstAlpha => consts::ONE_MINUS_DST_ALPHA,
            BlendFactor::ConstantColor => consts::CONSTANT_COLOR,
            BlendFactor::OneMinusConstantColor => consts::ONE_MINUS_CONSTANT_COLOR,
            BlendFactor::ConstantAlpha => consts::CONSTANT_ALPHA,
            BlendFactor::OneMinusConstantAlpha => consts::ONE_MINUS_CONSTANT_ALPHA,
            BlendFactor::SrcAlphaSaturate => consts::SRC_ALPHA_SATURATE,
        }
    }
}

impl From<BlendOp> for GLenum {
    #[inline]
    fn from(val: BlendOp) -> Self {
        match val {
            BlendOp::Add => consts::FUNC_ADD,
            BlendOp::Subtract => consts::FUNC_SUBTRACT,
            BlendOp::ReverseSubtract => consts::FUNC_REVERSE_SUBTRACT,
            BlendOp::Min => consts::MIN,
            BlendOp::Max => consts::MAX,
        }
    }
}

impl From<PrimitiveTopology> for GLenum {
    #[inline]
    fn from(val: PrimitiveTopology) -> Self {
        match val {
            PrimitiveTopology::PointList => consts::POINTS,
            PrimitiveTopology::LineList => consts::LINES,
            PrimitiveTopology::LineStrip => consts::LINE_STRIP,
            PrimitiveTopology::TriangleList => consts::TRIANGLES,
            PrimitiveTopology::TriangleStrip => consts::TRIANGLE_STRIP,
            PrimitiveTopology::TriangleFan => consts::TRIANGLE_FAN,
        }
    }
}
