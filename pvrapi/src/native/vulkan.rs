// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Vulkan backend.
//!
//! Vulkan bakes fixed-function state into `VkPipeline` objects instead of exposing it as mutable
//! context state. [`VulkanStateRecorder`] bridges the two models: state changes update a
//! [`VulkanPipelineState`] made of `ash` structures, and every draw captures a copy of it into a
//! [`VulkanCommandLog`]. The renderer then creates (or looks up) a `VkPipeline` matching each
//! captured state.
//!
//! Shader code must be SPIR-V. Vulkan has no named uniforms, so location lookups always return
//! `None`; resources are described by the pipeline layout instead.

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
use ash::vk;
use foldhash::HashMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::{collections::BTreeMap, sync::Arc};

const SPIRV_MAGIC: u32 = 0x0723_0203;

/// The fixed-function state a `VkPipeline` is created with.
///
/// The default value is the state of a freshly created context.
#[derive(Clone, Copy, Debug)]
pub struct VulkanPipelineState {
    pub program: Option<ProgramHandle>,
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: vk::CompareOp,
    pub depth_bias: Option<DepthBias>,
    pub stencil_test_enable: bool,
    pub front: vk::StencilOpState,
    pub back: vk::StencilOpState,
    /// The values a render pass that clears depth and stencil clears them to.
    pub clear_depth_stencil: vk::ClearDepthStencilValue,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub color_blend_attachment: vk::PipelineColorBlendAttachmentState,
    pub scissor_test_enable: bool,
}

impl Default for VulkanPipelineState {
    fn default() -> Self {
        let stencil = vk::StencilOpState {
            fail_op: vk::StencilOp::KEEP,
            pass_op: vk::StencilOp::KEEP,
            depth_fail_op: vk::StencilOp::KEEP,
            compare_op: vk::CompareOp::ALWAYS,
            compare_mask: u32::MAX,
            write_mask: u32::MAX,
            reference: 0,
        };

        VulkanPipelineState {
            program: None,
            depth_test_enable: false,
            depth_write_enable: true,
            depth_compare_op: vk::CompareOp::LESS,
            depth_bias: None,
            stencil_test_enable: false,
            front: stencil,
            back: stencil,
            clear_depth_stencil: vk::ClearDepthStencilValue {
                depth: 1.0,
                stencil: 0,
            },
            cull_mode: vk::CullModeFlags::NONE,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
            color_blend_attachment: vk::PipelineColorBlendAttachmentState {
                blend_enable: vk::FALSE,
                src_color_blend_factor: vk::BlendFactor::ONE,
                dst_color_blend_factor: vk::BlendFactor::ZERO,
                color_blend_op: vk::BlendOp::ADD,
                src_alpha_blend_factor: vk::BlendFactor::ONE,
                dst_alpha_blend_factor: vk::BlendFactor::ZERO,
                alpha_blend_op: vk::BlendOp::ADD,
                color_write_mask: ColorComponents::all().into(),
            },
            scissor_test_enable: false,
        }
    }
}

impl VulkanPipelineState {
    pub fn depth_stencil_create_info(&self) -> vk::PipelineDepthStencilStateCreateInfo<'static> {
        vk::PipelineDepthStencilStateCreateInfo {
            depth_test_enable: vk_bool(self.depth_test_enable),
            depth_write_enable: vk_bool(self.depth_write_enable),
            depth_compare_op: self.depth_compare_op,
            stencil_test_enable: vk_bool(self.stencil_test_enable),
            front: self.front,
            back: self.back,
            min_depth_bounds: 0.0,
            max_depth_bounds: 1.0,
            ..Default::default()
        }
    }

    pub fn rasterization_create_info(&self) -> vk::PipelineRasterizationStateCreateInfo<'static> {
        let depth_bias = self.depth_bias.unwrap_or_default();

        vk::PipelineRasterizationStateCreateInfo {
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: self.cull_mode,
            front_face: self.front_face,
            depth_bias_enable: vk_bool(self.depth_bias.is_some()),
            depth_bias_constant_factor: depth_bias.constant_factor,
            depth_bias_clamp: depth_bias.clamp,
            depth_bias_slope_factor: depth_bias.slope_factor,
            line_width: 1.0,
            ..Default::default()
        }
    }

    /// Returns the color blend state, applying the attachment state to a single attachment.
    pub fn color_blend_create_info(&self) -> vk::PipelineColorBlendStateCreateInfo<'_> {
        vk::PipelineColorBlendStateCreateInfo::default()
            .attachments(std::slice::from_ref(&self.color_blend_attachment))
    }

    /// Returns the clear value of the depth/stencil attachment, for `VkRenderPassBeginInfo`.
    #[inline]
    pub fn depth_stencil_clear_value(&self) -> vk::ClearValue {
        vk::ClearValue {
            depth_stencil: self.clear_depth_stencil,
        }
    }

    pub fn input_assembly_create_info(
        topology: PrimitiveTopology,
    ) -> vk::PipelineInputAssemblyStateCreateInfo<'static> {
        vk::PipelineInputAssemblyStateCreateInfo {
            topology: topology.into(),
            ..Default::default()
        }
    }

    fn stencil_mut(&mut self, faces: StencilFaces) -> SmallVec<[&mut vk::StencilOpState; 2]> {
        match faces {
            StencilFaces::Front => SmallVec::from_iter([&mut self.front]),
            StencilFaces::Back => SmallVec::from_iter([&mut self.back]),
            StencilFaces::FrontAndBack => SmallVec::from_iter([&mut self.front, &mut self.back]),
        }
    }
}

/// A draw captured by a [`VulkanStateRecorder`].
#[derive(Clone, Debug)]
pub struct RecordedDraw {
    pub state: VulkanPipelineState,
    pub topology: PrimitiveTopology,
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub instance_count: u32,
    /// Bound vertex buffers and their offsets, by binding.
    pub vertex_buffers: BTreeMap<u32, (BufferHandle, u64)>,
}

/// A compute dispatch captured by a [`VulkanStateRecorder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedDispatch {
    pub program: Option<ProgramHandle>,
    pub group_counts: [u32; 3],
}

/// Shared handle to the draws and dispatches captured by a [`VulkanStateRecorder`].
///
/// It stays usable after the recorder has been moved into a
/// [`GraphicsContext`](crate::context::GraphicsContext).
#[derive(Clone, Debug, Default)]
pub struct VulkanCommandLog {
    inner: Arc<Mutex<VulkanCommands>>,
}

#[derive(Debug, Default)]
struct VulkanCommands {
    draws: Vec<RecordedDraw>,
    dispatches: Vec<RecordedDispatch>,
}

impl VulkanCommandLog {
    pub fn draws(&self) -> Vec<RecordedDraw> {
        self.inner.lock().draws.clone()
    }

    pub fn dispatches(&self) -> Vec<RecordedDispatch> {
        self.inner.lock().dispatches.clone()
    }

    /// Removes and returns everything captured so far, typically once per frame.
    pub fn take(&self) -> (Vec<RecordedDraw>, Vec<RecordedDispatch>) {
        let mut inner = self.inner.lock();

        (
            std::mem::take(&mut inner.draws),
            std::mem::take(&mut inner.dispatches),
        )
    }
}

/// A [`NativeContext`] that accumulates the active state as Vulkan structures.
#[derive(Debug, Default)]
pub struct VulkanStateRecorder {
    state: VulkanPipelineState,
    vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
    vertex_buffers: BTreeMap<u32, (BufferHandle, u64)>,
    shaders: HashMap<u32, ShaderModule>,
    programs: HashMap<u32, SmallVec<[ShaderHandle; 2]>>,
    next_handle: u32,
    log: VulkanCommandLog,
}

#[derive(Debug)]
struct ShaderModule {
    stage: ShaderStage,
    code: Vec<u32>,
}

impl VulkanStateRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> &VulkanPipelineState {
        &self.state
    }

    /// Returns the current vertex input state.
    pub fn vertex_input_create_info(&self) -> vk::PipelineVertexInputStateCreateInfo<'_> {
        vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&self.vertex_bindings)
            .vertex_attribute_descriptions(&self.vertex_attributes)
    }

    /// Returns the SPIR-V words and stage of a shader, to create a `VkShaderModule` from.
    pub fn shader_code(&self, shader: ShaderHandle) -> Option<(ShaderStage, &[u32])> {
        self.shaders
            .get(&shader.0)
            .map(|module| (module.stage, module.code.as_slice()))
    }

    /// Returns the shaders a program was linked from.
    pub fn program_shaders(&self, program: ProgramHandle) -> Option<&[ShaderHandle]> {
        self.programs.get(&program.0).map(SmallVec::as_slice)
    }

    /// Returns a handle to the captured draws and dispatches.
    #[inline]
    pub fn log(&self) -> VulkanCommandLog {
        self.log.clone()
    }

    fn next_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl NativeContext for VulkanStateRecorder {
    fn api(&self) -> Api {
        Api::Vulkan
    }

    fn set_depth_test(&mut self, enable: bool) {
        self.state.depth_test_enable = enable;
    }

    fn set_depth_write(&mut self, enable: bool) {
        self.state.depth_write_enable = enable;
    }

    fn set_depth_compare_op(&mut self, compare_op: CompareOp) {
        self.state.depth_compare_op = compare_op.into();
    }

    fn set_depth_bias(&mut self, depth_bias: Option<DepthBias>) {
        self.state.depth_bias = depth_bias;
    }

    fn set_depth_clear_value(&mut self, depth: f32) {
        self.state.clear_depth_stencil.depth = depth;
    }

    fn set_stencil_test(&mut self, enable: bool) {
        self.state.stencil_test_enable = enable;
    }

    fn set_stencil_clear_value(&mut self, stencil: u32) {
        self.state.clear_depth_stencil.stencil = stencil;
    }

    fn set_stencil_ops(&mut self, faces: StencilFaces, ops: StencilOps) {
        for face in self.state.stencil_mut(faces) {
            face.fail_op = ops.fail_op.into();
            face.pass_op = ops.pass_op.into();
            face.depth_fail_op = ops.depth_fail_op.into();
        }
    }

    fn set_stencil_compare(&mut self, faces: StencilFaces, compare: StencilCompare) {
        for face in self.state.stencil_mut(faces) {
            face.compare_op = compare.compare_op.into();
            face.compare_mask = compare.compare_mask;
            face.reference = compare.reference;
        }
    }

    fn set_stencil_write_mask(&mut self, faces: StencilFaces, mask: u32) {
        for face in self.state.stencil_mut(faces) {
            face.write_mask = mask;
        }
    }

    fn set_cull_mode(&mut self, cull_mode: CullMode) {
        self.state.cull_mode = cull_mode.into();
    }

    fn set_front_face(&mut self, front_face: FrontFace) {
        self.state.front_face = front_face.into();
    }

    fn set_blend_enable(&mut self, enable: bool) {
        self.state.color_blend_attachment.blend_enable = vk_bool(enable);
    }

    fn set_blend_factors(&mut self, factors: BlendFactors) {
        let attachment = &mut self.state.color_blend_attachment;
        attachment.src_color_blend_factor = factors.src_color.into();
        attachment.dst_color_blend_factor = factors.dst_color.into();
        attachment.src_alpha_blend_factor = factors.src_alpha.into();
        attachment.dst_alpha_blend_factor = factors.dst_alpha.into();
    }

    fn set_blend_ops(&mut self, ops: BlendOps) {
        let attachment = &mut self.state.color_blend_attachment;
        attachment.color_blend_op = ops.color.into();
        attachment.alpha_blend_op = ops.alpha.into();
    }

    fn set_color_write_mask(&mut self, mask: ColorComponents) {
        self.state.color_blend_attachment.color_write_mask = mask.into();
    }

    fn set_scissor_test(&mut self, enable: bool) {
        self.state.scissor_test_enable = enable;
    }

    fn create_shader(&mut self, stage: ShaderStage, code: &[u8]) -> Result<ShaderHandle, String> {
        if code.len() % 4 != 0 {
            return Err(format!(
                "SPIR-V code size must be a multiple of 4, got {} bytes",
                code.len(),
            ));
        }

        let code: Vec<u32> = code
            .chunks_exact(4)
            .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
            .collect();

        if code.first() != Some(&SPIRV_MAGIC) {
            return Err("the code is not SPIR-V (bad magic number)".to_owned());
        }

        let handle = self.next_handle();
        self.shaders.insert(handle, ShaderModule { stage, code });

        Ok(ShaderHandle(handle))
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(&shader.0);
    }

    fn link_program(&mut self, shaders: &[ShaderHandle]) -> Result<ProgramHandle, String> {
        if shaders.is_empty() {
            return Err("a program needs at least one shader".to_owned());
        }

        if let Some(unknown) = shaders
            .iter()
            .find(|shader| !self.shaders.contains_key(&shader.0))
        {
            return Err(format!("unknown shader module {}", unknown.0));
        }

        let handle = self.next_handle();
        self.programs
            .insert(handle, shaders.iter().copied().collect());

        Ok(ProgramHandle(handle))
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program.0);
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.state.program = program;
    }

    fn uniform_location(&mut self, _program: ProgramHandle, _name: &str) -> Option<i32> {
        None
    }

    fn attribute_location(&mut self, _program: ProgramHandle, _name: &str) -> Option<i32> {
        None
    }

    fn set_vertex_input(&mut self, vertex_input: &VertexInputState) {
        self.vertex_bindings = vertex_input.to_vk_bindings();
        self.vertex_attributes = vertex_input.to_vk_attributes();
    }

    fn bind_vertex_buffer(&mut self, binding: u32, buffer: BufferHandle, offset: u64) {
        self.vertex_buffers.insert(binding, (buffer, offset));
    }

    fn draw(
        &mut self,
        topology: PrimitiveTopology,
        first_vertex: u32,
        vertex_count: u32,
        instance_count: u32,
    ) {
        self.log.inner.lock().draws.push(RecordedDraw {
            state: self.state,
            topology,
            first_vertex,
            vertex_count,
            instance_count,
            vertex_buffers: self.vertex_buffers.clone(),
        });
    }

    fn dispatch(&mut self, group_counts: [u32; 3]) {
        self.log.inner.lock().dispatches.push(RecordedDispatch {
            program: self.state.program,
            group_counts,
        });
    }
}

#[inline]
fn vk_bool(value: bool) -> vk::Bool32 {
    if value {
        vk::TRUE
    } else {
        vk::FALSE
    }
}

#[cfg(test)]
mod tests {
    use super::{VulkanPipelineState, VulkanStateRecorder, SPIRV_MAGIC};
    use crate::{
        native::{BufferHandle, NativeContext},
        pipeline::graphics::{
            color_blend::{BlendFactor, BlendFactors},
            depth_stencil::{CompareOp, StencilCompare, StencilFaces},
            input_assembly::PrimitiveTopology,
            rasterization::{CullMode, DepthBias},
        },
        shader::ShaderStage,
    };
    use ash::vk;

    fn spirv() -> Vec<u8> {
        [SPIRV_MAGIC, 0x0001_0000, 0, 1, 0]
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .collect()
    }

    #[test]
    fn state_snapshots() {
        let mut recorder = VulkanStateRecorder::new();

        recorder.set_depth_test(true);
        recorder.set_depth_compare_op(CompareOp::GreaterOrEqual);
        recorder.set_stencil_compare(
            StencilFaces::FrontAndBack,
            StencilCompare {
                compare_op: CompareOp::Equal,
                reference: 7,
                compare_mask: 0x0F,
            },
        );
        recorder.set_stencil_write_mask(StencilFaces::Back, 0x03);
        recorder.set_depth_clear_value(0.0);
        recorder.set_stencil_clear_value(5);
        recorder.set_cull_mode(CullMode::Back);
        recorder.set_depth_bias(Some(DepthBias {
            constant_factor: 1.0,
            clamp: 0.5,
            slope_factor: 2.0,
        }));
        recorder.set_blend_enable(true);
        recorder.set_blend_factors(BlendFactors {
            src_color: BlendFactor::SrcAlpha,
            dst_color: BlendFactor::OneMinusSrcAlpha,
            ..Default::default()
        });

        let state = recorder.state();
        let depth_stencil = state.depth_stencil_create_info();
        assert_eq!(depth_stencil.depth_test_enable, vk::TRUE);
        assert_eq!(depth_stencil.depth_compare_op, vk::CompareOp::GREATER_OR_EQUAL);
        assert_eq!(depth_stencil.front.reference, 7);
        assert_eq!(depth_stencil.back.compare_op, vk::CompareOp::EQUAL);
        assert_eq!(depth_stencil.back.compare_mask, 0x0F);
        assert_eq!(depth_stencil.front.write_mask, u32::MAX);
        assert_eq!(depth_stencil.back.write_mask, 0x03);
        assert_eq!(state.clear_depth_stencil.depth, 0.0);
        assert_eq!(
            unsafe { state.depth_stencil_clear_value().depth_stencil.stencil },
            5,
        );

        let rasterization = state.rasterization_create_info();
        assert_eq!(rasterization.cull_mode, vk::CullModeFlags::BACK);
        assert_eq!(rasterization.depth_bias_enable, vk::TRUE);
        assert_eq!(rasterization.depth_bias_clamp, 0.5);

        let color_blend = state.color_blend_create_info();
        assert_eq!(color_blend.attachment_count, 1);
        assert_eq!(state.color_blend_attachment.blend_enable, vk::TRUE);
        assert_eq!(
            state.color_blend_attachment.dst_color_blend_factor,
            vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        );
    }

    #[test]
    fn default_matches_fresh_context() {
        let state = VulkanPipelineState::default();
        let depth_stencil = state.depth_stencil_create_info();

        assert_eq!(depth_stencil.depth_test_enable, vk::FALSE);
        assert_eq!(depth_stencil.depth_write_enable, vk::TRUE);
        assert_eq!(depth_stencil.front.compare_op, vk::CompareOp::ALWAYS);
        assert_eq!(depth_stencil.back.write_mask, u32::MAX);
        assert_eq!(state.clear_depth_stencil.depth, 1.0);
        assert_eq!(state.clear_depth_stencil.stencil, 0);
        assert_eq!(state.cull_mode, vk::CullModeFlags::NONE);
        assert_eq!(state.color_blend_attachment.blend_enable, vk::FALSE);
    }

    #[test]
    fn shaders_must_be_spirv() {
        let mut recorder = VulkanStateRecorder::new();

        assert!(recorder
            .create_shader(ShaderStage::Vertex, b"void main() {}")
            .is_err());
        assert!(recorder
            .create_shader(ShaderStage::Vertex, b"abcd")
            .is_err());

        let vs = recorder
            .create_shader(ShaderStage::Vertex, &spirv())
            .unwrap();
        let (stage, code) = recorder.shader_code(vs).unwrap();
        assert_eq!(stage, ShaderStage::Vertex);
        assert_eq!(code[0], SPIRV_MAGIC);

        let program = recorder.link_program(&[vs]).unwrap();
        assert_eq!(recorder.program_shaders(program), Some(&[vs][..]));
        assert_eq!(recorder.uniform_location(program, "u_mvp"), None);
        assert!(recorder.link_program(&[]).is_err());
    }

    #[test]
    fn draws_capture_state() {
        let mut recorder = VulkanStateRecorder::new();
        let log = recorder.log();
        recorder.set_blend_enable(true);
        recorder.bind_vertex_buffer(0, BufferHandle(3), 16);
        recorder.draw(PrimitiveTopology::TriangleStrip, 0, 4, 1);
        recorder.set_blend_enable(false);
        recorder.draw(PrimitiveTopology::TriangleList, 0, 3, 1);
        recorder.dispatch([1, 2, 3]);

        let (draws, dispatches) = log.take();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].state.color_blend_attachment.blend_enable, vk::TRUE);
        assert_eq!(draws[1].state.color_blend_attachment.blend_enable, vk::FALSE);
        assert_eq!(draws[0].vertex_buffers[&0], (BufferHandle(3), 16));
        assert_eq!(
            VulkanPipelineState::input_assembly_create_info(draws[0].topology).topology,
            vk::PrimitiveTopology::TRIANGLE_STRIP,
        );
        assert_eq!(dispatches[0].group_counts, [1, 2, 3]);
        assert!(log.draws().is_empty());
        assert!(log.dispatches().is_empty());
    }
}
