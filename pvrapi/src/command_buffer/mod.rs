// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Recording commands to execute on a graphics context.
//!
//! Pipelines, vertex buffers and draws are never applied to a context directly. They are
//! recorded into a [`CommandBufferBuilder`], which produces a [`CommandBuffer`], and take effect
//! when that command buffer is executed:
//!
//! ```ignore
//! let mut builder = CommandBufferBuilder::new(context.clone());
//! builder
//!     .bind_pipeline_graphics(opaque.clone())?
//!     .bind_vertex_buffers(0, [(vertices.clone(), 0)])?
//!     .draw(36, 1, 0)
//!     .push_pipeline()
//!     .bind_pipeline_graphics(transparent.clone())?
//!     .draw(6, 1, 36)
//!     .pop_pipeline();
//! let command_buffer = builder.build();
//!
//! command_buffer.execute();
//! ```
//!
//! Commands execute in the order they were recorded, and each one sees the binding state left by
//! the previous ones. In particular, [`push_pipeline`](CommandBufferBuilder::push_pipeline)
//! saves whichever pipeline is bound when the command *executes*, not when it is recorded.
//!
//! A command buffer can be executed any number of times. It keeps the objects it references
//! alive until it is dropped.

pub use self::builder::CommandBufferBuilder;
use crate::{context::ContextState, GraphicsContext};
use std::{
    fmt::{Debug, Error as FmtError, Formatter},
    sync::Arc,
};
use thiserror::Error;

mod builder;

/// A sequence of recorded commands, ready to be executed.
pub struct CommandBuffer {
    context: Arc<GraphicsContext>,
    commands: Vec<(CommandInfo, Box<Command>)>,
}

type Command = dyn Fn(&mut ContextState) + Send + Sync + 'static;

/// Information about a recorded command.
#[derive(Clone, Copy, Debug)]
struct CommandInfo {
    name: &'static str,
}

impl CommandBuffer {
    /// Runs every command on the context the command buffer was recorded for.
    ///
    /// The context's binding state is locked for the whole execution.
    pub fn execute(&self) {
        let mut state = self.context.lock_state();

        log::trace!(
            "executing {} commands on context {}",
            self.commands.len(),
            self.context.label().unwrap_or("unnamed"),
        );

        for (info, command) in &self.commands {
            log::trace!("executing {}", info.name);
            command(&mut *state);
        }
    }

    /// Returns the context the command buffer executes on.
    #[inline]
    pub fn context(&self) -> &Arc<GraphicsContext> {
        &self.context
    }

    /// Returns the number of recorded commands.
    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Debug for CommandBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.debug_struct("CommandBuffer")
            .field("context", &self.context)
            .field(
                "commands",
                &self
                    .commands
                    .iter()
                    .map(|(info, _)| info.name)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Error that can happen when recording a command.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandBufferError {
    /// The object was created on a different context than the command buffer's.
    #[error("the object belongs to a different context than the command buffer")]
    ContextMismatch,

    /// A vertex buffer was bound at an offset past its end.
    #[error("vertex buffer offset {offset} is out of range for a buffer of {size} bytes")]
    VertexBufferOffsetOutOfRange { offset: u64, size: u64 },
}

#[cfg(test)]
mod tests {
    use super::{CommandBufferBuilder, CommandBufferError};
    use crate::{
        buffer::Buffer,
        native::{recording::NativeCall, vulkan::VulkanStateRecorder, BufferHandle},
        pipeline::{
            compute::ComputePipelineCreateInfo,
            graphics::{
                color_blend::{AttachmentBlend, BlendFactor, ColorBlendState},
                input_assembly::{InputAssemblyState, PrimitiveTopology},
                rasterization::{CullMode, RasterizationState},
                GraphicsPipelineCreateInfo,
            },
            PipelineBindPoint,
        },
        shader::{Shader, ShaderCreateInfo, ShaderStage},
        GraphicsContext, GraphicsContextCreateInfo,
    };
    use ash::vk;

    #[test]
    fn commands_are_deferred_and_ordered() {
        let (context, log) = recording_context!();
        let (vs, fs) = shaders!(context);
        let pipeline = context
            .create_graphics_pipeline(GraphicsPipelineCreateInfo::new(vs, fs), None)
            .unwrap();
        log.clear();

        let mut builder = CommandBufferBuilder::new(context.clone());
        builder
            .bind_pipeline_graphics(pipeline.clone())
            .unwrap()
            .draw(3, 1, 0)
            .draw(6, 2, 3);
        let command_buffer = builder.build();

        assert_eq!(command_buffer.len(), 3);
        assert!(log.calls().is_empty());
        assert!(context.bound_graphics_pipeline().is_none());

        command_buffer.execute();

        let calls = log.calls();
        let first_draw = calls
            .iter()
            .position(|call| matches!(call, NativeCall::Draw { .. }))
            .unwrap();
        assert!(calls[..first_draw]
            .iter()
            .any(|call| matches!(call, NativeCall::UseProgram(Some(_)))));
        assert_eq!(
            calls[first_draw..],
            [
                NativeCall::Draw {
                    topology: PrimitiveTopology::TriangleList,
                    first_vertex: 0,
                    vertex_count: 3,
                    instance_count: 1,
                },
                NativeCall::Draw {
                    topology: PrimitiveTopology::TriangleList,
                    first_vertex: 3,
                    vertex_count: 6,
                    instance_count: 2,
                },
            ],
        );
        assert_eq!(context.bound_graphics_pipeline(), Some(pipeline));
    }

    #[test]
    fn replaying_is_free_once_bound() {
        let (context, log) = recording_context!();
        let (vs, fs) = shaders!(context);
        let pipeline = context
            .create_graphics_pipeline(GraphicsPipelineCreateInfo::new(vs, fs), None)
            .unwrap();

        let mut builder = CommandBufferBuilder::new(context.clone());
        builder.bind_pipeline_graphics(pipeline).unwrap();
        let command_buffer = builder.build();

        command_buffer.execute();
        log.clear();
        command_buffer.execute();

        assert!(log.calls().is_empty());
    }

    #[test]
    fn blend_child_via_commands() {
        let (context, log) = recording_context!();
        let (vs, fs) = shaders!(context);
        let root = context
            .create_parentable_graphics_pipeline(
                GraphicsPipelineCreateInfo::new(vs, fs)
                    .color_blend_state(ColorBlendState::blend_disabled())
                    .rasterization_state(RasterizationState::new().cull_mode(CullMode::Back)),
            )
            .unwrap();
        let child = context
            .create_graphics_pipeline(
                GraphicsPipelineCreateInfo::default().color_blend_state(ColorBlendState::blend(
                    AttachmentBlend {
                        src_color_blend_factor: BlendFactor::One,
                        dst_color_blend_factor: BlendFactor::Zero,
                        ..Default::default()
                    },
                )),
                Some(&root),
            )
            .unwrap();

        let mut first = CommandBufferBuilder::new(context.clone());
        first.bind_pipeline_graphics(root.clone()).unwrap();
        first.build().execute();
        log.clear();

        let mut second = CommandBufferBuilder::new(context.clone());
        second.bind_pipeline_graphics(child.clone()).unwrap();
        second.build().execute();

        let factors = child.create_info().color_blend_state.attachments[0].factors();
        assert_eq!(
            log.calls(),
            [
                NativeCall::SetBlendEnable(true),
                NativeCall::SetBlendFactors(factors),
                NativeCall::SetVertexInput(root.states().vertex_input().clone()),
            ],
        );
        assert_eq!(log.state().cull_mode, CullMode::Back);
    }

    #[test]
    fn push_and_pop_restore_at_execution_time() {
        let (context, log) = recording_context!();
        let (vs, fs) = shaders!(context);
        let a = context
            .create_graphics_pipeline(GraphicsPipelineCreateInfo::new(vs.clone(), fs.clone()), None)
            .unwrap();
        let b = context
            .create_graphics_pipeline(
                GraphicsPipelineCreateInfo::new(vs, fs)
                    .rasterization_state(RasterizationState::new().cull_mode(CullMode::Front)),
                None,
            )
            .unwrap();

        // The push is recorded before anything is bound, but executes after `a` is bound.
        let mut nested = CommandBufferBuilder::new(context.clone());
        nested
            .push_pipeline()
            .bind_pipeline_graphics(b.clone())
            .unwrap()
            .draw(3, 1, 0)
            .pop_pipeline();
        let nested = nested.build();

        let mut outer = CommandBufferBuilder::new(context.clone());
        outer.bind_pipeline_graphics(a.clone()).unwrap();
        outer.build().execute();
        let a_state = log.state();

        nested.execute();

        assert_eq!(context.bound_graphics_pipeline(), Some(a));
        assert_eq!(context.pipeline_stack_depth(), 0);
        assert_eq!(log.state(), a_state);
    }

    #[test]
    fn unmatched_pop_is_ignored() {
        let (context, _log) = recording_context!();
        let (vs, fs) = shaders!(context);
        let pipeline = context
            .create_graphics_pipeline(GraphicsPipelineCreateInfo::new(vs, fs), None)
            .unwrap();

        let mut builder = CommandBufferBuilder::new(context.clone());
        builder
            .bind_pipeline_graphics(pipeline.clone())
            .unwrap()
            .pop_pipeline();
        builder.build().execute();

        assert_eq!(context.bound_graphics_pipeline(), Some(pipeline));
    }

    #[test]
    fn compute_round_trip_through_stack() {
        let (context, log) = recording_context!();
        let (vs, fs) = shaders!(context);
        let cs = Shader::new(
            context.clone(),
            ShaderCreateInfo::new(ShaderStage::Compute, b"void main() {}"),
        )
        .unwrap();
        let compute = context
            .create_compute_pipeline(ComputePipelineCreateInfo::new(cs))
            .unwrap();
        let graphics = context
            .create_graphics_pipeline(GraphicsPipelineCreateInfo::new(vs, fs), None)
            .unwrap();

        let mut builder = CommandBufferBuilder::new(context.clone());
        builder
            .bind_pipeline_compute(compute.clone())
            .unwrap()
            .dispatch([8, 8, 1])
            .push_pipeline()
            .bind_pipeline_graphics(graphics)
            .unwrap()
            .draw(3, 1, 0)
            .pop_pipeline()
            .dispatch([4, 1, 1]);
        builder.build().execute();

        assert_eq!(context.last_bound_bind_point(), PipelineBindPoint::Compute);
        assert_eq!(context.bound_compute_pipeline(), Some(compute.clone()));
        assert_eq!(log.state().program, Some(compute.program().handle()));
        assert_eq!(
            log.calls()
                .into_iter()
                .filter(|call| matches!(call, NativeCall::Dispatch(_)))
                .collect::<Vec<_>>(),
            [NativeCall::Dispatch([8, 8, 1]), NativeCall::Dispatch([4, 1, 1])],
        );
    }

    #[test]
    fn reset_forces_full_rebind() {
        let (context, log) = recording_context!();
        let (vs, fs) = shaders!(context);
        let pipeline = context
            .create_graphics_pipeline(GraphicsPipelineCreateInfo::new(vs, fs), None)
            .unwrap();

        let mut builder = CommandBufferBuilder::new(context.clone());
        builder
            .bind_pipeline_graphics(pipeline.clone())
            .unwrap()
            .reset_pipeline();
        builder.build().execute();

        assert!(context.bound_graphics_pipeline().is_none());
        log.clear();

        let mut builder = CommandBufferBuilder::new(context.clone());
        builder.bind_pipeline_graphics(pipeline).unwrap();
        builder.build().execute();

        assert!(log
            .calls()
            .iter()
            .any(|call| matches!(call, NativeCall::SetDepthTest(_))));
    }

    #[test]
    fn draw_uses_pipeline_topology() {
        let (context, log) = recording_context!();
        let (vs, fs) = shaders!(context);
        let strip = context
            .create_graphics_pipeline(
                GraphicsPipelineCreateInfo::new(vs, fs).input_assembly_state(
                    InputAssemblyState::new().topology(PrimitiveTopology::TriangleStrip),
                ),
                None,
            )
            .unwrap();

        let mut builder = CommandBufferBuilder::new(context.clone());
        builder
            .bind_pipeline_graphics(strip)
            .unwrap()
            .draw(4, 1, 0);
        builder.build().execute();

        assert_eq!(
            log.calls().last(),
            Some(&NativeCall::Draw {
                topology: PrimitiveTopology::TriangleStrip,
                first_vertex: 0,
                vertex_count: 4,
                instance_count: 1,
            }),
        );
    }

    #[test]
    fn vertex_buffers() {
        let (context, log) = recording_context!();
        let (other_context, _other_log) = recording_context!();
        let vertices = Buffer::from_handle(context.clone(), BufferHandle(7), 256);
        let normals = Buffer::from_handle(context.clone(), BufferHandle(8), 128);
        let foreign = Buffer::from_handle(other_context, BufferHandle(9), 64);

        let mut builder = CommandBufferBuilder::new(context.clone());
        assert_eq!(
            builder
                .bind_vertex_buffers(0, [(vertices.clone(), 512)])
                .unwrap_err(),
            CommandBufferError::VertexBufferOffsetOutOfRange {
                offset: 512,
                size: 256,
            },
        );
        assert_eq!(
            builder.bind_vertex_buffers(0, [(foreign, 0)]).unwrap_err(),
            CommandBufferError::ContextMismatch,
        );

        builder
            .bind_vertex_buffers(1, [(vertices, 0), (normals, 32)])
            .unwrap();
        let command_buffer = builder.build();
        assert_eq!(command_buffer.len(), 1);
        command_buffer.execute();

        assert_eq!(
            log.calls(),
            [
                NativeCall::BindVertexBuffer {
                    binding: 1,
                    buffer: BufferHandle(7),
                    offset: 0,
                },
                NativeCall::BindVertexBuffer {
                    binding: 2,
                    buffer: BufferHandle(8),
                    offset: 32,
                },
            ],
        );
    }

    #[test]
    fn pipeline_from_other_context_is_rejected() {
        let (context, _log) = recording_context!();
        let (other_context, _other_log) = recording_context!();
        let (vs, fs) = shaders!(other_context);
        let pipeline = other_context
            .create_graphics_pipeline(GraphicsPipelineCreateInfo::new(vs, fs), None)
            .unwrap();

        let mut builder = CommandBufferBuilder::new(context);
        assert_eq!(
            builder.bind_pipeline_graphics(pipeline).unwrap_err(),
            CommandBufferError::ContextMismatch,
        );
        assert!(builder.build().is_empty());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn draw_without_pipeline_panics() {
        let (context, _log) = recording_context!();

        let mut builder = CommandBufferBuilder::new(context);
        builder.draw(3, 1, 0);
        let command_buffer = builder.build();

        assert_should_panic!("no graphics pipeline", {
            command_buffer.execute();
        });
    }

    #[cfg(debug_assertions)]
    #[test]
    fn draw_after_compute_bind_panics() {
        let (context, _log) = recording_context!();
        let (vs, fs) = shaders!(context);
        let graphics = context
            .create_graphics_pipeline(GraphicsPipelineCreateInfo::new(vs, fs), None)
            .unwrap();
        let cs = Shader::new(
            context.clone(),
            ShaderCreateInfo::new(ShaderStage::Compute, b"void main() {}"),
        )
        .unwrap();
        let compute = context
            .create_compute_pipeline(ComputePipelineCreateInfo::new(cs))
            .unwrap();

        let mut builder = CommandBufferBuilder::new(context.clone());
        builder
            .bind_pipeline_graphics(graphics.clone())
            .unwrap()
            .bind_pipeline_compute(compute.clone())
            .unwrap()
            .draw(3, 1, 0);
        let command_buffer = builder.build();

        assert_should_panic!("compute pipeline's program is current", {
            command_buffer.execute();
        });

        let mut builder = CommandBufferBuilder::new(context);
        builder
            .bind_pipeline_compute(compute)
            .unwrap()
            .bind_pipeline_graphics(graphics)
            .unwrap()
            .dispatch([1, 1, 1]);
        let command_buffer = builder.build();

        assert_should_panic!("graphics pipeline's program is current", {
            command_buffer.execute();
        });
    }

    #[test]
    fn vulkan_backend_captures_draw_state() {
        let _ = pretty_env_logger::try_init();

        let recorder = VulkanStateRecorder::new();
        let log = recorder.log();
        let context = GraphicsContext::new(recorder, GraphicsContextCreateInfo::default());

        let spirv: Vec<u8> = [0x0723_0203u32, 0x0001_0000, 0, 1, 0]
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .collect();
        let vs = Shader::new(
            context.clone(),
            ShaderCreateInfo::new(ShaderStage::Vertex, &spirv),
        )
        .unwrap();
        let fs = Shader::new(
            context.clone(),
            ShaderCreateInfo::new(ShaderStage::Fragment, &spirv),
        )
        .unwrap();

        let opaque = context
            .create_parentable_graphics_pipeline(
                GraphicsPipelineCreateInfo::new(vs, fs)
                    .rasterization_state(RasterizationState::new().cull_mode(CullMode::Back)),
            )
            .unwrap();
        let transparent = context
            .create_graphics_pipeline(
                GraphicsPipelineCreateInfo::default()
                    .color_blend_state(ColorBlendState::blend(AttachmentBlend::alpha())),
                Some(&opaque),
            )
            .unwrap();

        let mut builder = CommandBufferBuilder::new(context.clone());
        builder
            .bind_pipeline_graphics(opaque)
            .unwrap()
            .draw(36, 1, 0)
            .bind_pipeline_graphics(transparent)
            .unwrap()
            .draw(6, 1, 36);
        builder.build().execute();

        let draws = log.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].state.cull_mode, vk::CullModeFlags::BACK);
        assert_eq!(draws[0].state.color_blend_attachment.blend_enable, vk::FALSE);
        assert_eq!(draws[1].state.cull_mode, vk::CullModeFlags::BACK);
        assert_eq!(draws[1].state.color_blend_attachment.blend_enable, vk::TRUE);
        assert_eq!(
            draws[1].state.color_blend_attachment.src_color_blend_factor,
            vk::BlendFactor::SRC_ALPHA,
        );
        assert_eq!(draws[0].state.program, draws[1].state.program);
    }
}
