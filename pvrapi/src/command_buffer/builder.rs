// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use super::{Command, CommandBuffer, CommandBufferError, CommandInfo};
use crate::{
    buffer::Buffer,
    context::ContextState,
    pipeline::{
        binder, compute::ComputePipeline, graphics::GraphicsPipeline, PipelineBindPoint,
    },
    ContextOwned, GraphicsContext,
};
use smallvec::SmallVec;
use std::{
    fmt::{Debug, Error as FmtError, Formatter},
    sync::Arc,
};

/// Records commands into a [`CommandBuffer`].
///
/// Recording only validates the arguments. Nothing happens on the context until the command
/// buffer is executed.
pub struct CommandBufferBuilder {
    context: Arc<GraphicsContext>,
    commands: Vec<(CommandInfo, Box<Command>)>,
}

impl CommandBufferBuilder {
    /// Starts recording commands for `context`.
    #[inline]
    pub fn new(context: Arc<GraphicsContext>) -> Self {
        CommandBufferBuilder {
            context,
            commands: Vec::new(),
        }
    }

    /// Finishes recording.
    #[inline]
    pub fn build(self) -> CommandBuffer {
        CommandBuffer {
            context: self.context,
            commands: self.commands,
        }
    }

    fn add_command(
        &mut self,
        name: &'static str,
        command: impl Fn(&mut ContextState) + Send + Sync + 'static,
    ) {
        self.commands
            .push((CommandInfo { name }, Box::new(command)));
    }

    fn validate_context(&self, object: &impl ContextOwned) -> Result<(), CommandBufferError> {
        if Arc::ptr_eq(object.context(), &self.context) {
            Ok(())
        } else {
            log::warn!(
                "rejected a command using an object of context {:?} in a command buffer of \
                context {:?}",
                object.context().label(),
                self.context.label(),
            );

            Err(CommandBufferError::ContextMismatch)
        }
    }

    /// Binds a graphics pipeline for future draw calls.
    ///
    /// Only the state that differs between the pipeline bound at execution time and `pipeline`
    /// is changed on the native context.
    pub fn bind_pipeline_graphics(
        &mut self,
        pipeline: Arc<GraphicsPipeline>,
    ) -> Result<&mut Self, CommandBufferError> {
        self.validate_context(&pipeline)?;

        self.add_command("bind_pipeline_graphics", move |state| {
            binder::bind_graphics(state, Some(&pipeline));
        });

        Ok(self)
    }

    /// Binds a compute pipeline for future dispatch calls.
    ///
    /// The fixed-function state of the bound graphics pipeline is left as is.
    pub fn bind_pipeline_compute(
        &mut self,
        pipeline: Arc<ComputePipeline>,
    ) -> Result<&mut Self, CommandBufferError> {
        self.validate_context(&pipeline)?;

        self.add_command("bind_pipeline_compute", move |state| {
            binder::bind_compute(state, &pipeline);
        });

        Ok(self)
    }

    /// Saves the pipeline that is bound when this command executes. The next
    /// [`pop_pipeline`](Self::pop_pipeline) rebinds it.
    pub fn push_pipeline(&mut self) -> &mut Self {
        self.add_command("push_pipeline", binder::push_pipeline);

        self
    }

    /// Rebinds the pipeline saved by the matching [`push_pipeline`](Self::push_pipeline). Does
    /// nothing if there is no saved pipeline.
    pub fn pop_pipeline(&mut self) -> &mut Self {
        self.add_command("pop_pipeline", binder::pop_pipeline);

        self
    }

    /// Forgets which pipelines are bound and which native state is current, so that the next
    /// bind applies its full state.
    ///
    /// Use this after code outside of this crate has touched the native state.
    pub fn reset_pipeline(&mut self) -> &mut Self {
        self.add_command("reset_pipeline", binder::reset_pipeline);

        self
    }

    /// Binds vertex buffers to consecutive bindings starting at `first_binding`, each at a byte
    /// offset.
    pub fn bind_vertex_buffers(
        &mut self,
        first_binding: u32,
        vertex_buffers: impl IntoIterator<Item = (Arc<Buffer>, u64)>,
    ) -> Result<&mut Self, CommandBufferError> {
        let vertex_buffers: SmallVec<[_; 4]> = vertex_buffers.into_iter().collect();

        for (buffer, offset) in &vertex_buffers {
            self.validate_context(buffer)?;

            if *offset >= buffer.size() {
                return Err(CommandBufferError::VertexBufferOffsetOutOfRange {
                    offset: *offset,
                    size: buffer.size(),
                });
            }
        }

        self.add_command("bind_vertex_buffers", move |state| {
            for (binding, (buffer, offset)) in (first_binding..).zip(&vertex_buffers) {
                buffer.bind_vertex_buffer(state, binding, *offset);
            }
        });

        Ok(self)
    }

    /// Draws `vertex_count` vertices starting at `first_vertex`, `instance_count` times, with
    /// the bound graphics pipeline and its primitive topology.
    pub fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32) -> &mut Self {
        self.add_command("draw", move |state| {
            debug_assert!(
                state.bound_graphics().is_some(),
                "draw executed with no graphics pipeline bound",
            );
            debug_assert!(
                state.last_bound == PipelineBindPoint::Graphics,
                "draw executed while a compute pipeline's program is current",
            );

            let topology = state.topology;
            state
                .native_mut()
                .draw(topology, first_vertex, vertex_count, instance_count);
        });

        self
    }

    /// Dispatches compute work groups with the bound compute pipeline.
    pub fn dispatch(&mut self, group_counts: [u32; 3]) -> &mut Self {
        self.add_command("dispatch", move |state| {
            debug_assert!(
                state.bound_compute().is_some(),
                "dispatch executed with no compute pipeline bound",
            );
            debug_assert!(
                state.last_bound == PipelineBindPoint::Compute,
                "dispatch executed while a graphics pipeline's program is current",
            );

            state.native_mut().dispatch(group_counts);
        });

        self
    }
}

impl Debug for CommandBufferBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.debug_struct("CommandBufferBuilder")
            .field("context", &self.context)
            .field("len", &self.commands.len())
            .finish_non_exhaustive()
    }
}
