// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Pipeline state management and binding over OpenGL ES and Vulkan.
//!
//! # Brief summary
//!
//! - A [`GraphicsContext`](crate::context::GraphicsContext) wraps one native graphics context
//!   (anything implementing [`NativeContext`](crate::native::NativeContext)) and owns the
//!   per-context bookkeeping: which pipeline is bound, the pipeline save/restore stack and the
//!   cache of the native state that was last committed.
//!
//! - A [`GraphicsPipeline`](crate::pipeline::graphics::GraphicsPipeline) is created from a
//!   [`GraphicsPipelineCreateInfo`](crate::pipeline::graphics::GraphicsPipelineCreateInfo),
//!   optionally deriving from a *parentable* pipeline. At creation time the description is broken
//!   down into [state units](crate::pipeline::state), and a pipeline with a parent only keeps the
//!   units that differ from its parent.
//!
//! - Pipelines are never bound directly. Binds are recorded into a
//!   [`CommandBufferBuilder`](crate::command_buffer::CommandBufferBuilder) and happen when the
//!   resulting command buffer is executed. When a pipeline is bound, the binder looks at how it
//!   relates to the pipeline that is currently bound (same pipeline, parent, child, sibling or
//!   unrelated) and issues only the native calls needed for the transition.
//!
//! # Backends
//!
//! Three implementations of `NativeContext` are provided:
//!
//! - [`GlesNative`](crate::native::gles::GlesNative) forwards to OpenGL ES entry points that you
//!   supply through the [`GlFunctions`](crate::native::gles::GlFunctions) trait.
//! - [`VulkanStateRecorder`](crate::native::vulkan::VulkanStateRecorder) accumulates the state as
//!   Vulkan structures, ready to be baked into a `VkPipeline`.
//! - [`RecordingNative`](crate::native::recording::RecordingNative) logs every call and emulates
//!   the resulting state, which is useful for tests and tooling.

pub use crate::context::{GraphicsContext, GraphicsContextCreateInfo};

#[macro_use]
mod tests;

pub mod buffer;
mod cache;
pub mod command_buffer;
pub mod context;
pub mod native;
pub mod pipeline;
pub mod shader;

/// Implemented on objects that belong to a graphics context.
pub trait ContextOwned {
    /// Returns the context that owns `self`.
    fn context(&self) -> &std::sync::Arc<GraphicsContext>;
}

impl<T> ContextOwned for T
where
    T: std::ops::Deref,
    T::Target: ContextOwned,
{
    #[inline]
    fn context(&self) -> &std::sync::Arc<GraphicsContext> {
        (**self).context()
    }
}

/// A helper type for non-exhaustive structs.
///
/// This type cannot be constructed outside pvrapi. Structures with a field of this type can only
/// be constructed by calling a constructor function or `Default::default()`. The effect is similar
/// to the standard Rust `#[non_exhaustive]` attribute, except that it does not prevent update
/// syntax from being used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)] // add traits as needed
pub struct NonExhaustive(pub(crate) ());

// Used by `#[serde(skip)]` on the `_ne` fields of create infos.
#[cfg(feature = "serde")]
pub(crate) fn non_exhaustive() -> NonExhaustive {
    NonExhaustive(())
}

macro_rules! impl_id_counter {
    ($type:ident) => {
        impl $type {
            pub(crate) fn next_id() -> std::num::NonZeroU64 {
                use std::{
                    num::NonZeroU64,
                    sync::atomic::{AtomicU64, Ordering},
                };

                static COUNTER: AtomicU64 = AtomicU64::new(1);

                match NonZeroU64::new(COUNTER.fetch_add(1, Ordering::Relaxed)) {
                    Some(id) => id,
                    None => {
                        log::error!("{} ID counter overflow", stringify!($type));
                        std::process::abort();
                    }
                }
            }
        }
    };
}

pub(crate) use impl_id_counter;
