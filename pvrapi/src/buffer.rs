// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Location in memory that contains vertex data.
//!
//! Buffers are allocated by the application through the native API and wrapped here so that
//! they can be bound as vertex buffers from a command buffer. The wrapper does not own the
//! native object: destroying it remains the application's job, once no command buffer
//! referencing the buffer will be executed anymore.

use crate::{
    context::{ContextState, GraphicsContext},
    native::BufferHandle,
    ContextOwned,
};
use std::{
    fmt::{Debug, Error as FmtError, Formatter},
    num::NonZeroU64,
    sync::Arc,
};

/// A native buffer.
pub struct Buffer {
    context: Arc<GraphicsContext>,
    handle: BufferHandle,
    size: u64,
    id: NonZeroU64,
}

impl Buffer {
    /// Wraps a native buffer of `size` bytes that was created on `context`.
    pub fn from_handle(
        context: Arc<GraphicsContext>,
        handle: BufferHandle,
        size: u64,
    ) -> Arc<Buffer> {
        Arc::new(Buffer {
            context,
            handle,
            size,
            id: Self::next_id(),
        })
    }

    #[inline]
    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    /// Returns the size of the buffer in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    pub(crate) fn bind_vertex_buffer(&self, state: &mut ContextState, binding: u32, offset: u64) {
        state
            .native_mut()
            .bind_vertex_buffer(binding, self.handle, offset);
    }
}

crate::impl_id_counter!(Buffer);

impl ContextOwned for Buffer {
    #[inline]
    fn context(&self) -> &Arc<GraphicsContext> {
        &self.context
    }
}

impl Debug for Buffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Buffer {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Buffer {}
