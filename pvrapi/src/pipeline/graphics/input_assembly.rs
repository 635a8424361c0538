// Copyright (c) 2017 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Assembling vertices into primitives.
//!
//! The input assembly is the stage where lists of vertices are turned into primitives.

use crate::pipeline::state::StateContainer;

/// The state in a graphics pipeline describing how the input assembly stage should behave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputAssemblyState {
    /// The type of primitives.
    ///
    /// `None` inherits the topology of the parent pipeline, or uses
    /// [`PrimitiveTopology::TriangleList`] if there is no parent.
    ///
    /// The default value is `None`.
    pub topology: Option<PrimitiveTopology>,

    #[cfg_attr(feature = "serde", serde(skip, default = "crate::non_exhaustive"))]
    pub _ne: crate::NonExhaustive,
}

impl Default for InputAssemblyState {
    #[inline]
    fn default() -> Self {
        Self {
            topology: None,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl InputAssemblyState {
    /// Creates an `InputAssemblyState` that inherits its topology.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the primitive topology.
    #[inline]
    pub fn topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = Some(topology);
        self
    }

    /// Resolves the topology into the container. Topology is not diffed, it is stored whole.
    pub fn create_state_objects(&self, container: &mut StateContainer, parent: Option<&Self>) {
        container.topology = self
            .topology
            .or_else(|| parent.and_then(|parent| parent.topology))
            .unwrap_or_default();
    }
}

/// Describes how vertices must be grouped together to form primitives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum PrimitiveTopology {
    /// A series of separate point primitives.
    PointList = ash::vk::PrimitiveTopology::POINT_LIST.as_raw(),
    /// A series of separate line primitives.
    LineList = ash::vk::PrimitiveTopology::LINE_LIST.as_raw(),
    /// A series of consecutive line primitives, with consecutive lines sharing a vertex.
    LineStrip = ash::vk::PrimitiveTopology::LINE_STRIP.as_raw(),
    /// A series of separate triangle primitives.
    TriangleList = ash::vk::PrimitiveTopology::TRIANGLE_LIST.as_raw(),
    /// A series of consecutive triangle primitives, with consecutive triangles sharing an edge
    /// (two vertices).
    TriangleStrip = ash::vk::PrimitiveTopology::TRIANGLE_STRIP.as_raw(),
    /// A series of consecutive triangle primitives, with all triangles sharing a common vertex
    /// (the first).
    TriangleFan = ash::vk::PrimitiveTopology::TRIANGLE_FAN.as_raw(),
}

impl From<PrimitiveTopology> for ash::vk::PrimitiveTopology {
    #[inline]
    fn from(val: PrimitiveTopology) -> ash::vk::PrimitiveTopology {
        Self::from_raw(val as i32)
    }
}

impl Default for PrimitiveTopology {
    #[inline]
    fn default() -> Self {
        PrimitiveTopology::TriangleList
    }
}

#[cfg(test)]
mod tests {
    use super::{InputAssemblyState, PrimitiveTopology};
    use crate::pipeline::state::StateContainer;

    #[test]
    fn topology_inheritance() {
        let parent = InputAssemblyState::new().topology(PrimitiveTopology::LineStrip);

        let mut container = StateContainer::new();
        InputAssemblyState::new().create_state_objects(&mut container, Some(&parent));
        assert_eq!(container.topology(), PrimitiveTopology::LineStrip);

        let mut container = StateContainer::new();
        InputAssemblyState::new()
            .topology(PrimitiveTopology::PointList)
            .create_state_objects(&mut container, Some(&parent));
        assert_eq!(container.topology(), PrimitiveTopology::PointList);

        let mut container = StateContainer::new();
        InputAssemblyState::new().create_state_objects(&mut container, None);
        assert_eq!(container.topology(), PrimitiveTopology::TriangleList);
        assert!(container.is_empty());
    }
}
