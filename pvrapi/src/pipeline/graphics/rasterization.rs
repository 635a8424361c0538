// Copyright (c) 2017 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Configures how primitives are culled and how their depth is biased.

use crate::pipeline::state::{StateContainer, StateValue};

/// The state in a graphics pipeline describing how the rasterization stage should behave.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RasterizationState {
    /// Specifies whether front faces or back faces should be discarded, or none, or both.
    ///
    /// The default value is [`CullMode::Back`].
    pub cull_mode: CullMode,

    /// Specifies which triangle orientation is considered to be the front of the triangle.
    ///
    /// The default value is [`FrontFace::CounterClockwise`].
    pub front_face: FrontFace,

    /// Sets how to modify depth values in the rasterization stage.
    ///
    /// If set to `None`, depth biasing is disabled.
    ///
    /// The default value is `None`.
    pub depth_bias: Option<DepthBias>,

    #[cfg_attr(feature = "serde", serde(skip, default = "crate::non_exhaustive"))]
    pub _ne: crate::NonExhaustive,
}

impl Default for RasterizationState {
    #[inline]
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            depth_bias: None,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl RasterizationState {
    /// Creates a `RasterizationState` with back-face culling and counter-clockwise fronts.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cull mode.
    #[inline]
    pub fn cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    /// Sets the front face.
    #[inline]
    pub fn front_face(mut self, front_face: FrontFace) -> Self {
        self.front_face = front_face;
        self
    }

    /// Sets the depth bias.
    #[inline]
    pub fn depth_bias(mut self, depth_bias: Option<DepthBias>) -> Self {
        self.depth_bias = depth_bias;
        self
    }

    /// Decomposes this aspect into state units, keeping only the fields that differ from
    /// `parent` if there is one.
    pub fn create_state_objects(&self, container: &mut StateContainer, parent: Option<&Self>) {
        let Some(parent) = parent else {
            container.push(StateValue::CullFace(self.cull_mode));
            container.push(StateValue::FrontFace(self.front_face));
            container.push(StateValue::DepthBias(self.depth_bias));
            return;
        };

        if self.cull_mode != parent.cull_mode {
            container.push(StateValue::CullFace(self.cull_mode));
        }

        if self.front_face != parent.front_face {
            container.push(StateValue::FrontFace(self.front_face));
        }

        if self.depth_bias != parent.depth_bias {
            container.push(StateValue::DepthBias(self.depth_bias));
        }
    }
}

/// The values to use for depth biasing.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepthBias {
    /// Specifies a constant factor to be multiplied to every depth value.
    pub constant_factor: f32,
    /// The maximum (or minimum) depth bias of a fragment.
    ///
    /// OpenGL ES has no equivalent and ignores it.
    pub clamp: f32,
    /// A scalar factor to multiply with a fragment's slope in depth bias calculations.
    pub slope_factor: f32,
}

impl Default for DepthBias {
    #[inline]
    fn default() -> Self {
        Self {
            constant_factor: 0.0,
            clamp: 0.0,
            slope_factor: 0.0,
        }
    }
}

/// Specifies the culling mode.
///
/// This setting works in pair with `front_face`. The `front_face` setting tells the GPU whether
/// clockwise or counter-clockwise correspond to the front and the back of each triangle. Then
/// `cull_mode` lets you specify whether front faces should be discarded, back faces should be
/// discarded, or none, or both.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum CullMode {
    /// No culling.
    None = ash::vk::CullModeFlags::NONE.as_raw(),
    /// The faces facing the front of the screen (ie. facing the user) will be removed.
    Front = ash::vk::CullModeFlags::FRONT.as_raw(),
    /// The faces facing the back of the screen will be removed.
    Back = ash::vk::CullModeFlags::BACK.as_raw(),
    /// All faces will be removed.
    FrontAndBack = ash::vk::CullModeFlags::FRONT_AND_BACK.as_raw(),
}

impl From<CullMode> for ash::vk::CullModeFlags {
    #[inline]
    fn from(val: CullMode) -> Self {
        Self::from_raw(val as u32)
    }
}

impl Default for CullMode {
    #[inline]
    fn default() -> CullMode {
        CullMode::None
    }
}

/// Specifies which triangle orientation corresponds to the front or the triangle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum FrontFace {
    /// Triangles whose vertices are oriented counter-clockwise on the screen will be considered
    /// as facing their front. Otherwise they will be considered as facing their back.
    CounterClockwise = ash::vk::FrontFace::COUNTER_CLOCKWISE.as_raw(),
    /// Triangles whose vertices are oriented clockwise on the screen will be considered
    /// as facing their front. Otherwise they will be considered as facing their back.
    Clockwise = ash::vk::FrontFace::CLOCKWISE.as_raw(),
}

impl From<FrontFace> for ash::vk::FrontFace {
    #[inline]
    fn from(val: FrontFace) -> Self {
        Self::from_raw(val as i32)
    }
}

impl Default for FrontFace {
    #[inline]
    fn default() -> FrontFace {
        FrontFace::CounterClockwise
    }
}
