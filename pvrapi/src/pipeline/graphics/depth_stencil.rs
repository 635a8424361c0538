// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Configures the operation of the depth and stencil tests.
//!
//! The depth test passes or fails depending on how the depth value of each fragment compares
//! to the existing depth value in the depth buffer at that fragment's location.
//!
//! The stencil test passes or fails depending on how a reference value compares to the existing
//! value in the stencil buffer at each fragment's location. Depending on the outcome of the
//! depth and stencil tests, the value of the stencil buffer at that location can be updated.

use crate::pipeline::state::{StateContainer, StateValue};

/// The state in a graphics pipeline describing how the depth and stencil tests should behave.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepthStencilState {
    /// Whether the depth test is enabled.
    ///
    /// The default value is `true`.
    pub depth_test: bool,

    /// Whether fragments that pass the depth test write their depth to the depth buffer.
    ///
    /// The default value is `true`.
    pub depth_write: bool,

    /// Comparison used by the depth test. Only meaningful while `depth_test` is enabled.
    ///
    /// The default value is [`CompareOp::Less`].
    pub depth_compare_op: CompareOp,

    /// Whether the stencil test is enabled.
    ///
    /// The default value is `false`.
    pub stencil_test: bool,

    /// Stencil operations to use for points, lines and triangles whose front is facing the user.
    pub front: StencilOpState,

    /// Stencil operations to use for triangles whose back is facing the user.
    pub back: StencilOpState,

    /// The value the depth buffer is cleared to.
    ///
    /// The default value is `1.0`.
    pub depth_clear_value: f32,

    /// The value the stencil buffer is cleared to.
    ///
    /// The default value is `0`.
    pub stencil_clear_value: u32,

    #[cfg_attr(feature = "serde", serde(skip, default = "crate::non_exhaustive"))]
    pub _ne: crate::NonExhaustive,
}

impl Default for DepthStencilState {
    #[inline]
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            depth_compare_op: CompareOp::Less,
            stencil_test: false,
            front: Default::default(),
            back: Default::default(),
            depth_clear_value: 1.0,
            stencil_clear_value: 0,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl DepthStencilState {
    /// Creates a `DepthStencilState` where all tests are disabled and depth writes are off.
    #[inline]
    pub fn disabled() -> Self {
        Self {
            depth_test: false,
            depth_write: false,
            ..Default::default()
        }
    }

    /// Creates a `DepthStencilState` with a `Less` depth test and depth writes enabled.
    #[inline]
    pub fn simple_depth_test() -> Self {
        Self::default()
    }

    #[inline]
    pub fn depth_test(mut self, enable: bool) -> Self {
        self.depth_test = enable;
        self
    }

    #[inline]
    pub fn depth_write(mut self, enable: bool) -> Self {
        self.depth_write = enable;
        self
    }

    #[inline]
    pub fn depth_compare_op(mut self, op: CompareOp) -> Self {
        self.depth_compare_op = op;
        self
    }

    #[inline]
    pub fn stencil_test(mut self, enable: bool) -> Self {
        self.stencil_test = enable;
        self
    }

    #[inline]
    pub fn clear_values(mut self, depth: f32, stencil: u32) -> Self {
        self.depth_clear_value = depth;
        self.stencil_clear_value = stencil;
        self
    }

    /// Sets the same stencil state for both faces.
    #[inline]
    pub fn stencil(mut self, state: StencilOpState) -> Self {
        self.front = state;
        self.back = state;
        self
    }

    /// Decomposes this aspect into state units.
    ///
    /// Without a parent every unit is emitted. With a parent, a unit is only emitted for the
    /// fields that differ from it. The depth comparison is special: it is emitted only when this
    /// pipeline has the depth test enabled and either the parent had it disabled or used a
    /// different comparison.
    pub fn create_state_objects(&self, container: &mut StateContainer, parent: Option<&Self>) {
        let Some(parent) = parent else {
            container.push(StateValue::DepthTest(self.depth_test));
            container.push(StateValue::DepthWrite(self.depth_write));
            container.push(StateValue::DepthFunc(self.depth_compare_op));
            container.push(StateValue::DepthClear(self.depth_clear_value));
            container.push(StateValue::StencilTest(self.stencil_test));
            container.push(StateValue::StencilClear(self.stencil_clear_value));
            container.push(StateValue::StencilOpFront(self.front.ops()));
            container.push(StateValue::StencilOpBack(self.back.ops()));
            container.push(StateValue::StencilCompareFront(self.front.compare()));
            container.push(StateValue::StencilCompareBack(self.back.compare()));
            container.push(StateValue::StencilWriteMaskFront(self.front.write_mask));
            container.push(StateValue::StencilWriteMaskBack(self.back.write_mask));
            return;
        };

        if self.depth_test != parent.depth_test {
            container.push(StateValue::DepthTest(self.depth_test));
        }

        if self.depth_write != parent.depth_write {
            container.push(StateValue::DepthWrite(self.depth_write));
        }

        if self.depth_test
            && (!parent.depth_test || self.depth_compare_op != parent.depth_compare_op)
        {
            container.push(StateValue::DepthFunc(self.depth_compare_op));
        }

        if self.depth_clear_value != parent.depth_clear_value {
            container.push(StateValue::DepthClear(self.depth_clear_value));
        }

        if self.stencil_test != parent.stencil_test {
            container.push(StateValue::StencilTest(self.stencil_test));
        }

        if self.stencil_clear_value != parent.stencil_clear_value {
            container.push(StateValue::StencilClear(self.stencil_clear_value));
        }

        if self.front.ops() != parent.front.ops() {
            container.push(StateValue::StencilOpFront(self.front.ops()));
        }

        if self.back.ops() != parent.back.ops() {
            container.push(StateValue::StencilOpBack(self.back.ops()));
        }

        if self.front.compare() != parent.front.compare() {
            container.push(StateValue::StencilCompareFront(self.front.compare()));
        }

        if self.back.compare() != parent.back.compare() {
            container.push(StateValue::StencilCompareBack(self.back.compare()));
        }

        if self.front.write_mask != parent.front.write_mask {
            container.push(StateValue::StencilWriteMaskFront(self.front.write_mask));
        }

        if self.back.write_mask != parent.back.write_mask {
            container.push(StateValue::StencilWriteMaskBack(self.back.write_mask));
        }
    }
}

/// Stencil test and update configuration for one face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StencilOpState {
    /// The operation to perform when the stencil test failed.
    pub fail_op: StencilOp,
    /// The operation to perform when both the depth test and the stencil test passed.
    pub pass_op: StencilOp,
    /// The operation to perform when the stencil test passed but the depth test failed.
    pub depth_fail_op: StencilOp,
    /// The comparison to perform between the existing stencil value in the stencil buffer, and
    /// the reference value.
    pub compare_op: CompareOp,
    /// Selects the bits of the stencil values participating in the stencil test.
    pub compare_mask: u32,
    /// Selects the bits of the stencil values updated by the stencil test.
    pub write_mask: u32,
    /// Reference value that is used in the unsigned stencil comparison.
    pub reference: u32,
}

impl Default for StencilOpState {
    #[inline]
    fn default() -> StencilOpState {
        StencilOpState {
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            compare_op: CompareOp::Always,
            compare_mask: u32::MAX,
            write_mask: u32::MAX,
            reference: 0,
        }
    }
}

impl StencilOpState {
    /// Returns the update operations of this face.
    #[inline]
    pub fn ops(&self) -> StencilOps {
        StencilOps {
            fail_op: self.fail_op,
            depth_fail_op: self.depth_fail_op,
            pass_op: self.pass_op,
        }
    }

    /// Returns the comparison of this face.
    #[inline]
    pub fn compare(&self) -> StencilCompare {
        StencilCompare {
            compare_op: self.compare_op,
            reference: self.reference,
            compare_mask: self.compare_mask,
        }
    }
}

/// The three stencil update operations of one face, as committed to the native context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StencilOps {
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
}

impl Default for StencilOps {
    #[inline]
    fn default() -> Self {
        Self {
            fail_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
        }
    }
}

/// The stencil comparison of one face, as committed to the native context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StencilCompare {
    pub compare_op: CompareOp,
    pub reference: u32,
    pub compare_mask: u32,
}

impl Default for StencilCompare {
    #[inline]
    fn default() -> Self {
        Self {
            compare_op: CompareOp::Always,
            reference: 0,
            compare_mask: u32::MAX,
        }
    }
}

/// Operation to perform after the depth and stencil tests.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum StencilOp {
    Keep = ash::vk::StencilOp::KEEP.as_raw(),
    Zero = ash::vk::StencilOp::ZERO.as_raw(),
    Replace = ash::vk::StencilOp::REPLACE.as_raw(),
    IncrementAndClamp = ash::vk::StencilOp::INCREMENT_AND_CLAMP.as_raw(),
    DecrementAndClamp = ash::vk::StencilOp::DECREMENT_AND_CLAMP.as_raw(),
    Invert = ash::vk::StencilOp::INVERT.as_raw(),
    IncrementAndWrap = ash::vk::StencilOp::INCREMENT_AND_WRAP.as_raw(),
    DecrementAndWrap = ash::vk::StencilOp::DECREMENT_AND_WRAP.as_raw(),
}

impl From<StencilOp> for ash::vk::StencilOp {
    #[inline]
    fn from(val: StencilOp) -> Self {
        Self::from_raw(val as i32)
    }
}

/// Specifies a face for stencil operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum StencilFaces {
    Front = ash::vk::StencilFaceFlags::FRONT.as_raw(),
    Back = ash::vk::StencilFaceFlags::BACK.as_raw(),
    FrontAndBack = ash::vk::StencilFaceFlags::FRONT_AND_BACK.as_raw(),
}

impl From<StencilFaces> for ash::vk::StencilFaceFlags {
    #[inline]
    fn from(val: StencilFaces) -> Self {
        Self::from_raw(val as u32)
    }
}

/// Specifies how two values should be compared to decide whether a test passes or fails.
///
/// Used for both depth testing and stencil testing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum CompareOp {
    /// The test never passes.
    Never = ash::vk::CompareOp::NEVER.as_raw(),
    /// The test passes if `value < reference_value`.
    Less = ash::vk::CompareOp::LESS.as_raw(),
    /// The test passes if `value == reference_value`.
    Equal = ash::vk::CompareOp::EQUAL.as_raw(),
    /// The test passes if `value <= reference_value`.
    LessOrEqual = ash::vk::CompareOp::LESS_OR_EQUAL.as_raw(),
    /// The test passes if `value > reference_value`.
    Greater = ash::vk::CompareOp::GREATER.as_raw(),
    /// The test passes if `value != reference_value`.
    NotEqual = ash::vk::CompareOp::NOT_EQUAL.as_raw(),
    /// The test passes if `value >= reference_value`.
    GreaterOrEqual = ash::vk::CompareOp::GREATER_OR_EQUAL.as_raw(),
    /// The test always passes.
    Always = ash::vk::CompareOp::ALWAYS.as_raw(),
}

impl From<CompareOp> for ash::vk::CompareOp {
    #[inline]
    fn from(val: CompareOp) -> Self {
        Self::from_raw(val as i32)
    }
}
