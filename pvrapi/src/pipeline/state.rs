// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Pipeline state broken down into independently settable units.
//!
//! A [`StateUnit`] is the smallest piece of native state that can be set, restored and compared
//! on its own: "depth test enabled", "blend factors", "cull mode" and so on. Every pipeline owns a
//! [`StateContainer`] with at most one unit of each [`StateKind`]. A root pipeline holds a unit
//! for every kind, while a pipeline with a parent only holds units for the state that differs from
//! its parent.
//!
//! Each unit remembers the value of the same kind in its parent pipeline. Unsetting a unit restores
//! that value, or the native default when there is no parent.

use crate::{
    context::ContextState,
    native::NativeContext,
    pipeline::graphics::{
        color_blend::{BlendFactors, BlendOps, ColorComponents},
        depth_stencil::{CompareOp, StencilCompare, StencilFaces, StencilOps},
        input_assembly::PrimitiveTopology,
        rasterization::{CullMode, DepthBias, FrontFace},
        vertex_input::{
            VertexInputAttributeDescription, VertexInputBindingDescription, VertexInputState,
        },
    },
    shader::{Shader, ShaderProgram},
};
use smallvec::SmallVec;
use std::sync::Arc;

/// The kind of a state unit.
///
/// Kinds are ordered; containers keep their units sorted by kind, with the shader program first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum StateKind {
    ShaderProgram,
    DepthTest,
    DepthWrite,
    DepthFunc,
    DepthBias,
    DepthClear,
    StencilTest,
    StencilClear,
    StencilOpFront,
    StencilOpBack,
    StencilCompareFront,
    StencilCompareBack,
    StencilWriteMaskFront,
    StencilWriteMaskBack,
    CullFace,
    FrontFace,
    BlendEnable,
    BlendFactors,
    BlendOps,
    ColorWriteMask,
    ScissorTest,
}

impl StateKind {
    /// The number of kinds.
    pub const COUNT: usize = 21;

    /// Every kind, in order.
    pub const ALL: [StateKind; Self::COUNT] = [
        StateKind::ShaderProgram,
        StateKind::DepthTest,
        StateKind::DepthWrite,
        StateKind::DepthFunc,
        StateKind::DepthBias,
        StateKind::DepthClear,
        StateKind::StencilTest,
        StateKind::StencilClear,
        StateKind::StencilOpFront,
        StateKind::StencilOpBack,
        StateKind::StencilCompareFront,
        StateKind::StencilCompareBack,
        StateKind::StencilWriteMaskFront,
        StateKind::StencilWriteMaskBack,
        StateKind::CullFace,
        StateKind::FrontFace,
        StateKind::BlendEnable,
        StateKind::BlendFactors,
        StateKind::BlendOps,
        StateKind::ColorWriteMask,
        StateKind::ScissorTest,
    ];

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Returns the value this kind has in a freshly created native context.
    pub fn default_value(self) -> StateValue {
        match self {
            StateKind::ShaderProgram => StateValue::ShaderProgram(None),
            StateKind::DepthTest => StateValue::DepthTest(false),
            StateKind::DepthWrite => StateValue::DepthWrite(true),
            StateKind::DepthFunc => StateValue::DepthFunc(CompareOp::Less),
            StateKind::DepthBias => StateValue::DepthBias(None),
            StateKind::DepthClear => StateValue::DepthClear(1.0),
            StateKind::StencilTest => StateValue::StencilTest(false),
            StateKind::StencilClear => StateValue::StencilClear(0),
            StateKind::StencilOpFront => StateValue::StencilOpFront(StencilOps::default()),
            StateKind::StencilOpBack => StateValue::StencilOpBack(StencilOps::default()),
            StateKind::StencilCompareFront => {
                StateValue::StencilCompareFront(StencilCompare::default())
            }
            StateKind::StencilCompareBack => {
                StateValue::StencilCompareBack(StencilCompare::default())
            }
            StateKind::StencilWriteMaskFront => StateValue::StencilWriteMaskFront(u32::MAX),
            StateKind::StencilWriteMaskBack => StateValue::StencilWriteMaskBack(u32::MAX),
            StateKind::CullFace => StateValue::CullFace(CullMode::None),
            StateKind::FrontFace => StateValue::FrontFace(FrontFace::CounterClockwise),
            StateKind::BlendEnable => StateValue::BlendEnable(false),
            StateKind::BlendFactors => StateValue::BlendFactors(BlendFactors::default()),
            StateKind::BlendOps => StateValue::BlendOps(BlendOps::default()),
            StateKind::ColorWriteMask => StateValue::ColorWriteMask(ColorComponents::all()),
            StateKind::ScissorTest => StateValue::ScissorTest(false),
        }
    }
}

/// The payload of a state unit.
#[derive(Clone, Debug, PartialEq)]
pub enum StateValue {
    ShaderProgram(Option<Arc<ShaderProgram>>),
    DepthTest(bool),
    DepthWrite(bool),
    DepthFunc(CompareOp),
    DepthBias(Option<DepthBias>),
    /// The value the depth buffer is cleared to.
    DepthClear(f32),
    StencilTest(bool),
    /// The value the stencil buffer is cleared to.
    StencilClear(u32),
    StencilOpFront(StencilOps),
    StencilOpBack(StencilOps),
    StencilCompareFront(StencilCompare),
    StencilCompareBack(StencilCompare),
    /// The bits of the stencil buffer that front faces may write.
    StencilWriteMaskFront(u32),
    StencilWriteMaskBack(u32),
    CullFace(CullMode),
    FrontFace(FrontFace),
    BlendEnable(bool),
    BlendFactors(BlendFactors),
    BlendOps(BlendOps),
    ColorWriteMask(ColorComponents),
    ScissorTest(bool),
}

impl StateValue {
    /// Returns the kind of this value.
    pub fn kind(&self) -> StateKind {
        match self {
            StateValue::ShaderProgram(_) => StateKind::ShaderProgram,
            StateValue::DepthTest(_) => StateKind::DepthTest,
            StateValue::DepthWrite(_) => StateKind::DepthWrite,
            StateValue::DepthFunc(_) => StateKind::DepthFunc,
            StateValue::DepthBias(_) => StateKind::DepthBias,
            StateValue::DepthClear(_) => StateKind::DepthClear,
            StateValue::StencilTest(_) => StateKind::StencilTest,
            StateValue::StencilClear(_) => StateKind::StencilClear,
            StateValue::StencilOpFront(_) => StateKind::StencilOpFront,
            StateValue::StencilOpBack(_) => StateKind::StencilOpBack,
            StateValue::StencilCompareFront(_) => StateKind::StencilCompareFront,
            StateValue::StencilCompareBack(_) => StateKind::StencilCompareBack,
            StateValue::StencilWriteMaskFront(_) => StateKind::StencilWriteMaskFront,
            StateValue::StencilWriteMaskBack(_) => StateKind::StencilWriteMaskBack,
            StateValue::CullFace(_) => StateKind::CullFace,
            StateValue::FrontFace(_) => StateKind::FrontFace,
            StateValue::BlendEnable(_) => StateKind::BlendEnable,
            StateValue::BlendFactors(_) => StateKind::BlendFactors,
            StateValue::BlendOps(_) => StateKind::BlendOps,
            StateValue::ColorWriteMask(_) => StateKind::ColorWriteMask,
            StateValue::ScissorTest(_) => StateKind::ScissorTest,
        }
    }

    /// Issues the native call that makes this value current.
    pub(crate) fn apply(&self, native: &mut dyn NativeContext) {
        match *self {
            StateValue::ShaderProgram(ref program) => {
                native.use_program(program.as_ref().map(|program| program.handle()))
            }
            StateValue::DepthTest(enable) => native.set_depth_test(enable),
            StateValue::DepthWrite(enable) => native.set_depth_write(enable),
            StateValue::DepthFunc(compare_op) => native.set_depth_compare_op(compare_op),
            StateValue::DepthBias(depth_bias) => native.set_depth_bias(depth_bias),
            StateValue::DepthClear(depth) => native.set_depth_clear_value(depth),
            StateValue::StencilTest(enable) => native.set_stencil_test(enable),
            StateValue::StencilClear(stencil) => native.set_stencil_clear_value(stencil),
            StateValue::StencilOpFront(ops) => native.set_stencil_ops(StencilFaces::Front, ops),
            StateValue::StencilOpBack(ops) => native.set_stencil_ops(StencilFaces::Back, ops),
            StateValue::StencilCompareFront(compare) => {
                native.set_stencil_compare(StencilFaces::Front, compare)
            }
            StateValue::StencilCompareBack(compare) => {
                native.set_stencil_compare(StencilFaces::Back, compare)
            }
            StateValue::StencilWriteMaskFront(mask) => {
                native.set_stencil_write_mask(StencilFaces::Front, mask)
            }
            StateValue::StencilWriteMaskBack(mask) => {
                native.set_stencil_write_mask(StencilFaces::Back, mask)
            }
            StateValue::CullFace(cull_mode) => native.set_cull_mode(cull_mode),
            StateValue::FrontFace(front_face) => native.set_front_face(front_face),
            StateValue::BlendEnable(enable) => native.set_blend_enable(enable),
            StateValue::BlendFactors(factors) => native.set_blend_factors(factors),
            StateValue::BlendOps(ops) => native.set_blend_ops(ops),
            StateValue::ColorWriteMask(mask) => native.set_color_write_mask(mask),
            StateValue::ScissorTest(enable) => native.set_scissor_test(enable),
        }
    }
}

/// One piece of pipeline state, together with the value it falls back to when unset.
#[derive(Clone, Debug)]
pub struct StateUnit {
    value: StateValue,
    parent: Option<StateValue>,
}

impl StateUnit {
    /// Creates a unit with no parent.
    #[inline]
    pub fn new(value: StateValue) -> Self {
        StateUnit {
            value,
            parent: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> StateKind {
        self.value.kind()
    }

    #[inline]
    pub fn value(&self) -> &StateValue {
        &self.value
    }

    /// Returns the value of the same kind in the nearest ancestor pipeline that has one.
    #[inline]
    pub fn parent(&self) -> Option<&StateValue> {
        self.parent.as_ref()
    }

    /// Restores the payload to the native default. Issues no native call.
    #[inline]
    pub fn reset(&mut self) {
        self.value = self.kind().default_value();
    }

    /// Makes this unit's value current.
    #[inline]
    pub(crate) fn set(&self, state: &mut ContextState) {
        state.commit(&self.value);
    }

    /// Restores the parent's value, or the native default without a parent.
    #[inline]
    pub(crate) fn unset(&self, state: &mut ContextState) {
        match &self.parent {
            Some(parent) => state.commit(parent),
            None => self.set_default(state),
        }
    }

    #[inline]
    pub(crate) fn set_default(&self, state: &mut ContextState) {
        state.commit(&self.kind().default_value());
    }
}

impl PartialEq for StateUnit {
    /// Compares payloads, the parent value is ignored.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// The full configuration of one pipeline: its state units and the state that is inherited
/// wholesale rather than diffed.
///
/// Units are kept sorted by [`StateKind`], not in the order they were pushed. Every unit targets
/// a different piece of native state, so the order they are set or unset in doesn't change the
/// resulting state, and sorting gives lookups by kind and a program unit that always comes first.
#[derive(Clone, Debug, Default)]
pub struct StateContainer {
    units: SmallVec<[StateUnit; 8]>,
    pub(crate) vertex_shader: Option<Arc<Shader>>,
    pub(crate) fragment_shader: Option<Arc<Shader>>,
    pub(crate) compute_shader: Option<Arc<Shader>>,
    pub(crate) vertex_input: VertexInputState,
    pub(crate) topology: PrimitiveTopology,
}

impl StateContainer {
    /// Creates an empty container.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit with no parent, keeping the units sorted by kind.
    ///
    /// A container holds at most one unit per kind. Pushing a kind that is already present
    /// replaces the previous unit.
    pub fn push(&mut self, value: StateValue) {
        let kind = value.kind();

        match self.units.binary_search_by_key(&kind, StateUnit::kind) {
            Ok(index) => {
                debug_assert!(false, "state unit {:?} pushed twice", kind);
                self.units[index] = StateUnit::new(value);
            }
            Err(index) => self.units.insert(index, StateUnit::new(value)),
        }
    }

    /// Returns the unit of the given kind, if this container has one.
    #[inline]
    pub fn get(&self, kind: StateKind) -> Option<&StateUnit> {
        self.units
            .binary_search_by_key(&kind, StateUnit::kind)
            .ok()
            .map(|index| &self.units[index])
    }

    #[inline]
    pub fn contains(&self, kind: StateKind) -> bool {
        self.get(kind).is_some()
    }

    /// Returns the units, sorted by kind.
    #[inline]
    pub fn units(&self) -> &[StateUnit] {
        &self.units
    }

    /// Returns the number of units.
    #[inline]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Returns the program of this container, if it has its own.
    ///
    /// The program unit always sorts first.
    pub fn program(&self) -> Option<&Arc<ShaderProgram>> {
        match self.units.first().map(StateUnit::value) {
            Some(StateValue::ShaderProgram(program)) => program.as_ref(),
            _ => None,
        }
    }

    #[inline]
    pub fn vertex_shader(&self) -> Option<&Arc<Shader>> {
        self.vertex_shader.as_ref()
    }

    #[inline]
    pub fn fragment_shader(&self) -> Option<&Arc<Shader>> {
        self.fragment_shader.as_ref()
    }

    #[inline]
    pub fn compute_shader(&self) -> Option<&Arc<Shader>> {
        self.compute_shader.as_ref()
    }

    #[inline]
    pub fn vertex_input(&self) -> &VertexInputState {
        &self.vertex_input
    }

    /// Returns the stride and input rate of a vertex buffer binding.
    #[inline]
    pub fn vertex_input_binding(&self, binding: u32) -> Option<&VertexInputBindingDescription> {
        self.vertex_input.bindings.get(&binding)
    }

    /// Returns the attributes read from a vertex buffer binding.
    #[inline]
    pub fn vertex_attributes(&self, binding: u32) -> Option<&[VertexInputAttributeDescription]> {
        self.vertex_input.attributes.get(&binding).map(Vec::as_slice)
    }

    #[inline]
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Fills in the parent value of every unit. `resolve` returns the value of a kind in the
    /// nearest ancestor that has one.
    pub(crate) fn link_parents(&mut self, resolve: impl Fn(StateKind) -> Option<StateValue>) {
        for unit in &mut self.units {
            unit.parent = resolve(unit.kind());
        }
    }

    /// Sets every unit.
    pub(crate) fn set_all(&self, state: &mut ContextState) {
        for unit in &self.units {
            unit.set(state);
        }
    }

    /// Unsets every unit.
    pub(crate) fn unset_all(&self, state: &mut ContextState) {
        for unit in &self.units {
            unit.unset(state);
        }
    }
}
