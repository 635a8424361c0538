// Copyright (c) 2017 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Blending of the fragment shader output with the color already in the framebuffer.
//!
//! When blending is enabled, every written pixel is computed as
//! `op(src * src_factor, dst * dst_factor)`, separately for the color components and for alpha.
//! When it is disabled, the fragment shader output is written as is. In both cases the color write
//! mask selects which components actually reach the framebuffer.
//!
//! Only one blend configuration is supported per pipeline, shared by every attachment, since
//! OpenGL ES can't blend attachments independently.

use crate::pipeline::state::{StateContainer, StateValue};
use std::ops::BitOr;

/// Describes how the color output of the fragment shader is written to the attachment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorBlendState {
    /// Sets the blend and output state for the color attachments.
    ///
    /// Only the first element is used. If more than one is provided, a warning is logged and the
    /// first one applies to every attachment. If the list is empty, the state is inherited from
    /// the parent pipeline, or the defaults are used if there is no parent.
    ///
    /// The default value is empty.
    pub attachments: Vec<ColorBlendAttachmentState>,

    #[cfg_attr(feature = "serde", serde(skip, default = "crate::non_exhaustive"))]
    pub _ne: crate::NonExhaustive,
}

impl Default for ColorBlendState {
    #[inline]
    fn default() -> Self {
        Self {
            attachments: Vec::new(),
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl ColorBlendState {
    /// Creates a `ColorBlendState` with one attachment that uses `state`.
    #[inline]
    pub fn with_attachment_state(state: ColorBlendAttachmentState) -> Self {
        Self {
            attachments: vec![state],
            ..Default::default()
        }
    }

    /// Creates a `ColorBlendState` with one attachment, and the given blending.
    #[inline]
    pub fn blend(blend: AttachmentBlend) -> Self {
        Self::with_attachment_state(ColorBlendAttachmentState {
            blend: Some(blend),
            ..Default::default()
        })
    }

    /// Creates a `ColorBlendState` with one attachment and blending disabled.
    #[inline]
    pub fn blend_disabled() -> Self {
        Self::with_attachment_state(ColorBlendAttachmentState::default())
    }

    /// Returns the attachment state that is actually used, if any was provided.
    pub fn effective_attachment(&self) -> Option<&ColorBlendAttachmentState> {
        self.attachments.first()
    }

    /// Decomposes this aspect into state units, keeping only the fields that differ from
    /// `parent` if there is one.
    ///
    /// The blend factors are only emitted when blending is enabled, and then whenever the parent
    /// had blending disabled or different factors. The blend operations are only emitted when
    /// blending is enabled and they differ from the parent's.
    pub fn create_state_objects(&self, container: &mut StateContainer, parent: Option<&Self>) {
        if self.attachments.len() > 1 {
            log::warn!(
                "{} color attachment blend states provided, only the first one is used for all \
                attachments",
                self.attachments.len(),
            );
        }

        let Some(parent) = parent else {
            let this = self.effective_attachment().copied().unwrap_or_default();
            container.push(StateValue::BlendEnable(this.blend.is_some()));
            container.push(StateValue::BlendFactors(this.factors()));
            container.push(StateValue::BlendOps(this.ops()));
            container.push(StateValue::ColorWriteMask(this.color_write_mask));
            return;
        };

        let Some(this) = self.effective_attachment() else {
            return;
        };
        let parent = parent.effective_attachment().copied().unwrap_or_default();

        if this.blend.is_some() != parent.blend.is_some() {
            container.push(StateValue::BlendEnable(this.blend.is_some()));
        }

        if this.blend.is_some() && (parent.blend.is_none() || this.factors() != parent.factors())
        {
            container.push(StateValue::BlendFactors(this.factors()));
        }

        if this.blend.is_some() && this.ops() != parent.ops() {
            container.push(StateValue::BlendOps(this.ops()));
        }

        if this.color_write_mask != parent.color_write_mask {
            container.push(StateValue::ColorWriteMask(this.color_write_mask));
        }
    }
}

/// Blending and write mask of a color attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorBlendAttachmentState {
    /// The blend parameters for the attachment.
    ///
    /// `None` disables blending: the fragment shader output replaces the framebuffer value.
    ///
    /// The default value is `None`.
    pub blend: Option<AttachmentBlend>,

    /// Sets which components of the final pixel value are written to the attachment.
    ///
    /// The default value is `ColorComponents::all()`.
    pub color_write_mask: ColorComponents,
}

impl Default for ColorBlendAttachmentState {
    #[inline]
    fn default() -> Self {
        Self {
            blend: None,
            color_write_mask: ColorComponents::all(),
        }
    }
}

impl ColorBlendAttachmentState {
    /// Returns the blend factors, or the native defaults when blending is disabled.
    #[inline]
    pub fn factors(&self) -> BlendFactors {
        self.blend
            .map(|blend| BlendFactors {
                src_color: blend.src_color_blend_factor,
                dst_color: blend.dst_color_blend_factor,
                src_alpha: blend.src_alpha_blend_factor,
                dst_alpha: blend.dst_alpha_blend_factor,
            })
            .unwrap_or_default()
    }

    /// Returns the blend operations, or the native defaults when blending is disabled.
    #[inline]
    pub fn ops(&self) -> BlendOps {
        self.blend
            .map(|blend| BlendOps {
                color: blend.color_blend_op,
                alpha: blend.alpha_blend_op,
            })
            .unwrap_or_default()
    }
}

/// Blend factors and operations, for color and alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttachmentBlend {
    /// Multiplies the color of the fragment shader output.
    ///
    /// The default value is [`BlendFactor::One`].
    pub src_color_blend_factor: BlendFactor,

    /// Multiplies the color already in the framebuffer.
    ///
    /// The default value is [`BlendFactor::Zero`].
    pub dst_color_blend_factor: BlendFactor,

    /// Combines the two weighted colors.
    ///
    /// The default value is [`BlendOp::Add`].
    pub color_blend_op: BlendOp,

    /// Multiplies the alpha of the fragment shader output.
    ///
    /// The default value is [`BlendFactor::One`].
    pub src_alpha_blend_factor: BlendFactor,

    /// Multiplies the alpha already in the framebuffer.
    ///
    /// The default value is [`BlendFactor::Zero`].
    pub dst_alpha_blend_factor: BlendFactor,

    /// Combines the two weighted alphas.
    ///
    /// The default value is [`BlendOp::Add`].
    pub alpha_blend_op: BlendOp,
}

impl Default for AttachmentBlend {
    #[inline]
    fn default() -> Self {
        Self {
            src_color_blend_factor: BlendFactor::One,
            dst_color_blend_factor: BlendFactor::Zero,
            color_blend_op: BlendOp::Add,
            src_alpha_blend_factor: BlendFactor::One,
            dst_alpha_blend_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOp::Add,
        }
    }
}

impl AttachmentBlend {
    /// Builds an `AttachmentBlend` where the output of the fragment shader is ignored and the
    /// destination is untouched.
    #[inline]
    pub fn ignore_source() -> Self {
        Self {
            src_color_blend_factor: BlendFactor::Zero,
            dst_color_blend_factor: BlendFactor::DstColor,
            color_blend_op: BlendOp::Add,
            src_alpha_blend_factor: BlendFactor::Zero,
            dst_alpha_blend_factor: BlendFactor::DstColor,
            alpha_blend_op: BlendOp::Add,
        }
    }

    /// Builds an `AttachmentBlend` where the output will be merged with the existing value
    /// based on the alpha of the source.
    #[inline]
    pub fn alpha() -> Self {
        Self {
            src_color_blend_factor: BlendFactor::SrcAlpha,
            dst_color_blend_factor: BlendFactor::OneMinusSrcAlpha,
            color_blend_op: BlendOp::Add,
            src_alpha_blend_factor: BlendFactor::SrcAlpha,
            dst_alpha_blend_factor: BlendFactor::OneMinusSrcAlpha,
            alpha_blend_op: BlendOp::Add,
        }
    }

    /// Builds an `AttachmentBlend` where the colors are added, and alpha is set to the maximum
    /// of the two.
    #[inline]
    pub fn additive() -> Self {
        Self {
            src_color_blend_factor: BlendFactor::One,
            dst_color_blend_factor: BlendFactor::One,
            color_blend_op: BlendOp::Add,
            src_alpha_blend_factor: BlendFactor::One,
            dst_alpha_blend_factor: BlendFactor::One,
            alpha_blend_op: BlendOp::Max,
        }
    }
}

impl From<ColorBlendAttachmentState> for ash::vk::PipelineColorBlendAttachmentState {
    #[inline]
    fn from(val: ColorBlendAttachmentState) -> Self {
        let factors = val.factors();
        let ops = val.ops();

        ash::vk::PipelineColorBlendAttachmentState {
            blend_enable: val.blend.is_some() as ash::vk::Bool32,
            src_color_blend_factor: factors.src_color.into(),
            dst_color_blend_factor: factors.dst_color.into(),
            color_blend_op: ops.color.into(),
            src_alpha_blend_factor: factors.src_alpha.into(),
            dst_alpha_blend_factor: factors.dst_alpha.into(),
            alpha_blend_op: ops.alpha.into(),
            color_write_mask: val.color_write_mask.into(),
        }
    }
}

/// The four blend factors, as committed to the native context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendFactors {
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl Default for BlendFactors {
    #[inline]
    fn default() -> Self {
        Self {
            src_color: BlendFactor::One,
            dst_color: BlendFactor::Zero,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
        }
    }
}

/// The color and alpha blend equations, as committed to the native context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendOps {
    pub color: BlendOp,
    pub alpha: BlendOp,
}

impl Default for BlendOps {
    #[inline]
    fn default() -> Self {
        Self {
            color: BlendOp::Add,
            alpha: BlendOp::Add,
        }
    }
}

/// The operation that takes `source` (output from the fragment shader), `destination` (value
/// currently in the framebuffer attachment) and `blend_constant` input values,
/// and produces new inputs to be fed to `BlendOp`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum BlendFactor {
    /// Always `0`.
    Zero = ash::vk::BlendFactor::ZERO.as_raw(),
    /// Always `1`.
    One = ash::vk::BlendFactor::ONE.as_raw(),
    /// `source` component-wise.
    SrcColor = ash::vk::BlendFactor::SRC_COLOR.as_raw(),
    /// `1 - source` component-wise.
    OneMinusSrcColor = ash::vk::BlendFactor::ONE_MINUS_SRC_COLOR.as_raw(),
    /// `destination` component-wise.
    DstColor = ash::vk::BlendFactor::DST_COLOR.as_raw(),
    /// `1 - destination` component-wise.
    OneMinusDstColor = ash::vk::BlendFactor::ONE_MINUS_DST_COLOR.as_raw(),
    /// `source.a` for all components.
    SrcAlpha = ash::vk::BlendFactor::SRC_ALPHA.as_raw(),
    /// `1 - source.a` for all components.
    OneMinusSrcAlpha = ash::vk::BlendFactor::ONE_MINUS_SRC_ALPHA.as_raw(),
    /// `destination.a` for all components.
    DstAlpha = ash::vk::BlendFactor::DST_ALPHA.as_raw(),
    /// `1 - destination.a` for all components.
    OneMinusDstAlpha = ash::vk::BlendFactor::ONE_MINUS_DST_ALPHA.as_raw(),
    /// `blend_constants` component-wise.
    ConstantColor = ash::vk::BlendFactor::CONSTANT_COLOR.as_raw(),
    /// `1 - blend_constants` component-wise.
    OneMinusConstantColor = ash::vk::BlendFactor::ONE_MINUS_CONSTANT_COLOR.as_raw(),
    /// `blend_constants.a` for all components.
    ConstantAlpha = ash::vk::BlendFactor::CONSTANT_ALPHA.as_raw(),
    /// `1 - blend_constants.a` for all components.
    OneMinusConstantAlpha = ash::vk::BlendFactor::ONE_MINUS_CONSTANT_ALPHA.as_raw(),
    /// For the alpha component, always `1`. For the color components,
    /// `min(source.a, 1 - destination.a)` for all components.
    SrcAlphaSaturate = ash::vk::BlendFactor::SRC_ALPHA_SATURATE.as_raw(),
}

impl From<BlendFactor> for ash::vk::BlendFactor {
    #[inline]
    fn from(val: BlendFactor) -> Self {
        Self::from_raw(val as i32)
    }
}

/// The arithmetic operation that is applied between the `source` and `destination` component
/// values, after the appropriate `BlendFactor` is applied to both.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum BlendOp {
    /// `source + destination`.
    Add = ash::vk::BlendOp::ADD.as_raw(),
    /// `source - destination`.
    Subtract = ash::vk::BlendOp::SUBTRACT.as_raw(),
    /// `destination - source`.
    ReverseSubtract = ash::vk::BlendOp::REVERSE_SUBTRACT.as_raw(),
    /// `min(source, destination)`.
    Min = ash::vk::BlendOp::MIN.as_raw(),
    /// `max(source, destination)`.
    Max = ash::vk::BlendOp::MAX.as_raw(),
}

impl From<BlendOp> for ash::vk::BlendOp {
    #[inline]
    fn from(val: BlendOp) -> Self {
        Self::from_raw(val as i32)
    }
}

/// A mask specifying color components that can be written to a framebuffer attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorComponents(u32);

impl ColorComponents {
    /// The red component.
    pub const R: Self = Self(ash::vk::ColorComponentFlags::R.as_raw());
    /// The green component.
    pub const G: Self = Self(ash::vk::ColorComponentFlags::G.as_raw());
    /// The blue component.
    pub const B: Self = Self(ash::vk::ColorComponentFlags::B.as_raw());
    /// The alpha component.
    pub const A: Self = Self(ash::vk::ColorComponentFlags::A.as_raw());

    /// Returns a mask with no component.
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns a mask with every component.
    #[inline]
    pub const fn all() -> Self {
        Self(Self::R.0 | Self::G.0 | Self::B.0 | Self::A.0)
    }

    /// Returns whether every component of `other` is also in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the mask as `[r, g, b, a]` booleans.
    #[inline]
    pub const fn to_rgba(self) -> [bool; 4] {
        [
            self.contains(Self::R),
            self.contains(Self::G),
            self.contains(Self::B),
            self.contains(Self::A),
        ]
    }
}

impl BitOr for ColorComponents {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl From<ColorComponents> for ash::vk::ColorComponentFlags {
    #[inline]
    fn from(val: ColorComponents) -> Self {
        Self::from_raw(val.0)
    }
}
