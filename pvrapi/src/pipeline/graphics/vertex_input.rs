// Copyright (c) 2017 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Configuration of vertex input.
//!
//! The vertex input stage reads vertex data from one or more vertex buffers. Each buffer binding
//! has a stride and an input rate, and lists the attributes that are fetched from it, each
//! feeding one shader input location.
//!
//! Vertex input is not split into state units. A pipeline that declares no bindings uses the
//! bindings of its parent, and the same goes for attributes.

use crate::pipeline::state::StateContainer;
use std::collections::BTreeMap;

/// The state in a graphics pipeline describing how the vertex input stage should behave.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexInputState {
    /// A description of the vertex buffers that the vertex input stage will read from, keyed by
    /// binding index.
    pub bindings: BTreeMap<u32, VertexInputBindingDescription>,

    /// For each binding index, the attributes read from that binding, in declaration order.
    pub attributes: BTreeMap<u32, Vec<VertexInputAttributeDescription>>,
}

impl VertexInputState {
    /// Constructs a new `VertexInputState` with no bindings or attributes.
    #[inline]
    pub fn new() -> VertexInputState {
        VertexInputState::default()
    }

    /// Adds a single binding.
    #[inline]
    pub fn binding(mut self, binding: u32, description: VertexInputBindingDescription) -> Self {
        self.bindings.insert(binding, description);
        self
    }

    /// Sets all bindings.
    pub fn bindings(
        mut self,
        bindings: impl IntoIterator<Item = (u32, VertexInputBindingDescription)>,
    ) -> Self {
        self.bindings = bindings.into_iter().collect();
        self
    }

    /// Appends an attribute to the ones read from `binding`.
    #[inline]
    pub fn attribute(mut self, binding: u32, description: VertexInputAttributeDescription) -> Self {
        self.attributes.entry(binding).or_default().push(description);
        self
    }

    /// Returns whether no binding and no attribute is declared.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.attributes.is_empty()
    }

    /// Returns the total number of attributes over all bindings.
    pub fn num_attributes(&self) -> usize {
        self.attributes.values().map(Vec::len).sum()
    }

    /// Stores the resolved vertex input in the container. Vertex input is not diffed.
    pub fn create_state_objects(&self, container: &mut StateContainer, parent: Option<&Self>) {
        container.vertex_input = self.inherit(parent);
    }

    /// Resolves the vertex input of a pipeline from its own description and its parent's.
    pub(crate) fn inherit(&self, parent: Option<&Self>) -> Self {
        let Some(parent) = parent else {
            return self.clone();
        };

        VertexInputState {
            bindings: if self.bindings.is_empty() {
                parent.bindings.clone()
            } else {
                self.bindings.clone()
            },
            attributes: if self.attributes.is_empty() {
                parent.attributes.clone()
            } else {
                self.attributes.clone()
            },
        }
    }

    /// Returns the bindings as Vulkan structures.
    pub fn to_vk_bindings(&self) -> Vec<ash::vk::VertexInputBindingDescription> {
        self.bindings
            .iter()
            .map(|(&binding, description)| ash::vk::VertexInputBindingDescription {
                binding,
                stride: description.stride,
                input_rate: description.input_rate.into(),
            })
            .collect()
    }

    /// Returns the attributes as Vulkan structures.
    pub fn to_vk_attributes(&self) -> Vec<ash::vk::VertexInputAttributeDescription> {
        self.attributes
            .iter()
            .flat_map(|(&binding, attributes)| {
                attributes
                    .iter()
                    .map(move |attribute| ash::vk::VertexInputAttributeDescription {
                        location: attribute.location,
                        binding,
                        format: attribute.format.into(),
                        offset: attribute.offset,
                    })
            })
            .collect()
    }
}

/// Describes a single vertex buffer binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexInputBindingDescription {
    /// The number of bytes from the start of one element in the vertex buffer to the start of the
    /// next element. This can be simply the size of the data in each element, but larger strides
    /// are possible.
    pub stride: u32,

    /// How often the vertex input should advance to the next element.
    pub input_rate: VertexInputRate,
}

/// Describes a single vertex buffer attribute mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexInputAttributeDescription {
    /// The shader input location fed by this attribute.
    pub location: u32,

    /// The size and type of the vertex data.
    pub format: VertexFormat,

    /// Number of bytes between the start of a vertex buffer element and the location of attribute.
    pub offset: u32,
}

/// How the vertex source should be unrolled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VertexInputRate {
    /// Each element of the source corresponds to a vertex.
    Vertex,

    /// Each element of the source corresponds to an instance.
    ///
    /// `divisor` indicates how many consecutive instances will use the same instance buffer data.
    Instance { divisor: u32 },
}

impl From<VertexInputRate> for ash::vk::VertexInputRate {
    #[inline]
    fn from(val: VertexInputRate) -> Self {
        match val {
            VertexInputRate::Vertex => ash::vk::VertexInputRate::VERTEX,
            VertexInputRate::Instance { .. } => ash::vk::VertexInputRate::INSTANCE,
        }
    }
}

/// The formats a vertex attribute can be read as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(non_camel_case_types)]
pub enum VertexFormat {
    R32_SFLOAT,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,
    R16G16_SFLOAT,
    R16G16B16A16_SFLOAT,
    R8G8B8A8_UNORM,
    R8G8B8A8_UINT,
    R16G16_SNORM,
    R32_UINT,
    R32_SINT,
}

/// Scalar type of the components of a [`VertexFormat`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Float32,
    Float16,
    Uint8,
    Int16,
    Uint32,
    Int32,
}

impl VertexFormat {
    /// Returns the number of components.
    pub fn components(self) -> u32 {
        match self {
            VertexFormat::R32_SFLOAT | VertexFormat::R32_UINT | VertexFormat::R32_SINT => 1,
            VertexFormat::R32G32_SFLOAT
            | VertexFormat::R16G16_SFLOAT
            | VertexFormat::R16G16_SNORM => 2,
            VertexFormat::R32G32B32_SFLOAT => 3,
            VertexFormat::R32G32B32A32_SFLOAT
            | VertexFormat::R16G16B16A16_SFLOAT
            | VertexFormat::R8G8B8A8_UNORM
            | VertexFormat::R8G8B8A8_UINT => 4,
        }
    }

    /// Returns the scalar type of each component.
    pub fn component_type(self) -> ComponentType {
        match self {
            VertexFormat::R32_SFLOAT
            | VertexFormat::R32G32_SFLOAT
            | VertexFormat::R32G32B32_SFLOAT
            | VertexFormat::R32G32B32A32_SFLOAT => ComponentType::Float32,
            VertexFormat::R16G16_SFLOAT | VertexFormat::R16G16B16A16_SFLOAT => {
                ComponentType::Float16
            }
            VertexFormat::R8G8B8A8_UNORM | VertexFormat::R8G8B8A8_UINT => ComponentType::Uint8,
            VertexFormat::R16G16_SNORM => ComponentType::Int16,
            VertexFormat::R32_UINT => ComponentType::Uint32,
            VertexFormat::R32_SINT => ComponentType::Int32,
        }
    }

    /// Returns whether integer components are normalized to `[0, 1]` or `[-1, 1]`.
    pub fn normalized(self) -> bool {
        matches!(
            self,
            VertexFormat::R8G8B8A8_UNORM | VertexFormat::R16G16_SNORM
        )
    }

    /// Returns the size in bytes of one element.
    pub fn block_size(self) -> u32 {
        let component_size = match self.component_type() {
            ComponentType::Float32 | ComponentType::Uint32 | ComponentType::Int32 => 4,
            ComponentType::Float16 | ComponentType::Int16 => 2,
            ComponentType::Uint8 => 1,
        };

        component_size * self.components()
    }
}

impl From<VertexFormat> for ash::vk::Format {
    #[inline]
    fn from(val: VertexFormat) -> Self {
        match val {
            VertexFormat::R32_SFLOAT => ash::vk::Format::R32_SFLOAT,
            VertexFormat::R32G32_SFLOAT => ash::vk::Format::R32G32_SFLOAT,
            VertexFormat::R32G32B32_SFLOAT => ash::vk::Format::R32G32B32_SFLOAT,
            VertexFormat::R32G32B32A32_SFLOAT => ash::vk::Format::R32G32B32A32_SFLOAT,
            VertexFormat::R16G16_SFLOAT => ash::vk::Format::R16G16_SFLOAT,
            VertexFormat::R16G16B16A16_SFLOAT => ash::vk::Format::R16G16B16A16_SFLOAT,
            VertexFormat::R8G8B8A8_UNORM => ash::vk::Format::R8G8B8A8_UNORM,
            VertexFormat::R8G8B8A8_UINT => ash::vk::Format::R8G8B8A8_UINT,
            VertexFormat::R16G16_SNORM => ash::vk::Format::R16G16_SNORM,
            VertexFormat::R32_UINT => ash::vk::Format::R32_UINT,
            VertexFormat::R32_SINT => ash::vk::Format::R32_SINT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        VertexFormat, VertexInputAttributeDescription, VertexInputBindingDescription,
        VertexInputRate, VertexInputState,
    };

    fn position_only() -> VertexInputState {
        VertexInputState::new()
            .binding(
                0,
                VertexInputBindingDescription {
                    stride: 12,
                    input_rate: VertexInputRate::Vertex,
                },
            )
            .attribute(
                0,
                VertexInputAttributeDescription {
                    location: 0,
                    format: VertexFormat::R32G32B32_SFLOAT,
                    offset: 0,
                },
            )
    }

    #[test]
    fn empty_child_inherits() {
        let parent = position_only();
        assert_eq!(VertexInputState::new().inherit(Some(&parent)), parent);
        assert!(VertexInputState::new().inherit(None).is_empty());
    }

    #[test]
    fn maps_fall_back_independently() {
        let parent = position_only();
        let child = VertexInputState::new().binding(
            0,
            VertexInputBindingDescription {
                stride: 32,
                input_rate: VertexInputRate::Vertex,
            },
        );

        let resolved = child.inherit(Some(&parent));
        assert_eq!(resolved.bindings[&0].stride, 32);
        assert_eq!(resolved.attributes, parent.attributes);
    }

    #[test]
    fn vk_descriptions() {
        let state = position_only().attribute(
            0,
            VertexInputAttributeDescription {
                location: 1,
                format: VertexFormat::R16G16_SFLOAT,
                offset: 12,
            },
        );

        let attributes = state.to_vk_attributes();
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[1].location, 1);
        assert_eq!(attributes[1].format, ash::vk::Format::R16G16_SFLOAT);
        assert_eq!(state.num_attributes(), 2);
        assert_eq!(state.to_vk_bindings()[0].stride, 12);
        assert_eq!(VertexFormat::R16G16B16A16_SFLOAT.block_size(), 8);
    }
}
