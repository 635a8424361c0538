// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The layout of descriptor sets and push constants used by a pipeline.
//!
//! Descriptor sets are bound by index at draw time; the layout only describes what a pipeline
//! expects at each index, so that it can be introspected.

use crate::shader::ShaderStage;
use smallvec::SmallVec;

/// Describes the resources a pipeline expects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineLayout {
    set_layouts: Vec<DescriptorSetLayout>,
    push_constant_ranges: Vec<PushConstantRange>,
}

impl PipelineLayout {
    /// Creates a layout with no descriptor set and no push constant.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a layout from its parts.
    pub fn new(create_info: PipelineLayoutCreateInfo) -> Self {
        let PipelineLayoutCreateInfo {
            set_layouts,
            push_constant_ranges,
            _ne: _,
        } = create_info;

        PipelineLayout {
            set_layouts,
            push_constant_ranges,
        }
    }

    /// Returns the layout of every descriptor set, by set index.
    #[inline]
    pub fn set_layouts(&self) -> &[DescriptorSetLayout] {
        &self.set_layouts
    }

    #[inline]
    pub fn push_constant_ranges(&self) -> &[PushConstantRange] {
        &self.push_constant_ranges
    }
}

/// Parameters to create a new `PipelineLayout`.
#[derive(Clone, Debug)]
pub struct PipelineLayoutCreateInfo {
    /// The descriptor set layouts, by set index.
    ///
    /// The default value is empty.
    pub set_layouts: Vec<DescriptorSetLayout>,

    /// The ranges of push constants that the pipeline will access.
    ///
    /// The default value is empty.
    pub push_constant_ranges: Vec<PushConstantRange>,

    pub _ne: crate::NonExhaustive,
}

impl Default for PipelineLayoutCreateInfo {
    #[inline]
    fn default() -> Self {
        Self {
            set_layouts: Vec::new(),
            push_constant_ranges: Vec::new(),
            _ne: crate::NonExhaustive(()),
        }
    }
}

/// The bindings of one descriptor set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DescriptorSetLayout {
    pub bindings: SmallVec<[DescriptorSetLayoutBinding; 4]>,
}

/// One binding in a descriptor set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub descriptor_count: u32,
    pub stages: SmallVec<[ShaderStage; 2]>,
}

/// The type of resource a descriptor refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformBuffer,
    StorageBuffer,
    UniformBufferDynamic,
    StorageBufferDynamic,
}

/// A range of push constants visible to one stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PushConstantRange {
    pub stage: ShaderStage,
    pub offset: u32,
    pub size: u32,
}
