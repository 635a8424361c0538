// Copyright (c) 2017 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! How the pipeline being bound relates to the one that is currently bound.
//!
//! The relation decides how much state has to be touched when switching pipelines. Only direct
//! relations count: a grandchild is `Unrelated` to its grandparent.

use super::graphics::GraphicsPipeline;
use std::sync::Arc;

/// The relation between the bound pipeline and the pipeline about to be bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineRelation {
    /// Both are the same pipeline.
    Identical,
    /// Nothing is bound, and nothing is being bound.
    NullNull,
    /// Nothing is bound, and a pipeline is being bound.
    NullNotNull,
    /// A pipeline is bound, and nothing is being bound.
    NotNullNull,
    /// The bound pipeline is the parent of the new one.
    FatherChild,
    /// The new pipeline is the parent of the bound one.
    ChildFather,
    /// Both pipelines have the same parent.
    Siblings,
    /// None of the above.
    Unrelated,
}

impl PipelineRelation {
    /// Classifies the transition from `bound` to `new`.
    pub fn classify(
        bound: Option<&Arc<GraphicsPipeline>>,
        new: Option<&Arc<GraphicsPipeline>>,
    ) -> PipelineRelation {
        let (bound, new) = match (bound, new) {
            (None, None) => return PipelineRelation::NullNull,
            (None, Some(_)) => return PipelineRelation::NullNotNull,
            (Some(_), None) => return PipelineRelation::NotNullNull,
            (Some(bound), Some(new)) => (bound, new),
        };

        if Arc::ptr_eq(bound, new) {
            return PipelineRelation::Identical;
        }

        match (bound.parent(), new.parent()) {
            (Some(bound_parent), _) if Arc::ptr_eq(bound_parent, new) => {
                PipelineRelation::ChildFather
            }
            (Some(bound_parent), Some(new_parent)) if Arc::ptr_eq(bound_parent, new_parent) => {
                PipelineRelation::Siblings
            }
            (_, Some(new_parent)) if Arc::ptr_eq(new_parent, bound) => {
                PipelineRelation::FatherChild
            }
            _ => PipelineRelation::Unrelated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PipelineRelation;
    use crate::pipeline::graphics::GraphicsPipelineCreateInfo;

    #[test]
    fn classify_hierarchy() {
        let (context, _log) = recording_context!();
        let (vs, fs) = shaders!(context);

        let root = context
            .create_parentable_graphics_pipeline(GraphicsPipelineCreateInfo::new(
                vs.clone(),
                fs.clone(),
            ))
            .unwrap();
        let other_root = context
            .create_parentable_graphics_pipeline(GraphicsPipelineCreateInfo::new(vs, fs))
            .unwrap();
        let child_a = context
            .create_graphics_pipeline(GraphicsPipelineCreateInfo::default(), Some(&root))
            .unwrap();
        let child_b = context
            .create_graphics_pipeline(GraphicsPipelineCreateInfo::default(), Some(&root))
            .unwrap();
        let cousin = context
            .create_graphics_pipeline(GraphicsPipelineCreateInfo::default(), Some(&other_root))
            .unwrap();

        let cases = [
            (None, None, PipelineRelation::NullNull),
            (None, Some(&root), PipelineRelation::NullNotNull),
            (Some(&root), None, PipelineRelation::NotNullNull),
            (Some(&root), Some(&root), PipelineRelation::Identical),
            (Some(&root), Some(&child_a), PipelineRelation::FatherChild),
            (Some(&child_a), Some(&root), PipelineRelation::ChildFather),
            (Some(&child_a), Some(&child_b), PipelineRelation::Siblings),
            (Some(&child_a), Some(&cousin), PipelineRelation::Unrelated),
            (Some(&root), Some(&other_root), PipelineRelation::Unrelated),
            (Some(&other_root), Some(&child_a), PipelineRelation::Unrelated),
        ];

        for (bound, new, expected) in cases {
            assert_eq!(
                PipelineRelation::classify(bound, new),
                expected,
                "{:?} -> {:?}",
                bound.map(|p| p.id()),
                new.map(|p| p.id()),
            );
        }
    }

    #[test]
    fn roots_are_not_siblings() {
        let (context, _log) = recording_context!();
        let (vs, fs) = shaders!(context);

        let a = context
            .create_graphics_pipeline(GraphicsPipelineCreateInfo::new(vs.clone(), fs.clone()), None)
            .unwrap();
        let b = context
            .create_graphics_pipeline(GraphicsPipelineCreateInfo::new(vs, fs), None)
            .unwrap();

        assert_eq!(
            PipelineRelation::classify(Some(&a), Some(&b)),
            PipelineRelation::Unrelated,
        );
    }
}
