// Copyright (c) 2017 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Makes pipelines current on a context.
//!
//! Binding a graphics pipeline first classifies it against the pipeline that is currently bound
//! and then touches as little state as the relation allows:
//!
//! | Relation                          | State pass                                             |
//! |-----------------------------------|--------------------------------------------------------|
//! | `Identical`, `NullNull`           | nothing at all                                         |
//! | `Unrelated`, `NullNotNull`        | every unit of every ancestor, root first, then its own |
//! | `FatherChild`                     | the new pipeline's units                               |
//! | `ChildFather`                     | the bound pipeline's units are unset                   |
//! | `Siblings`                        | the bound pipeline's units that the new one doesn't override are unset, then the new pipeline's units are set |
//! | `NotNullNull`                     | nothing, the record is cleared                         |
//!
//! After the state pass, the program and the vertex input of the new pipeline are made current.
//!
//! The functions here run while a command buffer executes, with the context state locked.

use super::{
    compute::ComputePipeline, graphics::GraphicsPipeline, relation::PipelineRelation,
    PipelineBindPoint,
};
use crate::context::{ContextState, SavedPipeline};
use std::sync::Arc;

/// Makes `new` the current graphics pipeline, or clears the record for `None`.
pub(crate) fn bind_graphics(state: &mut ContextState, new: Option<&Arc<GraphicsPipeline>>) {
    let bound = state.bound_graphics();
    let relation = PipelineRelation::classify(bound.as_ref(), new);

    log::trace!(
        "binding graphics pipeline {:?} over {:?}: {:?}",
        new.map(|p| p.id()),
        bound.as_ref().map(|p| p.id()),
        relation,
    );

    match relation {
        PipelineRelation::Identical => {
            // A compute bind in between replaced the program.
            if state.last_bound == PipelineBindPoint::Graphics {
                return;
            }
        }
        PipelineRelation::NullNull => return,
        PipelineRelation::NotNullNull => {
            state.bound_graphics = None;
            state.last_bound = PipelineBindPoint::Graphics;
            return;
        }
        PipelineRelation::NullNotNull | PipelineRelation::Unrelated => {
            if let Some(new) = new {
                new.set_all(state);
            }
        }
        PipelineRelation::FatherChild => {
            if let Some(new) = new {
                new.set_from_parent(state);
            }
        }
        PipelineRelation::ChildFather => {
            if let Some(bound) = &bound {
                bound.unset_to_parent(state);
            }
        }
        PipelineRelation::Siblings => {
            if let (Some(bound), Some(new)) = (&bound, new) {
                for unit in bound.states().units() {
                    if !new.states().contains(unit.kind()) {
                        unit.unset(state);
                    }
                }

                new.set_from_parent(state);
            }
        }
    }

    let Some(new) = new else {
        return;
    };

    new.bind_program_and_vertex_input(state);
    state.bound_graphics = Some(Arc::downgrade(new));
    state.last_bound = PipelineBindPoint::Graphics;
}

/// Makes `pipeline` the current compute pipeline.
pub(crate) fn bind_compute(state: &mut ContextState, pipeline: &Arc<ComputePipeline>) {
    log::trace!("binding compute pipeline {}", pipeline.id());

    pipeline.bind_program(state);
    state.bound_compute = Some(Arc::downgrade(pipeline));
    state.last_bound = PipelineBindPoint::Compute;
}

/// Saves the pipeline that was bound last on the pipeline stack.
pub(crate) fn push_pipeline(state: &mut ContextState) {
    if let Some(max_depth) = state.max_pipeline_stack_depth {
        if state.pipeline_stack.len() >= max_depth {
            log::warn!(
                "pipeline stack is full ({} entries), the push is ignored",
                max_depth,
            );
            return;
        }
    }

    let saved = match state.last_bound {
        PipelineBindPoint::Graphics => state.bound_graphics.clone().map(SavedPipeline::Graphics),
        PipelineBindPoint::Compute => state.bound_compute.clone().map(SavedPipeline::Compute),
    };

    state.pipeline_stack.push(saved);
}

/// Restores the pipeline saved by the matching push. Does nothing if the stack is empty.
pub(crate) fn pop_pipeline(state: &mut ContextState) {
    let Some(saved) = state.pipeline_stack.pop() else {
        log::debug!("pipeline stack is empty, the pop is ignored");
        return;
    };

    match saved {
        Some(SavedPipeline::Graphics(pipeline)) => {
            bind_graphics(state, pipeline.upgrade().as_ref());
        }
        Some(SavedPipeline::Compute(pipeline)) => match pipeline.upgrade() {
            Some(pipeline) => bind_compute(state, &pipeline),
            None => state.bound_compute = None,
        },
        None => bind_graphics(state, None),
    }
}

/// Forgets which pipelines are bound and what native state is current, without touching the
/// native state.
///
/// The next bind takes the path that sets every unit, and every value it sets reaches the native
/// context.
pub(crate) fn reset_pipeline(state: &mut ContextState) {
    state.bound_graphics = None;
    state.bound_compute = None;
    state.invalidate_state_cache();
}

#[cfg(test)]
mod tests {
    use super::{bind_compute, bind_graphics, pop_pipeline, push_pipeline, reset_pipeline};
    use crate::{
        context::GraphicsContextCreateInfo,
        native::recording::NativeCall,
        pipeline::{
            compute::ComputePipelineCreateInfo,
            graphics::{
                color_blend::{AttachmentBlend, BlendFactor, ColorBlendState},
                depth_stencil::{CompareOp, DepthStencilState},
                rasterization::{CullMode, FrontFace, RasterizationState},
                viewport::ViewportState,
                GraphicsPipeline, GraphicsPipelineCreateInfo,
            },
            PipelineBindPoint,
        },
        shader::{Shader, ShaderCreateInfo, ShaderStage},
        GraphicsContext,
    };
    use std::sync::Arc;

    struct Family {
        root: Arc<GraphicsPipeline>,
        blended: Arc<GraphicsPipeline>,
        greater: Arc<GraphicsPipeline>,
        other_root: Arc<GraphicsPipeline>,
    }

    fn family(context: &Arc<GraphicsContext>) -> Family {
        let (vs, fs) = shaders!(context);

        let root = context
            .create_parentable_graphics_pipeline(
                GraphicsPipelineCreateInfo::new(vs.clone(), fs.clone())
                    .color_blend_state(ColorBlendState::blend_disabled())
                    .rasterization_state(RasterizationState::new().cull_mode(CullMode::Back)),
            )
            .unwrap();
        let blended = context
            .create_graphics_pipeline(
                GraphicsPipelineCreateInfo::default()
                    .color_blend_state(ColorBlendState::blend(AttachmentBlend::alpha()))
                    .rasterization_state(RasterizationState::new().cull_mode(CullMode::Front)),
                Some(&root),
            )
            .unwrap();
        let greater = context
            .create_graphics_pipeline(
                GraphicsPipelineCreateInfo::default()
                    .depth_stencil_state(
                        DepthStencilState::default().depth_compare_op(CompareOp::Greater),
                    )
                    .viewport_state(ViewportState::default().scissor_test(true)),
                Some(&root),
            )
            .unwrap();
        let other_root = context
            .create_parentable_graphics_pipeline(
                GraphicsPipelineCreateInfo::new(vs, fs)
                    .depth_stencil_state(DepthStencilState::disabled())
                    .rasterization_state(
                        RasterizationState::new()
                            .cull_mode(CullMode::FrontAndBack)
                            .front_face(FrontFace::Clockwise),
                    )
                    .color_blend_state(ColorBlendState::blend(AttachmentBlend::additive())),
            )
            .unwrap();

        Family {
            root,
            blended,
            greater,
            other_root,
        }
    }

    #[test]
    fn child_after_parent_sets_only_its_units() {
        let (context, log) = recording_context!();
        let (vs, fs) = shaders!(context);

        let root = context
            .create_parentable_graphics_pipeline(
                GraphicsPipelineCreateInfo::new(vs, fs)
                    .color_blend_state(ColorBlendState::blend_disabled())
                    .rasterization_state(RasterizationState::new().cull_mode(CullMode::Back)),
            )
            .unwrap();
        let child = context
            .create_graphics_pipeline(
                GraphicsPipelineCreateInfo::default().color_blend_state(ColorBlendState::blend(
                    AttachmentBlend {
                        src_color_blend_factor: BlendFactor::One,
                        dst_color_blend_factor: BlendFactor::Zero,
                        ..Default::default()
                    },
                )),
                Some(&root),
            )
            .unwrap();

        let mut state = context.lock_state();
        bind_graphics(&mut state, Some(&root));
        log.clear();
        bind_graphics(&mut state, Some(&child));

        let factors = child.create_info().color_blend_state.attachments[0].factors();
        assert_eq!(
            log.calls(),
            [
                NativeCall::SetBlendEnable(true),
                NativeCall::SetBlendFactors(factors),
                NativeCall::SetVertexInput(root.states().vertex_input().clone()),
            ],
        );
        assert_eq!(log.state().cull_mode, CullMode::Back);
        drop(state);

        assert_eq!(context.bound_graphics_pipeline(), Some(child));
    }

    #[test]
    fn parent_after_child_unsets_child_units() {
        let (context, log) = recording_context!();
        let family = family(&context);

        let mut state = context.lock_state();
        bind_graphics(&mut state, Some(&family.root));
        let root_state = log.state();

        bind_graphics(&mut state, Some(&family.blended));
        assert_eq!(log.state().cull_mode, CullMode::Front);
        assert!(log.state().blend_enable);

        log.clear();
        bind_graphics(&mut state, Some(&family.root));

        assert!(log
            .calls()
            .iter()
            .filter(|call| call.is_state_change())
            .all(|call| matches!(
                call,
                NativeCall::SetBlendEnable(_)
                    | NativeCall::SetBlendFactors(_)
                    | NativeCall::SetBlendOps(_)
                    | NativeCall::SetCullMode(_)
            )));
        assert_eq!(log.state(), root_state);
    }

    #[test]
    fn sibling_switch_matches_cold_bind() {
        let (context, log) = recording_context!();
        let family = family(&context);

        let mut state = context.lock_state();
        bind_graphics(&mut state, Some(&family.blended));
        bind_graphics(&mut state, Some(&family.greater));
        let via_siblings = log.state();

        bind_graphics(&mut state, Some(&family.other_root));
        bind_graphics(&mut state, Some(&family.blended));
        reset_pipeline(&mut state);
        bind_graphics(&mut state, Some(&family.greater));
        let via_cold_path = log.state();

        assert_eq!(via_siblings, via_cold_path);
        assert_eq!(via_siblings.cull_mode, CullMode::Back);
        assert!(!via_siblings.blend_enable);
        assert_eq!(via_siblings.depth_compare_op, CompareOp::Greater);
        assert!(via_siblings.scissor_test);
    }

    #[test]
    fn sibling_switch_without_elision() {
        let (context, log) = recording_context!(GraphicsContextCreateInfo {
            elide_redundant_state: false,
            ..Default::default()
        });
        let family = family(&context);

        let mut state = context.lock_state();
        bind_graphics(&mut state, Some(&family.root));
        let root_state = log.state();
        bind_graphics(&mut state, Some(&family.blended));
        bind_graphics(&mut state, Some(&family.greater));
        bind_graphics(&mut state, Some(&family.root));

        assert_eq!(log.state(), root_state);
    }

    #[test]
    fn unrelated_bind_sets_everything() {
        let (context, log) = recording_context!(GraphicsContextCreateInfo {
            elide_redundant_state: false,
            ..Default::default()
        });
        let family = family(&context);

        let mut state = context.lock_state();
        bind_graphics(&mut state, Some(&family.other_root));
        log.clear();
        bind_graphics(&mut state, Some(&family.greater));

        let state_changes = log
            .calls()
            .into_iter()
            .filter(NativeCall::is_state_change)
            .count();
        assert_eq!(
            state_changes,
            family.root.states().len() + family.greater.states().len() + 1,
        );
        assert_eq!(log.state().front_face, FrontFace::CounterClockwise);
    }

    #[test]
    fn identical_bind_is_free() {
        let (context, log) = recording_context!(GraphicsContextCreateInfo {
            elide_redundant_state: false,
            ..Default::default()
        });
        let family = family(&context);

        let mut state = context.lock_state();
        bind_graphics(&mut state, Some(&family.blended));
        log.clear();
        bind_graphics(&mut state, Some(&family.blended));

        assert!(log.calls().is_empty());
    }

    #[test]
    fn identical_bind_after_compute_rebinds_program() {
        let (context, log) = recording_context!();
        let family = family(&context);
        let cs = Shader::new(
            context.clone(),
            ShaderCreateInfo::new(ShaderStage::Compute, b"void main() {}"),
        )
        .unwrap();
        let compute = context
            .create_compute_pipeline(ComputePipelineCreateInfo::new(cs))
            .unwrap();

        let mut state = context.lock_state();
        bind_graphics(&mut state, Some(&family.root));
        bind_compute(&mut state, &compute);
        assert_eq!(state.last_bound, PipelineBindPoint::Compute);

        log.clear();
        bind_graphics(&mut state, Some(&family.root));

        let program = family.root.program().map(|program| program.handle());
        assert_eq!(log.calls()[0], NativeCall::UseProgram(program));
        assert_eq!(state.last_bound, PipelineBindPoint::Graphics);
    }

    #[test]
    fn push_pop_restores_pipelines() {
        let (context, log) = recording_context!();
        let family = family(&context);

        let mut state = context.lock_state();
        bind_graphics(&mut state, Some(&family.root));
        let root_state = log.state();

        push_pipeline(&mut state);
        bind_graphics(&mut state, Some(&family.blended));
        push_pipeline(&mut state);
        bind_graphics(&mut state, Some(&family.other_root));

        pop_pipeline(&mut state);
        assert_eq!(state.bound_graphics(), Some(family.blended.clone()));
        pop_pipeline(&mut state);
        assert_eq!(state.bound_graphics(), Some(family.root.clone()));
        assert_eq!(log.state(), root_state);

        log.clear();
        pop_pipeline(&mut state);
        assert!(log.calls().is_empty());
        assert_eq!(state.bound_graphics(), Some(family.root.clone()));
        assert!(state.pipeline_stack.is_empty());
    }

    #[test]
    fn pop_of_empty_record_clears_binding() {
        let (context, _log) = recording_context!();
        let family = family(&context);

        let mut state = context.lock_state();
        push_pipeline(&mut state);
        bind_graphics(&mut state, Some(&family.root));
        pop_pipeline(&mut state);

        assert!(state.bound_graphics().is_none());
    }

    #[test]
    fn push_beyond_max_depth_is_dropped() {
        let (context, _log) = recording_context!(GraphicsContextCreateInfo {
            max_pipeline_stack_depth: Some(1),
            ..Default::default()
        });
        let family = family(&context);

        let mut state = context.lock_state();
        bind_graphics(&mut state, Some(&family.root));
        push_pipeline(&mut state);
        bind_graphics(&mut state, Some(&family.blended));
        push_pipeline(&mut state);
        assert_eq!(state.pipeline_stack.len(), 1);

        pop_pipeline(&mut state);
        assert_eq!(state.bound_graphics(), Some(family.root.clone()));
    }

    #[test]
    fn push_saves_last_bound_kind() {
        let (context, _log) = recording_context!();
        let family = family(&context);
        let cs = Shader::new(
            context.clone(),
            ShaderCreateInfo::new(ShaderStage::Compute, b"void main() {}"),
        )
        .unwrap();
        let compute = context
            .create_compute_pipeline(ComputePipelineCreateInfo::new(cs))
            .unwrap();

        let mut state = context.lock_state();
        bind_graphics(&mut state, Some(&family.root));
        bind_compute(&mut state, &compute);
        push_pipeline(&mut state);
        bind_graphics(&mut state, Some(&family.greater));
        pop_pipeline(&mut state);

        assert_eq!(state.last_bound, PipelineBindPoint::Compute);
        assert_eq!(state.bound_compute(), Some(compute.clone()));
        assert_eq!(state.bound_graphics(), Some(family.greater.clone()));
    }

    #[test]
    fn reset_reissues_cached_state() {
        let (context, log) = recording_context!();
        let family = family(&context);

        let mut state = context.lock_state();
        bind_graphics(&mut state, Some(&family.root));
        reset_pipeline(&mut state);

        log.clear();
        bind_graphics(&mut state, Some(&family.root));

        let calls = log.calls();
        assert!(calls.contains(&NativeCall::SetScissorTest(false)));
        assert!(calls.contains(&NativeCall::SetCullMode(CullMode::Back)));
        let program = family.root.program().map(|program| program.handle());
        assert!(calls.contains(&NativeCall::UseProgram(program)));
        assert_eq!(
            calls.iter().filter(|call| call.is_state_change()).count(),
            family.root.states().len(),
        );
    }

    #[test]
    fn reset_forces_full_bind() {
        let (context, log) = recording_context!(GraphicsContextCreateInfo {
            elide_redundant_state: false,
            ..Default::default()
        });
        let family = family(&context);

        let mut state = context.lock_state();
        bind_graphics(&mut state, Some(&family.root));
        reset_pipeline(&mut state);
        assert!(state.bound_graphics().is_none());

        log.clear();
        bind_graphics(&mut state, Some(&family.root));
        assert!(log
            .calls()
            .iter()
            .any(|call| matches!(call, NativeCall::SetScissorTest(false))));
    }
}
