// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Viewport and scissor state.
//!
//! The viewport and scissor rectangles themselves are dynamic and set by the render pass. The
//! pipeline only decides whether fragments outside the scissor box are discarded.

use crate::pipeline::state::{StateContainer, StateValue};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportState {
    /// Whether fragments outside the scissor box are discarded.
    ///
    /// The default value is `false`.
    pub scissor_test: bool,

    #[cfg_attr(feature = "serde", serde(skip, default = "crate::non_exhaustive"))]
    pub _ne: crate::NonExhaustive,
}

impl Default for ViewportState {
    #[inline]
    fn default() -> Self {
        Self {
            scissor_test: false,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl ViewportState {
    #[inline]
    pub fn scissor_test(mut self, enable: bool) -> Self {
        self.scissor_test = enable;
        self
    }

    pub fn create_state_objects(&self, container: &mut StateContainer, parent: Option<&Self>) {
        if parent.map_or(true, |parent| parent.scissor_test != self.scissor_test) {
            container.push(StateValue::ScissorTest(self.scissor_test));
        }
    }
}
