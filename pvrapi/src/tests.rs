// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

#![cfg(test)]

/// Creates a context backed by the recording backend and returns it together with its call log.
macro_rules! recording_context {
    () => {
        recording_context!($crate::context::GraphicsContextCreateInfo::default())
    };
    ($create_info:expr) => {{
        let _ = pretty_env_logger::try_init();

        let native = $crate::native::recording::RecordingNative::new();
        let log = native.log();
        let context = $crate::context::GraphicsContext::new(native, $create_info);

        (context, log)
    }};
}

/// Compiles a vertex and a fragment shader that link successfully on the recording backend.
macro_rules! shaders {
    ($context:expr) => {{
        use $crate::shader::{Shader, ShaderCreateInfo, ShaderStage};

        let vs = Shader::new(
            $context.clone(),
            ShaderCreateInfo::new(ShaderStage::Vertex, b"void main() {}"),
        )
        .unwrap();
        let fs = Shader::new(
            $context.clone(),
            ShaderCreateInfo::new(ShaderStage::Fragment, b"void main() {}"),
        )
        .unwrap();

        (vs, fs)
    }};
}

macro_rules! assert_should_panic {
    ($msg:expr, $code:block) => {{
        let res = ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| $code));

        match res {
            Ok(_) => panic!("Test expected to panic but didn't"),
            Err(err) => {
                if let Some(msg) = err.downcast_ref::<String>() {
                    assert!(msg.contains($msg));
                } else if let Some(&msg) = err.downcast_ref::<&str>() {
                    assert!(msg.contains($msg));
                } else {
                    panic!("Couldn't decipher the panic message of the test")
                }
            }
        }
    }};

    ($code:block) => {{
        let res = ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| $code));

        match res {
            Ok(_) => panic!("Test expected to panic but didn't"),
            Err(_) => {}
        }
    }};
}
