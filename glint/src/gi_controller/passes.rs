use log::debug;

use crate::{Engine, GiBuffers, GiConfig};

macro_rules! passes {
    ([ $( $name:ident => $class:ident, )* ]) => {
        $( mod $name; )*
        $( pub use self::$name::*; )*

        #[derive(Debug)]
        pub struct GiPasses {
            $( pub $name: $class, )*
        }

        impl GiPasses {
            pub fn new(
                engine: &Engine,
                device: &wgpu::Device,
                config: &GiConfig,
                buffers: &GiBuffers,
            ) -> Self {
                debug!("Initializing GI passes");

                Self {
                    $( $name: $class::new(engine, device, config, buffers), )*
                }
            }
        }
    };
}

passes!([
    gi_dispatch_sizing => GiDispatchSizingPass,
    gi_retrace_requesting => GiRetraceRequestingPass,
    gi_validation => GiValidationPass,
]);
