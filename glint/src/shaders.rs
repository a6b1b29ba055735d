use std::fs;
use std::path::Path;

use log::debug;

use crate::{Error, Result};

macro_rules! shaders {
    ([ $( $name:ident, )* ]) => {
        #[derive(Debug)]
        pub struct Shaders {
            $( pub $name: (wgpu::ShaderModule, &'static str), )*
        }

        impl Shaders {
            pub fn new(device: &wgpu::Device, dir: &Path) -> Result<Self> {
                Ok(Self {
                    $(
                        $name: (
                            load(device, dir, stringify!($name))?,
                            concat!(stringify!($name), "::main"),
                        ),
                    )*
                })
            }
        }
    };
}

shaders!([gi_dispatch_sizing, gi_retrace_requesting, gi_validation,]);

const SPIRV_MAGIC: u32 = 0x07230203;

fn load(
    device: &wgpu::Device,
    dir: &Path,
    name: &'static str,
) -> Result<wgpu::ShaderModule> {
    let path = dir.join(format!("{name}.spv"));

    debug!("Loading shader: {name} ({})", path.display());

    let bytes = fs::read(&path).map_err(|source| Error::ShaderIo {
        name,
        path: path.clone(),
        source,
    })?;

    if !is_spirv(&bytes) {
        return Err(Error::InvalidShader { name });
    }

    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("glint_{name}")),
        source: wgpu::util::make_spirv(&bytes),
    }))
}

fn is_spirv(bytes: &[u8]) -> bool {
    if bytes.len() < 4 || bytes.len() % 4 != 0 {
        return false;
    }

    let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];

    u32::from_le_bytes(magic) == SPIRV_MAGIC
        || u32::from_be_bytes(magic) == SPIRV_MAGIC
}
