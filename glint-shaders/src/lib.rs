#![cfg_attr(target_arch = "spirv", no_std)]

pub mod gi_dispatch_sizing;
pub mod gi_retrace_requesting;
pub mod gi_validation;
