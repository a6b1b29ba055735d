use glint_gpu::prelude::*;

#[spirv(compute(threads(1)))]
pub fn main(
    #[spirv(push_constant)] params: &GiDispatchSizingPassParams,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    item_counts: &[u32],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    dispatch_args: &mut [u32],
) {
    DispatchSizer::new(*params).run(item_counts, dispatch_args);
}
