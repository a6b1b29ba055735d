use glint_gpu::prelude::*;

#[spirv(compute(threads(8, 8)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &GiValidationPassParams,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    prim_depth: &[f32],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    gi_history: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    gi_retrace_requests: &mut [Vec4],
) {
    let gi_pos = global_id.xy();

    if !params.contains(gi_pos) {
        return;
    }

    GiValidator::new(*params).run_requesting(
        gi_pos,
        prim_depth,
        gi_history,
        gi_retrace_requests,
    );
}
