use bytemuck::{Pod, Zeroable};
use spirv_std::arch::IndexUnchecked;

/// Per-frame item counts, as produced by the counting passes.
///
/// Layout is fixed: `cell_count` lives at byte offset 0 and `surfel_count`
/// at byte offset 4 of the counts buffer.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct ItemCounts {
    pub cell_count: u32,
    pub surfel_count: u32,
}

impl ItemCounts {
    /// Index (in `u32`s) of `cell_count` inside the counts buffer.
    pub const CELL_COUNT: usize = 0;

    /// Index (in `u32`s) of `surfel_count` inside the counts buffer.
    pub const SURFEL_COUNT: usize = 1;

    /// Number of `u32`s occupied by this record.
    pub const LEN: usize = 2;

    pub fn read(buffer: &[u32]) -> Self {
        unsafe {
            Self {
                cell_count: *buffer.index_unchecked(Self::CELL_COUNT),
                surfel_count: *buffer.index_unchecked(Self::SURFEL_COUNT),
            }
        }
    }

    pub fn write(self, buffer: &mut [u32]) {
        unsafe {
            *buffer.index_unchecked_mut(Self::CELL_COUNT) = self.cell_count;
            *buffer.index_unchecked_mut(Self::SURFEL_COUNT) = self.surfel_count;
        }
    }
}
