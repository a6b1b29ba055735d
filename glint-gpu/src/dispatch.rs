use bytemuck::{Pod, Zeroable};
use spirv_std::arch::IndexUnchecked;

use crate::{GiDispatchSizingPassParams, ItemCounts};

/// Arguments of a single indirect dispatch, in the layout expected by
/// `dispatch_workgroups_indirect()` (plus one reserved word, so that each
/// slot is 16 bytes wide).
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct DispatchArgs {
    pub group_count_x: u32,
    pub group_count_y: u32,
    pub group_count_z: u32,
    pub reserved: u32,
}

impl DispatchArgs {
    /// Number of `u32`s occupied by a single slot.
    pub const LEN: usize = 4;

    /// Returns a dispatch that doesn't launch anything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Returns a dispatch large enough to process `count` items, rounding up
    /// to a whole workgroup; the last workgroup may be partially occupied, so
    /// the consuming kernel must check its index against the actual count.
    pub fn for_items(count: u32, capacity: DispatchCapacity) -> Self {
        Self {
            group_count_x: capacity.groups_for(count),
            group_count_y: 1,
            group_count_z: 1,
            reserved: 0,
        }
    }

    pub fn read(buffer: &[u32], slot: DispatchSlot) -> Self {
        let base = slot.index() * Self::LEN;

        unsafe {
            Self {
                group_count_x: *buffer.index_unchecked(base),
                group_count_y: *buffer.index_unchecked(base + 1),
                group_count_z: *buffer.index_unchecked(base + 2),
                reserved: *buffer.index_unchecked(base + 3),
            }
        }
    }

    pub fn write(self, buffer: &mut [u32], slot: DispatchSlot) {
        let base = slot.index() * Self::LEN;

        unsafe {
            *buffer.index_unchecked_mut(base) = self.group_count_x;
            *buffer.index_unchecked_mut(base + 1) = self.group_count_y;
            *buffer.index_unchecked_mut(base + 2) = self.group_count_z;
            *buffer.index_unchecked_mut(base + 3) = self.reserved;
        }
    }

    pub fn as_array(self) -> [u32; 4] {
        [
            self.group_count_x,
            self.group_count_y,
            self.group_count_z,
            self.reserved,
        ]
    }

    pub fn is_noop(self) -> bool {
        self.group_count_x == 0
            || self.group_count_y == 0
            || self.group_count_z == 0
    }
}

/// How many items a single workgroup processes.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct DispatchCapacity {
    pub threads_per_group: u32,
    pub entries_per_thread: u32,
}

impl DispatchCapacity {
    pub const fn new(threads_per_group: u32, entries_per_thread: u32) -> Self {
        Self {
            threads_per_group,
            entries_per_thread,
        }
    }

    pub fn get(self) -> u32 {
        self.threads_per_group * self.entries_per_thread
    }

    /// Returns `ceil(count / capacity)`.
    pub fn groups_for(self, count: u32) -> u32 {
        let capacity = self.get();

        // Written this way instead of `(count + capacity - 1) / capacity` so
        // that counts close to `u32::MAX` don't overflow
        count / capacity + if count % capacity == 0 { 0 } else { 1 }
    }
}

/// Position of a downstream dispatch inside the dispatch-args buffer.
///
/// Slots are fixed - consumers index the buffer with [`Self::offset()`].
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub enum DispatchSlot {
    CellClearing,
    SurfelBinning,
}

impl DispatchSlot {
    /// Number of slots; the dispatch-args buffer holds
    /// `COUNT * DispatchArgs::LEN` words.
    pub const COUNT: usize = 2;

    pub const CELL_CLEARING_CAPACITY: DispatchCapacity =
        DispatchCapacity::new(64, 16);

    pub const SURFEL_BINNING_CAPACITY: DispatchCapacity =
        DispatchCapacity::new(64, 1);

    pub fn index(self) -> usize {
        match self {
            DispatchSlot::CellClearing => 0,
            DispatchSlot::SurfelBinning => 1,
        }
    }

    /// Offset of this slot, in bytes.
    pub fn offset(self) -> u32 {
        (self.index() * DispatchArgs::LEN * 4) as u32
    }

    pub fn capacity(self) -> DispatchCapacity {
        match self {
            DispatchSlot::CellClearing => Self::CELL_CLEARING_CAPACITY,
            DispatchSlot::SurfelBinning => Self::SURFEL_BINNING_CAPACITY,
        }
    }

    pub fn item_count(self, counts: ItemCounts) -> u32 {
        match self {
            DispatchSlot::CellClearing => counts.cell_count,
            DispatchSlot::SurfelBinning => counts.surfel_count,
        }
    }
}

/// Turns item counts into indirect-dispatch arguments.
#[derive(Clone, Copy)]
pub struct DispatchSizer {
    params: GiDispatchSizingPassParams,
}

impl DispatchSizer {
    pub fn new(params: GiDispatchSizingPassParams) -> Self {
        Self { params }
    }

    pub fn is_enabled(self, slot: DispatchSlot) -> bool {
        match slot {
            DispatchSlot::CellClearing => self.params.is_cell_clearing(),
            DispatchSlot::SurfelBinning => true,
        }
    }

    pub fn eval(self, slot: DispatchSlot, counts: ItemCounts) -> DispatchArgs {
        if self.is_enabled(slot) {
            DispatchArgs::for_items(slot.item_count(counts), slot.capacity())
        } else {
            DispatchArgs::disabled()
        }
    }

    /// Writes every slot of `args` - disabled slots included, so that the
    /// buffer never carries arguments left over from a previous frame.
    pub fn run(self, counts: &[u32], args: &mut [u32]) {
        let counts = ItemCounts::read(counts);

        self.eval(DispatchSlot::CellClearing, counts)
            .write(args, DispatchSlot::CellClearing);

        self.eval(DispatchSlot::SurfelBinning, counts)
            .write(args, DispatchSlot::SurfelBinning);
    }
}
