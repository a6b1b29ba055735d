use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Pod, Zeroable,
)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Frame(u32);

impl Frame {
    /// Length of the tracing / validation cycle, in frames.
    pub const GI_CYCLE: u32 = 6;

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Returns whether this frame traces new GI samples.
    pub fn is_gi_tracing(self) -> bool {
        self.0 % Self::GI_CYCLE < 4
    }

    /// Returns whether this frame re-traces cached GI samples to check how
    /// stale they are.
    ///
    /// Validation frames come in pairs (frames 4 and 5 of each cycle), so
    /// that four consecutive validation frames land on every residue of
    /// `frame % 4` - see [`crate::resolve_subpixel()`].
    pub fn is_gi_validation(self) -> bool {
        !self.is_gi_tracing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence() {
        let validation_frames: Vec<_> = (0..12)
            .map(Frame::new)
            .filter(|frame| frame.is_gi_validation())
            .map(Frame::get)
            .collect();

        assert_eq!(vec![4, 5, 10, 11], validation_frames);
    }

    #[test]
    fn validation_frames_cover_every_subpixel() {
        let mut residues: Vec<_> = (0..Frame::GI_CYCLE * 2)
            .map(Frame::new)
            .filter(|frame| frame.is_gi_validation())
            .map(|frame| frame.get() % 4)
            .collect();

        residues.sort();

        assert_eq!(vec![0, 1, 2, 3], residues);
    }

    #[test]
    fn next_wraps() {
        assert_eq!(Frame::new(0), Frame::new(u32::MAX).next());
    }
}
