//! Node layouts: bitmasks used to route nodes to renderers and schedulers.

use bitflags::bitflags;

bitflags! {
    /// A 32-bit layout mask.
    ///
    /// The named bits are the builtin layouts. Every other bit is free for
    /// application-defined layouts and is preserved by all operations.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Layout: u32 {
        const DEFAULT = 1 << 0;
        const DEBUG_ONLY = 1 << 1;
        const STATIC = 1 << 2;
        const IGNORE_RAYCASTING = 1 << 3;
        const IGNORE_CULLING = 1 << 4;
        /// Nodes carrying this bit are never considered visible.
        const HIDDEN = 1 << 5;
        const PICKING = 1 << 6;
        const INSIDE_FRUSTUM = 1 << 7;

        const _ = !0;
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Layout {
    /// Build a layout from raw bits, keeping user-defined bits.
    pub fn from_raw(bits: u32) -> Self {
        Self::from_bits_retain(bits)
    }
}
