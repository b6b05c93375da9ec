//! Per-resource LOD requirement values.

/// LOD assumed for a resource before any requirement has been computed.
pub const DEFAULT_LOD: i32 = 0;

/// Streaming priority assumed before any requirement has been computed.
pub const DEFAULT_PRIORITY: f32 = 0.0;

/// The detail level a resource should be streamed at, and how urgently.
///
/// Compared by value: recomputing an identical `LodInfo` is not a change and
/// must not reach the resource's provider. Priorities compare bitwise, so a
/// NaN priority equals itself and `0.0` differs from `-0.0`.
#[derive(Clone, Copy, Debug)]
pub struct LodInfo {
    /// Level of detail the resource must reach (0 = coarsest available).
    pub required_lod: i32,
    /// Loader priority; higher is fetched first.
    pub priority: f32,
}

impl LodInfo {
    pub fn new(required_lod: i32, priority: f32) -> Self {
        Self {
            required_lod,
            priority,
        }
    }

    pub(crate) fn same_priority(&self, other: &Self) -> bool {
        self.priority.to_bits() == other.priority.to_bits()
    }
}

impl PartialEq for LodInfo {
    fn eq(&self, other: &Self) -> bool {
        self.required_lod == other.required_lod && self.same_priority(other)
    }
}

impl Eq for LodInfo {}

impl Default for LodInfo {
    fn default() -> Self {
        Self::new(DEFAULT_LOD, DEFAULT_PRIORITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lod_zero() {
        assert_eq!(LodInfo::default(), LodInfo::new(0, 0.0));
    }

    #[test]
    fn test_equality_is_by_value() {
        assert_eq!(LodInfo::new(2, 1.5), LodInfo::new(2, 1.5));
        assert_ne!(LodInfo::new(2, 1.5), LodInfo::new(2, 1.0));
        assert_ne!(LodInfo::new(1, 1.5), LodInfo::new(2, 1.5));
    }

    #[test]
    fn test_nan_priority_equals_itself() {
        assert_eq!(LodInfo::new(1, f32::NAN), LodInfo::new(1, f32::NAN));
        assert_ne!(LodInfo::new(1, f32::NAN), LodInfo::new(1, 0.0));
    }
}
