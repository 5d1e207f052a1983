/// Flags controlling [`crate::RayBeam::extract_rays`], matching the
/// `RayExtractionMask` bit layout from the source project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractFlags(u32);

impl ExtractFlags {
    pub const ORIGIN_POV: Self = Self(1 << 0);
    pub const DESTINATION_POV: Self = Self(1 << 1);
    pub const BEAM_IS_SURFACE_RELATIVE: Self = Self(1 << 2);
    pub const RAY_SHOULD_BE_SURFACE_RELATIVE: Self = Self(1 << 3);
    pub const EXTRACT_INTERCEPTED: Self = Self(1 << 4);
    pub const EXTRACT_VIGNETTED: Self = Self(1 << 5);
    pub const EXCLUDE_BEAM: Self = Self(1 << 6);

    pub const EXTRACT_ALL: Self = Self(Self::EXTRACT_INTERCEPTED.0 | Self::EXTRACT_VIGNETTED.0);

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for ExtractFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_checks_all_bits() {
        let flags = ExtractFlags::ORIGIN_POV | ExtractFlags::EXTRACT_INTERCEPTED;
        assert!(flags.contains(ExtractFlags::ORIGIN_POV));
        assert!(flags.contains(ExtractFlags::EXTRACT_INTERCEPTED));
        assert!(!flags.contains(ExtractFlags::EXTRACT_VIGNETTED));
        assert!(!flags.contains(ExtractFlags::DESTINATION_POV));
    }

    #[test]
    fn extract_all_covers_both_categories() {
        assert!(ExtractFlags::EXTRACT_ALL.contains(ExtractFlags::EXTRACT_INTERCEPTED));
        assert!(ExtractFlags::EXTRACT_ALL.contains(ExtractFlags::EXTRACT_VIGNETTED));
    }
}
