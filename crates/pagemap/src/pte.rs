//! Page-table entry decoding.
//!
//! Each 64-bit entry in `/proc/<pid>/pagemap` describes one virtual page.
//! Bit layout (see Documentation/admin-guide/mm/pagemap.rst):
//!
//! ```text
//! bit  63      page present in RAM
//! bit  62      page swapped out
//! bit  61      page is file-mapped or shared anonymous
//! bit  56      page exclusively mapped
//! bit  55      soft-dirty (written since tracking was last cleared)
//! bits 0..=54  page frame number, or swap type (0..=4) + swap offset (5..=54)
//! ```
//!
//! Any 64-bit value is a valid decode; there are no error conditions here.

/// Soft-dirty PTE bit.
pub const PM_SOFT_DIRTY: u64 = 1 << 55;
/// Page exclusively mapped.
pub const PM_MMAP_EXCLUSIVE: u64 = 1 << 56;
/// File-mapped or shared anonymous page.
pub const PM_FILE: u64 = 1 << 61;
/// Page is in swap.
pub const PM_SWAP: u64 = 1 << 62;
/// Page is present in RAM.
pub const PM_PRESENT: u64 = 1 << 63;

/// Mask for the page frame number (bits 0..=54).
const PM_PFRAME_MASK: u64 = (1 << 55) - 1;
/// Swap type lives in the low 5 bits when `PM_SWAP` is set.
const PM_SWAP_TYPE_MASK: u64 = 0x1f;
/// Swap offset occupies bits 5..=54 when `PM_SWAP` is set.
const PM_SWAP_OFFSET_MASK: u64 = (1 << 50) - 1;

/// A raw 64-bit pagemap entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PageEntry(pub u64);

/// Decoded flag bits of one entry. Flags are independent; several may be set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PageFlags {
    pub present: bool,
    pub swapped: bool,
    pub file_or_shared_anon: bool,
    pub soft_dirty: bool,
    pub exclusive: bool,
}

impl PageEntry {
    /// Build an entry from the little-endian bytes read out of pagemap.
    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        PageEntry(u64::from_le_bytes(bytes))
    }

    /// Decode the flag bits.
    pub fn flags(self) -> PageFlags {
        PageFlags {
            present: self.0 & PM_PRESENT != 0,
            swapped: self.0 & PM_SWAP != 0,
            file_or_shared_anon: self.0 & PM_FILE != 0,
            soft_dirty: self.0 & PM_SOFT_DIRTY != 0,
            exclusive: self.0 & PM_MMAP_EXCLUSIVE != 0,
        }
    }

    /// Page frame number, when the page is not swapped out.
    pub fn frame_number(self) -> Option<u64> {
        if self.0 & PM_SWAP != 0 {
            None
        } else {
            Some(self.0 & PM_PFRAME_MASK)
        }
    }

    /// Swap area type, when the page is swapped out.
    pub fn swap_type(self) -> Option<u8> {
        if self.0 & PM_SWAP != 0 {
            Some((self.0 & PM_SWAP_TYPE_MASK) as u8)
        } else {
            None
        }
    }

    /// Offset within the swap area, when the page is swapped out.
    pub fn swap_offset(self) -> Option<u64> {
        if self.0 & PM_SWAP != 0 {
            Some((self.0 >> 5) & PM_SWAP_OFFSET_MASK)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_only() {
        let entry = PageEntry(0x8000_0000_0000_0000);
        let flags = entry.flags();
        assert!(flags.present);
        assert!(!flags.swapped);
        assert!(!flags.file_or_shared_anon);
        assert!(!flags.soft_dirty);
        assert!(!flags.exclusive);
        assert_eq!(entry.frame_number(), Some(0));
        assert_eq!(entry.swap_type(), None);
    }

    #[test]
    fn test_swapped_with_type() {
        let entry = PageEntry((1 << 62) | 5);
        let flags = entry.flags();
        assert!(flags.swapped);
        assert!(!flags.present);
        assert_eq!(entry.swap_type(), Some(5));
        assert_eq!(entry.swap_offset(), Some(0));
        assert_eq!(entry.frame_number(), None);
    }

    #[test]
    fn test_swap_offset() {
        let entry = PageEntry((1 << 62) | (0x1234 << 5) | 3);
        assert_eq!(entry.swap_type(), Some(3));
        assert_eq!(entry.swap_offset(), Some(0x1234));
    }

    #[test]
    fn test_frame_number() {
        let entry = PageEntry(PM_PRESENT | 0x123456);
        assert_eq!(entry.frame_number(), Some(0x123456));
    }

    #[test]
    fn test_multiple_flags() {
        let entry = PageEntry(PM_PRESENT | PM_FILE | PM_SOFT_DIRTY | PM_MMAP_EXCLUSIVE);
        let flags = entry.flags();
        assert!(flags.present);
        assert!(flags.file_or_shared_anon);
        assert!(flags.soft_dirty);
        assert!(flags.exclusive);
        assert!(!flags.swapped);
    }

    #[test]
    fn test_zero_entry() {
        let flags = PageEntry(0).flags();
        assert_eq!(flags, PageFlags::default());
        assert_eq!(PageEntry(0).frame_number(), Some(0));
    }

    #[test]
    fn test_from_le_bytes() {
        let entry = PageEntry::from_le_bytes([0, 0, 0, 0, 0, 0, 0, 0x80]);
        assert!(entry.flags().present);
    }
}
