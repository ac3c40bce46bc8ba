use std::fmt;

// Each register contains 32 bits
pub const REG_SIZE: usize = std::mem::size_of::<u32>();

// Byte offsets into the GPIO block (BCM2835 datasheet @ 6.1)
pub const GPFSEL0: usize = 0x00;
pub const GPSET0: usize = 0x1c;
pub const GPCLR0: usize = 0x28;
pub const GPLEV0: usize = 0x34;

/// Size in bytes of the mapped GPIO region. Covers `GPFSEL0` up to and including `GPLEV0`.
pub const GPIO_REGION_SIZE: usize = 0x3c;
/// Number of 32-bit registers in the mapped GPIO region.
pub const GPIO_REGISTERS: usize = GPIO_REGION_SIZE / REG_SIZE;

/// Word-level access to the GPIO register block.
///
/// Offsets are byte offsets from the start of the block. They must be 32-bit
/// aligned and fall inside the region, otherwise the access panics. Register
/// access is infallible once the block is mapped.
pub trait RegisterMap: fmt::Debug + Send + Sync {
    /// Size of the mapped region in bytes.
    fn size(&self) -> usize;
    /// Reads the 32-bit register at `offset`.
    fn read_word(&self, offset: usize) -> u32;
    /// Writes `value` to the 32-bit register at `offset`.
    fn write_word(&self, offset: usize, value: u32);
}

#[inline(always)]
pub(crate) fn check_offset(offset: usize, size: usize) {
    assert!(
        offset % REG_SIZE == 0 && offset + REG_SIZE <= size,
        "register offset {:#x} outside {:#x}-byte GPIO region",
        offset,
        size
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_covers_used_registers() {
        for offset in [GPFSEL0, GPFSEL0 + 8, GPSET0, GPCLR0, GPLEV0] {
            check_offset(offset, GPIO_REGION_SIZE);
        }
        assert_eq!(GPIO_REGISTERS, 15);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn offset_past_end_panics() {
        check_offset(GPIO_REGION_SIZE, GPIO_REGION_SIZE);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn unaligned_offset_panics() {
        check_offset(GPSET0 + 1, GPIO_REGION_SIZE);
    }
}
