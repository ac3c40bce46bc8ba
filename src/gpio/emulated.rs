use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use super::regmap::{
    check_offset, RegisterMap, GPCLR0, GPIO_REGION_SIZE, GPIO_REGISTERS, GPLEV0, GPSET0, REG_SIZE,
};

struct Bank {
    regs: [AtomicU32; GPIO_REGISTERS],
    writes: AtomicUsize,
}

/// In-process stand-in for the GPIO register block.
///
/// Models the parts of the hardware the LED driver relies on. Writing a
/// pin's bit to `GPSET0` raises that bit in `GPLEV0`, writing it to `GPCLR0`
/// lowers it, and both command registers read back as zero. `GPLEV0` ignores
/// writes. Every other register behaves like plain memory.
///
/// Clones share the same registers, so a test can keep a clone to observe
/// the state of a bank owned by a [`Led`].
///
/// [`Led`]: ../struct.Led.html
#[derive(Clone)]
pub struct EmulatedBank {
    inner: Arc<Bank>,
}

impl fmt::Debug for EmulatedBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmulatedBank")
            .field("regs", &format_args!("{{ .. }}"))
            .field("writes", &self.writes())
            .finish()
    }
}

impl Default for EmulatedBank {
    fn default() -> Self {
        EmulatedBank::new()
    }
}

impl EmulatedBank {
    /// Constructs a bank with every register cleared.
    pub fn new() -> EmulatedBank {
        EmulatedBank {
            inner: Arc::new(Bank {
                regs: init_array!(AtomicU32::new(0), GPIO_REGISTERS),
                writes: AtomicUsize::new(0),
            }),
        }
    }

    /// Constructs a bank whose `GPFSEL0`..`GPFSEL2` registers hold `words`.
    pub fn with_function_select(words: [u32; 3]) -> EmulatedBank {
        let bank = EmulatedBank::new();
        for (i, word) in words.iter().enumerate() {
            bank.inner.regs[i].store(*word, Ordering::SeqCst);
        }

        bank
    }

    /// Number of register writes performed so far.
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }
}

impl RegisterMap for EmulatedBank {
    fn size(&self) -> usize {
        GPIO_REGION_SIZE
    }

    fn read_word(&self, offset: usize) -> u32 {
        check_offset(offset, GPIO_REGION_SIZE);

        self.inner.regs[offset / REG_SIZE].load(Ordering::SeqCst)
    }

    fn write_word(&self, offset: usize, value: u32) {
        check_offset(offset, GPIO_REGION_SIZE);

        self.inner.writes.fetch_add(1, Ordering::SeqCst);

        let level = &self.inner.regs[GPLEV0 / REG_SIZE];
        match offset {
            GPSET0 => {
                level.fetch_or(value, Ordering::SeqCst);
            }
            GPCLR0 => {
                level.fetch_and(!value, Ordering::SeqCst);
            }
            GPLEV0 => {}
            _ => self.inner.regs[offset / REG_SIZE].store(value, Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_drive_level() {
        let bank = EmulatedBank::new();

        bank.write_word(GPSET0, 1 << 3 | 1 << 17);
        assert_eq!(bank.read_word(GPLEV0), 1 << 3 | 1 << 17);
        assert_eq!(bank.read_word(GPSET0), 0);

        bank.write_word(GPCLR0, 1 << 3);
        assert_eq!(bank.read_word(GPLEV0), 1 << 17);
        assert_eq!(bank.read_word(GPCLR0), 0);
    }

    #[test]
    fn level_register_ignores_writes() {
        let bank = EmulatedBank::new();

        bank.write_word(GPLEV0, u32::MAX);
        assert_eq!(bank.read_word(GPLEV0), 0);
        assert_eq!(bank.writes(), 1);
    }

    #[test]
    fn clones_share_registers() {
        let bank = EmulatedBank::with_function_select([0, 0o7654_3210, 0]);
        let observer = bank.clone();

        assert_eq!(observer.read_word(4), 0o7654_3210);
        bank.write_word(8, 42);
        assert_eq!(observer.read_word(8), 42);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn out_of_range_write_panics() {
        EmulatedBank::new().write_word(GPIO_REGION_SIZE, 1);
    }
}
