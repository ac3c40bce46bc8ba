// Copyright (c) 2017-2021 Rene van der Meer
//
// Permission is hereby granted, free of charge, to any person obtaining a
// copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
// THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

use super::regmap::{RegisterMap, GPCLR0, GPLEV0, GPSET0};
use crate::gpio::{Level, GPIO_LINES};

/// Drives and samples a single GPIO pin through the dedicated set, clear and
/// level registers.
///
/// Each operation is a single word access. The set and clear registers are
/// self-clearing commands, so no read-modify-write is needed.
#[derive(Debug, Clone, Copy)]
pub struct Pin<'a> {
    regs: &'a dyn RegisterMap,
    pin: u8,
}

impl<'a> Pin<'a> {
    // Callers validate pin with gpio::validate_pin first
    #[inline]
    pub(crate) fn new(regs: &'a dyn RegisterMap, pin: u8) -> Pin<'a> {
        debug_assert!(pin < GPIO_LINES);

        Pin { regs, pin }
    }

    /// Sets the pin's output state to [`High`].
    ///
    /// [`High`]: enum.Level.html#variant.High
    #[inline]
    pub fn set_high(&self) {
        self.regs.write_word(GPSET0, 1 << self.pin);
    }

    /// Sets the pin's output state to [`Low`].
    ///
    /// [`Low`]: enum.Level.html#variant.Low
    #[inline]
    pub fn set_low(&self) {
        self.regs.write_word(GPCLR0, 1 << self.pin);
    }

    /// Sets the pin's output state.
    #[inline]
    pub fn write(&self, level: Level) {
        match level {
            Level::Low => self.set_low(),
            Level::High => self.set_high(),
        }
    }

    /// Reads the pin's logic level.
    #[inline]
    pub fn read(&self) -> Level {
        Level::from((self.regs.read_word(GPLEV0) >> self.pin) & 0b1 == 1)
    }

    /// Toggles the pin's output state between [`Low`] and [`High`].
    ///
    /// [`Low`]: enum.Level.html#variant.Low
    /// [`High`]: enum.Level.html#variant.High
    #[inline]
    pub fn toggle(&self) {
        self.write(!self.read());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::EmulatedBank;

    #[test]
    fn set_high_then_read() {
        let bank = EmulatedBank::new();
        let pin = Pin::new(&bank, 3);

        pin.set_high();
        assert_eq!(pin.read(), Level::High);
        assert_eq!(bank.read_word(GPLEV0), 1 << 3);

        pin.set_low();
        assert_eq!(pin.read(), Level::Low);
    }

    #[test]
    fn repeated_commands_are_idempotent() {
        let bank = EmulatedBank::new();
        let pin = Pin::new(&bank, 27);

        pin.set_high();
        let once = bank.read_word(GPLEV0);
        pin.set_high();
        assert_eq!(bank.read_word(GPLEV0), once);

        pin.set_low();
        pin.set_low();
        assert_eq!(bank.read_word(GPLEV0), 0);
    }

    #[test]
    fn commands_write_single_bit() {
        let bank = EmulatedBank::new();
        Pin::new(&bank, 5).set_high();

        for pin in 0..GPIO_LINES {
            let expected = Level::from(pin == 5);
            assert_eq!(Pin::new(&bank, pin).read(), expected);
        }
    }

    #[test]
    fn toggle_flips_level() {
        let bank = EmulatedBank::new();
        let pin = Pin::new(&bank, 0);

        pin.toggle();
        assert_eq!(pin.read(), Level::High);
        pin.toggle();
        assert_eq!(pin.read(), Level::Low);
    }
}
