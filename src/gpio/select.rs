use super::regmap::RegisterMap;
use crate::gpio::{select_bit_offset, select_register_offset, Mode, GPIO_LINES};

const FSEL_MASK: u32 = 0b111;
// Upper two bits of the field. The lowest bit is set separately when
// switching to output.
const FSEL_OUTPUT_CLEAR_MASK: u32 = 0b110;

/// Saved function-select configuration for a single pin.
///
/// Created by [`save`] before the pin is reconfigured. [`restore`] writes the
/// saved code back verbatim, leaving every other field in the register
/// untouched.
///
/// [`save`]: #method.save
/// [`restore`]: #method.restore
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct FunctionSelect {
    reg_offset: usize,
    bit_offset: u32,
    saved: Mode,
}

impl FunctionSelect {
    /// Captures `pin`'s current function-select code. `pin` must already be
    /// validated with `gpio::validate_pin`.
    pub(crate) fn save(regs: &dyn RegisterMap, pin: u8) -> FunctionSelect {
        debug_assert!(pin < GPIO_LINES);

        let reg_offset = select_register_offset(pin);
        let bit_offset = select_bit_offset(pin);

        let saved = Mode::from_bits(regs.read_word(reg_offset) >> bit_offset);

        FunctionSelect {
            reg_offset,
            bit_offset,
            saved,
        }
    }

    /// Returns the function-select code captured by [`save`].
    ///
    /// [`save`]: #method.save
    pub fn saved(&self) -> Mode {
        self.saved
    }

    /// Reads the pin's current function-select code.
    pub fn mode(&self, regs: &dyn RegisterMap) -> Mode {
        Mode::from_bits(regs.read_word(self.reg_offset) >> self.bit_offset)
    }

    /// Switches the pin to output.
    pub fn set_output(&self, regs: &dyn RegisterMap) {
        let reg_value = regs.read_word(self.reg_offset);
        regs.write_word(
            self.reg_offset,
            (reg_value & !(FSEL_OUTPUT_CLEAR_MASK << self.bit_offset))
                | (Mode::Output.bits() << self.bit_offset),
        );
    }

    /// Writes the saved function-select code back to the pin.
    pub fn restore(&self, regs: &dyn RegisterMap) {
        let reg_value = regs.read_word(self.reg_offset);
        regs.write_word(
            self.reg_offset,
            (reg_value & !(FSEL_MASK << self.bit_offset)) | (self.saved.bits() << self.bit_offset),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::EmulatedBank;

    // Fills every 3-bit field of a GPFSEL register with `code`.
    fn fill(code: u32) -> u32 {
        (0..10).fold(0, |acc, field| acc | (code << (field * 3)))
    }

    #[test]
    fn save_extracts_field() {
        let bank = EmulatedBank::with_function_select([0, 0b100 << 9, 0]);

        assert_eq!(FunctionSelect::save(&bank, 13).saved(), Mode::Alt0);
        assert_eq!(FunctionSelect::save(&bank, 12).saved(), Mode::Input);
    }

    #[test]
    fn set_output_selects_output_code() {
        for code in 0..8 {
            let bank = EmulatedBank::with_function_select([fill(code); 3]);
            let select = FunctionSelect::save(&bank, 3);

            select.set_output(&bank);
            assert_eq!(select.mode(&bank), Mode::Output);
        }
    }

    #[test]
    fn set_output_leaves_neighbours() {
        let bank = EmulatedBank::with_function_select([fill(0b111); 3]);
        let select = FunctionSelect::save(&bank, 21);

        select.set_output(&bank);

        let expected = fill(0b111) & !(0b110 << 3);
        assert_eq!(bank.read_word(8), expected);
        assert_eq!(bank.read_word(0), fill(0b111));
        assert_eq!(bank.read_word(4), fill(0b111));
    }

    #[test]
    fn restore_reproduces_original_word() {
        for pin in 0..GPIO_LINES {
            for code in 0..8 {
                // Neighbouring fields hold a different code than the pin itself
                let other = (code + 3) % 8;
                let mut words = [fill(other); 3];
                let reg = pin as usize / 10;
                let shift = (pin as u32 % 10) * 3;
                words[reg] = (words[reg] & !(0b111 << shift)) | (code << shift);

                let bank = EmulatedBank::with_function_select(words);
                let select = FunctionSelect::save(&bank, pin);
                assert_eq!(select.saved().bits(), code);

                select.set_output(&bank);
                select.restore(&bank);

                assert_eq!(bank.read_word(reg * 4), words[reg], "pin {} code {}", pin, code);
            }
        }
    }

    #[test]
    fn saved_code_survives_pin_commands() {
        let bank = EmulatedBank::with_function_select([0b010 << 9, 0, 0]);
        let select = FunctionSelect::save(&bank, 3);
        select.set_output(&bank);

        let pin = crate::gpio::Pin::new(&bank, 3);
        for _ in 0..4 {
            pin.set_high();
            pin.set_low();
        }

        select.restore(&bank);
        assert_eq!(select.mode(&bank), Mode::Alt5);
        assert_eq!(bank.read_word(0), 0b010 << 9);
    }
}
