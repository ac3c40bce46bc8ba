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

//! Register-level access to the GPIO peripheral.
//!
//! The BCM2836/BCM2837 GPIO block is controlled through a handful of 32-bit
//! registers. Each pin owns a 3-bit function-select field in one of the
//! `GPFSELn` registers, and is driven or sampled by writing or reading its
//! bit in the dedicated `GPSET0`, `GPCLR0` and `GPLEV0` registers.
//!
//! All register access goes through the [`RegisterMap`] trait, implemented by
//! [`GpioMem`] for real hardware and by [`EmulatedBank`] for hosts without a
//! GPIO peripheral.
//!
//! Pins are addressed by their BCM GPIO numbers, rather than their physical
//! location on the GPIO header. Only the 28 pins exposed on the header
//! (0-27) are supported.
//!
//! [`RegisterMap`]: trait.RegisterMap.html
//! [`GpioMem`]: struct.GpioMem.html
//! [`EmulatedBank`]: struct.EmulatedBank.html

use std::error;
use std::fmt;
use std::io;
use std::ops::Not;
use std::result;

mod emulated;
mod gpiomem;
mod pin;
mod regmap;
mod select;

pub use self::emulated::EmulatedBank;
pub use self::gpiomem::GpioMem;
pub(crate) use self::pin::Pin;
pub use self::regmap::{
    RegisterMap, GPCLR0, GPFSEL0, GPIO_REGION_SIZE, GPIO_REGISTERS, GPLEV0, GPSET0, REG_SIZE,
};
pub(crate) use self::select::FunctionSelect;

/// Number of GPIO pins exposed on the header. Valid pin numbers are `0..GPIO_LINES`.
pub const GPIO_LINES: u8 = 28;

/// Errors that can occur when configuring or accessing the GPIO pin.
#[derive(Debug)]
pub enum Error {
    /// Pin is not available.
    ///
    /// Only BCM GPIO numbers 0-27 are supported. This is detected before any
    /// register is touched.
    InvalidPin(u8),
    /// Invalid configuration value.
    ///
    /// A configuration source contained a value that couldn't be parsed.
    InvalidConfig(String),
    /// Permission denied when opening `/dev/gpiomem` or `/dev/mem` for
    /// read/write access.
    ///
    /// Members of the `gpio` group can normally access `/dev/gpiomem`.
    /// `/dev/mem` requires superuser privileges.
    PermissionDenied(String),
    /// The GPIO register block is already mapped.
    ///
    /// Only a single hardware mapping can exist at any time. Drop the
    /// existing [`Led`] before constructing another one.
    ///
    /// [`Led`]: ../struct.Led.html
    InstanceExists,
    /// I/O error while mapping the GPIO register block.
    Io(io::Error),
    /// Caller-supplied buffer can't be used for the requested transfer.
    ///
    /// Reads and writes exchange fixed two-byte commands. No register is
    /// touched when a buffer is rejected.
    Access { len: usize, required: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::InvalidPin(pin) => write!(f, "Pin {} is not available", pin),
            Error::InvalidConfig(ref msg) => write!(f, "Invalid configuration: {}", msg),
            Error::PermissionDenied(ref path) => write!(f, "Permission denied: {}", path),
            Error::InstanceExists => write!(f, "GPIO registers are already mapped"),
            Error::Io(ref err) => write!(f, "I/O error: {}", err),
            Error::Access { len, required } => write!(
                f,
                "Buffer of {} bytes is not accessible (requires {} bytes)",
                len, required
            ),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

/// Result type returned from methods that can have `simple_led::gpio::Error`s.
pub type Result<T> = result::Result<T, Error>;

/// Pin function-select codes.
///
/// The discriminants match the 3-bit codes stored in the `GPFSELn` registers,
/// so every possible field value maps to exactly one `Mode`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum Mode {
    Input = 0b000,
    Output = 0b001,
    Alt0 = 0b100,
    Alt1 = 0b101,
    Alt2 = 0b110,
    Alt3 = 0b111,
    Alt4 = 0b011,
    Alt5 = 0b010,
}

impl Mode {
    /// Decodes the lowest three bits of `bits` as a function-select code.
    pub fn from_bits(bits: u32) -> Mode {
        match bits & 0b111 {
            0b000 => Mode::Input,
            0b001 => Mode::Output,
            0b100 => Mode::Alt0,
            0b101 => Mode::Alt1,
            0b110 => Mode::Alt2,
            0b111 => Mode::Alt3,
            0b011 => Mode::Alt4,
            _ => Mode::Alt5,
        }
    }

    /// Returns the 3-bit function-select code.
    #[inline]
    pub fn bits(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Mode::Input => write!(f, "In"),
            Mode::Output => write!(f, "Out"),
            Mode::Alt0 => write!(f, "Alt0"),
            Mode::Alt1 => write!(f, "Alt1"),
            Mode::Alt2 => write!(f, "Alt2"),
            Mode::Alt3 => write!(f, "Alt3"),
            Mode::Alt4 => write!(f, "Alt4"),
            Mode::Alt5 => write!(f, "Alt5"),
        }
    }
}

/// Pin logic levels.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum Level {
    Low = 0,
    High = 1,
}

impl Level {
    /// Returns the ASCII digit used by the device-file interface, `b'0'` or `b'1'`.
    #[inline]
    pub fn as_ascii(self) -> u8 {
        match self {
            Level::Low => b'0',
            Level::High => b'1',
        }
    }
}

impl From<bool> for Level {
    fn from(e: bool) -> Level {
        if e {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Level::Low => write!(f, "Low"),
            Level::High => write!(f, "High"),
        }
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Returns `Err(Error::InvalidPin)` if `pin` isn't one of the supported BCM GPIO numbers.
pub fn validate_pin(pin: u8) -> Result<u8> {
    if pin < GPIO_LINES {
        Ok(pin)
    } else {
        Err(Error::InvalidPin(pin))
    }
}

/// Byte offset of the `GPFSELn` register holding `pin`'s function-select field.
#[inline]
pub fn select_register_offset(pin: u8) -> usize {
    GPFSEL0 + REG_SIZE * (pin as usize / 10)
}

/// Position of the lowest bit of `pin`'s 3-bit function-select field.
#[inline]
pub fn select_bit_offset(pin: u8) -> u32 {
    (pin as u32 % 10) * 3
}
