use std::fmt;
use std::sync::MutexGuard;

use super::Led;
use crate::gpio::{Error, Level, Result};

/// Size of the commands exchanged through [`Session::read`] and [`Session::write`].
///
/// [`Session::read`]: struct.Session.html#method.read
/// [`Session::write`]: struct.Session.html#method.write
pub const BUF_SIZE: usize = 2;

/// Exclusive access to the LED's pin.
///
/// Returned by [`Led::open`]. The session ends when it's closed or goes out
/// of scope, after which another caller blocked in [`Led::open`] can proceed.
///
/// [`Led::open`]: struct.Led.html#method.open
pub struct Session<'a> {
    led: &'a Led,
    _guard: MutexGuard<'a, ()>,
}

impl fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("pin", &self.led.pin)
            .finish()
    }
}

impl<'a> Session<'a> {
    pub(super) fn new(led: &'a Led, guard: MutexGuard<'a, ()>) -> Session<'a> {
        log::debug!("GPIO {} session opened", led.pin);

        Session { led, _guard: guard }
    }

    /// Returns the GPIO pin number.
    pub fn pin(&self) -> u8 {
        self.led.pin
    }

    /// Reads the pin's logic level.
    pub fn level(&self) -> Level {
        self.led.output().read()
    }

    /// Turns the LED on.
    pub fn set_high(&self) {
        self.led.output().set_high();
    }

    /// Turns the LED off.
    pub fn set_low(&self) {
        self.led.output().set_low();
    }

    /// Toggles the LED.
    pub fn toggle(&self) {
        self.led.output().toggle();
    }

    /// Fills `buf` with the pin's logic level as `"0"` or `"1"`, followed by a
    /// NUL byte, and returns the number of bytes written.
    ///
    /// Returns `Err(Error::Access)` without reading the pin if `buf` is
    /// shorter than [`BUF_SIZE`].
    ///
    /// [`BUF_SIZE`]: constant.BUF_SIZE.html
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        accessible(buf.len(), "writing")?;

        let level = self.level();
        buf[0] = level.as_ascii();
        buf[1] = b'\0';

        log::info!("GPIO {} read = {}", self.led.pin, buf[0] as char);

        Ok(BUF_SIZE)
    }

    /// Interprets the command in `buf` and returns the number of bytes consumed.
    ///
    /// A command starting with `'0'` turns the LED off. Any other command
    /// turns it on. Only the first [`BUF_SIZE`] bytes are consumed.
    ///
    /// Returns `Err(Error::Access)` without touching the pin if `buf` is
    /// shorter than [`BUF_SIZE`].
    ///
    /// [`BUF_SIZE`]: constant.BUF_SIZE.html
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        accessible(buf.len(), "reading")?;

        if buf[0] == b'0' {
            self.set_low();
        } else {
            self.set_high();
        }

        log::debug!("GPIO {} write = {}", self.led.pin, buf[0] as char);

        Ok(BUF_SIZE)
    }

    /// Ends the session.
    pub fn close(self) {}
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        log::debug!("GPIO {} session closed", self.led.pin);
    }
}

fn accessible(len: usize, direction: &str) -> Result<()> {
    if len < BUF_SIZE {
        log::error!(
            "Cannot access buffer of {} bytes for {} (requires {})",
            len,
            direction,
            BUF_SIZE
        );

        return Err(Error::Access {
            len,
            required: BUF_SIZE,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::{EmulatedBank, RegisterMap, GPLEV0};

    fn led(pin: u8) -> (Led, EmulatedBank) {
        let bank = EmulatedBank::new();
        let led = Led::with_registers(pin, bank.clone()).unwrap();

        (led, bank)
    }

    #[test]
    fn write_zero_drives_low() {
        let (led, bank) = led(3);
        let session = led.open();

        session.write(b"1\0").unwrap();
        assert_eq!(bank.read_word(GPLEV0), 1 << 3);

        assert_eq!(session.write(b"0\n").unwrap(), BUF_SIZE);
        assert_eq!(bank.read_word(GPLEV0), 0);
    }

    #[test]
    fn any_other_command_drives_high() {
        let (led, _bank) = led(4);
        let session = led.open();

        for command in [&b"1\n"[..], &b"x\0"[..], &b"01"[..], &b"10\n"[..]] {
            session.set_low();
            session.write(command).unwrap();
            assert_eq!(session.level(), Level::High, "{:?}", command);
        }
    }

    #[test]
    fn read_reports_level_as_text() {
        let (led, _bank) = led(9);
        let session = led.open();
        let mut buf = [0xffu8; 4];

        session.write(b"1\n").unwrap();
        assert_eq!(session.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"1\0\xff\xff");

        session.write(b"0\n").unwrap();
        session.read(&mut buf).unwrap();
        assert_eq!(&buf[..2], b"0\0");
    }

    #[test]
    fn short_buffers_are_rejected_without_register_access() {
        let (led, bank) = led(3);
        let session = led.open();
        let writes = bank.writes();

        let mut empty = [0u8; 0];
        assert!(matches!(
            session.read(&mut empty),
            Err(Error::Access {
                len: 0,
                required: 2
            })
        ));

        let mut short = [b'x'; 1];
        assert!(matches!(session.read(&mut short), Err(Error::Access { .. })));
        assert_eq!(short, [b'x']);

        assert!(matches!(session.write(b"1"), Err(Error::Access { len: 1, .. })));
        assert!(matches!(session.write(b""), Err(Error::Access { len: 0, .. })));

        assert_eq!(bank.writes(), writes);
        assert_eq!(session.level(), Level::Low);
    }

    #[test]
    fn try_open_fails_while_active() {
        let (led, _bank) = led(3);

        let session = led.open();
        assert!(led.try_open().is_none());

        session.close();
        assert!(led.try_open().is_some());
    }

    #[test]
    fn toggle_through_session() {
        let (led, _bank) = led(20);
        let session = led.open();

        session.toggle();
        assert_eq!(session.level(), Level::High);
        session.toggle();
        assert_eq!(session.level(), Level::Low);
    }
}
