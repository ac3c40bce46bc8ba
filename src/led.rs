use std::fmt;
use std::sync::{Mutex, PoisonError, TryLockError};

use crate::config::Config;
use crate::gpio::{
    self, Error, FunctionSelect, GpioMem, Mode, Pin, RegisterMap, Result, GPIO_REGION_SIZE,
};

mod session;

pub use self::session::{Session, BUF_SIZE};

/// An LED connected to a single GPIO pin.
///
/// Constructing a `Led` maps the GPIO register block, saves the pin's
/// function-select code and configures the pin as an output. When the `Led`
/// goes out of scope, the pin is driven low, its original function-select
/// code is restored, and the register block is unmapped, in that order.
///
/// Pin access goes through a [`Session`]. Only one session can be active at
/// any time. `Led` is `Sync`, so it can be shared between threads using an
/// `Arc` or scoped threads.
///
/// [`Session`]: struct.Session.html
pub struct Led {
    pin: u8,
    select: FunctionSelect,
    session_lock: Mutex<()>,
    // Dropped after Led::drop has restored the pin
    regs: Box<dyn RegisterMap>,
}

impl fmt::Debug for Led {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Led")
            .field("pin", &self.pin)
            .field("select", &self.select)
            .field("session_lock", &self.session_lock)
            .field("regs", &self.regs)
            .finish()
    }
}

impl Led {
    /// Maps the GPIO register block described by `config`, and configures
    /// `config.pin` as an output.
    ///
    /// The pin number is validated before the register block is mapped.
    pub fn new(config: Config) -> Result<Led> {
        let pin = gpio::validate_pin(config.pin)?;
        let regs = GpioMem::open(config.gpio_base(), GPIO_REGION_SIZE)?;

        Ok(Led::init(pin, Box::new(regs)))
    }

    /// Configures `pin` as an output using an existing register map, such as
    /// an [`EmulatedBank`].
    ///
    /// Returns `Err(Error::InvalidConfig)` if `regs` doesn't cover the whole
    /// GPIO region.
    ///
    /// [`EmulatedBank`]: gpio/struct.EmulatedBank.html
    pub fn with_registers<R>(pin: u8, regs: R) -> Result<Led>
    where
        R: RegisterMap + 'static,
    {
        let pin = gpio::validate_pin(pin)?;

        if regs.size() < GPIO_REGION_SIZE {
            return Err(Error::InvalidConfig(format!(
                "register map of {} bytes doesn't cover the {}-byte GPIO region",
                regs.size(),
                GPIO_REGION_SIZE
            )));
        }

        Ok(Led::init(pin, Box::new(regs)))
    }

    fn init(pin: u8, regs: Box<dyn RegisterMap>) -> Led {
        let select = FunctionSelect::save(&*regs, pin);
        select.set_output(&*regs);

        log::info!("LED on GPIO {} ready (saved function {})", pin, select.saved());

        Led {
            pin,
            select,
            session_lock: Mutex::new(()),
            regs,
        }
    }

    /// Returns the GPIO pin number.
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Returns the function-select code the pin had before it was configured
    /// as an output. It's restored when the `Led` goes out of scope.
    pub fn saved_mode(&self) -> Mode {
        self.select.saved()
    }

    /// Returns the pin's current function-select code.
    pub fn mode(&self) -> Mode {
        self.select.mode(&*self.regs)
    }

    /// Starts a session, blocking the current thread until any active session
    /// is closed.
    ///
    /// There's no ordering guarantee between multiple threads waiting on
    /// `open`.
    pub fn open(&self) -> Session<'_> {
        // A panicking session holder doesn't leave the pin in an
        // inconsistent state, since every pin command is a single write.
        let guard = self
            .session_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        Session::new(self, guard)
    }

    /// Starts a session if none is active, otherwise returns `None`.
    pub fn try_open(&self) -> Option<Session<'_>> {
        match self.session_lock.try_lock() {
            Ok(guard) => Some(Session::new(self, guard)),
            Err(TryLockError::Poisoned(err)) => Some(Session::new(self, err.into_inner())),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    pub(crate) fn output(&self) -> Pin<'_> {
        Pin::new(&*self.regs, self.pin)
    }
}

impl Drop for Led {
    fn drop(&mut self) {
        self.output().set_low();
        self.select.restore(&*self.regs);

        log::info!("LED on GPIO {} released (restored function {})", self.pin, self.select.saved());
    }
}
