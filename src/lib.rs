//! simple-led drives an LED wired to a single GPIO pin on a Raspberry Pi 2 or 3
//! by directly accessing the BCM2836/BCM2837 GPIO registers.
//!
//! The register block is memory-mapped through `/dev/gpiomem`, or `/dev/mem` when
//! `/dev/gpiomem` isn't available. On startup the pin's original function-select
//! code is saved and the pin is switched to output. When the [`Led`] goes out of
//! scope the pin is driven low and its original function is restored.
//!
//! Access to the pin is serialized through sessions. [`Led::open`] blocks until
//! no other session is active, and the returned [`Session`] offers the same
//! `read`/`write` contract as the LED character device: reads produce
//! `"0"` or `"1"` followed by a NUL byte, writes of `"0"` turn the LED off and
//! any other command turns it on.
//!
//! ```no_run
//! use simple_led::{Config, Led};
//!
//! # fn main() -> simple_led::gpio::Result<()> {
//! let led = Led::new(Config::default().with_pin(17))?;
//!
//! let session = led.open();
//! session.write(b"1\n")?;
//!
//! let mut buf = [0u8; 2];
//! session.read(&mut buf)?;
//! assert_eq!(&buf, b"1\0");
//! session.close();
//! # Ok(())
//! # }
//! ```
//!
//! [`Led`]: struct.Led.html
//! [`Led::open`]: struct.Led.html#method.open
//! [`Session`]: struct.Session.html

#[macro_use]
mod macros;

pub mod config;
pub mod gpio;
mod led;

pub use crate::config::Config;
pub use crate::led::{Led, Session, BUF_SIZE};
