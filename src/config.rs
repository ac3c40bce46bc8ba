//! Startup configuration.
//!
//! [`Config`] carries the GPIO pin the LED is connected to and the physical
//! location of the GPIO register block. The defaults match a Raspberry Pi 2
//! or 3 with the LED on BCM GPIO 3.
//!
//! [`Config`]: struct.Config.html

use std::env;

use crate::gpio::{Error, Result};

/// Default BCM GPIO number the LED is connected to.
pub const DEFAULT_PIN: u8 = 3;
/// Peripheral base address for the BCM2836 and BCM2837.
pub const PERIPHERAL_BASE_RPI2: u64 = 0x3f00_0000;
/// Offset of the GPIO block from the peripheral base.
pub const GPIO_OFFSET: u64 = 0x20_0000;

/// Environment variable read by [`Config::from_env`].
///
/// [`Config::from_env`]: struct.Config.html#method.from_env
pub const ENV_PIN: &str = "SIMPLE_LED_PIN";

/// LED driver configuration.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Config {
    /// BCM GPIO number. Validated when the [`Led`] is constructed.
    ///
    /// [`Led`]: ../struct.Led.html
    pub pin: u8,
    /// Physical address of the peripheral block.
    pub peripheral_base: u64,
    /// Offset of the GPIO registers from `peripheral_base`.
    pub gpio_offset: u64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            pin: DEFAULT_PIN,
            peripheral_base: PERIPHERAL_BASE_RPI2,
            gpio_offset: GPIO_OFFSET,
        }
    }
}

impl Config {
    /// Constructs the default configuration, overriding the pin with
    /// `SIMPLE_LED_PIN` if it's set.
    pub fn from_env() -> Result<Config> {
        let config = Config::default();

        match env::var(ENV_PIN) {
            Ok(value) => Ok(config.with_pin(parse_pin(&value)?)),
            Err(env::VarError::NotPresent) => Ok(config),
            Err(env::VarError::NotUnicode(_)) => {
                Err(Error::InvalidConfig(format!("{} is not valid unicode", ENV_PIN)))
            }
        }
    }

    pub fn with_pin(mut self, pin: u8) -> Config {
        self.pin = pin;
        self
    }

    pub fn with_peripheral_base(mut self, peripheral_base: u64) -> Config {
        self.peripheral_base = peripheral_base;
        self
    }

    pub fn with_gpio_offset(mut self, gpio_offset: u64) -> Config {
        self.gpio_offset = gpio_offset;
        self
    }

    /// Physical address of the GPIO register block.
    pub fn gpio_base(&self) -> u64 {
        self.peripheral_base + self.gpio_offset
    }
}

fn parse_pin(value: &str) -> Result<u8> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{}={:?} is not a pin number", ENV_PIN, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(config.pin, 3);
        assert_eq!(config.gpio_base(), 0x3f20_0000);
    }

    #[test]
    fn builder_overrides() {
        let config = Config::default()
            .with_pin(17)
            .with_peripheral_base(0x2000_0000)
            .with_gpio_offset(0x20_0000);

        assert_eq!(config.pin, 17);
        assert_eq!(config.gpio_base(), 0x2020_0000);
    }

    #[test]
    fn parse_pin_values() {
        assert_eq!(parse_pin("6").unwrap(), 6);
        assert_eq!(parse_pin(" 27\n").unwrap(), 27);
        // Range is checked when the Led is constructed
        assert_eq!(parse_pin("40").unwrap(), 40);
        assert!(matches!(parse_pin("six"), Err(Error::InvalidConfig(_))));
        assert!(matches!(parse_pin("-1"), Err(Error::InvalidConfig(_))));
    }
}
