// led_blink.rs - Blinks the LED until SIGINT or SIGTERM is received.
//
// The pin is taken from the SIMPLE_LED_PIN environment variable, or
// defaults to BCM GPIO 3.

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use simple_signal::{self, Signal};

use simple_led::{Config, Led, BUF_SIZE};

fn main() -> Result<(), Box<dyn Error>> {
    let led = Led::new(Config::from_env()?)?;

    let running = Arc::new(AtomicBool::new(true));

    // When a SIGINT (Ctrl-C) or SIGTERM signal is caught, atomically set running to false.
    simple_signal::set_handler(&[Signal::Int, Signal::Term], {
        let running = running.clone();
        move |_| {
            running.store(false, Ordering::SeqCst);
        }
    });

    let mut buf = [0u8; BUF_SIZE];
    while running.load(Ordering::SeqCst) {
        // Hold the session only while touching the pin.
        let session = led.open();
        session.toggle();
        session.read(&mut buf)?;
        session.close();

        println!("GPIO {}: {}", led.pin(), buf[0] as char);
        thread::sleep(Duration::from_millis(500));
    }

    // The pin is driven low and its original function restored when led goes out of scope.
    Ok(())
}
