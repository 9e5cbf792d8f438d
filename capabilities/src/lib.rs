//! Scripthost Capabilities
//!
//! Host-implemented classes and methods that scripts can call through the
//! scripthost capability bridge. Each capability follows the same shape:
//!
//! 1. A trait for the external device/consumer the capability drives
//! 2. Handlers that verify argument count and tags before acting, staging
//!    a `false` return until every check passes
//! 3. A `register_*` entry that defines the class and binds its methods
//!    to trampoline slots
//!
//! # Available Capabilities
//!
//! ## Pixels
//! - `PIXELS.set(index, r, g, b)`: stage one pixel of an LED-strip style
//!   surface
//! - `PIXELS.update()`: flush staged pixels to the device
//!
//! # Usage
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//! use scripthost_runtime::{HostConfig, ScriptHost, StubEngine};
//! use scripthost_capabilities::pixels::NullPixelSink;
//!
//! let mut host = ScriptHost::new(StubEngine::new(), HostConfig::default());
//! let sink = Rc::new(RefCell::new(NullPixelSink));
//! scripthost_capabilities::register_capabilities(&mut host, sink).unwrap();
//! ```

#![warn(missing_docs)]
#![deny(clippy::arithmetic_side_effects)]

pub mod pixels;

use scripthost_runtime::{RegistrationError, ScriptEngine, ScriptHost};

use pixels::SharedPixelSink;

/// Register every capability in this crate with the host
///
/// # Errors
/// Propagates the first registration failure; capabilities registered
/// before the failure remain in place.
pub fn register_capabilities<E: ScriptEngine>(
    host: &mut ScriptHost<E>,
    pixel_sink: SharedPixelSink,
) -> Result<(), RegistrationError> {
    pixels::register_pixels(host, pixel_sink)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixels::PixelSink;
    use scripthost_runtime::{HostConfig, StubEngine, Value};
    use std::{cell::RefCell, rc::Rc};

    #[derive(Debug, Default)]
    struct RecordingSink {
        sets: Vec<(usize, u8, u8, u8)>,
        flushes: usize,
    }

    impl PixelSink for RecordingSink {
        fn set(&mut self, index: usize, red: u8, green: u8, blue: u8) {
            self.sets.push((index, red, green, blue));
        }

        fn flush(&mut self) {
            self.flushes += 1;
        }
    }

    fn valid_image() -> Vec<u8> {
        let mut image = b"RITE".to_vec();
        image.extend_from_slice(&[0, 0, 0, 1]);
        image
    }

    #[test]
    fn test_register_capabilities() {
        let mut host = ScriptHost::new(StubEngine::new(), HostConfig::default());
        let sink = Rc::new(RefCell::new(RecordingSink::default()));
        register_capabilities(&mut host, sink).expect("failed to register capabilities");
    }

    #[test]
    fn test_pixels_end_to_end() {
        let mut host = ScriptHost::new(StubEngine::new(), HostConfig::default());
        let sink = Rc::new(RefCell::new(RecordingSink::default()));
        let class = pixels::register_pixels(&mut host, sink.clone()).unwrap();

        host.init();
        let handle = host.class_handle(class).unwrap();
        host.engine_mut().script_call(
            handle,
            "set",
            vec![
                Value::Integer(0),
                Value::Integer(10),
                Value::Integer(20),
                Value::Integer(30),
            ],
        );
        host.engine_mut().script_call(handle, "update", vec![]);

        assert_eq!(host.run(Some(&valid_image())), 0);
        assert_eq!(
            host.engine().returns(),
            &[Value::Bool(true), Value::Bool(true)]
        );
        assert_eq!(sink.borrow().sets, vec![(0, 10, 20, 30)]);
        assert_eq!(sink.borrow().flushes, 1);
    }
}
