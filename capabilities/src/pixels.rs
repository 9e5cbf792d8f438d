//! PIXELS capability
//!
//! Exposes an LED-strip style pixel surface to scripts as a `PIXELS` class
//! with two methods:
//!
//! - `set(index, red, green, blue)`: stage one pixel; returns `true` on
//!   success, `false` if any argument is missing or non-numeric (the sink
//!   is not touched on malformed input)
//! - `update()`: flush staged pixels to the device; returns `true`
//!
//! The device itself sits behind the [`PixelSink`] trait; this module only
//! validates and marshals.

use std::{cell::RefCell, rc::Rc};

use scripthost_runtime::{ClassId, Frame, Handler, RegistrationError, ScriptEngine, ScriptHost};

/// Pixel surface consumer
///
/// Implemented by the embedder; the capability never interprets color
/// values beyond truncating them to bytes.
pub trait PixelSink {
    /// Stage the pixel at `index` to the given color
    fn set(&mut self, index: usize, red: u8, green: u8, blue: u8);

    /// Push staged pixels to the device
    fn flush(&mut self);
}

/// Sink that discards every pixel operation
///
/// For tests and headless embedders.
#[derive(Debug, Default)]
pub struct NullPixelSink;

impl PixelSink for NullPixelSink {
    fn set(&mut self, _index: usize, _red: u8, _green: u8, _blue: u8) {}

    fn flush(&mut self) {}
}

/// Shared handle to a pixel sink, cloned into each method handler
pub type SharedPixelSink = Rc<RefCell<dyn PixelSink>>;

/// Register the `PIXELS` class and its methods with the host
///
/// # Errors
/// Propagates registration failures (invalid names cannot occur here, so
/// in practice only slot exhaustion).
pub fn register_pixels<E: ScriptEngine>(
    host: &mut ScriptHost<E>,
    sink: SharedPixelSink,
) -> Result<ClassId, RegistrationError> {
    let class = host.define_class("PIXELS", None)?;
    host.define_method(class, "set", set_handler(Rc::clone(&sink)))?;
    host.define_method(class, "update", update_handler(sink))?;
    Ok(class)
}

fn set_handler(sink: SharedPixelSink) -> Handler {
    Box::new(move |frame| set_pixel(&sink, frame))
}

fn update_handler(sink: SharedPixelSink) -> Handler {
    Box::new(move |frame| {
        sink.borrow_mut().flush();
        frame.set_return_bool(true);
    })
}

/// `PIXELS.set(index, red, green, blue)`
///
/// The false return is staged first and only upgraded to true after every
/// argument checks out and the sink call is made.
fn set_pixel(sink: &SharedPixelSink, frame: &mut Frame<'_>) {
    frame.set_return_bool(false);
    if frame.argc() < 4 {
        return;
    }
    let (Some(index), Some(red), Some(green), Some(blue)) = (
        frame.int_arg(1),
        frame.int_arg(2),
        frame.int_arg(3),
        frame.int_arg(4),
    ) else {
        log::debug!("PIXELS.set rejected: non-numeric argument");
        return;
    };
    if index < 0 {
        log::debug!("PIXELS.set rejected: negative index {index}");
        return;
    }
    sink.borrow_mut()
        .set(index as usize, red as u8, green as u8, blue as u8);
    frame.set_return_bool(true);
}
