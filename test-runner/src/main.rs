//! Demo runner for the scripthost boundary layer
//!
//! Wires a scripted stub engine, the PIXELS capability and a logging pixel
//! sink together, then drives a few runs through the host to show the
//! validation, execution and defensive-reset paths.

use std::{cell::RefCell, rc::Rc};

use scripthost_capabilities::pixels::PixelSink;
use scripthost_runtime::{HostConfig, ScriptHost, StubEngine, Value};

/// Sink that logs every pixel operation instead of driving hardware
#[derive(Debug, Default)]
struct LoggingPixelSink {
    staged: usize,
}

impl PixelSink for LoggingPixelSink {
    fn set(&mut self, index: usize, red: u8, green: u8, blue: u8) {
        self.staged += 1;
        log::info!("pixel {index} <- rgb({red}, {green}, {blue})");
    }

    fn flush(&mut self) {
        log::info!("flushed {} staged pixel(s)", self.staged);
        self.staged = 0;
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize simple logger with custom format
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "   {}", record.args())
        })
        .init();

    println!("=== Scripthost Demo Runner ===\n");

    // 1. Create host and register capabilities
    println!("1. Creating script host and registering capabilities...");
    let mut host = ScriptHost::new(StubEngine::new(), HostConfig::default());
    let sink = Rc::new(RefCell::new(LoggingPixelSink::default()));
    let pixels = scripthost_capabilities::pixels::register_pixels(&mut host, sink)?;
    println!("   ✓ Host created with PIXELS registered\n");

    // 2. Script the engine: a program that paints two pixels and flushes
    println!("2. Scripting stub engine calls...");
    host.init();
    let handle = host
        .class_handle(pixels)
        .expect("arena is live after init");
    host.engine_mut().script_call(
        handle,
        "set",
        vec![
            Value::Integer(0),
            Value::Integer(255),
            Value::Integer(0),
            Value::Integer(0),
        ],
    );
    host.engine_mut().script_call(
        handle,
        "set",
        vec![
            Value::Integer(1),
            Value::Float(127.9),
            Value::Integer(127),
            Value::Integer(127),
        ],
    );
    host.engine_mut().script_call(handle, "update", vec![]);
    println!("   ✓ Three calls queued\n");

    // 3. Run a well-formed image
    println!("3. Running a valid program image...");
    let mut image = b"RITE".to_vec();
    image.extend_from_slice(&[0, 0, 0, 1]);
    let code = host.run(Some(&image));
    println!("   Exit code: {code}\n");

    // 4. Show the validator rejecting malformed images
    println!("4. Running malformed images...");
    println!("   null image       -> {}", host.run(None));
    println!("   undersized image -> {}", host.run(Some(b"RITE")));
    println!("   bad header       -> {}", host.run(Some(b"NOPE0000")));
    println!();

    // 5. Arena statistics
    println!("5. Arena statistics:");
    host.print_statistics();

    if code == 0 {
        println!("\n✅ Demo run completed successfully");
    } else {
        println!("\n⚠️  Demo run exited with {code}");
    }

    Ok(())
}
