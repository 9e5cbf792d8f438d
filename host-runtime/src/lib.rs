//! Scripthost Runtime
//!
//! This crate is the boundary layer between an outer host and an embedded,
//! bytecode-driven script interpreter running in a fixed memory arena. The
//! interpreter itself is an external collaborator reached through the
//! [`ScriptEngine`] trait; this crate owns everything on the trust
//! boundary around it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Embedding host               │
//! │   (loads images, supplies capabilities) │
//! └────────────────┬────────────────────────┘
//!                  │
//!                  │ init / run / register
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │    scripthost-runtime (this crate)      │
//! │  ┌─────────────────────────────────┐    │
//! │  │    ScriptHost                   │    │
//! │  │  - image validation             │    │
//! │  │  - arena lifecycle              │    │
//! │  │  - run orchestration + reset    │    │
//! │  │  - capability table replay      │    │
//! │  └─────────────────────────────────┘    │
//! │  ┌─────────────────────────────────┐    │
//! │  │    CapabilityBridge             │    │
//! │  │  - trampoline slot pool         │    │
//! │  │  - handler side table           │    │
//! │  │  - Frame marshalling            │    │
//! │  └─────────────────────────────────┘    │
//! └────────────────┬────────────────────────┘
//!                  │ ScriptEngine trait
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │      Bytecode interpreter (external)    │
//! │  - init(pool) / create_task / run       │
//! │  - calls NativeFn entries only          │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use scripthost_runtime::{HostConfig, ScriptHost, StubEngine};
//!
//! let mut host = ScriptHost::new(StubEngine::new(), HostConfig::default());
//!
//! // Register a capability scripts can call
//! let class = host.define_class("DEMO", None).unwrap();
//! host.define_method(class, "answer", Box::new(|frame| frame.set_return_int(42)))
//!     .unwrap();
//!
//! // One image per run; a well-formed image terminates with 0
//! let mut image = b"RITE".to_vec();
//! image.extend_from_slice(&[0, 0, 0, 1]);
//! assert_eq!(host.run(Some(&image)), 0);
//! ```

#![warn(missing_docs)]
#![deny(clippy::arithmetic_side_effects)]

pub mod arena;
pub mod bridge;
pub mod config;
pub mod diag;
pub mod engine;
pub mod error;
pub mod host;
pub mod validate;
pub mod value;

// Re-export main types
pub use arena::{Arena, ArenaState};
pub use bridge::{CapabilityBridge, Handler, RegistrationError, SlotIndex, SLOT_COUNT};
pub use config::HostConfig;
pub use diag::{Channel, DiagnosticChannel, LogSink, MemorySink, OutputSink};
pub use engine::{
    ClassHandle, NativeFn, PoolStats, ScriptEngine, StubEngine, TaskHandle, RAW_EXIT_OK,
};
pub use error::{exit_code, HostError, Result};
pub use host::{ClassId, ScriptHost};
pub use validate::{validate, ImageError};
pub use value::{Frame, ObjectRef, Value};
