//! Arena lifecycle management
//!
//! One fixed-capacity memory region backs the interpreter instance for the
//! whole life of the host. The arena is torn down and re-armed after every
//! run, so no object graph, open task or heap fragmentation survives from
//! one run into the next.

use crate::engine::ScriptEngine;

/// Lifecycle state of the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaState {
    /// No interpreter instance is bound to the region
    Uninitialized,
    /// An interpreter instance is live on the region
    Initialized,
}

/// The fixed memory region backing the interpreter
///
/// Owned by the [`ScriptHost`](crate::ScriptHost); nothing else mutates
/// it. Both operations are infallible by contract: a correctly sized
/// static region always initializes, and allocator exhaustion surfaces
/// later, at the allocation that actually fails.
pub struct Arena {
    pool: Box<[u8]>,
    state: ArenaState,
}

impl Arena {
    /// Allocates a region of `capacity` bytes, initially unbound
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: vec![0u8; capacity].into_boxed_slice(),
            state: ArenaState::Uninitialized,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ArenaState {
        self.state
    }

    /// Region capacity in bytes
    pub fn capacity(&self) -> usize {
        self.pool.len()
    }

    /// Idempotent bring-up: binds `engine` to the region on first call
    ///
    /// Returns `true` if an initialization actually happened, so callers
    /// know engine-side state is fresh.
    pub fn ensure_ready<E: ScriptEngine>(&mut self, engine: &mut E) -> bool {
        if self.state == ArenaState::Initialized {
            return false;
        }
        engine.init(&mut self.pool);
        self.state = ArenaState::Initialized;
        true
    }

    /// Unconditional teardown and immediate re-initialization
    ///
    /// Invalidates every engine object handle issued before the call;
    /// leaves the arena `Initialized` and ready for the next run.
    pub fn reset<E: ScriptEngine>(&mut self, engine: &mut E) {
        if self.state == ArenaState::Initialized {
            engine.cleanup();
        }
        engine.init(&mut self.pool);
        self.state = ArenaState::Initialized;
    }
}
