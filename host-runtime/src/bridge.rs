//! Capability registration bridge
//!
//! The interpreter can only call statically known function addresses, yet
//! host capabilities are supplied at runtime. The bridge closes that gap
//! with a fixed pool of trampoline slots: each slot owns one pre-compiled
//! forwarding function whose sole job is to look up the handler bound to
//! its own slot and invoke it with the current call frame. Slots are
//! issued in increasing order and are never reused; registration fails
//! once all [`SLOT_COUNT`] are consumed.

use thiserror::Error;

use crate::{engine::NativeFn, value::Frame};

/// Number of trampoline slots, and so the most live native methods a host can
/// expose to scripts at once
pub const SLOT_COUNT: usize = 32;

/// Index of an issued trampoline slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotIndex(usize);

impl SlotIndex {
    /// Zero-based slot position
    pub fn raw(self) -> usize {
        self.0
    }
}

/// A dynamically supplied capability handler
pub type Handler = Box<dyn FnMut(&mut Frame<'_>)>;

/// Errors raised by registration calls
///
/// Each failure is local to the call that raised it; no in-progress or
/// future run is affected.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Class or method name is empty
    #[error("registration name is empty")]
    EmptyName,

    /// Class or method name exceeds the configured bound
    #[error("registration name too long: {len} bytes (maximum {max})")]
    NameTooLong {
        /// Offending name length
        len: usize,
        /// Configured maximum length
        max: usize,
    },

    /// Every trampoline slot has been issued
    #[error("trampoline slots exhausted ({capacity} issued)")]
    SlotsExhausted {
        /// Fixed slot pool capacity
        capacity: usize,
    },

    /// Slot already carries a handler
    #[error("trampoline slot {0} is already bound")]
    SlotAlreadyBound(usize),

    /// Slot was never issued by [`CapabilityBridge::reserve_slot`]
    #[error("trampoline slot {0} was never reserved")]
    SlotNotReserved(usize),

    /// Class identifier does not name a registered class
    #[error("unknown class identifier {0}")]
    UnknownClass(usize),

    /// Engine rejected the class definition
    #[error("engine rejected class {0:?}")]
    EngineRejected(String),
}

enum Slot {
    Free,
    Reserved,
    Bound(Handler),
}

impl Slot {
    fn is_free(&self) -> bool {
        matches!(self, Slot::Free)
    }
}

/// Fixed pool of trampoline slots plus the handler side table
///
/// Mutated only by registration calls; read (through [`dispatch`]) while a
/// script runs. The host must not register during an active run.
///
/// [`dispatch`]: CapabilityBridge::dispatch
pub struct CapabilityBridge {
    slots: Vec<Slot>,
    next: usize,
}

impl CapabilityBridge {
    /// Creates a bridge with all [`SLOT_COUNT`] slots free
    pub fn new() -> Self {
        Self {
            slots: (0..SLOT_COUNT).map(|_| Slot::Free).collect(),
            next: 0,
        }
    }

    /// Issue the next slot, in strictly increasing order
    ///
    /// # Errors
    /// [`RegistrationError::SlotsExhausted`] once all slots are issued.
    pub fn reserve_slot(&mut self) -> Result<SlotIndex, RegistrationError> {
        let index = self.next;
        match self.slots.get_mut(index) {
            Some(slot) if slot.is_free() => {
                *slot = Slot::Reserved;
                self.next = index.saturating_add(1);
                Ok(SlotIndex(index))
            }
            _ => Err(RegistrationError::SlotsExhausted {
                capacity: SLOT_COUNT,
            }),
        }
    }

    /// Bind the late-supplied handler behind an issued slot
    ///
    /// # Errors
    /// - [`RegistrationError::SlotNotReserved`] if the slot was never issued
    /// - [`RegistrationError::SlotAlreadyBound`] if it already has a handler
    pub fn bind(&mut self, slot: SlotIndex, handler: Handler) -> Result<(), RegistrationError> {
        match self.slots.get_mut(slot.0) {
            Some(entry @ Slot::Reserved) => {
                *entry = Slot::Bound(handler);
                Ok(())
            }
            Some(Slot::Bound(_)) => Err(RegistrationError::SlotAlreadyBound(slot.0)),
            _ => Err(RegistrationError::SlotNotReserved(slot.0)),
        }
    }

    /// Number of slots currently carrying a handler
    pub fn bound_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Bound(_)))
            .count()
    }

    /// Invoke the handler bound to `slot` with the current call frame
    ///
    /// Called from the slot's forwarding function while a script runs. A
    /// slot without a handler leaves Nil in the return slot so the script
    /// still observes a validly tagged value.
    pub fn dispatch(&mut self, slot: SlotIndex, frame: &mut Frame<'_>) {
        match self.slots.get_mut(slot.0) {
            Some(Slot::Bound(handler)) => handler(frame),
            _ => {
                log::warn!("script call reached unbound trampoline slot {}", slot.0);
                frame.set_return_nil();
            }
        }
    }

    /// The statically addressable forwarding function for `slot`
    ///
    /// Every slot's forwarder exists from build time; only the handler
    /// behind it is late-bound.
    pub fn forwarder(slot: SlotIndex) -> NativeFn {
        // SlotIndex is only ever issued with a position below SLOT_COUNT
        FORWARDERS[slot.0]
    }
}

impl Default for CapabilityBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates one named forwarding fn per slot so each has a distinct
/// static address, then collects them in issue order.
macro_rules! forwarder_table {
    ($($slot:literal),* $(,)?) => {
        [$(
            {
                fn forward(bridge: &mut CapabilityBridge, frame: &mut Frame<'_>) {
                    bridge.dispatch(SlotIndex($slot), frame);
                }
                forward as NativeFn
            }
        ),*]
    };
}

static FORWARDERS: [NativeFn; SLOT_COUNT] = forwarder_table!(
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25,
    26, 27, 28, 29, 30, 31,
);
