//! The script host boundary
//!
//! [`ScriptHost`] is the single owner of the arena, the engine instance,
//! the capability bridge and the diagnostic channel. It drives one run at
//! a time: validate, arm the arena, create the task, run to completion,
//! then unconditionally tear the arena down and re-arm it. The defensive
//! reset runs on every path after a task exists, so the correctness of a
//! run never depends on how the previous one ended.
//!
//! Registration calls populate a host-side capability table. Engine
//! handles do not survive a reset, so the table is replayed into the
//! engine after every arena (re)initialization, so a registered method
//! stays callable for as many runs as the host lives.

use crate::{
    arena::{Arena, ArenaState},
    bridge::{CapabilityBridge, Handler, RegistrationError, SlotIndex},
    config::HostConfig,
    diag::{DiagnosticChannel, LogSink, OutputSink},
    engine::{ClassHandle, PoolStats, ScriptEngine, RAW_EXIT_OK},
    error::exit_code,
    validate::validate,
};

/// Stable identifier for a class registered through the host
///
/// Unlike [`ClassHandle`], a `ClassId` survives arena resets: it names an
/// entry in the host-side capability table, not an engine object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassId(usize);

struct ClassRecord {
    name: String,
    superclass: Option<ClassId>,
    /// Engine-side handle from the most recent replay; stale after reset
    engine_handle: Option<ClassHandle>,
    methods: Vec<(String, SlotIndex)>,
}

/// The execution controller and registration surface
///
/// Non-reentrant by design: `run` takes `&mut self`, so a second
/// concurrent run on the same host is ruled out by the borrow checker.
/// Embedders wanting cross-thread access must serialize externally.
pub struct ScriptHost<E: ScriptEngine> {
    engine: E,
    arena: Arena,
    bridge: CapabilityBridge,
    diag: DiagnosticChannel,
    config: HostConfig,
    classes: Vec<ClassRecord>,
}

impl<E: ScriptEngine> ScriptHost<E> {
    /// Creates a host over `engine`, routing diagnostics to the `log` facade
    pub fn new(engine: E, config: HostConfig) -> Self {
        let sink = Box::new(LogSink);
        Self::with_sink(engine, config, sink)
    }

    /// Creates a host emitting diagnostics through a custom sink
    pub fn with_sink(engine: E, config: HostConfig, sink: Box<dyn OutputSink>) -> Self {
        let arena = Arena::new(config.arena_size);
        let diag = DiagnosticChannel::new(sink, config.diag_truncate_at);
        Self {
            engine,
            arena,
            bridge: CapabilityBridge::new(),
            diag,
            config,
            classes: Vec::new(),
        }
    }

    /// Idempotent arena/interpreter bring-up
    ///
    /// Called implicitly by [`run`](Self::run); exposed so embedders can
    /// front-load initialization.
    pub fn init(&mut self) {
        if self.arena.ensure_ready(&mut self.engine) {
            self.sync_capabilities();
        }
    }

    /// Validate and execute one program image
    ///
    /// Returns `0` on normal completion, a negative host code for images
    /// rejected before execution (-1 null, -2 too small, -3 too large,
    /// -4 bad header, -5 task creation failure), or the script's own
    /// non-zero termination status.
    pub fn run(&mut self, image: Option<&[u8]>) -> i32 {
        let image = match validate(image, &self.config) {
            Ok(image) => image,
            Err(err) => {
                self.diag.error(&format!("rejecting program image: {err}"));
                return err.exit_code();
            }
        };

        self.init();

        if self.engine.create_task(image).is_none() {
            self.diag.error(&format!(
                "task creation failed: the memory pool ({} bytes) may be exhausted, \
                 the image may be corrupt, or a previous run left abnormal state",
                self.config.arena_size
            ));
            self.reset();
            return exit_code::TASK_CREATE_FAILED;
        }

        let raw = self.engine.run(&mut self.bridge);

        // Defensive reset on every path once a task existed
        self.reset();

        if raw == RAW_EXIT_OK {
            exit_code::OK
        } else {
            raw
        }
    }

    /// Register a class with the host
    ///
    /// `superclass` defaults to the engine's universal base class when
    /// omitted and must name a class registered earlier through this host.
    ///
    /// # Errors
    /// Name validation failures and engine rejections; nothing is
    /// registered on error.
    pub fn define_class(
        &mut self,
        name: &str,
        superclass: Option<ClassId>,
    ) -> Result<ClassId, RegistrationError> {
        self.validate_name(name)?;
        if let Some(super_id) = superclass {
            if super_id.0 >= self.classes.len() {
                return Err(RegistrationError::UnknownClass(super_id.0));
            }
        }

        let mut record = ClassRecord {
            name: name.to_string(),
            superclass,
            engine_handle: None,
            methods: Vec::new(),
        };

        // With a live arena the class is defined eagerly; otherwise the
        // replay at bring-up covers it.
        if self.arena.state() == ArenaState::Initialized {
            let super_handle = self.resolve_superclass(superclass);
            match self.engine.define_class(name, super_handle) {
                Some(handle) => record.engine_handle = Some(handle),
                None => return Err(RegistrationError::EngineRejected(name.to_string())),
            }
        }

        let id = ClassId(self.classes.len());
        self.classes.push(record);
        Ok(id)
    }

    /// Bind a host-supplied handler as a method on a registered class
    ///
    /// Reserves a trampoline slot, binds `handler` behind it and wires the
    /// slot's forwarder into the engine. The returned slot index is stable
    /// for the life of the host.
    ///
    /// # Errors
    /// Name validation failures, unknown class, or slot pool exhaustion.
    pub fn define_method(
        &mut self,
        class: ClassId,
        name: &str,
        handler: Handler,
    ) -> Result<SlotIndex, RegistrationError> {
        self.validate_name(name)?;
        if class.0 >= self.classes.len() {
            return Err(RegistrationError::UnknownClass(class.0));
        }

        let slot = self.bridge.reserve_slot()?;
        self.bridge.bind(slot, handler)?;
        self.classes[class.0].methods.push((name.to_string(), slot));

        if let Some(handle) = self.classes[class.0].engine_handle {
            self.engine
                .define_method(handle, name, CapabilityBridge::forwarder(slot));
        }
        Ok(slot)
    }

    /// Issue the next trampoline slot without binding a handler yet
    ///
    /// The two-step path for embedders whose handlers arrive after slot
    /// numbers have been handed out; pair with
    /// [`bind_method_slot`](Self::bind_method_slot).
    pub fn reserve_method_slot(&mut self) -> Result<SlotIndex, RegistrationError> {
        self.bridge.reserve_slot()
    }

    /// Bind the handler behind a previously reserved slot
    pub fn bind_method_slot(
        &mut self,
        slot: SlotIndex,
        handler: Handler,
    ) -> Result<(), RegistrationError> {
        self.bridge.bind(slot, handler)
    }

    /// The engine's universal base class
    pub fn object_class(&self) -> ClassHandle {
        self.engine.object_class()
    }

    /// Engine-side handle for a registered class, if the arena is live
    ///
    /// Stale after the next reset; useful for wiring scripted engines.
    pub fn class_handle(&self, id: ClassId) -> Option<ClassHandle> {
        self.classes.get(id.0).and_then(|record| record.engine_handle)
    }

    /// Emit allocator usage through the info channel (debug aid)
    pub fn print_statistics(&mut self) {
        let PoolStats {
            total,
            used,
            free,
            fragmentation,
        } = self.engine.statistics();
        self.diag.info(&format!(
            "memory pool: {total} bytes total, {used} used, {free} free, {fragmentation} fragments"
        ));
    }

    /// Current arena lifecycle state
    pub fn arena_state(&self) -> ArenaState {
        self.arena.state()
    }

    /// The active configuration
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Borrow the engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutably borrow the engine
    ///
    /// For embedder-side engine setup only; never call between
    /// [`run`](Self::run) invocations in ways that leave a task alive.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    fn validate_name(&self, name: &str) -> Result<(), RegistrationError> {
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if name.len() > self.config.max_name_length {
            return Err(RegistrationError::NameTooLong {
                len: name.len(),
                max: self.config.max_name_length,
            });
        }
        Ok(())
    }

    fn resolve_superclass(&self, superclass: Option<ClassId>) -> ClassHandle {
        superclass
            .and_then(|id| self.classes.get(id.0))
            .and_then(|record| record.engine_handle)
            .unwrap_or_else(|| self.engine.object_class())
    }

    fn reset(&mut self) {
        self.arena.reset(&mut self.engine);
        self.sync_capabilities();
    }

    /// Replay the capability table into a freshly initialized engine
    ///
    /// Registration order is preserved, so a superclass is always defined
    /// before its subclasses.
    fn sync_capabilities(&mut self) {
        for i in 0..self.classes.len() {
            let name = self.classes[i].name.clone();
            let super_handle = self.resolve_superclass(self.classes[i].superclass);
            let handle = self.engine.define_class(&name, super_handle);
            self.classes[i].engine_handle = handle;
            let Some(handle) = handle else {
                self.diag
                    .error(&format!("engine rejected class {name:?} at re-registration"));
                continue;
            };
            for (method, slot) in self.classes[i].methods.clone() {
                self.engine
                    .define_method(handle, &method, CapabilityBridge::forwarder(slot));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diag::Channel,
        engine::StubEngine,
        value::Value,
    };
    use std::{cell::RefCell, rc::Rc};

    struct SharedSink(Rc<RefCell<Vec<(Channel, String)>>>);

    impl OutputSink for SharedSink {
        fn write(&mut self, channel: Channel, bytes: &[u8]) -> usize {
            self.0
                .borrow_mut()
                .push((channel, String::from_utf8_lossy(bytes).into_owned()));
            bytes.len()
        }
    }

    fn host() -> ScriptHost<StubEngine> {
        ScriptHost::new(StubEngine::new(), HostConfig::default())
    }

    fn host_with_diag() -> (ScriptHost<StubEngine>, Rc<RefCell<Vec<(Channel, String)>>>) {
        let entries = Rc::new(RefCell::new(Vec::new()));
        let sink = Box::new(SharedSink(Rc::clone(&entries)));
        let host = ScriptHost::with_sink(StubEngine::new(), HostConfig::default(), sink);
        (host, entries)
    }

    fn valid_image() -> Vec<u8> {
        let mut image = b"RITE".to_vec();
        image.extend_from_slice(&[0, 0, 0, 1]);
        image
    }

    #[test]
    fn test_run_null_image() {
        let mut host = host();
        assert_eq!(host.run(None), -1);
        // Rejected before any interpreter interaction
        assert_eq!(host.engine().init_count(), 0);
    }

    #[test]
    fn test_run_undersized_image() {
        let (mut host, entries) = host_with_diag();
        assert_eq!(host.run(Some(b"RITE")), -2);
        let entries = entries.borrow();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, Channel::Error);
        assert!(entries[0].1.contains("4 bytes"));
        assert!(entries[0].1.contains("minimum 8"));
    }

    #[test]
    fn test_run_oversized_image() {
        let mut host = host();
        let image = vec![0u8; 1024 * 1024 + 1];
        assert_eq!(host.run(Some(&image)), -3);
    }

    #[test]
    fn test_run_bad_header() {
        let mut host = host();
        assert_eq!(host.run(Some(b"NOPE0000")), -4);
    }

    #[test]
    fn test_run_success() {
        let mut host = host();
        assert_eq!(host.run(Some(&valid_image())), 0);
        assert_eq!(host.arena_state(), ArenaState::Initialized);
        // One bring-up plus the defensive reset
        assert_eq!(host.engine().init_count(), 2);
        assert_eq!(host.engine().cleanup_count(), 1);
    }

    #[test]
    fn test_run_script_status_passthrough() {
        let mut host = host();
        host.engine_mut().set_exit_status(7);
        assert_eq!(host.run(Some(&valid_image())), 7);
        host.engine_mut().set_exit_status(-42);
        assert_eq!(host.run(Some(&valid_image())), -42);
    }

    #[test]
    fn test_task_creation_failure_resets_and_recovers() {
        let (mut host, entries) = host_with_diag();
        host.engine_mut().fail_next_task_creation();
        assert_eq!(host.run(Some(&valid_image())), -5);
        assert_eq!(host.arena_state(), ArenaState::Initialized);
        assert!(entries.borrow()[0].1.contains("40960 bytes"));

        // The failure does not poison later runs
        assert_eq!(host.run(Some(&valid_image())), 0);
    }

    #[test]
    fn test_sequential_runs_do_not_interfere() {
        let mut host = host();
        let image = valid_image();
        for _ in 0..100 {
            assert_eq!(host.run(Some(&image)), 0);
            assert_eq!(host.arena_state(), ArenaState::Initialized);
        }
        // Every run tore the arena down exactly once
        assert_eq!(host.engine().cleanup_count(), 100);
        assert_eq!(host.engine().init_count(), 101);
    }

    #[test]
    fn test_init_is_idempotent() {
        let mut host = host();
        host.init();
        host.init();
        assert_eq!(host.engine().init_count(), 1);
    }

    #[test]
    fn test_define_class_rejects_bad_names() {
        let mut host = host();
        assert!(matches!(
            host.define_class("", None),
            Err(RegistrationError::EmptyName)
        ));
        let long = "X".repeat(65);
        assert!(matches!(
            host.define_class(&long, None),
            Err(RegistrationError::NameTooLong { len: 65, max: 64 })
        ));
        // Nothing was registered
        assert!(host.define_method(ClassId(0), "m", Box::new(|_| {})).is_err());
    }

    #[test]
    fn test_define_class_unknown_superclass() {
        let mut host = host();
        assert!(matches!(
            host.define_class("KID", Some(ClassId(5))),
            Err(RegistrationError::UnknownClass(5))
        ));
    }

    #[test]
    fn test_method_round_trip_through_scripted_engine() {
        let mut host = host();
        let class = host.define_class("DEMO", None).unwrap();
        host.define_method(class, "answer", Box::new(|frame| frame.set_return_int(42)))
            .unwrap();

        host.init();
        let handle = host.class_handle(class).unwrap();
        host.engine_mut().script_call(handle, "answer", vec![]);

        assert_eq!(host.run(Some(&valid_image())), 0);
        assert_eq!(host.engine().returns(), &[Value::Integer(42)]);
    }

    #[test]
    fn test_registered_method_survives_resets() {
        let mut host = host();
        let class = host.define_class("DEMO", None).unwrap();
        host.define_method(class, "answer", Box::new(|frame| frame.set_return_int(42)))
            .unwrap();

        host.init();
        let handle = host.class_handle(class).unwrap();
        host.engine_mut().script_call(handle, "answer", vec![]);

        // Each run ends in a reset; the replay keeps the method callable
        assert_eq!(host.run(Some(&valid_image())), 0);
        assert_eq!(host.run(Some(&valid_image())), 0);
        assert_eq!(
            host.engine().returns(),
            &[Value::Integer(42), Value::Integer(42)]
        );
    }

    #[test]
    fn test_registration_after_init() {
        let mut host = host();
        host.init();
        let class = host.define_class("LATE", None).unwrap();
        // Arena was live, so the engine handle exists immediately
        assert!(host.class_handle(class).is_some());
    }

    #[test]
    fn test_slot_exhaustion_through_host() {
        let mut host = host();
        let class = host.define_class("WIDE", None).unwrap();
        for i in 0..32 {
            let slot = host
                .define_method(class, &format!("m{i}"), Box::new(|_| {}))
                .unwrap();
            assert_eq!(slot.raw(), i);
        }
        assert!(matches!(
            host.define_method(class, "overflow", Box::new(|_| {})),
            Err(RegistrationError::SlotsExhausted { .. })
        ));
    }

    #[test]
    fn test_reserve_then_bind_slot() {
        let mut host = host();
        let slot = host.reserve_method_slot().unwrap();
        assert_eq!(slot.raw(), 0);
        host.bind_method_slot(slot, Box::new(|frame| frame.set_return_bool(true)))
            .unwrap();
        assert!(host.bind_method_slot(slot, Box::new(|_| {})).is_err());
    }

    #[test]
    fn test_print_statistics_emits_info() {
        let (mut host, entries) = host_with_diag();
        host.init();
        host.print_statistics();
        let entries = entries.borrow();
        assert_eq!(entries[0].0, Channel::Info);
        assert!(entries[0].1.contains("40960 bytes total"));
    }

    #[test]
    fn test_subclass_resolves_registered_superclass() {
        let mut host = host();
        let base = host.define_class("BASE", None).unwrap();
        let kid = host.define_class("KID", Some(base)).unwrap();
        host.init();
        assert!(host.class_handle(base).is_some());
        assert!(host.class_handle(kid).is_some());
        assert_ne!(host.class_handle(base), host.class_handle(kid));
    }
}
