//! External interpreter interface
//!
//! The bytecode interpreter itself is an external collaborator; this module
//! specifies the narrow surface the boundary layer drives it through and
//! ships [`StubEngine`], a scripted implementation for tests and demos.
//!
//! The engine can only call statically known function addresses, which is
//! why [`NativeFn`] is a plain `fn` pointer: dynamic host behavior is
//! reached by indirecting through the
//! [`CapabilityBridge`](crate::bridge::CapabilityBridge) forwarder table.

use std::collections::HashMap;

use crate::{
    bridge::CapabilityBridge,
    value::{Frame, Value},
};

/// Raw engine status meaning normal task termination
///
/// Any other status is the script's own termination code and passes
/// through [`ScriptHost::run`](crate::ScriptHost::run) unchanged.
pub const RAW_EXIT_OK: i32 = 1;

/// Statically addressable method entry point
///
/// The only callable shape the engine understands. The bridge supplies one
/// such forwarder per trampoline slot.
pub type NativeFn = fn(&mut CapabilityBridge, &mut Frame<'_>);

/// Opaque handle to an engine-side class
///
/// Handles are invalidated by every arena reset; the host re-applies its
/// registrations rather than retaining them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassHandle(u32);

impl ClassHandle {
    /// The universal base class
    pub const OBJECT: ClassHandle = ClassHandle(0);

    /// Construct a handle from an engine-side identifier
    pub fn new(raw: u32) -> Self {
        ClassHandle(raw)
    }

    /// The engine-side identifier
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Opaque handle to one in-progress execution task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle(u32);

impl TaskHandle {
    /// Construct a handle from an engine-side identifier
    pub fn new(raw: u32) -> Self {
        TaskHandle(raw)
    }
}

/// Allocator usage snapshot for [`print_statistics`](crate::ScriptHost::print_statistics)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total pool capacity in bytes
    pub total: usize,
    /// Bytes currently allocated
    pub used: usize,
    /// Bytes currently free
    pub free: usize,
    /// Count of non-contiguous free fragments
    pub fragmentation: usize,
}

/// The bytecode interpreter, specified at its interface
///
/// Implementations wrap a concrete engine (the reference deployment wraps
/// an mruby/c-style VM). The host guarantees the call discipline: `init`
/// before anything else, at most one task alive, `cleanup` + `init` after
/// every run regardless of outcome.
pub trait ScriptEngine {
    /// Bind the engine allocator to the given fixed memory region
    fn init(&mut self, pool: &mut [u8]);

    /// Create an execution task from validated bytecode
    ///
    /// Returns `None` on failure (typically pool exhaustion); the image
    /// has already passed host-side validation but may still be rejected
    /// by the engine's own structural checks.
    fn create_task(&mut self, bytecode: &[u8]) -> Option<TaskHandle>;

    /// Run the current task to completion, returning the raw exit status
    ///
    /// Registered method calls made by the script dispatch through
    /// `bridge` for the duration of this call.
    fn run(&mut self, bridge: &mut CapabilityBridge) -> i32;

    /// Tear down the engine instance, releasing every engine-owned object
    fn cleanup(&mut self);

    /// Define a class, returning `None` if the engine rejects it
    fn define_class(&mut self, name: &str, superclass: ClassHandle) -> Option<ClassHandle>;

    /// Bind a method name on a class to a statically addressable entry
    fn define_method(&mut self, class: ClassHandle, name: &str, entry: NativeFn);

    /// The universal base class
    fn object_class(&self) -> ClassHandle {
        ClassHandle::OBJECT
    }

    /// Snapshot of allocator usage
    fn statistics(&self) -> PoolStats;
}

/// One method invocation replayed by [`StubEngine::run`]
#[derive(Debug, Clone)]
pub struct ScriptedCall {
    /// Class the method is looked up on
    pub class: ClassHandle,
    /// Method name
    pub method: String,
    /// Positional arguments placed in frame slots `1..`
    pub args: Vec<Value>,
}

/// Scripted engine for tests, benchmarks and demos
///
/// Plays the role the `NoOp*` providers play for storage: a real trait
/// implementation with observable bookkeeping and no interpreter behind
/// it. `run` replays the scripted calls through whatever entries were
/// registered via `define_method`, so bridge dispatch is exercised
/// end to end.
#[derive(Default)]
pub struct StubEngine {
    pool_size: usize,
    init_count: usize,
    cleanup_count: usize,
    exit_status: Option<i32>,
    fail_next_task: bool,
    task: Option<TaskHandle>,
    next_task: u32,
    next_class: u32,
    methods: HashMap<(u32, String), NativeFn>,
    calls: Vec<ScriptedCall>,
    returns: Vec<Value>,
}

impl StubEngine {
    /// Creates an engine that terminates every run normally
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `create_task` call fail
    pub fn fail_next_task_creation(&mut self) {
        self.fail_next_task = true;
    }

    /// Override the raw status returned by subsequent runs
    pub fn set_exit_status(&mut self, status: i32) {
        self.exit_status = Some(status);
    }

    /// Queue a method call to be replayed on every run
    pub fn script_call(&mut self, class: ClassHandle, method: &str, args: Vec<Value>) {
        self.calls.push(ScriptedCall {
            class,
            method: method.to_string(),
            args,
        });
    }

    /// Return values collected from replayed calls, in call order
    pub fn returns(&self) -> &[Value] {
        &self.returns
    }

    /// How many times `init` has run
    pub fn init_count(&self) -> usize {
        self.init_count
    }

    /// How many times `cleanup` has run
    pub fn cleanup_count(&self) -> usize {
        self.cleanup_count
    }

    /// Size of the pool most recently bound by `init`
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }
}

impl ScriptEngine for StubEngine {
    fn init(&mut self, pool: &mut [u8]) {
        self.pool_size = pool.len();
        self.init_count = self.init_count.saturating_add(1);
        // A reset drops every engine-side definition with the pool
        self.methods.clear();
        self.next_class = 0;
        self.task = None;
    }

    fn create_task(&mut self, bytecode: &[u8]) -> Option<TaskHandle> {
        if self.fail_next_task {
            self.fail_next_task = false;
            return None;
        }
        if self.task.is_some() || bytecode.is_empty() {
            return None;
        }
        self.next_task = self.next_task.wrapping_add(1);
        let handle = TaskHandle::new(self.next_task);
        self.task = Some(handle);
        Some(handle)
    }

    fn run(&mut self, bridge: &mut CapabilityBridge) -> i32 {
        if self.task.take().is_none() {
            return RAW_EXIT_OK;
        }
        for i in 0..self.calls.len() {
            let call = self.calls[i].clone();
            let Some(entry) = self.methods.get(&(call.class.raw(), call.method)).copied() else {
                continue;
            };
            let mut slots = Vec::with_capacity(call.args.len().saturating_add(1));
            slots.push(Value::Nil);
            slots.extend(call.args);
            let mut frame = Frame::new(&mut slots);
            entry(bridge, &mut frame);
            self.returns.push(slots.swap_remove(0));
        }
        self.exit_status.unwrap_or(RAW_EXIT_OK)
    }

    fn cleanup(&mut self) {
        self.cleanup_count = self.cleanup_count.saturating_add(1);
        self.task = None;
    }

    fn define_class(&mut self, name: &str, _superclass: ClassHandle) -> Option<ClassHandle> {
        if name.is_empty() {
            return None;
        }
        self.next_class = self.next_class.wrapping_add(1);
        Some(ClassHandle::new(self.next_class))
    }

    fn define_method(&mut self, class: ClassHandle, name: &str, entry: NativeFn) {
        self.methods.insert((class.raw(), name.to_string()), entry);
    }

    fn statistics(&self) -> PoolStats {
        PoolStats {
            total: self.pool_size,
            used: 0,
            free: self.pool_size,
            fragmentation: 0,
        }
    }
}
