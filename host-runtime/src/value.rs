//! Tagged values and the argument/return frame
//!
//! The interpreter and host capabilities exchange data through a register
//! window of dynamically tagged values: slot 0 is the return slot, slots
//! `1..=argc` are positional arguments. [`Frame`] wraps that window and
//! provides the marshalling primitives capabilities are written against.

use std::{any::Any, fmt, rc::Rc};

/// Opaque reference-counted object handle
///
/// The boundary layer never looks inside an object; it only moves the
/// reference and releases it when a slot is overwritten.
pub type ObjectRef = Rc<dyn Any>;

/// A dynamically tagged interpreter value
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Nil,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Integer(i64),
    /// Double-precision float
    Float(f64),
    /// Reference-counted interpreter object
    Object(ObjectRef),
}

impl Value {
    /// Whether this value carries an Integer or Float tag
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Read as an integer, truncating a Float toward zero
    ///
    /// Returns `None` for non-numeric tags.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    /// Read as a float, widening an Integer
    ///
    /// Returns `None` for non-numeric tags.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Integer(n) => write!(f, "Integer({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Object(obj) => write!(f, "Object({:p})", Rc::as_ptr(obj)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            // Objects compare by identity, not content
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// The register window passed to a capability handler
///
/// Slot 0 is the return slot; slots `1..=argc` hold the positional
/// arguments. The interpreter sizes the window before dispatch, so a
/// handler must check [`argc`](Frame::argc) before reading arguments;
/// out-of-range reads yield `None`/`false` rather than a value.
pub struct Frame<'a> {
    slots: &'a mut [Value],
}

impl<'a> Frame<'a> {
    /// Wraps a register window; `slots[0]` is the return slot
    ///
    /// The window must contain at least the return slot.
    pub fn new(slots: &'a mut [Value]) -> Self {
        debug_assert!(!slots.is_empty(), "frame requires a return slot");
        Self { slots }
    }

    /// Number of positional arguments
    pub fn argc(&self) -> usize {
        self.slots.len().saturating_sub(1)
    }

    /// Borrow the argument at `index` (1-based, `1..=argc`)
    pub fn arg(&self, index: usize) -> Option<&Value> {
        if index == 0 {
            return None;
        }
        self.slots.get(index)
    }

    /// Whether the argument at `index` carries a numeric tag
    pub fn is_numeric(&self, index: usize) -> bool {
        self.arg(index).is_some_and(Value::is_numeric)
    }

    /// Argument at `index` as an integer (Float truncates toward zero)
    pub fn int_arg(&self, index: usize) -> Option<i64> {
        self.arg(index)?.as_int()
    }

    /// Argument at `index` as a float (Integer widens)
    pub fn float_arg(&self, index: usize) -> Option<f64> {
        self.arg(index)?.as_float()
    }

    /// Overwrite the return slot
    ///
    /// The previous value is dropped first, releasing any object reference
    /// it held. Ownership of an object placed here transfers to the
    /// interpreter when the handler returns.
    pub fn set_return(&mut self, value: Value) {
        self.slots[0] = value;
    }

    /// Put an Integer-tagged value in the return slot
    pub fn set_return_int(&mut self, value: i64) {
        self.set_return(Value::Integer(value));
    }

    /// Put a Float-tagged value in the return slot
    pub fn set_return_float(&mut self, value: f64) {
        self.set_return(Value::Float(value));
    }

    /// Put a Boolean-tagged value in the return slot
    pub fn set_return_bool(&mut self, value: bool) {
        self.set_return(Value::Bool(value));
    }

    /// Put Nil in the return slot
    pub fn set_return_nil(&mut self) {
        self.set_return(Value::Nil);
    }

    /// Borrow the current return slot content
    pub fn return_value(&self) -> &Value {
        &self.slots[0]
    }
}
