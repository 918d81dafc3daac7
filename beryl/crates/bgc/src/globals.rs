//! The process-wide global-variable table.
//!
//! Globals are keyed by interned symbol and may carry read/write access
//! hooks: a read hook computes the value on demand (`$$` style process
//! state), a write hook normalizes the assigned value before it lands.
//! The table's values are GC roots.

use beryl_util::Symbol;
use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::error::{BgcError, Result};
use crate::hashmap::Hashmap;
use crate::marker::MarkingVisitor;
use crate::object::Value;

/// Computes a global's value at read time
pub type ReadHook = fn(&GlobalVariableInfo) -> Option<Value>;

/// Normalizes a value at write time
pub type WriteHook = fn(Value, &GlobalVariableInfo) -> Value;

/// One global variable's bookkeeping
pub struct GlobalVariableInfo {
    name: Symbol,
    value: Option<Value>,
    readonly: bool,
    read_hook: Option<ReadHook>,
    write_hook: Option<WriteHook>,
}

impl GlobalVariableInfo {
    pub fn new(name: Symbol, value: Option<Value>, readonly: bool) -> Self {
        Self {
            name,
            value,
            readonly,
            read_hook: None,
            write_hook: None,
        }
    }

    pub fn name(&self) -> Symbol {
        self.name
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn value(&self) -> Option<Value> {
        match self.read_hook {
            Some(hook) => hook(self),
            None => self.value,
        }
    }

    pub fn set_read_hook(&mut self, hook: ReadHook) {
        self.read_hook = Some(hook);
    }

    pub fn set_write_hook(&mut self, hook: WriteHook) {
        self.write_hook = Some(hook);
    }
}

lazy_static! {
    static ref GLOBALS: Mutex<Hashmap<Symbol, GlobalVariableInfo>> = Mutex::new(Hashmap::new());
}

/// Define (or redefine) a global
pub fn define(name: Symbol, value: Option<Value>, readonly: bool) {
    GLOBALS
        .lock()
        .put(name, GlobalVariableInfo::new(name, value, readonly));
}

/// Install a read hook on an existing or fresh global
pub fn set_read_hook(name: Symbol, hook: ReadHook) {
    let mut globals = GLOBALS.lock();
    if globals.get(name).is_none() {
        globals.put(name, GlobalVariableInfo::new(name, None, false));
    }
    if let Some(info) = globals.get_mut(name) {
        info.set_read_hook(hook);
    }
}

/// Install a write hook on an existing or fresh global
pub fn set_write_hook(name: Symbol, hook: WriteHook) {
    let mut globals = GLOBALS.lock();
    if globals.get(name).is_none() {
        globals.put(name, GlobalVariableInfo::new(name, None, false));
    }
    if let Some(info) = globals.get_mut(name) {
        info.set_write_hook(hook);
    }
}

/// Read a global; undefined globals read as `None`
pub fn get(name: Symbol) -> Option<Value> {
    GLOBALS.lock().get(name).and_then(GlobalVariableInfo::value)
}

/// Write a global
pub fn set(name: Symbol, value: Value) -> Result<()> {
    let mut globals = GLOBALS.lock();
    match globals.get_mut(name) {
        Some(info) => {
            if info.readonly {
                return Err(BgcError::ReadOnlyGlobal(name.to_string()));
            }
            let value = match info.write_hook {
                Some(hook) => hook(value, info),
                None => value,
            };
            info.value = Some(value);
            Ok(())
        },
        None => {
            globals.put(name, GlobalVariableInfo::new(name, Some(value), false));
            Ok(())
        },
    }
}

/// Queue every global's value for marking
pub(crate) fn visit(visitor: &mut MarkingVisitor) {
    for (_, info) in GLOBALS.lock().iter() {
        if let Some(value) = info.value {
            visitor.visit(value);
        }
    }
}

/// Drop every global (test teardown)
pub fn clear() {
    *GLOBALS.lock() = Hashmap::new();
}

/// Stock access hooks
pub mod access_hooks {
    use super::GlobalVariableInfo;
    use crate::object::Value;

    /// Read hooks compute process state on demand
    pub mod read_hooks {
        use super::*;

        /// `$$` - the current process id
        #[cfg(unix)]
        pub fn getpid(_info: &GlobalVariableInfo) -> Option<Value> {
            // Safety: getpid has no failure modes.
            Some(Value::integer(unsafe { libc::getpid() } as i64))
        }
    }

    /// Write hooks normalize assigned values
    pub mod write_hooks {
        use super::*;

        /// Coerce the assigned value to an integer, truncating floats
        pub fn to_int(value: Value, _info: &GlobalVariableInfo) -> Value {
            if value.is_integer() {
                return value;
            }
            if let Some(object) = value.as_object() {
                if let crate::object::ObjectData::Float(f) = object.data() {
                    return Value::integer(*f as i64);
                }
            }
            value
        }
    }
}
