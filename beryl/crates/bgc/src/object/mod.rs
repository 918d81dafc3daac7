//! The runtime object model.
//!
//! Every heap cell is an [`Object`]: a mark flag, a type tag, a class
//! pointer, an optional singleton class, a frozen flag, an
//! instance-variable table keyed by interned symbols, and a payload for
//! the types that carry native data (arrays, strings, classes, ...).
//!
//! Class-ness is payload, not a separate cell shape: a class is an object
//! whose data is a [`ClassInfo`] (superclass, method table, included
//! modules). That collapses the original deep `Cell` hierarchy into one
//! tagged form with a single child-visiting function, and it keeps the
//! cyclic core of the model (`Object`'s class is `Class`, whose class is
//! itself) representable without special cases - the mark-sweep collector
//! handles the cycles.

mod method_info;
mod value;

pub use method_info::{Method, MethodInfo, MethodVisibility, NativeFn};
pub use value::{ObjectRef, Value};

use std::cell::Cell as StdCell;

use beryl_util::Symbol;

use crate::cell::Cell;
use crate::error::{BgcError, Result};
use crate::hashmap::Hashmap;
use crate::marker::MarkingVisitor;

/// The closed set of runtime type tags
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectType {
    Nil,
    Array,
    Binding,
    Class,
    Encoding,
    Exception,
    False,
    Fiber,
    Float,
    Hash,
    Integer,
    Io,
    MatchData,
    Method,
    Module,
    Object,
    Proc,
    Range,
    Random,
    Regexp,
    String,
    Symbol,
    True,
    UnboundMethod,
    VoidP,
}

/// Native payload carried by some object types
#[derive(Debug, Default)]
pub enum ObjectData {
    #[default]
    None,
    Array(Vec<Value>),
    Float(f64),
    String(String),
    Symbol(Symbol),
    Exception {
        message: String,
    },
    Range {
        first: Value,
        last: Value,
        exclude_end: bool,
    },
    Class(Box<ClassInfo>),
    /// An opaque native pointer owned elsewhere
    VoidPtr(usize),
}

/// The class-shaped payload: method table plus ancestry
#[derive(Debug, Default)]
pub struct ClassInfo {
    pub name: Option<String>,
    pub superclass: Option<ObjectRef>,
    pub methods: Hashmap<Symbol, MethodInfo>,
    pub included_modules: Vec<ObjectRef>,
}

impl ClassInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// One garbage-collected runtime object
#[derive(Debug)]
pub struct Object {
    /// GC mark flag; interior-mutable so marking works through shared refs
    marked: StdCell<bool>,
    frozen: bool,
    object_type: ObjectType,
    klass: Option<ObjectRef>,
    singleton_class: Option<ObjectRef>,
    ivars: Hashmap<Symbol, Value>,
    data: ObjectData,
}

impl Object {
    /// Create an object of the given type and class
    pub fn new(object_type: ObjectType, klass: Option<ObjectRef>) -> Self {
        Self {
            marked: StdCell::new(false),
            frozen: false,
            object_type,
            klass,
            singleton_class: None,
            ivars: Hashmap::new(),
            data: ObjectData::None,
        }
    }

    /// Create an object with a native payload
    pub fn with_data(object_type: ObjectType, klass: Option<ObjectRef>, data: ObjectData) -> Self {
        let mut object = Self::new(object_type, klass);
        object.data = data;
        object
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn class(&self) -> Option<ObjectRef> {
        self.klass
    }

    pub fn set_class(&mut self, klass: ObjectRef) {
        self.klass = Some(klass);
    }

    pub fn singleton_class(&self) -> Option<ObjectRef> {
        self.singleton_class
    }

    pub fn set_singleton_class(&mut self, singleton: ObjectRef) {
        self.singleton_class = Some(singleton);
    }

    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ObjectData {
        &mut self.data
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    // ------------------------------------------------------------------
    // Instance variables
    // ------------------------------------------------------------------

    /// Read an instance variable
    ///
    /// Symbols are interned, so symbol identity is the key discipline.
    pub fn ivar_get(&self, name: Symbol) -> Option<Value> {
        self.ivars.get(name).copied()
    }

    /// Write an instance variable
    pub fn ivar_set(&mut self, name: Symbol, value: Value) -> Result<()> {
        if self.frozen {
            return Err(BgcError::FrozenError);
        }
        self.ivars.put(name, value);
        Ok(())
    }

    /// Number of instance variables
    pub fn ivar_count(&self) -> usize {
        self.ivars.size()
    }

    // ------------------------------------------------------------------
    // Classes and method lookup
    // ------------------------------------------------------------------

    /// The class payload, when this object is a class or module
    pub fn class_info(&self) -> Option<&ClassInfo> {
        match &self.data {
            ObjectData::Class(info) => Some(info),
            _ => None,
        }
    }

    pub fn class_info_mut(&mut self) -> Option<&mut ClassInfo> {
        match &mut self.data {
            ObjectData::Class(info) => Some(info),
            _ => None,
        }
    }

    /// Define a method on this class/module
    pub fn define_method(
        &mut self,
        name: Symbol,
        method: Method,
        visibility: MethodVisibility,
    ) -> Result<()> {
        if self.frozen {
            return Err(BgcError::FrozenError);
        }
        match self.class_info_mut() {
            Some(info) => {
                info.methods.put(name, MethodInfo::new(visibility, method));
                Ok(())
            },
            None => Err(BgcError::NoMethodError(format!(
                "cannot define method '{}' on a non-class",
                name
            ))),
        }
    }

    /// Append a module to this class's ancestry
    pub fn include_module(&mut self, module: ObjectRef) -> Result<()> {
        match self.class_info_mut() {
            Some(info) => {
                info.included_modules.push(module);
                Ok(())
            },
            None => Err(BgcError::NoMethodError(
                "cannot include a module into a non-class".to_string(),
            )),
        }
    }

    /// Resolve `name` for this receiver
    ///
    /// The walk goes singleton class first (with its modules and chain),
    /// then the regular class chain; each class consults its own table,
    /// then its included modules (most recently included first), then its
    /// superclass. The result carries the owning class and the visibility.
    pub fn find_method(&self, name: Symbol) -> Option<MethodHandle> {
        if let Some(singleton) = self.singleton_class {
            if let Some(handle) = chain_lookup(singleton, name) {
                return Some(handle);
            }
        }
        chain_lookup(self.klass?, name)
    }

    /// Find and invoke `name` on this receiver
    pub fn send(receiver: ObjectRef, name: Symbol, args: &[Value]) -> Result<Value> {
        match receiver.find_method(name) {
            Some(handle) => handle.call(receiver, args),
            None => Err(BgcError::NoMethodError(name.to_string())),
        }
    }
}

impl Cell for Object {
    /// Enumerate every heap-owned field exactly once
    fn visit_children(&self, visitor: &mut MarkingVisitor) {
        if let Some(klass) = self.klass {
            visitor.visit_object(klass);
        }
        if let Some(singleton) = self.singleton_class {
            visitor.visit_object(singleton);
        }
        for (_, value) in self.ivars.iter() {
            visitor.visit(*value);
        }
        match &self.data {
            ObjectData::Array(values) => {
                for value in values {
                    visitor.visit(*value);
                }
            },
            ObjectData::Range { first, last, .. } => {
                visitor.visit(*first);
                visitor.visit(*last);
            },
            ObjectData::Class(info) => {
                if let Some(superclass) = info.superclass {
                    visitor.visit_object(superclass);
                }
                for module in &info.included_modules {
                    visitor.visit_object(*module);
                }
            },
            ObjectData::None
            | ObjectData::Float(_)
            | ObjectData::String(_)
            | ObjectData::Symbol(_)
            | ObjectData::Exception { .. }
            | ObjectData::VoidPtr(_) => {},
        }
    }

    fn is_visited(&self) -> bool {
        self.marked.get()
    }

    fn mark(&self) {
        self.marked.set(true);
    }

    fn clear_mark(&self) {
        self.marked.set(false);
    }
}

/// A resolved method: who owns it, what it is called, how visible it is
#[derive(Clone, Copy, Debug)]
pub struct MethodHandle {
    owner: ObjectRef,
    name: Symbol,
    visibility: MethodVisibility,
}

impl MethodHandle {
    pub fn owner(&self) -> ObjectRef {
        self.owner
    }

    pub fn visibility(&self) -> MethodVisibility {
        self.visibility
    }

    /// Invoke the resolved method
    pub fn call(&self, receiver: ObjectRef, args: &[Value]) -> Result<Value> {
        let owner = self.owner;
        let info = owner
            .class_info()
            .and_then(|info| info.methods.get(self.name))
            .ok_or_else(|| BgcError::NoMethodError(self.name.to_string()))?;
        info.call(receiver, args)
    }
}

/// Walk one class chain: own table, included modules, superclass
fn chain_lookup(start: ObjectRef, name: Symbol) -> Option<MethodHandle> {
    let mut current = Some(start);
    while let Some(class) = current {
        let info = class.class_info()?;
        if let Some(method_info) = info.methods.get(name) {
            return Some(MethodHandle {
                owner: class,
                name,
                visibility: method_info.visibility(),
            });
        }
        for module in info.included_modules.iter().rev() {
            if let Some(method_info) = module.class_info().and_then(|m| m.methods.get(name)) {
                return Some(MethodHandle {
                    owner: *module,
                    name,
                    visibility: method_info.visibility(),
                });
            }
        }
        current = info.superclass;
    }
    None
}
