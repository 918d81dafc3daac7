//! Runtime bootstrap: the core class graph and the well-known singleton
//! objects.
//!
//! The graph is deliberately cyclic: `Class` is an instance of itself,
//! `Object` is the canonical root of the superclass chain
//! (`Class < Module < Object`), and every class is an object with a class
//! pointer. [`init`] builds the graph once, registers every core cell as a
//! GC root, and is idempotent; [`shutdown`] unpins everything again for
//! tests that want to observe a clean sweep.

use beryl_util::Symbol;
use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::heap;
use crate::marker::roots;
use crate::object::{ClassInfo, Object, ObjectData, ObjectRef, ObjectType, Value};

/// Handles to the bootstrapped core objects
#[derive(Clone, Copy, Debug)]
pub struct CoreObjects {
    pub object_class: ObjectRef,
    pub module_class: ObjectRef,
    pub class_class: ObjectRef,
    pub nil_class: ObjectRef,
    pub true_class: ObjectRef,
    pub false_class: ObjectRef,
    pub integer_class: ObjectRef,
    pub float_class: ObjectRef,
    pub string_class: ObjectRef,
    pub symbol_class: ObjectRef,
    pub array_class: ObjectRef,
    pub hash_class: ObjectRef,
    pub range_class: ObjectRef,
    pub exception_class: ObjectRef,
    pub void_ptr_class: ObjectRef,
    pub nil: ObjectRef,
    pub true_obj: ObjectRef,
    pub false_obj: ObjectRef,
    pub main_object: ObjectRef,
}

// ObjectRef is a NonNull; the runtime contract is single-threaded access.
unsafe impl Send for CoreObjects {}

lazy_static! {
    static ref CORE: Mutex<Option<CoreObjects>> = Mutex::new(None);
}

/// Build the core class graph (idempotent)
pub fn init() {
    let mut core = CORE.lock();
    if core.is_some() {
        return;
    }

    // collection stays off until the graph is consistent and rooted
    let was_enabled = heap::gc_enabled();
    heap::gc_disable();

    let mut class_class = alloc_class("Class", None);
    let mut module_class = alloc_class("Module", None);
    let mut object_class = alloc_class("Object", None);

    // tie the knot: Class is its own class, Class < Module < Object, and
    // Object is its own grand-ancestor through that cycle
    let class_class_ref = class_class;
    class_class.set_class(class_class_ref);
    module_class.set_class(class_class_ref);
    object_class.set_class(class_class_ref);
    set_superclass(&mut class_class, module_class);
    set_superclass(&mut module_class, object_class);

    let nil_class = alloc_subclass("NilClass", class_class, object_class);
    let true_class = alloc_subclass("TrueClass", class_class, object_class);
    let false_class = alloc_subclass("FalseClass", class_class, object_class);
    let integer_class = alloc_subclass("Integer", class_class, object_class);
    let float_class = alloc_subclass("Float", class_class, object_class);
    let string_class = alloc_subclass("String", class_class, object_class);
    let symbol_class = alloc_subclass("Symbol", class_class, object_class);
    let array_class = alloc_subclass("Array", class_class, object_class);
    let hash_class = alloc_subclass("Hash", class_class, object_class);
    let range_class = alloc_subclass("Range", class_class, object_class);
    let exception_class = alloc_subclass("Exception", class_class, object_class);
    let void_ptr_class = alloc_subclass("VoidP", class_class, object_class);

    let mut nil = heap::allocate_object(Object::new(ObjectType::Nil, Some(nil_class)));
    nil.freeze();
    let mut true_obj = heap::allocate_object(Object::new(ObjectType::True, Some(true_class)));
    true_obj.freeze();
    let mut false_obj = heap::allocate_object(Object::new(ObjectType::False, Some(false_class)));
    false_obj.freeze();
    let main_object = heap::allocate_object(Object::new(ObjectType::Object, Some(object_class)));

    let objects = CoreObjects {
        object_class,
        module_class,
        class_class,
        nil_class,
        true_class,
        false_class,
        integer_class,
        float_class,
        string_class,
        symbol_class,
        array_class,
        hash_class,
        range_class,
        exception_class,
        void_ptr_class,
        nil,
        true_obj,
        false_obj,
        main_object,
    };

    for object in [
        object_class,
        module_class,
        class_class,
        nil_class,
        true_class,
        false_class,
        integer_class,
        float_class,
        string_class,
        symbol_class,
        array_class,
        hash_class,
        range_class,
        exception_class,
        void_ptr_class,
        nil,
        true_obj,
        false_obj,
        main_object,
    ] {
        roots::register_root(Value::object(object));
    }

    *core = Some(objects);
    if was_enabled {
        heap::gc_enable();
    }
}

/// The core handles; panics when [`init`] has not run
pub fn core() -> CoreObjects {
    CORE.lock().expect("runtime::init() has not been called")
}

/// Has [`init`] run?
pub fn initialized() -> bool {
    CORE.lock().is_some()
}

/// Unpin the core graph and forget it (test teardown)
///
/// The objects become ordinary garbage; the next collection reclaims
/// whatever nothing else reaches.
pub fn shutdown() {
    let mut core = CORE.lock();
    if let Some(objects) = core.take() {
        for object in [
            objects.object_class,
            objects.module_class,
            objects.class_class,
            objects.nil_class,
            objects.true_class,
            objects.false_class,
            objects.integer_class,
            objects.float_class,
            objects.string_class,
            objects.symbol_class,
            objects.array_class,
            objects.hash_class,
            objects.range_class,
            objects.exception_class,
            objects.void_ptr_class,
            objects.nil,
            objects.true_obj,
            objects.false_obj,
            objects.main_object,
        ] {
            roots::unregister_root(Value::object(object));
        }
    }
}

// ----------------------------------------------------------------------------
// Constructors for common values
// ----------------------------------------------------------------------------

/// The `nil` value
pub fn nil_value() -> Value {
    Value::object(core().nil)
}

/// A boolean value
pub fn bool_value(value: bool) -> Value {
    if value {
        Value::object(core().true_obj)
    } else {
        Value::object(core().false_obj)
    }
}

/// Allocate a runtime string
pub fn new_string(value: impl Into<String>) -> ObjectRef {
    heap::allocate_object(Object::with_data(
        ObjectType::String,
        Some(core().string_class),
        ObjectData::String(value.into()),
    ))
}

/// Allocate a runtime symbol object wrapping an interned symbol
pub fn new_symbol(name: &str) -> ObjectRef {
    heap::allocate_object(Object::with_data(
        ObjectType::Symbol,
        Some(core().symbol_class),
        ObjectData::Symbol(Symbol::intern(name)),
    ))
}

/// Allocate a runtime float
pub fn new_float(value: f64) -> ObjectRef {
    heap::allocate_object(Object::with_data(
        ObjectType::Float,
        Some(core().float_class),
        ObjectData::Float(value),
    ))
}

/// Allocate a runtime array
pub fn new_array(values: Vec<Value>) -> ObjectRef {
    heap::allocate_object(Object::with_data(
        ObjectType::Array,
        Some(core().array_class),
        ObjectData::Array(values),
    ))
}

/// Allocate an opaque native-pointer wrapper
pub fn new_void_ptr(addr: usize) -> ObjectRef {
    heap::allocate_object(Object::with_data(
        ObjectType::VoidP,
        Some(core().void_ptr_class),
        ObjectData::VoidPtr(addr),
    ))
}

/// Allocate a plain class object under `superclass`
pub fn new_class(name: impl Into<String>, superclass: ObjectRef) -> ObjectRef {
    let mut info = ClassInfo::named(name);
    info.superclass = Some(superclass);
    heap::allocate_object(Object::with_data(
        ObjectType::Class,
        Some(core().class_class),
        ObjectData::Class(Box::new(info)),
    ))
}

/// The singleton class of `object`, created on demand
pub fn singleton_class_for(mut object: ObjectRef) -> ObjectRef {
    if let Some(singleton) = object.singleton_class() {
        return singleton;
    }
    let mut info = ClassInfo::default();
    info.superclass = object.class();
    let singleton = heap::allocate_object(Object::with_data(
        ObjectType::Class,
        Some(core().class_class),
        ObjectData::Class(Box::new(info)),
    ));
    object.set_singleton_class(singleton);
    singleton
}

// ----------------------------------------------------------------------------
// Bootstrap helpers
// ----------------------------------------------------------------------------

fn alloc_class(name: &str, superclass: Option<ObjectRef>) -> ObjectRef {
    let mut info = ClassInfo::named(name);
    info.superclass = superclass;
    heap::allocate_object(Object::with_data(
        ObjectType::Class,
        None,
        ObjectData::Class(Box::new(info)),
    ))
}

fn alloc_subclass(name: &str, class_class: ObjectRef, superclass: ObjectRef) -> ObjectRef {
    let mut info = ClassInfo::named(name);
    info.superclass = Some(superclass);
    heap::allocate_object(Object::with_data(
        ObjectType::Class,
        Some(class_class),
        ObjectData::Class(Box::new(info)),
    ))
}

fn set_superclass(class: &mut ObjectRef, superclass: ObjectRef) {
    if let Some(info) = class.class_info_mut() {
        info.superclass = Some(superclass);
    }
}
