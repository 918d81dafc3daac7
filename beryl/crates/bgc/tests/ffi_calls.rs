//! End-to-end native calls through the attach_function surface.

#![cfg(unix)]

mod common;

use beryl_util::Symbol;
use bgc::ffi::{Library, NativeType};
use bgc::object::Value;
use bgc::{heap, runtime, Object};
use common::heap_lock;

#[test]
fn attach_getpid_as_a_singleton_method() {
    let _guard = heap_lock();
    common::init_runtime();
    heap::gc_disable();

    let core = runtime::core();
    let wrapper = runtime::new_class("LibSelf", core.object_class);

    let library = Library::open_self().expect("the process handle always opens");
    library
        .attach_function(wrapper, "getpid", "getpid", vec![], NativeType::Int)
        .expect("getpid resolves in the process image");

    let result = Object::send(wrapper, Symbol::intern("getpid"), &[]).unwrap();
    assert!(result.is_integer());
    assert_eq!(result.as_integer(), std::process::id() as i64);
    heap::gc_enable();
}

#[test]
fn attach_abs_marshals_arguments() {
    let _guard = heap_lock();
    common::init_runtime();
    heap::gc_disable();

    let core = runtime::core();
    let wrapper = runtime::new_class("LibSelfAbs", core.object_class);

    let library = Library::open_self().unwrap();
    library
        .attach_function(wrapper, "abs", "abs", vec![NativeType::Int], NativeType::Int)
        .expect("abs resolves in the process image");

    let result = Object::send(wrapper, Symbol::intern("abs"), &[Value::integer(-42)]).unwrap();
    assert_eq!(result.as_integer(), 42);
    heap::gc_enable();
}

#[test]
fn arity_and_type_errors_surface() {
    let _guard = heap_lock();
    common::init_runtime();
    heap::gc_disable();

    let core = runtime::core();
    let wrapper = runtime::new_class("LibSelfErrs", core.object_class);

    let library = Library::open_self().unwrap();
    library
        .attach_function(
            wrapper,
            "abs_checked",
            "abs",
            vec![NativeType::Int],
            NativeType::Int,
        )
        .unwrap();

    // wrong arity
    let err = Object::send(wrapper, Symbol::intern("abs_checked"), &[]).unwrap_err();
    assert!(err.to_string().contains("number of arguments"));

    // wrong type: a string object where an int is expected
    let string_value = Value::object(runtime::new_string("nope"));
    let err =
        Object::send(wrapper, Symbol::intern("abs_checked"), &[string_value]).unwrap_err();
    assert!(err.to_string().contains("argument 0"), "got: {}", err);
    heap::gc_enable();
}

#[test]
fn missing_library_reports_reason() {
    let err = Library::open("definitely_not_a_real_library_xyz").unwrap_err();
    let message = err.to_string();
    assert!(
        message.contains("libdefinitely_not_a_real_library_xyz"),
        "prefix/suffix applied: {}",
        message
    );
}
