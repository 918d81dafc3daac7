//! Native-library loading and function attachment.
//!
//! [`Library::open`] resolves a library name - applying the `lib` prefix
//! and the platform suffix when missing - and wraps the opaque handle.
//! [`Library::attach_function`] looks up a symbol, prepares a call
//! signature over [`NativeType`], and installs a singleton method on the
//! wrapping class object that marshals arguments from runtime values to
//! native values and the return value back.
//!
//! Without a libffi binding, callable signatures are a fixed thunk set:
//! up to six integer-class arguments (bool, chars, ints, longs, size_t,
//! pointer, string, enum) with an integer-class or void return, or up to
//! three all-double arguments returning double. Anything else is rejected
//! at attach time.

use std::ffi::{CStr, CString};
use std::mem;
use std::os::raw::c_void;
use std::ptr;

use beryl_util::Symbol;

use crate::error::{BgcError, Result};
use crate::object::{Method, MethodVisibility, ObjectData, ObjectRef, ObjectType, Value};
use crate::runtime;

/// Native types understood by the marshaller
#[derive(Clone, Debug, PartialEq)]
pub enum NativeType {
    Bool,
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    SizeT,
    Double,
    Pointer,
    String,
    Void,
    /// A user-defined enum mapping symbol names to integer values
    Enum(Vec<(std::string::String, i64)>),
}

impl NativeType {
    fn is_integer_class(&self) -> bool {
        !matches!(self, NativeType::Double | NativeType::Void)
    }

    fn display(&self) -> &'static str {
        match self {
            NativeType::Bool => "bool",
            NativeType::Char => "char",
            NativeType::UChar => "uchar",
            NativeType::Short => "short",
            NativeType::UShort => "ushort",
            NativeType::Int => "int",
            NativeType::UInt => "uint",
            NativeType::Long => "long",
            NativeType::ULong => "ulong",
            NativeType::LongLong => "long_long",
            NativeType::ULongLong => "ulong_long",
            NativeType::SizeT => "size_t",
            NativeType::Double => "double",
            NativeType::Pointer => "pointer",
            NativeType::String => "string",
            NativeType::Void => "void",
            NativeType::Enum(_) => "enum",
        }
    }
}

/// Maximum integer-class arity the thunk set covers
const MAX_INT_ARGS: usize = 6;
/// Maximum all-double arity the thunk set covers
const MAX_DOUBLE_ARGS: usize = 3;

/// An opened native library
#[derive(Debug)]
pub struct Library {
    handle: *mut c_void,
    name: std::string::String,
}

impl Library {
    /// Open a library by name
    ///
    /// A bare name gets the `lib` prefix and the platform suffix applied
    /// when missing: `open("m")` tries `libm.so` (or `libm.dylib`).
    pub fn open(name: &str) -> Result<Library> {
        let candidate = normalize_library_name(name);
        let cname = CString::new(candidate.clone()).map_err(|_| BgcError::LibraryNotFound {
            name: name.to_string(),
            reason: "name contains a NUL byte".to_string(),
        })?;
        // Safety: dlopen with a valid C string.
        let handle = unsafe { libc::dlopen(cname.as_ptr(), libc::RTLD_LAZY) };
        if handle.is_null() {
            return Err(BgcError::LibraryNotFound {
                name: candidate,
                reason: dlerror_string(),
            });
        }
        Ok(Library {
            handle,
            name: candidate,
        })
    }

    /// Open the running process itself (symbols of the main program and
    /// everything it links)
    pub fn open_self() -> Result<Library> {
        // Safety: dlopen(NULL) yields the global handle.
        let handle = unsafe { libc::dlopen(ptr::null(), libc::RTLD_LAZY) };
        if handle.is_null() {
            return Err(BgcError::LibraryNotFound {
                name: "<self>".to_string(),
                reason: dlerror_string(),
            });
        }
        Ok(Library {
            handle,
            name: "<self>".to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve a symbol to its address
    pub fn symbol(&self, name: &str) -> Result<usize> {
        let cname = CString::new(name).map_err(|_| BgcError::SymbolNotFound(name.to_string()))?;
        // Safety: dlsym with a live handle and valid C string.
        let address = unsafe { libc::dlsym(self.handle, cname.as_ptr()) };
        if address.is_null() {
            return Err(BgcError::SymbolNotFound(name.to_string()));
        }
        Ok(address as usize)
    }

    /// Attach `symbol_name` as a singleton method `method_name` on `class`
    ///
    /// The installed method marshals its runtime arguments to native
    /// values, calls through the prepared signature, and marshals the
    /// return value back.
    pub fn attach_function(
        &self,
        class: ObjectRef,
        method_name: &str,
        symbol_name: &str,
        arg_types: Vec<NativeType>,
        return_type: NativeType,
    ) -> Result<()> {
        let signature = Signature::prepare(arg_types, return_type)?;
        let address = self.symbol(symbol_name)?;

        let marshaller = move |_receiver: ObjectRef, args: &[Value]| -> Result<Value> {
            signature.call(address, args)
        };

        let mut singleton = runtime::singleton_class_for(class);
        singleton.define_method(
            Symbol::intern(method_name),
            Method::Dynamic(Box::new(marshaller)),
            MethodVisibility::Public,
        )
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        // Safety: the handle came from dlopen and is closed exactly once.
        unsafe {
            libc::dlclose(self.handle);
        }
    }
}

/// Apply `lib` prefix and platform suffix when missing
fn normalize_library_name(name: &str) -> std::string::String {
    if name.contains('/') || name.contains(platform_suffix()) {
        return name.to_string();
    }
    let mut result = std::string::String::new();
    if !name.starts_with("lib") {
        result.push_str("lib");
    }
    result.push_str(name);
    result.push_str(platform_suffix());
    result
}

fn platform_suffix() -> &'static str {
    if cfg!(target_os = "macos") {
        ".dylib"
    } else {
        ".so"
    }
}

fn dlerror_string() -> std::string::String {
    // Safety: dlerror returns a static buffer or null.
    let message = unsafe { libc::dlerror() };
    if message.is_null() {
        "unknown error".to_string()
    } else {
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    }
}

/// A validated call signature
#[derive(Debug)]
struct Signature {
    arg_types: Vec<NativeType>,
    return_type: NativeType,
    all_double: bool,
}

impl Signature {
    /// Validate a signature against the supported thunk set
    fn prepare(arg_types: Vec<NativeType>, return_type: NativeType) -> Result<Signature> {
        let has_double_arg = arg_types.iter().any(|t| *t == NativeType::Double);
        if has_double_arg || return_type == NativeType::Double {
            let all_double = arg_types.iter().all(|t| *t == NativeType::Double);
            if !all_double || return_type != NativeType::Double {
                return Err(BgcError::UnsupportedSignature(
                    "double arguments require an all-double signature".to_string(),
                ));
            }
            if arg_types.len() > MAX_DOUBLE_ARGS {
                return Err(BgcError::UnsupportedSignature(format!(
                    "at most {} double arguments are supported",
                    MAX_DOUBLE_ARGS
                )));
            }
            return Ok(Signature {
                arg_types,
                return_type,
                all_double: true,
            });
        }

        if arg_types.len() > MAX_INT_ARGS {
            return Err(BgcError::UnsupportedSignature(format!(
                "at most {} arguments are supported",
                MAX_INT_ARGS
            )));
        }
        if let Some(bad) = arg_types.iter().find(|t| !t.is_integer_class()) {
            return Err(BgcError::UnsupportedSignature(format!(
                "unsupported argument type {}",
                bad.display()
            )));
        }
        Ok(Signature {
            arg_types,
            return_type,
            all_double: false,
        })
    }

    fn call(&self, address: usize, args: &[Value]) -> Result<Value> {
        if args.len() != self.arg_types.len() {
            return Err(BgcError::FfiArityError {
                expected: self.arg_types.len(),
                provided: args.len(),
            });
        }
        if self.all_double {
            let mut slots = [0f64; MAX_DOUBLE_ARGS];
            for (index, (value, ty)) in args.iter().zip(&self.arg_types).enumerate() {
                slots[index] = to_double(*value, ty, index)?;
            }
            let result = call_double(address, &slots[..args.len()]);
            return Ok(Value::object(runtime::new_float(result)));
        }

        // keep marshalled C strings alive across the call
        let mut strings: Vec<CString> = Vec::new();
        let mut slots = [0usize; MAX_INT_ARGS];
        for (index, (value, ty)) in args.iter().zip(&self.arg_types).enumerate() {
            slots[index] = to_slot(*value, ty, index, &mut strings)?;
        }
        let result = call_integer(address, &slots[..args.len()]);
        // convert before `strings` drops: the callee may have returned a
        // pointer into one of the marshalled buffers
        let value = from_slot(result, &self.return_type);
        drop(strings);
        value
    }
}

/// Marshal one integer-class argument
fn to_slot(
    value: Value,
    native_type: &NativeType,
    index: usize,
    strings: &mut Vec<CString>,
) -> Result<usize> {
    let type_error = |provided: &str| BgcError::FfiTypeError {
        index,
        expected: native_type.display().to_string(),
        provided: provided.to_string(),
    };

    match native_type {
        NativeType::Bool => match value.as_object() {
            None => Ok((value.as_integer() != 0) as usize),
            Some(object) => match object.object_type() {
                ObjectType::True => Ok(1),
                ObjectType::False => Ok(0),
                _ => Err(type_error("object")),
            },
        },
        NativeType::Char
        | NativeType::UChar
        | NativeType::Short
        | NativeType::UShort
        | NativeType::Int
        | NativeType::UInt
        | NativeType::Long
        | NativeType::ULong
        | NativeType::LongLong
        | NativeType::ULongLong
        | NativeType::SizeT => {
            if !value.is_integer() {
                return Err(type_error("object"));
            }
            Ok(value.as_integer() as usize)
        },
        NativeType::Pointer => match value.as_object() {
            None => Ok(value.as_integer() as usize),
            Some(object) => match object.data() {
                ObjectData::VoidPtr(addr) => Ok(*addr),
                _ if object.object_type() == ObjectType::Nil => Ok(0),
                _ => Err(type_error("object")),
            },
        },
        NativeType::String => match value.as_object() {
            Some(object) => match object.data() {
                ObjectData::String(s) => {
                    let cstring =
                        CString::new(s.as_str()).map_err(|_| type_error("string with NUL"))?;
                    strings.push(cstring);
                    Ok(strings
                        .last()
                        .expect("just pushed")
                        .as_ptr() as usize)
                },
                _ => Err(type_error("object")),
            },
            None => Err(type_error("integer")),
        },
        NativeType::Enum(mapping) => match value.as_object() {
            Some(object) => match object.data() {
                ObjectData::Symbol(symbol) => {
                    let name = symbol.as_str();
                    mapping
                        .iter()
                        .find(|(key, _)| key == name)
                        .map(|(_, v)| *v as usize)
                        .ok_or_else(|| BgcError::InvalidEnumValue(name.to_string()))
                },
                _ => Err(type_error("object")),
            },
            None => Ok(value.as_integer() as usize),
        },
        NativeType::Double | NativeType::Void => Err(type_error("unsupported")),
    }
}

/// Marshal one double argument
fn to_double(value: Value, native_type: &NativeType, index: usize) -> Result<f64> {
    if value.is_integer() {
        return Ok(value.as_integer() as f64);
    }
    if let Some(object) = value.as_object() {
        if let ObjectData::Float(f) = object.data() {
            return Ok(*f);
        }
    }
    Err(BgcError::FfiTypeError {
        index,
        expected: native_type.display().to_string(),
        provided: "object".to_string(),
    })
}

/// Marshal the return slot back to a runtime value
fn from_slot(slot: usize, return_type: &NativeType) -> Result<Value> {
    let value = match return_type {
        NativeType::Void => runtime::nil_value(),
        NativeType::Bool => runtime::bool_value(slot != 0),
        NativeType::Char => Value::integer(slot as u8 as i8 as i64),
        NativeType::UChar => Value::integer(slot as u8 as i64),
        NativeType::Short => Value::integer(slot as u16 as i16 as i64),
        NativeType::UShort => Value::integer(slot as u16 as i64),
        NativeType::Int => Value::integer(slot as u32 as i32 as i64),
        NativeType::UInt => Value::integer(slot as u32 as i64),
        NativeType::Long
        | NativeType::LongLong => Value::integer(slot as i64),
        NativeType::ULong | NativeType::ULongLong | NativeType::SizeT => {
            Value::integer(slot as i64)
        },
        NativeType::Pointer => {
            if slot == 0 {
                runtime::nil_value()
            } else {
                Value::object(runtime::new_void_ptr(slot))
            }
        },
        NativeType::String => {
            if slot == 0 {
                runtime::nil_value()
            } else {
                // Safety: the callee returned a NUL-terminated string.
                let s = unsafe { CStr::from_ptr(slot as *const libc::c_char) };
                Value::object(runtime::new_string(s.to_string_lossy().into_owned()))
            }
        },
        NativeType::Enum(_) => Value::integer(slot as i64),
        NativeType::Double => {
            return Err(BgcError::UnsupportedSignature(
                "double return outside an all-double signature".to_string(),
            ))
        },
    };
    Ok(value)
}

/// Call through an integer-class thunk of the given arity
fn call_integer(address: usize, slots: &[usize]) -> usize {
    // Safety: the signature was validated at attach time; the transmutes
    // select the extern "C" type matching the arity.
    unsafe {
        match *slots {
            [] => mem::transmute::<usize, unsafe extern "C" fn() -> usize>(address)(),
            [a] => mem::transmute::<usize, unsafe extern "C" fn(usize) -> usize>(address)(a),
            [a, b] => {
                mem::transmute::<usize, unsafe extern "C" fn(usize, usize) -> usize>(address)(a, b)
            },
            [a, b, c] => mem::transmute::<usize, unsafe extern "C" fn(usize, usize, usize) -> usize>(
                address,
            )(a, b, c),
            [a, b, c, d] => mem::transmute::<
                usize,
                unsafe extern "C" fn(usize, usize, usize, usize) -> usize,
            >(address)(a, b, c, d),
            [a, b, c, d, e] => mem::transmute::<
                usize,
                unsafe extern "C" fn(usize, usize, usize, usize, usize) -> usize,
            >(address)(a, b, c, d, e),
            [a, b, c, d, e, f] => mem::transmute::<
                usize,
                unsafe extern "C" fn(usize, usize, usize, usize, usize, usize) -> usize,
            >(address)(a, b, c, d, e, f),
            _ => unreachable!("arity validated at attach time"),
        }
    }
}

/// Call through an all-double thunk of the given arity
fn call_double(address: usize, slots: &[f64]) -> f64 {
    // Safety: as above; doubles use their own register class, hence the
    // separate thunk set.
    unsafe {
        match *slots {
            [] => mem::transmute::<usize, unsafe extern "C" fn() -> f64>(address)(),
            [a] => mem::transmute::<usize, unsafe extern "C" fn(f64) -> f64>(address)(a),
            [a, b] => mem::transmute::<usize, unsafe extern "C" fn(f64, f64) -> f64>(address)(a, b),
            [a, b, c] => {
                mem::transmute::<usize, unsafe extern "C" fn(f64, f64, f64) -> f64>(address)(a, b, c)
            },
            _ => unreachable!("arity validated at attach time"),
        }
    }
}
