//! Methods and their lookup metadata.

use std::fmt;

use crate::error::Result;
use crate::object::{ObjectRef, Value};

/// Visibility attached to a method at definition time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MethodVisibility {
    #[default]
    Public,
    Private,
    Protected,
}

/// A plain native function implementing a method
pub type NativeFn = fn(ObjectRef, &[Value]) -> Result<Value>;

/// A callable method body
pub enum Method {
    /// A statically known native function
    Native(NativeFn),
    /// A closure, used for generated methods (FFI marshallers)
    Dynamic(Box<dyn Fn(ObjectRef, &[Value]) -> Result<Value>>),
}

impl Method {
    /// Invoke the method on `receiver`
    pub fn call(&self, receiver: ObjectRef, args: &[Value]) -> Result<Value> {
        match self {
            Method::Native(function) => function(receiver, args),
            Method::Dynamic(function) => function(receiver, args),
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Native(_) => write!(f, "Method::Native"),
            Method::Dynamic(_) => write!(f, "Method::Dynamic"),
        }
    }
}

/// A method table entry: the method plus its visibility
#[derive(Debug)]
pub struct MethodInfo {
    visibility: MethodVisibility,
    method: Method,
}

impl MethodInfo {
    pub fn new(visibility: MethodVisibility, method: Method) -> Self {
        Self { visibility, method }
    }

    pub fn public(method: Method) -> Self {
        Self::new(MethodVisibility::Public, method)
    }

    pub fn visibility(&self) -> MethodVisibility {
        self.visibility
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn call(&self, receiver: ObjectRef, args: &[Value]) -> Result<Value> {
        self.method.call(receiver, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_default() {
        assert_eq!(MethodVisibility::default(), MethodVisibility::Public);
    }
}
