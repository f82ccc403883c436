//! Native members wrapped as leaf terms.
//!
//! A [`NativeMethod`] is exposed as a `Method` leaf when it takes at most one argument and as
//! a `MethodBinder` leaf otherwise. Applying a binder accumulates arguments in an immutable
//! [`PartialApplication`]; once the arity is reached the body runs and its result becomes a
//! constant.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use log::debug;
use smallvec::SmallVec;

use crate::{
    error::{NativeError, TermError, TermResult},
    expr::{Expr, ExprKind, constant, function, pretty::PrettyExpr, pretty::PrettyMode, type_term},
    host::{HostType, Value, builtin},
};

type MethodBody = dyn Fn(&[Value]) -> Result<Value, NativeError> + Send + Sync;
type PropertyGetter = dyn Fn() -> Result<Value, NativeError> + Send + Sync;

/// A native function with declared parameter and result types.
pub struct NativeMethod {
    name: Arc<str>,
    parameters: SmallVec<HostType, 4>,
    result: HostType,
    body: Box<MethodBody>,
}

impl NativeMethod {
    pub fn new(
        name: impl Into<Arc<str>>,
        parameters: &[HostType],
        result: HostType,
        body: impl Fn(&[Value]) -> Result<Value, NativeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.iter().cloned().collect(),
            result,
            body: Box::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[HostType] {
        &self.parameters
    }

    pub fn result(&self) -> &HostType {
        &self.result
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Run the body, wrapping native faults.
    pub fn invoke(&self, arguments: &[Value]) -> TermResult<Value> {
        debug!("Invoking native method '{}' with {} argument(s)", self.name, arguments.len());
        (self.body)(arguments).map_err(|fault| TermError::native(self.name.to_string(), fault))
    }
}

impl fmt::Debug for NativeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeMethod")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

/// Shared handle on a native method. Two handles are equal only when they share the method.
#[derive(Clone, Debug)]
pub struct MethodTerm(Arc<NativeMethod>);

impl MethodTerm {
    pub fn new(method: NativeMethod) -> Self {
        MethodTerm(Arc::new(method))
    }

    pub fn method(&self) -> &NativeMethod {
        &self.0
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn arity(&self) -> usize {
        self.0.arity()
    }

    /// Curried signature after `applied` arguments were supplied.
    ///
    /// A zero-arity method is seen as a function from `unit`.
    pub fn signature(&self, applied: usize) -> Expr {
        let parameters = self.0.parameters();
        let result = type_term(self.0.result().clone());
        if parameters.is_empty() {
            return function(type_term(builtin::UNIT.clone()), result);
        }
        parameters
            .iter()
            .skip(applied)
            .rev()
            .fold(result, |acc, parameter| function(type_term(parameter.clone()), acc))
    }
}

impl PartialEq for MethodTerm {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MethodTerm {}

impl Hash for MethodTerm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

/// A readable native property.
pub struct NativeProperty {
    name: Arc<str>,
    ty: HostType,
    getter: Box<PropertyGetter>,
}

impl NativeProperty {
    pub fn new(
        name: impl Into<Arc<str>>,
        ty: HostType,
        getter: impl Fn() -> Result<Value, NativeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            getter: Box::new(getter),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host_type(&self) -> &HostType {
        &self.ty
    }
}

impl fmt::Debug for NativeProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeProperty")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct PropertyTerm(Arc<NativeProperty>);

impl PropertyTerm {
    pub fn new(property: NativeProperty) -> Self {
        PropertyTerm(Arc::new(property))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn host_type(&self) -> &HostType {
        self.0.host_type()
    }

    pub fn get(&self) -> TermResult<Value> {
        (self.0.getter)().map_err(|fault| TermError::native(self.0.name.to_string(), fault))
    }
}

impl PartialEq for PropertyTerm {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for PropertyTerm {}

impl Hash for PropertyTerm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

/// Arguments supplied so far to a multi-argument method.
///
/// Never mutated: every additional argument produces a new value, so one partial application
/// may be shared by several trees.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PartialApplication {
    method: MethodTerm,
    arguments: SmallVec<Value, 4>,
}

impl PartialApplication {
    pub fn new(method: MethodTerm) -> Self {
        Self {
            method,
            arguments: SmallVec::new(),
        }
    }

    pub fn method(&self) -> &MethodTerm {
        &self.method
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn remaining(&self) -> usize {
        self.method.arity().saturating_sub(self.arguments.len())
    }

    pub fn with_argument(&self, value: Value) -> Self {
        let mut arguments = self.arguments.clone();
        arguments.push(value);
        Self {
            method: self.method.clone(),
            arguments,
        }
    }

    fn call_value(&self, value: Value) -> TermResult<Expr> {
        let next = self.with_argument(value);
        if next.remaining() == 0 {
            next.method.method().invoke(&next.arguments).map(constant)
        } else {
            Ok(Expr::partial(next))
        }
    }
}

/// Capability of leaf terms that can be applied to an argument during reduction.
pub trait Callable {
    /// Apply to an already-reduced argument.
    fn call(&self, argument: &Expr) -> TermResult<Expr>;
}

/// Extract the constant payload, checking it against the expected parameter type.
fn expect_argument(callee: &str, expected: &HostType, argument: &Expr) -> TermResult<Value> {
    let ExprKind::Constant(value) = argument.kind() else {
        return Err(TermError::InvalidArgument {
            callee: callee.to_string(),
            argument: argument.pretty_string(PrettyMode::Minimum),
        });
    };
    let actual = value.host_type();
    if !expected.is_assignable_from(&actual) {
        return Err(TermError::ArgumentType {
            callee: callee.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(value.clone())
}

impl Callable for MethodTerm {
    fn call(&self, argument: &Expr) -> TermResult<Expr> {
        let method = self.method();
        match method.parameters() {
            [] => {
                expect_argument(method.name(), &builtin::UNIT, argument)?;
                method.invoke(&[]).map(constant)
            }
            [parameter] => {
                let value = expect_argument(method.name(), parameter, argument)?;
                method.invoke(&[value]).map(constant)
            }
            [first, ..] => {
                let value = expect_argument(method.name(), first, argument)?;
                PartialApplication::new(self.clone()).call_value(value)
            }
        }
    }
}

impl Callable for PartialApplication {
    fn call(&self, argument: &Expr) -> TermResult<Expr> {
        let method = self.method.method();
        let Some(expected) = method.parameters().get(self.arguments.len()) else {
            return method.invoke(&self.arguments).map(constant);
        };
        let value = expect_argument(method.name(), expected, argument)?;
        self.call_value(value)
    }
}
