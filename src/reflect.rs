//! An explicit registry of types and their static/instance members.
//!
//! Data sources and naming hooks are looked up by name at discovery time, so
//! test suites register the members they expose here instead of relying on
//! run-time reflection.

use crate::exception::Exception;
use crate::value::{Value, ValueType};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Identity of a test method as seen by formatters and naming hooks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TestMethodInfo {
    pub declaring_type: String,
    pub name: String,
}

impl TestMethodInfo {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
        }
    }

    /// `Type.Method`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_type, self.name)
    }
}

impl fmt::Display for TestMethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Property,
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Property => f.write_str("property"),
            MemberKind::Method => f.write_str("method"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// The consuming test method's identity.
    MethodInfo,
    /// The argument tuple of one invocation.
    Arguments,
    Value(ValueType),
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::MethodInfo => f.write_str("&TestMethodInfo"),
            ParamType::Arguments => f.write_str("&[Value]"),
            ParamType::Value(ty) => write!(f, "{}", ty),
        }
    }
}

/// Parameter list and return type of a member. A `None` return is `()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<ParamType>,
    pub returns: Option<ValueType>,
}

impl Signature {
    pub fn new(params: Vec<ParamType>, returns: Option<ValueType>) -> Self {
        Self { params, returns }
    }

    pub fn getter() -> Self {
        Self::new(Vec::new(), Some(ValueType::Object))
    }

    pub fn naming_hook() -> Self {
        Self::new(
            vec![ParamType::MethodInfo, ParamType::Arguments],
            Some(ValueType::String),
        )
    }
}

/// One argument passed to a member invocation.
#[derive(Debug, Clone, Copy)]
pub enum Argument<'a> {
    Method(&'a TestMethodInfo),
    Arguments(&'a [Value]),
    Value(&'a Value),
}

impl Argument<'_> {
    fn fits(&self, param: &ParamType) -> bool {
        match (self, param) {
            (Argument::Method(_), ParamType::MethodInfo) => true,
            (Argument::Arguments(_), ParamType::Arguments) => true,
            (Argument::Value(value), ParamType::Value(ty)) => value
                .value_type()
                .map_or(true, |actual| ty.is_assignable_from(actual)),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    #[error("{member} takes {expected} argument(s) but {received} were supplied")]
    ArgumentCount {
        member: String,
        expected: usize,
        received: usize,
    },
    #[error("argument {index} of {member} does not match parameter type {expected}")]
    ArgumentType {
        member: String,
        index: usize,
        expected: String,
    },
}

pub type Invoker = Arc<dyn Fn(&[Argument<'_>]) -> Result<Value, Exception> + Send + Sync>;

#[derive(Clone)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    pub is_static: bool,
    pub visibility: Visibility,
    pub signature: Signature,
    invoker: Invoker,
}

impl Member {
    /// A public static property.
    pub fn property<F>(name: impl Into<String>, getter: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: MemberKind::Property,
            is_static: true,
            visibility: Visibility::Public,
            signature: Signature::getter(),
            invoker: Arc::new(move |_| Ok(getter())),
        }
    }

    /// A public static parameterless method producing data.
    pub fn data_method<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::method(name, Signature::getter(), move |_| Ok(f()))
    }

    /// A public static method with the display-name hook signature.
    pub fn naming_hook<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&TestMethodInfo, &[Value]) -> String + Send + Sync + 'static,
    {
        Self::method(name, Signature::naming_hook(), move |args| match args {
            [Argument::Method(method), Argument::Arguments(data)] => Ok(Value::Str(f(method, data))),
            _ => Err(InvocationError::ArgumentType {
                member: "naming hook".to_string(),
                index: 0,
                expected: ParamType::MethodInfo.to_string(),
            }
            .into()),
        })
    }

    /// A public static method with an arbitrary signature.
    pub fn method<F>(name: impl Into<String>, signature: Signature, f: F) -> Self
    where
        F: Fn(&[Argument<'_>]) -> Result<Value, Exception> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: MemberKind::Method,
            is_static: true,
            visibility: Visibility::Public,
            signature,
            invoker: Arc::new(f),
        }
    }

    pub fn instance(mut self) -> Self {
        self.is_static = false;
        self
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Checks the arguments against the signature, then calls the member.
    pub fn invoke(&self, args: &[Argument<'_>]) -> Result<Value, Exception> {
        if args.len() != self.signature.params.len() {
            return Err(InvocationError::ArgumentCount {
                member: self.name.clone(),
                expected: self.signature.params.len(),
                received: args.len(),
            }
            .into());
        }
        if let Some((index, param)) = args
            .iter()
            .zip(&self.signature.params)
            .enumerate()
            .find_map(|(i, (arg, param))| (!arg.fits(param)).then_some((i, param)))
        {
            return Err(InvocationError::ArgumentType {
                member: self.name.clone(),
                index,
                expected: param.to_string(),
            }
            .into());
        }
        (self.invoker)(args)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("is_static", &self.is_static)
            .field("visibility", &self.visibility)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub name: String,
    members: Vec<Member>,
}

impl TypeInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// All members with this name and kind, regardless of binding.
    pub fn find_all(&self, name: &str, kind: MemberKind) -> Vec<&Member> {
        self.members
            .iter()
            .filter(|m| m.name == name && m.kind == kind)
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeInfo>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type, replacing any earlier one with the same name.
    pub fn register(&mut self, ty: TypeInfo) -> &mut Self {
        self.types.insert(ty.name.clone(), ty);
        self
    }

    pub fn with_type(mut self, ty: TypeInfo) -> Self {
        self.register(ty);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values;

    fn registry() -> TypeRegistry {
        TypeRegistry::new().with_type(
            TypeInfo::new("Planets")
                .with(Member::property("Inner", || Value::from(vec!["mercury", "venus"])))
                .with(Member::data_method("Outer", || Value::from(vec!["neptune"])))
                .with(Member::data_method("Outer", || Value::Null).instance())
                .with(Member::naming_hook("Name", |method, data| {
                    format!("{} x{}", method.name, data.len())
                })),
        )
    }

    #[test]
    fn test_find_all_filters_by_kind() {
        let registry = registry();
        let planets = registry.get("Planets").unwrap();
        assert_eq!(planets.find_all("Inner", MemberKind::Property).len(), 1);
        assert!(planets.find_all("Inner", MemberKind::Method).is_empty());
        assert_eq!(planets.find_all("Outer", MemberKind::Method).len(), 2);
    }

    #[test]
    fn test_invoke_property() {
        let registry = registry();
        let inner = registry.get("Planets").unwrap().find_all("Inner", MemberKind::Property)[0];
        let value = inner.invoke(&[]).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_invoke_naming_hook() {
        let registry = registry();
        let hook = registry.get("Planets").unwrap().find_all("Name", MemberKind::Method)[0];
        let method = TestMethodInfo::new("Planets", "Orbit");
        let data = values![1, 2];
        let name = hook
            .invoke(&[Argument::Method(&method), Argument::Arguments(&data)])
            .unwrap();
        assert_eq!(name.as_str(), Some("Orbit x2"));
    }

    #[test]
    fn test_invoke_checks_arguments() {
        let registry = registry();
        let hook = registry.get("Planets").unwrap().find_all("Name", MemberKind::Method)[0];
        let err = hook.invoke(&[]).unwrap_err();
        assert!(err.is::<InvocationError>());

        let value = Value::from(1);
        let err = hook
            .invoke(&[Argument::Value(&value), Argument::Value(&value)])
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<InvocationError>(),
            Some(&InvocationError::ArgumentType {
                member: "Name".to_string(),
                index: 0,
                expected: "&TestMethodInfo".to_string(),
            })
        );
    }

    #[test]
    fn test_modifiers() {
        let member = Member::data_method("M", || Value::Null).instance().private();
        assert!(!member.is_static);
        assert!(!member.is_public());
    }

    #[test]
    fn test_qualified_name() {
        let method = TestMethodInfo::new("DummyTestClass", "TestMethod1");
        assert_eq!(method.qualified_name(), "DummyTestClass.TestMethod1");
        assert_eq!(method.to_string(), "DummyTestClass.TestMethod1");
    }
}
