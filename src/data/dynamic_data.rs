use crate::data::{default_display_name, DataSourceError, HookViolation, TestDataSource};
use crate::exception::flatten_exception;
use crate::reflect::{Argument, Member, MemberKind, ParamType, TestMethodInfo, TypeRegistry};
use crate::value::{ArgumentTuple, Value, ValueType};
use tracing::debug;

/// Argument tuples produced by a static property or method, resolved by name
/// through the [`TypeRegistry`] when tests are discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicData {
    source_name: String,
    source_kind: MemberKind,
    declaring_type: Option<String>,
    display_name_hook: Option<String>,
    display_name_hook_type: Option<String>,
}

impl DynamicData {
    /// Reads tuples from a static property.
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            source_kind: MemberKind::Property,
            declaring_type: None,
            display_name_hook: None,
            display_name_hook_type: None,
        }
    }

    /// Reads tuples from a static parameterless method.
    pub fn method(source_name: impl Into<String>) -> Self {
        Self {
            source_kind: MemberKind::Method,
            ..Self::new(source_name)
        }
    }

    /// Looks the source up on `type_name` instead of the test's own type.
    pub fn on_type(mut self, type_name: impl Into<String>) -> Self {
        self.declaring_type = Some(type_name.into());
        self
    }

    pub fn with_display_name_hook(mut self, hook: impl Into<String>) -> Self {
        self.display_name_hook = Some(hook.into());
        self
    }

    pub fn with_display_name_hook_type(mut self, type_name: impl Into<String>) -> Self {
        self.display_name_hook_type = Some(type_name.into());
        self
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn source_kind(&self) -> MemberKind {
        self.source_kind
    }

    fn resolve_source<'r>(
        &self,
        registry: &'r TypeRegistry,
        type_name: &str,
    ) -> Result<&'r Member, DataSourceError> {
        let candidates: Vec<&Member> = registry
            .get(type_name)
            .map(|ty| ty.find_all(&self.source_name, self.source_kind))
            .unwrap_or_default()
            .into_iter()
            .filter(|member| member.is_static)
            .collect();

        match candidates.as_slice() {
            [member] => Ok(*member),
            [] => Err(DataSourceError::MemberNotFound {
                type_name: type_name.to_string(),
                member: self.source_name.clone(),
                kind: self.source_kind,
            }),
            _ => Err(DataSourceError::AmbiguousMember {
                type_name: type_name.to_string(),
                member: self.source_name.clone(),
                kind: self.source_kind,
            }),
        }
    }

    fn resolve_hook<'r>(
        &self,
        registry: &'r TypeRegistry,
        hook: &str,
        type_name: &str,
    ) -> Result<&'r Member, DataSourceError> {
        let invalid = |violation| DataSourceError::InvalidDisplayNameHook {
            hook: hook.to_string(),
            type_name: type_name.to_string(),
            violation,
        };

        let member = registry
            .get(type_name)
            .and_then(|ty| ty.find_all(hook, MemberKind::Method).into_iter().next())
            .ok_or_else(|| invalid(HookViolation::Missing))?;

        if !member.is_static {
            return Err(invalid(HookViolation::NotStatic));
        }
        if !member.is_public() {
            return Err(invalid(HookViolation::NotPublic));
        }
        if member.signature.params != [ParamType::MethodInfo, ParamType::Arguments] {
            return Err(invalid(HookViolation::WrongParameters));
        }
        if member.signature.returns != Some(ValueType::String) {
            return Err(invalid(HookViolation::WrongReturnType));
        }
        Ok(member)
    }
}

impl TestDataSource for DynamicData {
    fn get_data(
        &self,
        registry: &TypeRegistry,
        method: &TestMethodInfo,
    ) -> Result<Vec<ArgumentTuple>, DataSourceError> {
        let type_name = self
            .declaring_type
            .as_deref()
            .unwrap_or(&method.declaring_type);
        let member = self.resolve_source(registry, type_name)?;

        debug!(
            "Reading {} {}.{} for {}",
            self.source_kind, type_name, self.source_name, method
        );

        let value = member
            .invoke(&[])
            .map_err(|err| DataSourceError::SourceInvocationFailed {
                member: format!("{}.{}", type_name, self.source_name),
                message: flatten_exception(&err),
            })?;

        let wrong_type = |found: String| DataSourceError::WrongDataSourceType {
            type_name: type_name.to_string(),
            member: self.source_name.clone(),
            found,
        };

        let rows = match value {
            Value::Null => {
                return Err(DataSourceError::NullDataSource {
                    type_name: type_name.to_string(),
                    member: self.source_name.clone(),
                })
            }
            Value::Array(rows) => rows,
            other => return Err(wrong_type(other.type_name())),
        };

        if rows.is_empty() {
            return Err(DataSourceError::EmptyDataSource {
                type_name: type_name.to_string(),
                member: self.source_name.clone(),
            });
        }

        let tuples = rows
            .into_iter()
            .map(|row| match row {
                Value::Array(tuple) => Ok(tuple),
                other => Err(wrong_type(format!("an element of type {}", other.type_name()))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("{} yielded {} tuple(s)", self.source_name, tuples.len());
        Ok(tuples)
    }

    fn get_display_name(
        &self,
        registry: &TypeRegistry,
        method: &TestMethodInfo,
        data: Option<&[Value]>,
    ) -> Result<Option<String>, DataSourceError> {
        let Some(data) = data else {
            return Ok(None);
        };

        let Some(hook) = self.display_name_hook.as_deref() else {
            return Ok(Some(default_display_name(&method.name, data)));
        };

        let type_name = self
            .display_name_hook_type
            .as_deref()
            .unwrap_or(&method.declaring_type);
        let member = self.resolve_hook(registry, hook, type_name)?;

        let name = member
            .invoke(&[Argument::Method(method), Argument::Arguments(data)])
            .map_err(|err| DataSourceError::SourceInvocationFailed {
                member: format!("{}.{}", type_name, hook),
                message: flatten_exception(&err),
            })?;

        match name {
            Value::Str(name) => Ok(Some(name)),
            Value::Null => Ok(None),
            other => Err(DataSourceError::SourceInvocationFailed {
                member: format!("{}.{}", type_name, hook),
                message: format!("expected a String, got {}", other.type_name()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::Exception;
    use crate::reflect::{Signature, TypeInfo};
    use crate::values;
    use assert_matches::assert_matches;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("Operation is not valid due to the current state of the object.")]
    struct InvalidOperationError;

    fn reusable_rows() -> Value {
        Value::Array(vec![Value::from(vec![1, 2, 3]), Value::from(vec![4, 5, 6])])
    }

    fn throwing(_: &[Argument<'_>]) -> Result<Value, Exception> {
        Err(InvalidOperationError.into())
    }

    fn custom_name(method: &TestMethodInfo, data: &[Value]) -> String {
        format!(
            "DynamicDataTestWithDisplayName {} with {} parameters",
            method.name,
            data.len()
        )
    }

    fn registry() -> TypeRegistry {
        let dummy = TypeInfo::new("DummyTestClass")
            .with(Member::property("ReusableTestDataProperty", reusable_rows))
            .with(Member::property("NullProperty", || Value::Null))
            .with(Member::property("EmptyProperty", || Value::Array(Vec::new())))
            .with(Member::property("WrongDataTypeProperty", || Value::from("Dummy")))
            .with(Member::property("FlatProperty", || Value::from(vec![1, 2])))
            .with(Member::property("InstanceProperty", reusable_rows).instance())
            .with(Member::data_method("ReusableTestDataMethod", reusable_rows))
            .with(Member::data_method("DuplicateMethod", reusable_rows))
            .with(Member::data_method("DuplicateMethod", reusable_rows))
            .with(Member::method("ThrowingMethod", Signature::getter(), throwing))
            .with(Member::naming_hook("GetCustomDynamicDataDisplayName", custom_name))
            .with(Member::method(
                "GetDynamicDataDisplayNameWithMissingParameters",
                Signature::new(vec![], Some(ValueType::String)),
                throwing,
            ))
            .with(Member::method(
                "GetDynamicDataDisplayNameWithInvalidReturnType",
                Signature::new(vec![ParamType::MethodInfo, ParamType::Arguments], None),
                throwing,
            ))
            .with(Member::method(
                "GetDynamicDataDisplayNameWithInvalidFirstParameterType",
                Signature::new(
                    vec![ParamType::Value(ValueType::String), ParamType::Arguments],
                    Some(ValueType::String),
                ),
                throwing,
            ))
            .with(Member::method(
                "GetDynamicDataDisplayNameWithInvalidSecondParameterType",
                Signature::new(
                    vec![ParamType::MethodInfo, ParamType::Value(ValueType::String)],
                    Some(ValueType::String),
                ),
                throwing,
            ))
            .with(Member::naming_hook("GetDynamicDataDisplayNameNonStatic", custom_name).instance())
            .with(Member::naming_hook("GetDynamicDataDisplayNamePrivate", custom_name).private())
            .with(Member::method(
                "ThrowingHook",
                Signature::naming_hook(),
                throwing,
            ));

        let dummy2 = TypeInfo::new("DummyTestClass2")
            .with(Member::property("ReusableTestDataProperty2", reusable_rows))
            .with(Member::data_method("ReusableTestDataMethod2", reusable_rows))
            .with(Member::naming_hook("GetCustomDynamicDataDisplayName2", custom_name));

        TypeRegistry::new().with_type(dummy).with_type(dummy2)
    }

    fn test_method1() -> TestMethodInfo {
        TestMethodInfo::new("DummyTestClass", "TestMethod1")
    }

    fn expected_rows() -> Vec<ArgumentTuple> {
        vec![values![1, 2, 3], values![4, 5, 6]]
    }

    #[test]
    fn test_get_data_fails_for_missing_property() {
        let source = DynamicData::new("ABC");
        assert_matches!(
            source.get_data(&registry(), &test_method1()),
            Err(DataSourceError::MemberNotFound { kind: MemberKind::Property, .. })
        );
    }

    #[test]
    fn test_get_data_reads_property() {
        let source = DynamicData::new("ReusableTestDataProperty");
        assert_eq!(source.get_data(&registry(), &test_method1()).unwrap(), expected_rows());
    }

    #[test]
    fn test_get_data_reads_property_in_different_type() {
        let source = DynamicData::new("ReusableTestDataProperty2").on_type("DummyTestClass2");
        assert_eq!(source.get_data(&registry(), &test_method1()).unwrap(), expected_rows());
    }

    #[test]
    fn test_get_data_reads_method() {
        let source = DynamicData::method("ReusableTestDataMethod");
        assert_eq!(source.get_data(&registry(), &test_method1()).unwrap(), expected_rows());
    }

    #[test]
    fn test_get_data_reads_method_in_different_type() {
        let source = DynamicData::method("ReusableTestDataMethod2").on_type("DummyTestClass2");
        assert_eq!(source.get_data(&registry(), &test_method1()).unwrap(), expected_rows());
    }

    #[test]
    fn test_kind_must_match() {
        let source = DynamicData::new("ReusableTestDataMethod");
        assert_matches!(
            source.get_data(&registry(), &test_method1()),
            Err(DataSourceError::MemberNotFound { .. })
        );
    }

    #[test]
    fn test_unregistered_type_is_not_found() {
        let source = DynamicData::new("ReusableTestDataProperty").on_type("Nowhere");
        assert_matches!(
            source.get_data(&registry(), &test_method1()),
            Err(DataSourceError::MemberNotFound { type_name, .. }) if type_name == "Nowhere"
        );
    }

    #[test]
    fn test_instance_source_is_ignored() {
        let source = DynamicData::new("InstanceProperty");
        assert_matches!(
            source.get_data(&registry(), &test_method1()),
            Err(DataSourceError::MemberNotFound { .. })
        );
    }

    #[test]
    fn test_ambiguous_source() {
        let source = DynamicData::method("DuplicateMethod");
        assert_matches!(
            source.get_data(&registry(), &test_method1()),
            Err(DataSourceError::AmbiguousMember { .. })
        );
    }

    #[test]
    fn test_get_data_fails_for_null() {
        let source = DynamicData::new("NullProperty").on_type("DummyTestClass");
        assert_matches!(
            source.get_data(&registry(), &test_method1()),
            Err(DataSourceError::NullDataSource { .. })
        );
    }

    #[test]
    fn test_get_data_fails_for_empty() {
        let source = DynamicData::new("EmptyProperty").on_type("DummyTestClass");
        assert_matches!(
            source.get_data(&registry(), &test_method1()),
            Err(DataSourceError::EmptyDataSource { .. })
        );
    }

    #[test]
    fn test_get_data_fails_for_wrong_type() {
        let source = DynamicData::new("WrongDataTypeProperty").on_type("DummyTestClass");
        assert_matches!(
            source.get_data(&registry(), &test_method1()),
            Err(DataSourceError::WrongDataSourceType { found, .. }) if found == "String"
        );
    }

    #[test]
    fn test_get_data_fails_for_non_tuple_elements() {
        let source = DynamicData::new("FlatProperty");
        assert_matches!(
            source.get_data(&registry(), &test_method1()),
            Err(DataSourceError::WrongDataSourceType { .. })
        );
    }

    #[test]
    fn test_get_data_reports_flattened_invocation_error() {
        let source = DynamicData::method("ThrowingMethod");
        let err = source.get_data(&registry(), &test_method1()).unwrap_err();
        assert_matches!(
            err,
            DataSourceError::SourceInvocationFailed { ref message, .. }
                if message.ends_with("InvalidOperationError: Operation is not valid due to the current state of the object.")
        );
    }

    #[test]
    fn test_display_name_default() {
        let source = DynamicData::new("ReusableTestDataProperty");
        let name = source
            .get_display_name(&registry(), &test_method1(), Some(&values![1, 2, 3]))
            .unwrap();
        assert_eq!(name.as_deref(), Some("TestMethod1 (1,2,3)"));
    }

    #[test]
    fn test_display_name_hook() {
        let source = DynamicData::new("ReusableTestDataProperty")
            .with_display_name_hook("GetCustomDynamicDataDisplayName");
        let name = source
            .get_display_name(&registry(), &test_method1(), Some(&values![1, 2, 3]))
            .unwrap();
        assert_eq!(
            name.as_deref(),
            Some("DynamicDataTestWithDisplayName TestMethod1 with 3 parameters")
        );
    }

    #[test]
    fn test_display_name_hook_in_different_type() {
        let source = DynamicData::new("ReusableTestDataProperty")
            .with_display_name_hook("GetCustomDynamicDataDisplayName2")
            .with_display_name_hook_type("DummyTestClass2");
        let name = source
            .get_display_name(&registry(), &test_method1(), Some(&values![1, 2, 3]))
            .unwrap();
        assert_eq!(
            name.as_deref(),
            Some("DynamicDataTestWithDisplayName TestMethod1 with 3 parameters")
        );
    }

    fn hook_violation(hook: &str) -> HookViolation {
        let source = DynamicData::new("ReusableTestDataProperty").with_display_name_hook(hook);
        match source.get_display_name(&registry(), &test_method1(), Some(&values![1, 2, 3])) {
            Err(DataSourceError::InvalidDisplayNameHook { violation, .. }) => violation,
            other => panic!("expected an invalid hook, got {:?}", other),
        }
    }

    #[test]
    fn test_hook_with_missing_parameters() {
        assert_eq!(
            hook_violation("GetDynamicDataDisplayNameWithMissingParameters"),
            HookViolation::WrongParameters
        );
    }

    #[test]
    fn test_hook_with_invalid_return_type() {
        assert_eq!(
            hook_violation("GetDynamicDataDisplayNameWithInvalidReturnType"),
            HookViolation::WrongReturnType
        );
    }

    #[test]
    fn test_hook_with_invalid_first_parameter() {
        assert_eq!(
            hook_violation("GetDynamicDataDisplayNameWithInvalidFirstParameterType"),
            HookViolation::WrongParameters
        );
    }

    #[test]
    fn test_hook_with_invalid_second_parameter() {
        assert_eq!(
            hook_violation("GetDynamicDataDisplayNameWithInvalidSecondParameterType"),
            HookViolation::WrongParameters
        );
    }

    #[test]
    fn test_hook_non_static() {
        assert_eq!(
            hook_violation("GetDynamicDataDisplayNameNonStatic"),
            HookViolation::NotStatic
        );
    }

    #[test]
    fn test_hook_private() {
        assert_eq!(
            hook_violation("GetDynamicDataDisplayNamePrivate"),
            HookViolation::NotPublic
        );
    }

    #[test]
    fn test_hook_missing() {
        assert_eq!(
            hook_violation("MissingCustomDynamicDataDisplayName"),
            HookViolation::Missing
        );
    }

    #[test]
    fn test_hook_invocation_error() {
        let source = DynamicData::new("ReusableTestDataProperty").with_display_name_hook("ThrowingHook");
        assert_matches!(
            source.get_display_name(&registry(), &test_method1(), Some(&values![1])),
            Err(DataSourceError::SourceInvocationFailed { .. })
        );
    }

    #[test]
    fn test_display_name_without_data_is_none() {
        let source = DynamicData::new("ReusableTestDataProperty");
        assert_eq!(
            source.get_display_name(&registry(), &test_method1(), None).unwrap(),
            None
        );
    }

    #[test]
    fn test_display_name_handles_nulls() {
        let source = DynamicData::new("ReusableTestDataProperty");
        let registry = registry();
        let method = test_method1();

        let name = |data: ArgumentTuple| {
            source
                .get_display_name(&registry, &method, Some(&data))
                .unwrap()
                .unwrap()
        };
        assert_eq!(name(values!["value1", "value2", None::<&str>]), "TestMethod1 (value1,value2,)");
        assert_eq!(name(values![None::<&str>, "value1", "value2"]), "TestMethod1 (,value1,value2)");
        assert_eq!(name(values!["value1", None::<&str>, "value2"]), "TestMethod1 (value1,,value2)");
    }
}
