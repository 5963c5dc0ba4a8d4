mod data_row;
pub mod display;
mod dynamic_data;

pub use data_row::DataRow;
pub use display::{default_display_name, display_name};
pub use dynamic_data::DynamicData;

use crate::reflect::{MemberKind, TestMethodInfo, TypeRegistry};
use crate::value::{ArgumentTuple, Value};
use thiserror::Error;

/// A provider of argument tuples for a data-driven test method.
pub trait TestDataSource: Send + Sync {
    /// Produces the tuples in source order.
    fn get_data(
        &self,
        registry: &TypeRegistry,
        method: &TestMethodInfo,
    ) -> Result<Vec<ArgumentTuple>, DataSourceError>;

    /// Names one invocation. `None` data yields `None` unless the source
    /// carries an explicit name.
    fn get_display_name(
        &self,
        registry: &TypeRegistry,
        method: &TestMethodInfo,
        data: Option<&[Value]>,
    ) -> Result<Option<String>, DataSourceError>;
}

/// The first rule a display-name hook broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HookViolation {
    #[error("method not found")]
    Missing,
    #[error("method must be static")]
    NotStatic,
    #[error("method must be public")]
    NotPublic,
    #[error("parameters must be (&TestMethodInfo, &[Value])")]
    WrongParameters,
    #[error("return type must be String")]
    WrongReturnType,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataSourceError {
    #[error("Static {kind} '{member}' not found on type '{type_name}'")]
    MemberNotFound {
        type_name: String,
        member: String,
        kind: MemberKind,
    },

    #[error("Static {kind} '{member}' on type '{type_name}' is ambiguous")]
    AmbiguousMember {
        type_name: String,
        member: String,
        kind: MemberKind,
    },

    #[error("Data source '{member}' on type '{type_name}' returned null")]
    NullDataSource { type_name: String, member: String },

    #[error("Data source '{member}' on type '{type_name}' returned no data")]
    EmptyDataSource { type_name: String, member: String },

    #[error("Data source '{member}' on type '{type_name}' must return a sequence of argument arrays, found {found}")]
    WrongDataSourceType {
        type_name: String,
        member: String,
        found: String,
    },

    #[error("Display name hook '{hook}' on type '{type_name}' is invalid: {violation}")]
    InvalidDisplayNameHook {
        hook: String,
        type_name: String,
        violation: HookViolation,
    },

    #[error("Invoking '{member}' failed: {message}")]
    SourceInvocationFailed { member: String, message: String },
}
