pub mod assertions;
pub mod console;
pub mod data;
pub mod discovery;
pub mod exception;
pub mod helpers;
pub mod reflect;
pub mod requests;
pub mod runner;
pub mod value;

pub use assertions::{
    Assert, AssertError, AssertFailure, AssertResult, AssertResultExt, CollectionAssert, Culture,
    StringAssert, StringComparison,
};
pub use console::{run_console, run_console_with, ConsoleOptions};
pub use data::{DataRow, DataSourceError, DynamicData, TestDataSource};
pub use discovery::{discover, TestCase, TestMethod, TestSuite};
pub use exception::{flatten_exception, Exception, ExpectedException};
pub use helpers::GenericParameterHelper;
pub use reflect::{Member, MemberKind, TestMethodInfo, TypeInfo, TypeRegistry};
pub use requests::{ConsoleTestExecutionRequestFactory, TestExecutionRequest};
pub use runner::{execute_request, OutputFormat, RunnerOptions};
pub use value::{ArgumentTuple, Value, ValueType};
