use crate::data::{DataRow, DataSourceError, DynamicData, TestDataSource};
use crate::exception::{Exception, ExpectedException};
use crate::reflect::{TestMethodInfo, TypeRegistry};
use crate::requests::TestExecutionFilter;
use crate::value::{ArgumentTuple, Value};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub type SyncBody = Arc<dyn Fn(&[Value]) -> Result<(), Exception> + Send + Sync>;
pub type AsyncBody =
    Arc<dyn Fn(ArgumentTuple) -> BoxFuture<'static, Result<(), Exception>> + Send + Sync>;

#[derive(Clone)]
pub enum TestBody {
    Sync(SyncBody),
    Async(AsyncBody),
}

/// A test method and everything attached to it: data sources, an expected
/// error, a timeout, or a reason to skip it.
#[derive(Clone)]
pub struct TestMethod {
    info: TestMethodInfo,
    body: TestBody,
    sources: Vec<Arc<dyn TestDataSource>>,
    expected_exception: Option<ExpectedException>,
    timeout: Option<Duration>,
    ignore_reason: Option<String>,
}

impl TestMethod {
    pub fn new<F>(declaring_type: impl Into<String>, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<(), Exception> + Send + Sync + 'static,
    {
        Self::with_body(
            TestMethodInfo::new(declaring_type, name),
            TestBody::Sync(Arc::new(body)),
        )
    }

    pub fn new_async<F, Fut>(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        body: F,
    ) -> Self
    where
        F: Fn(ArgumentTuple) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Exception>> + Send + 'static,
    {
        Self::with_body(
            TestMethodInfo::new(declaring_type, name),
            TestBody::Async(Arc::new(move |args| body(args).boxed())),
        )
    }

    fn with_body(info: TestMethodInfo, body: TestBody) -> Self {
        Self {
            info,
            body,
            sources: Vec::new(),
            expected_exception: None,
            timeout: None,
            ignore_reason: None,
        }
    }

    pub fn with_data(mut self, source: impl TestDataSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    pub fn data_row(self, row: DataRow) -> Self {
        self.with_data(row)
    }

    pub fn dynamic_data(self, source: DynamicData) -> Self {
        self.with_data(source)
    }

    pub fn expect_exception(mut self, expected: ExpectedException) -> Self {
        self.expected_exception = Some(expected);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn ignored(mut self, reason: impl Into<String>) -> Self {
        self.ignore_reason = Some(reason.into());
        self
    }

    pub fn info(&self) -> &TestMethodInfo {
        &self.info
    }

    pub fn body(&self) -> &TestBody {
        &self.body
    }

    pub fn expected_exception(&self) -> Option<&ExpectedException> {
        self.expected_exception.as_ref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn ignore_reason(&self) -> Option<&str> {
        self.ignore_reason.as_deref()
    }

    fn expand(&self, registry: &TypeRegistry) -> Result<Vec<(String, ArgumentTuple)>, DataSourceError> {
        if self.sources.is_empty() {
            return Ok(vec![(self.info.name.clone(), Vec::new())]);
        }

        let mut cases = Vec::new();
        for source in &self.sources {
            for tuple in source.get_data(registry, &self.info)? {
                let name = source
                    .get_display_name(registry, &self.info, Some(&tuple))?
                    .unwrap_or_else(|| self.info.name.clone());
                cases.push((name, tuple));
            }
        }
        Ok(cases)
    }
}

/// The registry that data sources resolve against plus the test methods.
#[derive(Clone, Default)]
pub struct TestSuite {
    registry: TypeRegistry,
    methods: Vec<TestMethod>,
}

impl TestSuite {
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: TestMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn add(&mut self, method: TestMethod) -> &mut Self {
        self.methods.push(method);
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn methods(&self) -> &[TestMethod] {
        &self.methods
    }
}

/// One invocation of a test method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    pub method: TestMethodInfo,
    pub display_name: String,
    pub arguments: ArgumentTuple,
    #[serde(skip)]
    pub method_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to discover test data for {method}: {source}")]
pub struct DiscoveryError {
    pub method: TestMethodInfo,
    #[source]
    pub source: DataSourceError,
}

#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub cases: Vec<TestCase>,
    pub errors: Vec<DiscoveryError>,
}

impl Discovery {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Expands every method into its test cases and keeps those the filter
/// selects. A method whose data cannot be produced contributes an error and
/// no cases.
pub fn discover(suite: &TestSuite, filter: &TestExecutionFilter) -> Discovery {
    let mut discovery = Discovery::default();

    for (method_index, method) in suite.methods().iter().enumerate() {
        let info = method.info();
        match method.expand(suite.registry()) {
            Ok(cases) => {
                let before = discovery.cases.len();
                discovery.cases.extend(
                    cases
                        .into_iter()
                        .filter(|(name, _)| filter.matches_case(info, name))
                        .map(|(display_name, arguments)| TestCase {
                            method: info.clone(),
                            display_name,
                            arguments,
                            method_index,
                        }),
                );
                debug!(
                    "Discovered {} case(s) for {}",
                    discovery.cases.len() - before,
                    info
                );
            }
            Err(source) => {
                if filter.matches_case(info, &info.name) {
                    discovery.errors.push(DiscoveryError {
                        method: info.clone(),
                        source,
                    });
                } else {
                    debug!("Skipping unselected method {} with invalid data: {}", info, source);
                }
            }
        }
    }

    info!(
        "Discovery found {} test case(s) and {} error(s)",
        discovery.cases.len(),
        discovery.errors.len()
    );
    discovery
}
