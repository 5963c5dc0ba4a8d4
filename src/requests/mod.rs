mod filter;

pub use filter::{ConsoleFilterFactory, TestExecutionFilter, TestExecutionFilterFactory};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

/// Option key that switches a session from running tests to listing them.
pub const DISCOVER_TESTS_OPTION_KEY: &str = "list-tests";

/// Read access to the parsed command line.
pub trait CommandLineOptions {
    fn is_option_set(&self, key: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSessionContext {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
}

impl TestSessionContext {
    pub fn new() -> Self {
        let started_at = Utc::now();
        Self {
            session_id: format!(
                "{}-{}",
                std::process::id(),
                started_at.timestamp_millis()
            ),
            started_at,
        }
    }
}

impl Default for TestSessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct DiscoverRequest {
    pub session: TestSessionContext,
    pub filter: TestExecutionFilter,
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub session: TestSessionContext,
    pub filter: TestExecutionFilter,
}

#[derive(Debug, Clone)]
pub enum TestExecutionRequest {
    Discover(DiscoverRequest),
    Run(RunRequest),
}

impl TestExecutionRequest {
    pub fn session(&self) -> &TestSessionContext {
        match self {
            TestExecutionRequest::Discover(request) => &request.session,
            TestExecutionRequest::Run(request) => &request.session,
        }
    }

    pub fn filter(&self) -> &TestExecutionFilter {
        match self {
            TestExecutionRequest::Discover(request) => &request.filter,
            TestExecutionRequest::Run(request) => &request.filter,
        }
    }

    pub fn is_discovery(&self) -> bool {
        matches!(self, TestExecutionRequest::Discover(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Unable to create test execution filter")]
    FilterCreationFailed,
}

/// Decides whether a console session discovers or runs tests.
pub struct ConsoleTestExecutionRequestFactory<'a> {
    options: &'a dyn CommandLineOptions,
    filter_factory: &'a dyn TestExecutionFilterFactory,
}

impl<'a> ConsoleTestExecutionRequestFactory<'a> {
    pub fn new(
        options: &'a dyn CommandLineOptions,
        filter_factory: &'a dyn TestExecutionFilterFactory,
    ) -> Self {
        Self {
            options,
            filter_factory,
        }
    }

    /// The filter is built first; failing to build one is an error even when
    /// only discovery was requested.
    pub fn create_request(
        &self,
        session: TestSessionContext,
    ) -> Result<TestExecutionRequest, RequestError> {
        let filter = self
            .filter_factory
            .try_create()
            .ok_or(RequestError::FilterCreationFailed)?;

        let request = if self.options.is_option_set(DISCOVER_TESTS_OPTION_KEY) {
            TestExecutionRequest::Discover(DiscoverRequest { session, filter })
        } else {
            TestExecutionRequest::Run(RunRequest { session, filter })
        };
        debug!(
            "Session {} classified as {}",
            request.session().session_id,
            if request.is_discovery() { "discovery" } else { "run" }
        );
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashSet;

    struct Flags(HashSet<&'static str>);

    impl CommandLineOptions for Flags {
        fn is_option_set(&self, key: &str) -> bool {
            self.0.contains(key)
        }
    }

    struct FixedFilter(Option<TestExecutionFilter>);

    impl TestExecutionFilterFactory for FixedFilter {
        fn try_create(&self) -> Option<TestExecutionFilter> {
            self.0.clone()
        }
    }

    fn flags(keys: &[&'static str]) -> Flags {
        Flags(keys.iter().copied().collect())
    }

    #[test]
    fn test_discover_flag_creates_discover_request() {
        let options = flags(&[DISCOVER_TESTS_OPTION_KEY]);
        let filters = FixedFilter(Some(TestExecutionFilter::All));
        let factory = ConsoleTestExecutionRequestFactory::new(&options, &filters);
        let session = TestSessionContext::new();

        let request = factory.create_request(session.clone()).unwrap();
        assert_matches!(request, TestExecutionRequest::Discover(_));
        assert_eq!(request.session(), &session);
        assert_matches!(request.filter(), TestExecutionFilter::All);
    }

    #[test]
    fn test_no_flag_creates_run_request() {
        let options = flags(&["verbose"]);
        let filters = FixedFilter(Some(TestExecutionFilter::Exact("Orbit".to_string())));
        let factory = ConsoleTestExecutionRequestFactory::new(&options, &filters);

        let request = factory.create_request(TestSessionContext::new()).unwrap();
        assert_matches!(
            request,
            TestExecutionRequest::Run(RunRequest { filter: TestExecutionFilter::Exact(ref name), .. }) if name == "Orbit"
        );
    }

    #[test]
    fn test_filter_failure_is_an_error_regardless_of_mode() {
        let filters = FixedFilter(None);
        for options in [flags(&[]), flags(&[DISCOVER_TESTS_OPTION_KEY])] {
            let factory = ConsoleTestExecutionRequestFactory::new(&options, &filters);
            let err = factory.create_request(TestSessionContext::new()).unwrap_err();
            assert_eq!(err, RequestError::FilterCreationFailed);
            assert_eq!(err.to_string(), "Unable to create test execution filter");
        }
    }

    #[test]
    fn test_console_filter_factory_feeds_request() {
        let options = flags(&[]);
        let filters = ConsoleFilterFactory::new(Some("/^Orb/".to_string()));
        let factory = ConsoleTestExecutionRequestFactory::new(&options, &filters);
        let request = factory.create_request(TestSessionContext::new()).unwrap();
        assert!(request.filter().matches("Orbit"));
    }
}
