use crate::reflect::TestMethodInfo;
use regex::Regex;
use tracing::warn;

/// Selects which test cases a session covers.
#[derive(Debug, Clone)]
pub enum TestExecutionFilter {
    All,
    Exact(String),
    Regex(Regex),
}

impl TryFrom<&str> for TestExecutionFilter {
    type Error = String;

    fn try_from(pattern: &str) -> Result<Self, Self::Error> {
        if pattern.starts_with('/') && pattern.ends_with('/') && pattern.len() > 2 {
            let regex_pattern = &pattern[1..pattern.len() - 1];
            Regex::new(regex_pattern)
                .map(TestExecutionFilter::Regex)
                .map_err(|e| format!("Invalid regex pattern: {}", e))
        } else if pattern.is_empty() {
            Err("Filter pattern is empty".to_string())
        } else {
            Ok(TestExecutionFilter::Exact(pattern.to_string()))
        }
    }
}

impl TestExecutionFilter {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            TestExecutionFilter::All => true,
            TestExecutionFilter::Exact(pattern) => name == pattern,
            TestExecutionFilter::Regex(regex) => regex.is_match(name),
        }
    }

    /// A case is selected when its method name, qualified name or display
    /// name matches.
    pub fn matches_case(&self, method: &TestMethodInfo, display_name: &str) -> bool {
        self.matches(&method.name)
            || self.matches(&method.qualified_name())
            || self.matches(display_name)
    }
}

pub trait TestExecutionFilterFactory {
    /// `None` when no filter could be built.
    fn try_create(&self) -> Option<TestExecutionFilter>;
}

/// Builds the filter from the host's `--filter` pattern.
#[derive(Debug, Clone, Default)]
pub struct ConsoleFilterFactory {
    pattern: Option<String>,
}

impl ConsoleFilterFactory {
    pub fn new(pattern: Option<String>) -> Self {
        Self { pattern }
    }
}

impl TestExecutionFilterFactory for ConsoleFilterFactory {
    fn try_create(&self) -> Option<TestExecutionFilter> {
        let Some(pattern) = self.pattern.as_deref() else {
            return Some(TestExecutionFilter::All);
        };
        match TestExecutionFilter::try_from(pattern) {
            Ok(filter) => Some(filter),
            Err(e) => {
                warn!("Invalid test filter {:?}: {}", pattern, e);
                None
            }
        }
    }
}
