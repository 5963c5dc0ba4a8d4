pub mod executor;
pub mod reporter;

pub use executor::{execute_request, run_case, RunnerOptions, SessionOutput};
pub use reporter::{DiscoveryOutput, OutputFormat, OutputFormatter, Status, TestResult, TestRunOutput};
