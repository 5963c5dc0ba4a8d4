use crate::assertions::AssertError;
use crate::discovery::{discover, TestBody, TestCase, TestMethod, TestSuite};
use crate::exception::{flatten_exception, Exception, ExceptionChain, ExpectedExceptionError};
use crate::requests::TestExecutionRequest;
use crate::runner::reporter::{
    DefaultReporter, DiscoveryOutput, OutputFormat, Reporter, Status, Summary, TestResult,
    TestRunOutput,
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::oneshot;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    pub verbose: bool,
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone)]
pub enum SessionOutput {
    Discovered(DiscoveryOutput),
    Ran(TestRunOutput),
}

impl SessionOutput {
    pub fn has_failures(&self) -> bool {
        match self {
            SessionOutput::Discovered(output) => !output.errors.is_empty(),
            SessionOutput::Ran(output) => output.has_failures(),
        }
    }

    pub fn has_discovery_errors(&self) -> bool {
        match self {
            SessionOutput::Discovered(output) => !output.errors.is_empty(),
            SessionOutput::Ran(output) => output.summary.discovery_errors > 0,
        }
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Discovers the suite under the request's filter, then lists or runs the
/// selected cases.
pub async fn execute_request(
    suite: &TestSuite,
    request: &TestExecutionRequest,
    options: &RunnerOptions,
) -> SessionOutput {
    let reporter = DefaultReporter::new(options.verbose, options.output_format);
    let session_id = request.session().session_id.clone();
    let discovery = discover(suite, request.filter());

    let errors: Vec<String> = discovery.errors.iter().map(ToString::to_string).collect();
    for error in &errors {
        reporter.on_discovery_error(error);
    }

    if request.is_discovery() {
        return SessionOutput::Discovered(DiscoveryOutput {
            session_id,
            tests: discovery.cases,
            errors,
        });
    }

    if discovery.cases.is_empty() && errors.is_empty() {
        reporter.on_warning("No tests matched the filter");
    }

    let start_time = Instant::now();
    let start_epoch = epoch_millis();
    let mut results = Vec::with_capacity(discovery.cases.len());

    for case in &discovery.cases {
        let method = &suite.methods()[case.method_index];
        let result = run_case(method, case).await;
        reporter.on_result(&result);
        results.push(result);
    }

    let summary = Summary::from_results(
        &results,
        errors.len(),
        start_time.elapsed().as_millis() as u64,
        start_epoch,
        epoch_millis(),
    );
    info!(
        "Session {} finished: {} passed, {} failed, {} skipped, {} inconclusive",
        session_id, summary.passed, summary.failed, summary.skipped, summary.other
    );

    SessionOutput::Ran(TestRunOutput {
        session_id,
        tests: results,
        errors,
        summary,
    })
}

/// Runs one case to completion on the runtime and classifies its outcome.
pub async fn run_case(method: &TestMethod, case: &TestCase) -> TestResult {
    let mut result = TestResult {
        name: case.display_name.clone(),
        method: case.method.qualified_name(),
        status: Status::Passed,
        duration_ms: 0,
        message: None,
        trace: None,
    };

    if let Some(reason) = method.ignore_reason() {
        debug!("Skipping {}: {}", case.display_name, reason);
        result.status = Status::Skipped;
        result.message = Some(reason.to_string());
        return result;
    }

    debug!("Running {}", case.display_name);
    let start = Instant::now();
    let joined = run_body(case, method.body().clone(), method.timeout()).await;
    result.duration_ms = start.elapsed().as_millis() as u64;

    let outcome = match joined {
        Finished::Completed(outcome) => outcome,
        Finished::Panicked(message) => {
            warn!("{} panicked: {}", case.display_name, message);
            result.status = Status::Failed;
            result.message = Some(format!(
                "Test method {} panicked: {}",
                case.method.qualified_name(),
                message
            ));
            return result;
        }
        Finished::TimedOut(limit) => {
            result.status = Status::Failed;
            result.message = Some(format!(
                "Test '{}' exceeded execution timeout period of {}ms.",
                case.display_name,
                limit.as_millis()
            ));
            return result;
        }
    };

    let outcome = match method.expected_exception() {
        Some(expected) => expected.verify(&case.method, outcome),
        None => outcome,
    };

    if let Err(exception) = outcome {
        classify_failure(&mut result, case, exception);
    }
    result
}

enum Finished {
    Completed(Result<(), Exception>),
    Panicked(String),
    TimedOut(Duration),
}

/// Async bodies are aborted on timeout. Sync bodies with a timeout run on a
/// dedicated thread that is detached when the limit passes, since blocking
/// code cannot be interrupted.
async fn run_body(case: &TestCase, body: TestBody, timeout: Option<Duration>) -> Finished {
    let args = case.arguments.clone();
    match (body, timeout) {
        (TestBody::Sync(body), Some(limit)) => {
            let (tx, rx) = oneshot::channel();
            let spawned = std::thread::Builder::new()
                .name(format!("attest-{}", case.method.name))
                .spawn(move || {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&args)));
                    let _ = tx.send(outcome.map_err(panic_message));
                });
            if let Err(e) = spawned {
                return Finished::Completed(Err(Exception::from(e)));
            }
            match tokio::time::timeout(limit, rx).await {
                Ok(Ok(Ok(outcome))) => Finished::Completed(outcome),
                Ok(Ok(Err(message))) => Finished::Panicked(message),
                Ok(Err(_)) => Finished::Panicked("test thread exited without a result".to_string()),
                Err(_) => {
                    warn!(
                        "{} timed out after {:?}; its thread cannot be stopped and is left running detached",
                        case.display_name, limit
                    );
                    Finished::TimedOut(limit)
                }
            }
        }
        (TestBody::Sync(body), None) => {
            joined(tokio::task::spawn_blocking(move || body(&args)).await)
        }
        (TestBody::Async(body), Some(limit)) => {
            let handle = tokio::spawn(body(args));
            let abort = handle.abort_handle();
            match tokio::time::timeout(limit, handle).await {
                Ok(result) => joined(result),
                Err(_) => {
                    abort.abort();
                    warn!("{} timed out after {:?}", case.display_name, limit);
                    Finished::TimedOut(limit)
                }
            }
        }
        (TestBody::Async(body), None) => joined(tokio::spawn(body(args)).await),
    }
}

fn joined(result: Result<Result<(), Exception>, JoinError>) -> Finished {
    match result {
        Ok(outcome) => Finished::Completed(outcome),
        Err(err) => Finished::Panicked(join_error_message(err)),
    }
}

fn classify_failure(result: &mut TestResult, case: &TestCase, exception: Exception) {
    if let Some(err) = exception.downcast_ref::<AssertError>() {
        result.status = match err {
            AssertError::Inconclusive(_) => Status::Other,
            AssertError::Failed(_) | AssertError::Format(_) => Status::Failed,
        };
        result.message = Some(err.to_string());
        return;
    }

    result.status = Status::Failed;
    if exception.is::<ExpectedExceptionError>() {
        result.message = Some(exception.message());
        return;
    }

    result.message = Some(format!(
        "Test method {} threw exception: {}",
        case.method.qualified_name(),
        flatten_exception(&exception)
    ));
    let chain = ExceptionChain::capture(&exception);
    if chain.links().len() > 1 {
        result.trace = Some(
            chain
                .links()
                .iter()
                .map(|link| format!("{}: {}", link.type_name, link.message))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
}

fn join_error_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    panic_message(err.into_panic())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
