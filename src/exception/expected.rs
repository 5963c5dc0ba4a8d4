use crate::assertions::AssertError;
use crate::exception::{flatten_exception, short_type_name, Exception};
use crate::reflect::TestMethodInfo;
use std::error::Error;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpectedExceptionError {
    #[error("Test method {method} did not throw expected exception {expected}.{}", .message.as_deref().map(|m| format!(" {}", m)).unwrap_or_default())]
    NotThrown {
        method: String,
        expected: String,
        message: Option<String>,
    },

    #[error("Test method {method} threw exception {actual}, but exception {expected} was expected. Exception message: {flattened}")]
    WrongException {
        method: String,
        expected: String,
        actual: String,
        flattened: String,
    },
}

/// Declares that a test passes only when it fails with a given error type.
#[derive(Clone)]
pub struct ExpectedException {
    type_name: &'static str,
    matches: fn(&Exception) -> bool,
    no_exception_message: Option<String>,
}

impl fmt::Debug for ExpectedException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpectedException")
            .field("type_name", &self.type_name)
            .field("no_exception_message", &self.no_exception_message)
            .finish()
    }
}

impl ExpectedException {
    pub fn of<E>() -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            type_name: std::any::type_name::<E>(),
            matches: |exception| exception.is::<E>(),
            no_exception_message: None,
        }
    }

    /// Appended to the failure when the test completes without an error.
    pub fn with_no_exception_message(mut self, message: impl Into<String>) -> Self {
        self.no_exception_message = Some(message.into());
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Maps a test outcome to the outcome under this expectation. Assertion
    /// failures are returned unchanged.
    pub fn verify(
        &self,
        method: &TestMethodInfo,
        outcome: Result<(), Exception>,
    ) -> Result<(), Exception> {
        let expected = short_type_name(self.type_name).to_string();
        let exception = match outcome {
            Ok(()) => {
                return Err(ExpectedExceptionError::NotThrown {
                    method: method.qualified_name(),
                    expected,
                    message: self.no_exception_message.clone(),
                }
                .into())
            }
            Err(exception) => exception,
        };

        if (self.matches)(&exception) {
            return Ok(());
        }
        if exception.is::<AssertError>() {
            return Err(exception);
        }

        Err(ExpectedExceptionError::WrongException {
            method: method.qualified_name(),
            expected,
            actual: exception.short_type_name().to_string(),
            flattened: flatten_exception(&exception),
        }
        .into())
    }
}
