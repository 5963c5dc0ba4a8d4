mod assert;
pub mod collection;
pub mod culture;
pub mod message;
pub mod string;

pub use assert::Assert;
pub use collection::CollectionAssert;
pub use culture::{Culture, StringComparison};
pub use message::{build_user_message, replace_null_chars, FormatError};
pub use string::StringAssert;

use crate::value::Value;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// The details of a failed (or inconclusive) assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertFailure {
    pub assertion: Cow<'static, str>,
    pub detail: Option<String>,
    pub user_message: Option<String>,
}

impl AssertFailure {
    pub fn new(assertion: impl Into<Cow<'static, str>>) -> Self {
        Self {
            assertion: assertion.into(),
            detail: None,
            user_message: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn append_user_message(&mut self, message: String) {
        if message.is_empty() {
            return;
        }
        self.user_message = Some(match self.user_message.take() {
            Some(existing) => format!("{} {}", existing, message),
            None => message,
        });
    }
}

impl fmt::Display for AssertFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed.", self.assertion)?;
        if let Some(detail) = self.detail.as_deref().filter(|d| !d.is_empty()) {
            write!(f, " {}", detail)?;
        }
        if let Some(message) = self.user_message.as_deref() {
            write!(f, " {}", message)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertError {
    #[error("{0}")]
    Failed(AssertFailure),
    #[error("{0}")]
    Inconclusive(AssertFailure),
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl AssertError {
    pub fn failure(&self) -> Option<&AssertFailure> {
        match self {
            AssertError::Failed(failure) | AssertError::Inconclusive(failure) => Some(failure),
            AssertError::Format(_) => None,
        }
    }
}

pub type AssertResult<T = ()> = Result<T, AssertError>;

/// Builds an `AssertError::Failed` for the named assertion.
pub fn throw_assert_failed(assertion: impl Into<Cow<'static, str>>, detail: impl Into<String>) -> AssertError {
    AssertError::Failed(AssertFailure::new(assertion).with_detail(detail))
}

pub(crate) fn check(
    condition: bool,
    assertion: &'static str,
    detail: impl FnOnce() -> String,
) -> AssertResult {
    if condition {
        Ok(())
    } else {
        Err(throw_assert_failed(assertion, detail()))
    }
}

/// Attaches a user message to a failed assertion. Passing assertions are
/// returned untouched and their messages are never formatted.
pub trait AssertResultExt<T> {
    fn with_message(self, message: impl Into<String>) -> AssertResult<T>;

    fn with_formatted_message(self, template: &str, args: &[Value]) -> AssertResult<T>;
}

impl<T> AssertResultExt<T> for AssertResult<T> {
    fn with_message(self, message: impl Into<String>) -> AssertResult<T> {
        self.map_err(|err| attach(err, message.into()))
    }

    fn with_formatted_message(self, template: &str, args: &[Value]) -> AssertResult<T> {
        match self {
            Ok(value) => Ok(value),
            Err(AssertError::Format(err)) => Err(AssertError::Format(err)),
            Err(err) => {
                let message = build_user_message(template, args)?;
                Err(attach(err, message))
            }
        }
    }
}

fn attach(err: AssertError, message: String) -> AssertError {
    match err {
        AssertError::Failed(mut failure) => {
            failure.append_user_message(replace_null_chars(&message).into_owned());
            AssertError::Failed(failure)
        }
        AssertError::Inconclusive(mut failure) => {
            failure.append_user_message(replace_null_chars(&message).into_owned());
            AssertError::Inconclusive(failure)
        }
        other => other,
    }
}
