mod expected;

pub use expected::{ExpectedException, ExpectedExceptionError};

use std::error::Error;
use std::fmt;

/// An error raised by test code, carrying the Rust type name of the error it
/// was built from and an optional inner exception.
///
/// Every `Error + Send + Sync + 'static` converts into an `Exception`, so test
/// bodies returning `Result<(), Exception>` can use `?` on any error.
pub struct Exception {
    type_name: &'static str,
    error: Box<dyn Error + Send + Sync + 'static>,
    inner: Option<Box<Exception>>,
}

impl Exception {
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            type_name: std::any::type_name::<E>(),
            error: Box::new(error),
            inner: None,
        }
    }

    /// Attaches the exception that caused this one.
    pub fn with_inner(mut self, inner: impl Into<Exception>) -> Self {
        self.inner = Some(Box::new(inner.into()));
        self
    }

    /// Fully qualified type name, e.g. `my_crate::errors::ParseError`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path, e.g. `ParseError`.
    pub fn short_type_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub fn inner(&self) -> Option<&Exception> {
        self.inner.as_deref()
    }

    pub fn is<E>(&self) -> bool
    where
        E: Error + Send + Sync + 'static,
    {
        self.error.is::<E>()
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Error + Send + Sync + 'static,
    {
        self.error.downcast_ref::<E>()
    }

    pub fn downcast<E>(self) -> Result<E, Self>
    where
        E: Error + Send + Sync + 'static,
    {
        let Exception {
            type_name,
            error,
            inner,
        } = self;
        match error.downcast::<E>() {
            Ok(typed) => Ok(*typed),
            Err(error) => Err(Exception {
                type_name,
                error,
                inner,
            }),
        }
    }

    /// Iterates this exception followed by each inner exception.
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            next: Some(self),
        }
    }
}

impl<E> From<E> for Exception
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Exception::new(error)
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exception")
            .field("type_name", &self.type_name)
            .field("message", &self.message())
            .field("inner", &self.inner)
            .finish()
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

pub struct Chain<'a> {
    next: Option<&'a Exception>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Exception;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.inner();
        Some(current)
    }
}

/// Strips the module path (and any generic arguments' paths) from a type name.
pub fn short_type_name(type_name: &str) -> &str {
    let base_end = type_name.find('<').unwrap_or(type_name.len());
    let start = type_name[..base_end]
        .rfind("::")
        .map(|idx| idx + 2)
        .unwrap_or(0);
    &type_name[start..base_end]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    pub type_name: String,
    pub message: String,
}

/// A flattened snapshot of an exception and all of its inner exceptions,
/// outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionChain {
    links: Vec<ChainLink>,
}

impl ExceptionChain {
    pub fn capture(exception: &Exception) -> Self {
        let links = exception
            .chain()
            .map(|link| ChainLink {
                type_name: link.type_name().to_string(),
                message: link.message(),
            })
            .collect();
        Self { links }
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }
}

impl fmt::Display for ExceptionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, link) in self.links.iter().enumerate() {
            if i > 0 {
                f.write_str(" ---> ")?;
            }
            write!(f, "{}: {}", link.type_name, link.message)?;
        }
        Ok(())
    }
}

/// Renders `"{type}: {message}"` for the exception and every inner exception,
/// joined by `" ---> "`.
pub fn flatten_exception(exception: &Exception) -> String {
    ExceptionChain::capture(exception).to_string()
}
