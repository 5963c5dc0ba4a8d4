use crate::assertions::culture::Culture;
use crate::assertions::message::replace_null_chars;
use crate::assertions::{check, throw_assert_failed, AssertError, AssertFailure, AssertResult};
use crate::exception::{short_type_name, Exception};
use crate::value::{Typed, Value, ValueType};
use std::error::Error;
use std::fmt::Debug;
use std::future::Future;

/// General purpose assertions.
///
/// Extension assertions hang off the cached [`Assert::that`] instance:
///
/// ```
/// use attest::{Assert, AssertResult};
///
/// trait EvenAssert {
///     fn is_even(&self, value: i32) -> AssertResult;
/// }
///
/// impl EvenAssert for Assert {
///     fn is_even(&self, value: i32) -> AssertResult {
///         Assert::is_true(value % 2 == 0)
///     }
/// }
///
/// assert!(Assert::that().is_even(4).is_ok());
/// ```
#[derive(Debug)]
pub struct Assert;

static ASSERT: Assert = Assert;

/// Numeric types supporting comparison within a tolerance.
pub trait Tolerance: Copy + Debug {
    fn is_within(expected: Self, actual: Self, delta: Self) -> bool;
}

macro_rules! impl_float_tolerance {
    ($($ty:ty),*) => {
        $(
            impl Tolerance for $ty {
                fn is_within(expected: Self, actual: Self, delta: Self) -> bool {
                    if expected.is_nan() || actual.is_nan() || delta.is_nan() {
                        return false;
                    }
                    (expected - actual).abs() <= delta
                }
            }
        )*
    };
}

macro_rules! impl_int_tolerance {
    ($($ty:ty),*) => {
        $(
            impl Tolerance for $ty {
                fn is_within(expected: Self, actual: Self, delta: Self) -> bool {
                    let diff = (expected as i128 - actual as i128).abs();
                    diff <= (delta as i128).abs()
                }
            }
        )*
    };
}

impl_float_tolerance!(f32, f64);
impl_int_tolerance!(i32, i64);

impl Assert {
    /// The shared instance used as the receiver of extension assertions.
    pub fn that() -> &'static Assert {
        &ASSERT
    }

    pub fn are_equal<T>(expected: T, actual: T) -> AssertResult
    where
        T: PartialEq + Debug,
    {
        check(expected == actual, "Assert.AreEqual", || {
            format!("Expected:<{:?}>. Actual:<{:?}>.", expected, actual)
        })
    }

    pub fn are_not_equal<T>(not_expected: T, actual: T) -> AssertResult
    where
        T: PartialEq + Debug,
    {
        check(not_expected != actual, "Assert.AreNotEqual", || {
            format!(
                "Expected any value except:<{:?}>. Actual:<{:?}>.",
                not_expected, actual
            )
        })
    }

    pub fn are_equal_within<T: Tolerance>(expected: T, actual: T, delta: T) -> AssertResult {
        check(T::is_within(expected, actual, delta), "Assert.AreEqual", || {
            format!(
                "Expected a difference no greater than <{:?}> between expected value <{:?}> and actual value <{:?}>.",
                delta, expected, actual
            )
        })
    }

    pub fn are_not_equal_within<T: Tolerance>(not_expected: T, actual: T, delta: T) -> AssertResult {
        check(
            !T::is_within(not_expected, actual, delta),
            "Assert.AreNotEqual",
            || {
                format!(
                    "Expected a difference greater than <{:?}> between expected value <{:?}> and actual value <{:?}>.",
                    delta, not_expected, actual
                )
            },
        )
    }

    /// Compares strings using the invariant culture.
    pub fn are_equal_str(expected: &str, actual: &str, ignore_case: bool) -> AssertResult {
        Self::are_equal_str_with_culture(expected, actual, ignore_case, &Culture::invariant())
    }

    pub fn are_equal_str_with_culture(
        expected: &str,
        actual: &str,
        ignore_case: bool,
        culture: &Culture,
    ) -> AssertResult {
        if culture.equals(expected, actual, ignore_case) {
            return Ok(());
        }
        let expected = replace_null_chars(expected);
        let actual = replace_null_chars(actual);
        let detail = if !ignore_case && culture.equals(&expected, &actual, true) {
            format!(
                "Expected:<{}>. Case is different for actual value:<{}>.",
                expected, actual
            )
        } else {
            format!("Expected:<{}>. Actual:<{}>.", expected, actual)
        };
        Err(throw_assert_failed("Assert.AreEqual", detail))
    }

    pub fn are_not_equal_str(not_expected: &str, actual: &str, ignore_case: bool) -> AssertResult {
        Self::are_not_equal_str_with_culture(not_expected, actual, ignore_case, &Culture::invariant())
    }

    pub fn are_not_equal_str_with_culture(
        not_expected: &str,
        actual: &str,
        ignore_case: bool,
        culture: &Culture,
    ) -> AssertResult {
        check(
            !culture.equals(not_expected, actual, ignore_case),
            "Assert.AreNotEqual",
            || {
                format!(
                    "Expected any value except:<{}>. Actual:<{}>.",
                    replace_null_chars(not_expected),
                    replace_null_chars(actual)
                )
            },
        )
    }

    /// Passes when both references point at the same object.
    pub fn are_same<T: ?Sized>(expected: &T, actual: &T) -> AssertResult {
        check(std::ptr::eq(expected, actual), "Assert.AreSame", String::new)
    }

    pub fn are_not_same<T: ?Sized>(not_expected: &T, actual: &T) -> AssertResult {
        check(
            !std::ptr::eq(not_expected, actual),
            "Assert.AreNotSame",
            String::new,
        )
    }

    pub fn is_true(condition: bool) -> AssertResult {
        check(condition, "Assert.IsTrue", String::new)
    }

    pub fn is_false(condition: bool) -> AssertResult {
        check(!condition, "Assert.IsFalse", String::new)
    }

    pub fn is_null<T>(value: Option<T>) -> AssertResult {
        check(value.is_none(), "Assert.IsNull", String::new)
    }

    pub fn is_not_null<T>(value: Option<T>) -> AssertResult {
        check(value.is_some(), "Assert.IsNotNull", String::new)
    }

    /// Fails for a null value or a missing expected type.
    pub fn is_instance_of_type(value: Option<&Value>, expected: Option<ValueType>) -> AssertResult {
        let actual = value.and_then(Value::value_type);
        match (actual, expected) {
            (Some(actual), Some(expected)) if expected.is_assignable_from(actual) => Ok(()),
            (Some(actual), Some(expected)) => Err(throw_assert_failed(
                "Assert.IsInstanceOfType",
                format!("Expected type:<{}>. Actual type:<{}>.", expected, actual),
            )),
            _ => Err(AssertError::Failed(AssertFailure::new(
                "Assert.IsInstanceOfType",
            ))),
        }
    }

    /// A null value is never an instance, so it passes; a missing type fails.
    pub fn is_not_instance_of_type(value: Option<&Value>, wrong: Option<ValueType>) -> AssertResult {
        let Some(wrong) = wrong else {
            return Err(AssertError::Failed(AssertFailure::new(
                "Assert.IsNotInstanceOfType",
            )));
        };
        match value.and_then(Value::value_type) {
            Some(actual) if wrong.is_assignable_from(actual) => Err(throw_assert_failed(
                "Assert.IsNotInstanceOfType",
                format!("Wrong Type:<{}>. Actual type:<{}>.", wrong, actual),
            )),
            _ => Ok(()),
        }
    }

    pub fn is_instance_of<T: Typed>(value: Option<&Value>) -> AssertResult {
        Self::is_instance_of_type(value, Some(T::VALUE_TYPE))
    }

    pub fn is_not_instance_of<T: Typed>(value: Option<&Value>) -> AssertResult {
        Self::is_not_instance_of_type(value, Some(T::VALUE_TYPE))
    }

    pub fn fail(message: impl Into<String>) -> AssertResult {
        Err(throw_assert_failed("Assert.Fail", message))
    }

    pub fn inconclusive(message: impl Into<String>) -> AssertResult {
        Err(AssertError::Inconclusive(
            AssertFailure::new("Assert.Inconclusive").with_detail(message),
        ))
    }

    /// Runs `action` and passes only if it fails with an error of type `E`,
    /// which is returned.
    pub fn throws_exception<E>(action: impl FnOnce() -> Result<(), Exception>) -> AssertResult<E>
    where
        E: Error + Send + Sync + 'static,
    {
        expect_exception::<E>("Assert.ThrowsException", action())
    }

    pub async fn throws_exception_async<E>(
        action: impl Future<Output = Result<(), Exception>>,
    ) -> AssertResult<E>
    where
        E: Error + Send + Sync + 'static,
    {
        expect_exception::<E>("Assert.ThrowsExceptionAsync", action.await)
    }
}

fn expect_exception<E>(assertion: &'static str, outcome: Result<(), Exception>) -> AssertResult<E>
where
    E: Error + Send + Sync + 'static,
{
    let expected = short_type_name(std::any::type_name::<E>());
    match outcome {
        Ok(()) => Err(throw_assert_failed(
            assertion,
            format!("No exception thrown. {} exception was expected.", expected),
        )),
        Err(exception) => exception.downcast::<E>().map_err(|other| {
            throw_assert_failed(
                assertion,
                format!(
                    "Threw exception {}, but exception {} was expected.",
                    other.short_type_name(),
                    expected
                ),
            )
        }),
    }
}
