use crate::assertions::{check, throw_assert_failed, AssertResult};
use crate::value::{Value, ValueType};
use std::fmt::Debug;

/// Assertions over collections. Ordered comparisons look at position,
/// equivalence ignores order but respects multiplicity.
#[derive(Debug)]
pub struct CollectionAssert;

static COLLECTION_ASSERT: CollectionAssert = CollectionAssert;

impl CollectionAssert {
    pub fn that() -> &'static CollectionAssert {
        &COLLECTION_ASSERT
    }

    pub fn contains<T: PartialEq>(collection: &[T], element: &T) -> AssertResult {
        check(collection.contains(element), "CollectionAssert.Contains", String::new)
    }

    pub fn does_not_contain<T: PartialEq>(collection: &[T], element: &T) -> AssertResult {
        check(
            !collection.contains(element),
            "CollectionAssert.DoesNotContain",
            String::new,
        )
    }

    pub fn all_items_are_not_null<T>(collection: &[Option<T>]) -> AssertResult {
        check(
            collection.iter().all(Option::is_some),
            "CollectionAssert.AllItemsAreNotNull",
            String::new,
        )
    }

    pub fn all_items_are_unique<T: PartialEq + Debug>(collection: &[T]) -> AssertResult {
        for (i, item) in collection.iter().enumerate() {
            if collection[..i].contains(item) {
                return Err(throw_assert_failed(
                    "CollectionAssert.AllItemsAreUnique",
                    format!("Duplicate item found:<{:?}>.", item),
                ));
            }
        }
        Ok(())
    }

    /// Passes when every element of `subset` (with multiplicity) appears in
    /// `superset`.
    pub fn is_subset_of<T: PartialEq>(subset: &[T], superset: &[T]) -> AssertResult {
        check(is_subset(subset, superset), "CollectionAssert.IsSubsetOf", String::new)
    }

    pub fn is_not_subset_of<T: PartialEq>(subset: &[T], superset: &[T]) -> AssertResult {
        check(
            !is_subset(subset, superset),
            "CollectionAssert.IsNotSubsetOf",
            String::new,
        )
    }

    pub fn are_equal<T: PartialEq + Debug>(expected: &[T], actual: &[T]) -> AssertResult {
        match ordered_mismatch(expected, actual) {
            None => Ok(()),
            Some(reason) => Err(throw_assert_failed("CollectionAssert.AreEqual", reason)),
        }
    }

    pub fn are_not_equal<T: PartialEq + Debug>(not_expected: &[T], actual: &[T]) -> AssertResult {
        check(
            ordered_mismatch(not_expected, actual).is_some(),
            "CollectionAssert.AreNotEqual",
            String::new,
        )
    }

    pub fn are_equivalent<T: PartialEq + Debug>(expected: &[T], actual: &[T]) -> AssertResult {
        match equivalence_mismatch(expected, actual) {
            None => Ok(()),
            Some(reason) => Err(throw_assert_failed("CollectionAssert.AreEquivalent", reason)),
        }
    }

    pub fn are_not_equivalent<T: PartialEq + Debug>(expected: &[T], actual: &[T]) -> AssertResult {
        check(
            equivalence_mismatch(expected, actual).is_some(),
            "CollectionAssert.AreNotEquivalent",
            || "Both collections contain the same elements.".to_string(),
        )
    }

    pub fn all_items_are_instances_of_type(collection: &[Value], expected: ValueType) -> AssertResult {
        for (index, item) in collection.iter().enumerate() {
            let matches = item
                .value_type()
                .map_or(false, |actual| expected.is_assignable_from(actual));
            if !matches {
                return Err(throw_assert_failed(
                    "CollectionAssert.AllItemsAreInstancesOfType",
                    format!(
                        "Element at index {} is not of expected type. Expected type:<{}>. Actual type:<{}>.",
                        index,
                        expected,
                        item.type_name()
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn is_subset<T: PartialEq>(subset: &[T], superset: &[T]) -> bool {
    let mut used = vec![false; superset.len()];
    subset.iter().all(|item| {
        let slot = superset
            .iter()
            .enumerate()
            .position(|(i, candidate)| !used[i] && candidate == item);
        match slot {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

fn ordered_mismatch<T: PartialEq + Debug>(expected: &[T], actual: &[T]) -> Option<String> {
    if expected.len() != actual.len() {
        return Some(format!(
            "Different number of elements. Expected:<{}>. Actual:<{}>.",
            expected.len(),
            actual.len()
        ));
    }
    expected
        .iter()
        .zip(actual)
        .position(|(e, a)| e != a)
        .map(|index| {
            format!(
                "Element at index {} do not match. Expected:<{:?}>. Actual:<{:?}>.",
                index, expected[index], actual[index]
            )
        })
}

fn equivalence_mismatch<T: PartialEq + Debug>(expected: &[T], actual: &[T]) -> Option<String> {
    if expected.len() != actual.len() {
        return Some(format!(
            "The number of elements in the collections do not match. Expected:<{}>. Actual:<{}>.",
            expected.len(),
            actual.len()
        ));
    }
    for item in expected {
        let expected_count = expected.iter().filter(|e| *e == item).count();
        let actual_count = actual.iter().filter(|a| *a == item).count();
        if expected_count != actual_count {
            return Some(format!(
                "The expected collection contains {} occurrence(s) of <{:?}>. The actual collection contains {} occurrence(s).",
                expected_count, item, actual_count
            ));
        }
    }
    None
}
