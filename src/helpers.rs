use std::sync::atomic::{AtomicI32, Ordering};

static NEXT_DATA: AtomicI32 = AtomicI32::new(0);

/// A plain value for exercising generic code under test.
///
/// Equality, ordering and hashing all follow `data`. Default instances are
/// given distinct data so they compare unequal, and iterating yields
/// `data % 10` items.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenericParameterHelper {
    pub data: i32,
}

impl GenericParameterHelper {
    pub fn new(data: i32) -> Self {
        Self { data }
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> {
        0..(self.data % 10).max(0)
    }
}

impl Default for GenericParameterHelper {
    fn default() -> Self {
        Self::new(NEXT_DATA.fetch_add(1, Ordering::Relaxed))
    }
}

impl<'a> IntoIterator for &'a GenericParameterHelper {
    type Item = i32;
    type IntoIter = std::ops::Range<i32>;

    fn into_iter(self) -> Self::IntoIter {
        0..(self.data % 10).max(0)
    }
}
