use crate::data::{display_name, DataSourceError, TestDataSource};
use crate::reflect::{TestMethodInfo, TypeRegistry};
use crate::value::{ArgumentTuple, Value};

/// One inline argument tuple, optionally with a fixed display name.
///
/// An empty row and a row holding a single `Null` are different rows, and an
/// array argument stays a single element of the tuple.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataRow {
    data: ArgumentTuple,
    display_name: Option<String>,
}

impl DataRow {
    pub fn new(data: impl Into<ArgumentTuple>) -> Self {
        Self {
            data: data.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn data(&self) -> &[Value] {
        &self.data
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

impl TestDataSource for DataRow {
    fn get_data(
        &self,
        _registry: &TypeRegistry,
        _method: &TestMethodInfo,
    ) -> Result<Vec<ArgumentTuple>, DataSourceError> {
        Ok(vec![self.data.clone()])
    }

    fn get_display_name(
        &self,
        _registry: &TypeRegistry,
        method: &TestMethodInfo,
        data: Option<&[Value]>,
    ) -> Result<Option<String>, DataSourceError> {
        Ok(display_name(&method.name, data, self.display_name.as_deref()))
    }
}

/// Builds a [`DataRow`] from values convertible into [`Value`].
///
/// ```
/// use attest::{data_row, Value};
///
/// let row = data_row!["neptune", None::<&str>];
/// assert_eq!(row.data(), &[Value::from("neptune"), Value::Null]);
/// ```
#[macro_export]
macro_rules! data_row {
    () => {
        $crate::data::DataRow::default()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::data::DataRow::new($crate::values![$($value),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values;

    fn method() -> TestMethodInfo {
        TestMethodInfo::new("DummyTestClass", "DataRowTestMethod")
    }

    #[test]
    fn test_default_row_is_empty() {
        assert!(DataRow::default().data().is_empty());
        assert!(data_row![].data().is_empty());
    }

    #[test]
    fn test_row_keeps_values() {
        assert_eq!(data_row!["mercury"].data(), &values!["mercury"][..]);
        assert_eq!(
            data_row!["mercury", "venus", "earth"].data(),
            &values!["mercury", "venus", "earth"][..]
        );
    }

    #[test]
    fn test_single_null_is_not_empty() {
        let row = data_row![None::<&str>];
        assert_eq!(row.data(), &[Value::Null]);
        assert_ne!(row, DataRow::default());
    }

    #[test]
    fn test_nulls_keep_position() {
        assert_eq!(
            data_row!["neptune", None::<&str>].data(),
            &[Value::from("neptune"), Value::Null]
        );
        assert_eq!(
            data_row![None::<&str>, "logos"].data(),
            &[Value::Null, Value::from("logos")]
        );
    }

    #[test]
    fn test_arrays_stay_single_elements() {
        let row = data_row![["a"], ["b"]];
        assert_eq!(row.data().len(), 2);
        assert_eq!(row.data()[0], Value::from(vec!["a"]));
        assert_eq!(row.data()[1], Value::from(vec!["b"]));
    }

    #[test]
    fn test_get_data_returns_one_tuple() {
        let row = data_row!["mercury"];
        let data = row.get_data(&TypeRegistry::new(), &method()).unwrap();
        assert_eq!(data, vec![values!["mercury"]]);
    }

    #[test]
    fn test_display_name_uses_default_formatter() {
        let row = data_row![None::<&str>];
        let registry = TypeRegistry::new();
        let name = row
            .get_display_name(&registry, &method(), Some(&values!["First", "Second", None::<&str>]))
            .unwrap();
        assert_eq!(name.as_deref(), Some("DataRowTestMethod (First,Second,)"));
    }

    #[test]
    fn test_display_name_override() {
        let row = data_row![None::<&str>].with_display_name("DataRowTestWithDisplayName");
        let registry = TypeRegistry::new();
        let name = row
            .get_display_name(&registry, &method(), Some(&values!["First", "Second", None::<&str>]))
            .unwrap();
        assert_eq!(name.as_deref(), Some("DataRowTestWithDisplayName"));
        let name = row.get_display_name(&registry, &method(), None).unwrap();
        assert_eq!(name.as_deref(), Some("DataRowTestWithDisplayName"));
    }

    #[test]
    fn test_display_name_without_data() {
        let row = data_row!["x"];
        let name = row.get_display_name(&TypeRegistry::new(), &method(), None).unwrap();
        assert_eq!(name, None);
    }

    #[test]
    fn test_display_name_for_arrays() {
        let registry = TypeRegistry::new();
        let method = TestMethodInfo::new("T", "MyMethod");

        let row = data_row![["a", "b", "c"]];
        let name = row.get_display_name(&registry, &method, Some(row.data())).unwrap();
        assert_eq!(name.as_deref(), Some("MyMethod (a,b,c)"));

        let row = data_row![["a"], ["1"]];
        let name = row.get_display_name(&registry, &method, Some(row.data())).unwrap();
        assert_eq!(name.as_deref(), Some("MyMethod (Vec<String>,Vec<String>)"));
    }
}
