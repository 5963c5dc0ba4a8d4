use crate::value::Value;

/// Default display name for one invocation: `Method (a,b,c)`.
///
/// A tuple holding exactly one array is treated as a params list and its
/// elements are listed directly. Otherwise each argument renders through
/// [`Value`]'s `Display`, so nulls are empty and arrays show their type name.
pub fn default_display_name(method_name: &str, data: &[Value]) -> String {
    let items = match data {
        [Value::Array(items)] => items.as_slice(),
        _ => data,
    };
    let joined = items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("{} ({})", method_name, joined)
}

/// Resolves the display name with override taking precedence over the
/// default. Without a tuple there is nothing to name.
pub fn display_name(
    method_name: &str,
    data: Option<&[Value]>,
    display_override: Option<&str>,
) -> Option<String> {
    if let Some(name) = display_override {
        return Some(name.to_string());
    }
    data.map(|data| default_display_name(method_name, data))
}
