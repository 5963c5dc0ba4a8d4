use crate::value::Value;
use std::borrow::Cow;
use thiserror::Error;

/// Widest alignment a format item may request.
const MAX_ALIGNMENT: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Input string was not in a correct format (position {position})")]
    Malformed { position: usize },
    #[error("Format item {index} is out of range for {count} argument(s)")]
    IndexOutOfRange { index: usize, count: usize },
}

/// Escapes embedded NUL characters so they survive in failure messages.
pub fn replace_null_chars(input: &str) -> Cow<'_, str> {
    if input.contains('\0') {
        Cow::Owned(input.replace('\0', "\\0"))
    } else {
        Cow::Borrowed(input)
    }
}

/// Builds the user-supplied part of a failure message.
///
/// Without arguments the template is returned verbatim, so braces need no
/// escaping. With arguments it is a composite format string: `{0}`,
/// `{1,-8}`, with `{{` and `}}` as literal braces.
pub fn build_user_message(template: &str, args: &[Value]) -> Result<String, FormatError> {
    if args.is_empty() {
        return Ok(template.to_string());
    }
    format_composite(template, args)
}

fn format_composite(template: &str, args: &[Value]) -> Result<String, FormatError> {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                out.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                out.push('}');
                i += 2;
            }
            '}' => return Err(FormatError::Malformed { position: i }),
            '{' => {
                let start = i;
                let close = chars[i + 1..]
                    .iter()
                    .position(|c| *c == '}')
                    .map(|offset| i + 1 + offset)
                    .ok_or(FormatError::Malformed { position: start })?;
                let item: String = chars[i + 1..close].iter().collect();
                out.push_str(&format_item(&item, args, start)?);
                i = close + 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(out)
}

fn format_item(item: &str, args: &[Value], position: usize) -> Result<String, FormatError> {
    let malformed = FormatError::Malformed { position };
    let (index_part, alignment) = match item.split_once(',') {
        Some((index, alignment)) => {
            let width: i64 = alignment.trim().parse().map_err(|_| malformed.clone())?;
            if width.unsigned_abs() > MAX_ALIGNMENT {
                return Err(malformed);
            }
            (index, Some(width))
        }
        None => (item, None),
    };

    if index_part.is_empty() || !index_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed);
    }
    let index: usize = index_part.parse().map_err(|_| malformed)?;
    let value = args.get(index).ok_or(FormatError::IndexOutOfRange {
        index,
        count: args.len(),
    })?;
    let rendered = value.to_string();

    Ok(match alignment {
        Some(width) => pad(rendered, width),
        None => rendered,
    })
}

/// Right-aligns for positive widths, left-aligns for negative ones.
fn pad(rendered: String, width: i64) -> String {
    let len = rendered.chars().count();
    let target = width.unsigned_abs() as usize;
    if len >= target {
        return rendered;
    }
    let fill = " ".repeat(target - len);
    if width < 0 {
        rendered + &fill
    } else {
        fill + &rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values;
    use assert_matches::assert_matches;

    #[test]
    fn test_replace_null_chars_empty() {
        assert_eq!(replace_null_chars(""), "");
    }

    #[test]
    fn test_replace_null_chars_in_string() {
        assert_eq!(
            replace_null_chars("The quick brown fox \0 jumped over the la\0zy dog\0"),
            "The quick brown fox \\0 jumped over the la\\0zy dog\\0"
        );
    }

    #[test]
    fn test_oversized_alignment_is_a_format_error() {
        assert_matches!(
            build_user_message("{0,70000}", &values![1]),
            Ok(ref s) if s.len() == 70000 && s.ends_with('1')
        );
        assert_matches!(
            build_user_message("x{0,-9223372036854775807}", &values![1]),
            Err(FormatError::Malformed { position: 1 })
        );
        assert_matches!(
            build_user_message("{0,1000001}", &values![1]),
            Err(FormatError::Malformed { position: 0 })
        );
        assert_eq!(build_user_message("[{0,-3}]", &values![7]).unwrap(), "[7  ]");
        assert_eq!(build_user_message("[{0,3}]", &values![7]).unwrap(), "[  7]");
    }

    #[test]
    fn test_no_arguments_returns_template_verbatim() {
        assert_eq!(build_user_message("{", &[]).unwrap(), "{");
        assert_eq!(build_user_message(":-{", &[]).unwrap(), ":-{");
    }

    #[test]
    fn test_invalid_composite_with_arguments_fails() {
        assert_matches!(
            build_user_message("{", &values!["arg"]),
            Err(FormatError::Malformed { .. })
        );
        assert_matches!(
            build_user_message("message {{0}", &values!["arg"]),
            Err(FormatError::Malformed { .. })
        );
    }

    #[test]
    fn test_formats_positional_arguments() {
        let message = build_user_message(
            "The world is not on fire {0}.{1}-{2}.",
            &values!["ta", "da", 123],
        )
        .unwrap();
        assert_eq!(message, "The world is not on fire ta.da-123.");
    }

    #[test]
    fn test_escaped_braces() {
        let message = build_user_message("{{{0}}}", &values![7]).unwrap();
        assert_eq!(message, "{7}");
    }

    #[test]
    fn test_alignment() {
        assert_eq!(build_user_message("[{0,4}]", &values![1]).unwrap(), "[   1]");
        assert_eq!(build_user_message("[{0,-4}]", &values![1]).unwrap(), "[1   ]");
    }

    #[test]
    fn test_index_out_of_range() {
        assert_matches!(
            build_user_message("{3}", &values!["a"]),
            Err(FormatError::IndexOutOfRange { index: 3, count: 1 })
        );
    }
}
