/// Filters operating on string
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::value::Value;
use unic_segment::GraphemeIndices;

#[cfg(feature = "urlencode")]
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::errors::{Error, Result};
use crate::utils;

/// Everything but the unreserved characters of RFC 3986, like `encodeURIComponent`
#[cfg(feature = "urlencode")]
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

lazy_static! {
    static ref STRIPTAGS_RE: Regex = Regex::new(r"(<!--.*?-->|<[^>]*>)").unwrap();
    static ref WORDS_RE: Regex = Regex::new(r"\b(?P<first>[\w'])(?P<rest>[\w']*)\b").unwrap();
}

/// Convert a value to uppercase.
pub fn uppercase(value: &Value, _: &[Value]) -> Result<Value> {
    let s = try_get_value!("uppercase", "value", String, value);

    Ok(Value::String(s.to_uppercase()))
}

/// Convert a value to lowercase.
pub fn lowercase(value: &Value, _: &[Value]) -> Result<Value> {
    let s = try_get_value!("lowercase", "value", String, value);

    Ok(Value::String(s.to_lowercase()))
}

/// First letter of the string is uppercase rest is lowercase
pub fn capitalize(value: &Value, _: &[Value]) -> Result<Value> {
    let s = try_get_value!("capitalize", "value", String, value);
    let mut chars = s.chars();
    match chars.next() {
        None => Ok(Value::String(String::new())),
        Some(f) => {
            let res = f.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase();
            Ok(Value::String(res))
        }
    }
}

/// Capitalizes each word in the string
pub fn title_case(value: &Value, _: &[Value]) -> Result<Value> {
    let s = try_get_value!("titleCase", "value", String, value);

    let res = WORDS_RE.replace_all(&s, |caps: &Captures| {
        let first = caps["first"].to_uppercase();
        let rest = caps["rest"].to_lowercase();
        format!("{}{}", first, rest)
    });
    Ok(Value::String(res.into_owned()))
}

/// Strip leading and trailing whitespace.
pub fn trim(value: &Value, _: &[Value]) -> Result<Value> {
    let s = try_get_value!("trim", "value", String, value);

    Ok(Value::String(s.trim().to_string()))
}

/// Truncates a string to the indicated length.
///
/// # Arguments
///
/// * `value`   - The string that needs to be truncated.
/// * `length`  - The length at which the string needs to be truncated. If
///   the length is larger than the length of the string, the string is
///   returned untouched. The default value is 255.
/// * `end`     - The ellipsis string to be used if the given string is
///   truncated. The default value is "...".
///
/// # Remarks
///
/// The return value of this function might be longer than `length`: the `end`
/// string is *added* after the truncation occurs.
///
pub fn truncate(value: &Value, args: &[Value]) -> Result<Value> {
    let s = try_get_value!("truncate", "value", String, value);
    let length = try_get_arg!("truncate", "length", usize, args, 0).unwrap_or(255);
    let end = try_get_arg!("truncate", "end", String, args, 1).unwrap_or_else(|| "...".to_string());

    let graphemes = GraphemeIndices::new(&s).collect::<Vec<(usize, &str)>>();

    // Nothing to truncate?
    if length >= graphemes.len() {
        return Ok(Value::String(s));
    }

    let result = s[..graphemes[length].0].to_string() + &end;
    Ok(Value::String(result))
}

/// Replaces every `from` substring with `to`.
pub fn replace(value: &Value, args: &[Value]) -> Result<Value> {
    let s = try_get_value!("replace", "value", String, value);

    let from = match try_get_arg!("replace", "from", String, args, 0) {
        Some(from) => from,
        None => return Err(Error::msg("Filter `replace` expected an arg called `from`")),
    };
    let to = match try_get_arg!("replace", "to", String, args, 1) {
        Some(to) => to,
        None => return Err(Error::msg("Filter `replace` expected an arg called `to`")),
    };

    Ok(Value::String(s.replace(&from, &to)))
}

/// Split the given string by the given separator, returning an array.
pub fn split(value: &Value, args: &[Value]) -> Result<Value> {
    let s = try_get_value!("split", "value", String, value);

    let separator = match try_get_arg!("split", "separator", String, args, 0) {
        Some(separator) => separator,
        None => return Err(Error::msg("Filter `split` expected an arg called `separator`")),
    };

    Ok(Value::Array(s.split(&separator).map(|part| Value::String(part.to_string())).collect()))
}

/// Transform a string into a slug
#[cfg(feature = "builtins")]
pub fn slugify(value: &Value, _: &[Value]) -> Result<Value> {
    let s = try_get_value!("slugify", "value", String, value);
    Ok(Value::String(slug::slugify(s)))
}

/// Removes html tags and comments from string
pub fn strip_tags(value: &Value, _: &[Value]) -> Result<Value> {
    let s = try_get_value!("stripTags", "value", String, value);
    Ok(Value::String(STRIPTAGS_RE.replace_all(&s, "").into_owned()))
}

/// Convert line breaks (`\n` or `\r\n`) to HTML linebreaks (`<br>`).
///
/// The result is meant to go through a `html_` variable, the `<br>` being escaped otherwise.
pub fn nl2br(value: &Value, _: &[Value]) -> Result<Value> {
    let s = try_get_value!("nl2br", "value", String, value);
    Ok(Value::String(s.replace("\r\n", "<br>").replace('\n', "<br>")))
}

/// Percent-encodes everything but unreserved URI characters
#[cfg(feature = "urlencode")]
pub fn url_encode(value: &Value, _: &[Value]) -> Result<Value> {
    let s = try_get_value!("urlEncode", "value", String, value);
    let encoded = percent_encode(s.as_bytes(), COMPONENT_ENCODE_SET).to_string();
    Ok(Value::String(encoded))
}

/// Returns the given text with all special HTML characters encoded
pub fn escape(value: &Value, _: &[Value]) -> Result<Value> {
    let s = try_get_value!("escape", "value", String, value);
    Ok(Value::String(utils::escape_html(&s)))
}

/// Gets the number of words in a string.
pub fn word_count(value: &Value, _: &[Value]) -> Result<Value> {
    let s = try_get_value!("wordCount", "value", String, value);

    Ok(Value::from(s.split_whitespace().count()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uppercase_lowercase() {
        assert_eq!(uppercase(&json!("hello"), &[]).unwrap(), json!("HELLO"));
        assert_eq!(lowercase(&json!("HeLLo"), &[]).unwrap(), json!("hello"));
    }

    #[test]
    fn test_uppercase_non_string() {
        let err = uppercase(&json!(1), &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Filter `uppercase` received an incorrect type for arg `value`: got `1` but expected a String"
        );
    }

    #[test]
    fn test_capitalize() {
        let tests = vec![("CAPITAL IZE", "Capital ize"), ("capital ize", "Capital ize"), ("", "")];
        for (input, expected) in tests {
            assert_eq!(capitalize(&json!(input), &[]).unwrap(), json!(expected));
        }
    }

    #[test]
    fn test_title_case() {
        let tests = vec![
            ("foo bar", "Foo Bar"),
            ("foo\tbar", "Foo\tBar"),
            ("foo  bar", "Foo  Bar"),
            ("f bar f", "F Bar F"),
            ("foo-bar", "Foo-Bar"),
            ("FOO\tBAR", "Foo\tBar"),
            ("foo (bar)", "Foo (Bar)"),
            ("foo_bar", "Foo_bar"),
            ("foo's bar", "Foo's Bar"),
        ];
        for (input, expected) in tests {
            assert_eq!(title_case(&json!(input), &[]).unwrap(), json!(expected));
        }
    }

    #[test]
    fn test_trim() {
        assert_eq!(trim(&json!("  hah   "), &[]).unwrap(), json!("hah"));
    }

    #[test]
    fn test_truncate_smaller_than_length() {
        assert_eq!(truncate(&json!("hello"), &[json!(255)]).unwrap(), json!("hello"));
    }

    #[test]
    fn test_truncate_when_required() {
        assert_eq!(truncate(&json!("日本語のテキスト"), &[json!(2)]).unwrap(), json!("日本..."));
        assert_eq!(truncate(&json!("HELLO"), &[json!(3)]).unwrap(), json!("HEL..."));
    }

    #[test]
    fn test_truncate_custom_end() {
        assert_eq!(truncate(&json!("hello"), &[json!(2), json!("!")]).unwrap(), json!("he!"));
        assert_eq!(truncate(&json!("hello"), &[json!(2), json!("")]).unwrap(), json!("he"));
    }

    #[test]
    fn test_truncate_multichar_grapheme() {
        assert_eq!(
            truncate(&json!("\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467} family"), &[json!(1)]).unwrap(),
            json!("\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}...")
        );
    }

    #[test]
    fn test_replace() {
        let res = replace(&json!("Hello world!"), &[json!("Hello"), json!("Goodbye")]);
        assert_eq!(res.unwrap(), json!("Goodbye world!"));
    }

    #[test]
    fn test_replace_missing_arg() {
        let err = replace(&json!("Hello world!"), &[json!("Hello")]).unwrap_err();
        assert_eq!(err.to_string(), "Filter `replace` expected an arg called `to`");
    }

    #[test]
    fn test_split() {
        assert_eq!(split(&json!("a,b,c"), &[json!(",")]).unwrap(), json!(["a", "b", "c"]));
        assert_eq!(split(&json!("abc"), &[json!(",")]).unwrap(), json!(["abc"]));
        assert!(split(&json!("abc"), &[]).is_err());
    }

    #[cfg(feature = "builtins")]
    #[test]
    fn test_slugify() {
        let tests = vec![
            (r#"Hello world"#, "hello-world"),
            (r#"Hello 文 world"#, "hello-wen-world"),
            (r#"Hello   world!"#, "hello-world"),
        ];
        for (input, expected) in tests {
            assert_eq!(slugify(&json!(input), &[]).unwrap(), json!(expected));
        }
    }

    #[test]
    fn test_strip_tags() {
        let tests = vec![
            (r"<b>Joel</b> <button>is</button> a <span>slug</span>", "Joel is a slug"),
            (r#"<p>just a small   \n example <a href="x">link</a></p>"#, r#"just a small   \n example link"#),
            (r#"<p>hello<!-- a comment --> world</p>"#, "hello world"),
            (r"no tags", "no tags"),
        ];
        for (input, expected) in tests {
            assert_eq!(strip_tags(&json!(input), &[]).unwrap(), json!(expected));
        }
    }

    #[test]
    fn test_nl2br() {
        let tests = vec![("hello world", "hello world"), ("hello\nworld", "hello<br>world"), ("a\r\nb", "a<br>b")];
        for (input, expected) in tests {
            assert_eq!(nl2br(&json!(input), &[]).unwrap(), json!(expected));
        }
    }

    #[cfg(feature = "urlencode")]
    #[test]
    fn test_url_encode() {
        let tests = vec![
            (r#"https://www.example.org/foo?a=b&c=d"#, r#"https%3A%2F%2Fwww.example.org%2Ffoo%3Fa%3Db%26c%3Dd"#),
            (r#"hello world"#, r#"hello%20world"#),
            (r#"it's (fine)!"#, r#"it's%20(fine)!"#),
        ];
        for (input, expected) in tests {
            assert_eq!(url_encode(&json!(input), &[]).unwrap(), json!(expected));
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(&json!("<a href=\"/\">"), &[]).unwrap(), json!("&lt;a href=&quot;&#x2F;&quot;&gt;"));
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(&json!("Joel is a slug"), &[]).unwrap(), json!(4));
        assert_eq!(word_count(&json!("   "), &[]).unwrap(), json!(0));
    }
}
