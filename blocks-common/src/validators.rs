//! Input validators shared by the feature catalogue and the mass upload form
//!
//! Every validator returns `Ok(())` on success and an [`Error`] describing the
//! first problem found otherwise. None of them has side effects.

use crate::{Error, Result};

/// Validate a single CSS classname
///
/// A valid classname is non-empty, does not start with a digit and only
/// contains ASCII alphanumerics, `-` or `_`. This is a class name, not a
/// selector: `.foo` is rejected.
pub fn validate_css_classname(name: &str) -> Result<()> {
    let mut chars = name.chars();

    let first = match chars.next() {
        Some(c) => c,
        None => return Err(Error::InvalidClassname(name.to_string())),
    };

    if first.is_ascii_digit() || !is_classname_char(first) {
        return Err(Error::InvalidClassname(name.to_string()));
    }

    if chars.all(is_classname_char) {
        Ok(())
    } else {
        Err(Error::InvalidClassname(name.to_string()))
    }
}

/// Validate every classname in list order, stopping on the first invalid one
pub fn validate_css_classnames<S: AsRef<str>>(names: &[S]) -> Result<()> {
    for name in names {
        validate_css_classname(name.as_ref())?;
    }

    Ok(())
}

/// Validate a feature value
///
/// With `allow_multiple` the value is a whitespace separated list of classes
/// (`"btn btn-lg"`), each one validated. Otherwise the whole value must be a
/// single classname.
pub fn validate_feature_value(value: &str, allow_multiple: bool) -> Result<()> {
    if !allow_multiple {
        return validate_css_classname(value);
    }

    let names: Vec<&str> = value.split_whitespace().collect();
    if names.is_empty() {
        return Err(Error::InvalidClassname(value.to_string()));
    }

    validate_css_classnames(&names)
}

fn is_classname_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Check a filename against the allowed image extensions
///
/// Only the final dot-extension is considered, compared case-insensitively.
/// Validation is naive: it trusts the filename, not the file content.
pub fn is_valid_image_filename<S: AsRef<str>>(filename: &str, allowed_extensions: &[S]) -> bool {
    let ext = match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => return false,
    };

    allowed_extensions
        .iter()
        .any(|allowed| allowed.as_ref().eq_ignore_ascii_case(&ext))
}

/// Validate a file size does not exceed `limit` bytes (equality is allowed)
pub fn validate_file_size(size: u64, limit: u64) -> Result<()> {
    if size > limit {
        return Err(Error::SizeExceeded {
            limit: format_file_size(limit),
            size: format_file_size(size),
        });
    }

    Ok(())
}

/// Format a byte count as a human readable size ("12 bytes", "4.1 MB")
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    if bytes < 1024 {
        return if bytes == 1 {
            "1 byte".to_string()
        } else {
            format!("{} bytes", bytes)
        };
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_classnames() {
        for name in ["foo", "foo-bar", "foo_bar", "foo42bar", "_foo", "-foo"] {
            assert!(validate_css_classname(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_classnames() {
        for name in ["", "1foo", "foo bar", ".foo", "foo@bar", "été"] {
            assert!(
                matches!(validate_css_classname(name), Err(Error::InvalidClassname(_))),
                "{:?} should be invalid",
                name
            );
        }
    }

    #[test]
    fn test_classnames_fail_on_first_invalid() {
        assert!(validate_css_classnames(&["foo", "foo-bar", "_foo"]).is_ok());

        match validate_css_classnames(&["foo", "1foo", "2bar"]) {
            Err(Error::InvalidClassname(name)) => assert_eq!(name, "1foo"),
            other => panic!("Expected InvalidClassname, got {:?}", other),
        }
    }

    #[test]
    fn test_feature_value_multiple_classes() {
        assert!(validate_feature_value("foo bar", false).is_err());
        assert!(validate_feature_value("foo bar", true).is_ok());
        assert!(validate_feature_value("foo  1bar", true).is_err());
        assert!(validate_feature_value("   ", true).is_err());
        assert!(validate_feature_value("foo", true).is_ok());
    }

    #[test]
    fn test_image_filename() {
        let allowed = ["jpg", "jpeg", "svg", "gif", "png"];

        assert!(!is_valid_image_filename("/foo/bar", &allowed));
        assert!(!is_valid_image_filename("bar.txt", &allowed));
        assert!(!is_valid_image_filename("bar.jpg.txt", &allowed));
        assert!(is_valid_image_filename("bar.jpg", &allowed));
        assert!(is_valid_image_filename("/foo/bar.jpg", &allowed));
        assert!(is_valid_image_filename("/foo/bar.txt.jpg", &allowed));
        assert!(is_valid_image_filename("bar.PNG", &allowed));
        assert!(is_valid_image_filename("bar.gif", &allowed));
        assert!(is_valid_image_filename("bar.svg", &allowed));
    }

    #[test]
    fn test_file_size_boundary() {
        assert!(validate_file_size(50, 1000).is_ok());
        assert!(validate_file_size(1000, 1000).is_ok());
        assert!(matches!(
            validate_file_size(1001, 1000),
            Err(Error::SizeExceeded { .. })
        ));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(1), "1 byte");
        assert_eq!(format_file_size(1000), "1000 bytes");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(42991616), "41.0 MB");
    }
}
