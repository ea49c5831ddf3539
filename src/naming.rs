//! Identifier derivation for generated accessors and constants.
//!
//! A field name is split into chunks on every character outside
//! `[A-Za-z0-9]`. Empty chunks (leading, trailing or repeated separators) are
//! dropped. Case inside a chunk is preserved, so `fooBar` is a single chunk.

fn chunks(name: &str) -> impl Iterator<Item = &str> {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|chunk| !chunk.is_empty())
}

/// Convert a field name to the CamelCase form used in accessor names.
///
/// - `"foo_bar"` → `"FooBar"`
/// - `"foo-bar2"` → `"FooBar2"`
/// - `"__leading"` → `"Leading"`
pub fn to_camel_case(name: &str) -> String {
    chunks(name)
        .map(|chunk| {
            let mut chars = chunk.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_ascii_uppercase().to_string() + chars.as_str(),
            }
        })
        .collect()
}

/// Convert a field name to the UPPER_SNAKE form used for field-number constants.
///
/// - `"foo_bar"` → `"FOO_BAR"`
/// - `"fooBar"` → `"FOOBAR"`
pub fn to_const_name(name: &str) -> String {
    chunks(name)
        .map(|chunk| chunk.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_conversion() {
        assert_eq!(to_camel_case("foo_bar"), "FooBar");
        assert_eq!(to_camel_case("foo-bar2"), "FooBar2");
        assert_eq!(to_camel_case("id"), "Id");
        assert_eq!(to_camel_case("phone_number_type"), "PhoneNumberType");
    }

    #[test]
    fn camel_case_drops_empty_chunks() {
        assert_eq!(to_camel_case("__leading"), "Leading");
        assert_eq!(to_camel_case("trailing__"), "Trailing");
        assert_eq!(to_camel_case("a..b"), "AB");
    }

    #[test]
    fn camel_case_keeps_inner_case() {
        assert_eq!(to_camel_case("fooBar"), "FooBar");
        assert_eq!(to_camel_case("html_URL"), "HtmlURL");
    }

    #[test]
    fn const_name_conversion() {
        assert_eq!(to_const_name("foo_bar"), "FOO_BAR");
        assert_eq!(to_const_name("foobar"), "FOOBAR");
        assert_eq!(to_const_name("fooBar"), "FOOBAR");
        assert_eq!(to_const_name("foo-bar2"), "FOO_BAR2");
        assert_eq!(to_const_name("__leading"), "LEADING");
        assert_eq!(to_const_name("a  b"), "A_B");
    }

    #[test]
    fn non_ascii_letters_are_separators() {
        assert_eq!(to_camel_case("caf\u{e9}_menu"), "CafMenu");
        assert_eq!(to_const_name("caf\u{e9}_menu"), "CAF_MENU");
    }

    #[test]
    fn degenerate_names_yield_empty_identifiers() {
        assert_eq!(to_camel_case(""), "");
        assert_eq!(to_camel_case("___"), "");
        assert_eq!(to_const_name(""), "");
        assert_eq!(to_const_name("-_-"), "");
    }

    #[test]
    fn derivation_is_idempotent() {
        let camel = to_camel_case("foo_bar_baz");
        assert_eq!(to_camel_case(&camel), camel);
        let konst = to_const_name("foo_bar_baz");
        assert_eq!(to_const_name(&konst), konst);
    }
}
