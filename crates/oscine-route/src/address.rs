//! Validation of OSC addresses.
//!
//! Two forms exist. A *registered* address may use the pattern
//! metacharacters and must be well-formed enough to compile. A *concrete*
//! address is the sent form and may not contain metacharacters at all.

use crate::RouteError;

/// Characters that only have meaning in patterns and are forbidden in the
/// concrete (sent) form of an address.
const PATTERN_CHARS: &[char] = &['#', '*', '?', ',', '[', ']', '{', '}'];

fn invalid(address: &str, reason: impl Into<String>) -> RouteError {
    RouteError::InvalidAddress {
        address: address.to_string(),
        reason: reason.into(),
    }
}

/// Validates an address for handler registration. Patterns are allowed,
/// but brackets and braces must balance.
pub fn validate_address(address: &str) -> Result<(), RouteError> {
    if !address.starts_with('/') {
        return Err(invalid(address, "must begin with '/'"));
    }
    if address.chars().any(char::is_whitespace) {
        return Err(invalid(address, "must not contain whitespace"));
    }

    let chars: Vec<char> = address.chars().collect();
    let mut in_alt = false;
    let mut i = 0;
    while i < chars.len() {
        // Inside {}, everything up to the closing brace is literal except
        // that alternations do not nest.
        if in_alt {
            match chars[i] {
                '{' => return Err(invalid(address, "nested '{'")),
                '}' => in_alt = false,
                _ => {}
            }
            i += 1;
            continue;
        }
        match chars[i] {
            '[' => {
                let mut j = i + 1;
                if matches!(chars.get(j), Some('!') | Some('^')) {
                    j += 1;
                }
                // A literal ']' is allowed as the first class character.
                if chars.get(j) == Some(&']') {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    if chars[j] == '[' {
                        return Err(invalid(address, "nested '['"));
                    }
                    j += 1;
                }
                if j >= chars.len() {
                    return Err(invalid(address, "unterminated '['"));
                }
                i = j + 1;
            }
            ']' => return Err(invalid(address, "unmatched ']'")),
            '{' => {
                in_alt = true;
                i += 1;
            }
            '}' => return Err(invalid(address, "unmatched '}'")),
            _ => i += 1,
        }
    }
    if in_alt {
        return Err(invalid(address, "unterminated '{'"));
    }
    Ok(())
}

/// Validates the concrete (sent) form of an address: no whitespace and none
/// of the pattern metacharacters.
pub fn validate_concrete(address: &str) -> Result<(), RouteError> {
    if !address.starts_with('/') {
        return Err(invalid(address, "must begin with '/'"));
    }
    if address.chars().any(char::is_whitespace) {
        return Err(invalid(address, "must not contain whitespace"));
    }
    if let Some(c) = address.chars().find(|c| PATTERN_CHARS.contains(c)) {
        return Err(invalid(address, format!("contains reserved character {c:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_addresses_are_valid_in_both_forms() {
        for addr in ["/", "/a", "/address/test", "/mixer/1/fader"] {
            validate_address(addr).unwrap();
            validate_concrete(addr).unwrap();
        }
    }

    #[test]
    fn missing_slash_is_rejected() {
        assert!(validate_address("status").is_err());
        assert!(validate_concrete("status").is_err());
    }

    #[test]
    fn whitespace_is_rejected() {
        assert!(validate_address("/a b").is_err());
        assert!(validate_concrete("/a\tb").is_err());
    }

    #[test]
    fn patterns_are_valid_registrations_but_not_concrete() {
        for addr in ["/lfo/?", "/foo/*", "/foo/[a-c]", "/foo/{bar,baz}"] {
            validate_address(addr).unwrap();
            assert!(validate_concrete(addr).is_err(), "{addr} concrete");
        }
    }

    #[test]
    fn leading_literal_bracket_in_a_class_is_allowed() {
        validate_address("/foo/[]abc]").unwrap();
        validate_address("/foo/[!]abc]").unwrap();
    }

    #[test]
    fn unbalanced_brackets_are_rejected() {
        for addr in ["/foo/[a-c", "/foo/a-c]", "/foo/{bar", "/foo/bar}", "/x/[[a]]"] {
            assert!(validate_address(addr).is_err(), "{addr}");
        }
    }
}
