//! Text normalization and case helpers shared by models and the scrubber.

/// Lower-cases `input`, collapses runs of whitespace to a single space and
/// trims trailing whitespace.
pub fn clean(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut pending_space = false;

    for c in input.chars() {
        if c.is_whitespace() {
            pending_space = !output.is_empty();
            continue;
        }
        if pending_space {
            output.push(' ');
            pending_space = false;
        }
        output.extend(c.to_lowercase());
    }

    output
}

/// Cleans `input` and keeps only lower-case letters and ASCII digits.
///
/// Useful for seeding a PRNG in a way that disregards punctuation and case.
pub fn clean_token(input: &str) -> String {
    clean(input)
        .chars()
        .filter(|c| c.is_lowercase() || c.is_ascii_digit())
        .collect()
}

/// True when no alphabetic character of `s` is upper case.
pub fn is_lower(s: &str) -> bool {
    !s.chars().any(char::is_uppercase)
}

/// True when no alphabetic character of `s` is lower case.
pub fn is_upper(s: &str) -> bool {
    !s.chars().any(char::is_lowercase)
}

/// True when every word of `s` starts upper case and continues lower case.
pub fn is_title(s: &str) -> bool {
    let mut word_start = true;
    for c in s.chars() {
        if c.is_lowercase() && word_start {
            return false;
        }
        if c.is_uppercase() && !word_start {
            return false;
        }
        word_start = c == ' ';
    }
    true
}

/// Converts `s` to the case pattern of `like`.
///
/// Upper, lower and title case are recognized, checked in that order; any
/// other (mixed) pattern leaves `s` unchanged.
pub fn to_same_case(s: &str, like: &str) -> String {
    if is_upper(like) {
        s.to_uppercase()
    } else if is_lower(like) {
        s.to_lowercase()
    } else if is_title(like) {
        to_title(s)
    } else {
        s.to_string()
    }
}

fn to_title(s: &str) -> String {
    let mut output = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if word_start {
            output.extend(c.to_uppercase());
        } else {
            output.push(c);
        }
        word_start = c.is_whitespace();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean() {
        assert_eq!(clean("Hello, world!"), "hello, world!");
        assert_eq!(clean("   aHaHaHH    Ahah Hah"), "ahahahh ahah hah");
        assert_eq!(clean("tabs\tand\nnewlines  "), "tabs and newlines");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn test_clean_token() {
        assert_eq!(clean_token("Joe.Smith+1@Example.com"), "joesmith1examplecom");
        assert_eq!(clean_token("  --  "), "");
    }

    #[test]
    fn test_is_lower() {
        for input in ["hi", "hi world", "12873", "#@$*&"] {
            assert!(is_lower(input), "{input:?} should be lower");
        }
        for input in ["Hi", "HI", "HI world", "hi WORLD"] {
            assert!(!is_lower(input), "{input:?} should not be lower");
        }
    }

    #[test]
    fn test_is_title() {
        for input in ["Hi", "Hi World", "12873", "#@$*&"] {
            assert!(is_title(input), "{input:?} should be title");
        }
        for input in ["HI world", "hi World", "HI World"] {
            assert!(!is_title(input), "{input:?} should not be title");
        }
    }

    #[test]
    fn test_is_upper() {
        for input in ["HI", "HI WORLD", "12873", "#@$*&"] {
            assert!(is_upper(input), "{input:?} should be upper");
        }
        for input in ["Hi", "hi", "HI world", "hi WORLD"] {
            assert!(!is_upper(input), "{input:?} should not be upper");
        }
    }

    #[test]
    fn test_to_same_case() {
        assert_eq!(to_same_case("jane doe", "JOHN SMITH"), "JANE DOE");
        assert_eq!(to_same_case("Jane Doe", "john smith"), "jane doe");
        assert_eq!(to_same_case("jane doe", "John Smith"), "Jane Doe");
        assert_eq!(to_same_case("jane doe", "mcDonald"), "jane doe");
    }
}
