//! Deterministic, shape-preserving masking.
//!
//! Masking scrambles ASCII letters and the digits 1-9 with a PRNG seeded by
//! the value itself, so the same value always masks the same way without a
//! lookup table. Length, case, punctuation, whitespace and the digit `0` are
//! preserved.

use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;

use crate::seed;

/// Values at least this long are always masked as a single word.
const SPECIAL_CASE_LIMIT: usize = 1024;

/// Pre-compiled patterns for the special-case shapes.
struct MaskPatterns {
    email: Regex,
    extension: Regex,
}

impl MaskPatterns {
    fn instance() -> &'static Self {
        static PATTERNS: OnceLock<MaskPatterns> = OnceLock::new();
        PATTERNS.get_or_init(Self::compile)
    }

    fn compile() -> Self {
        Self {
            email: Regex::new(
                r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*$",
            )
            .expect("Invalid email pattern"),
            extension: Regex::new(r"\.[a-z]{1,5}$").expect("Invalid extension pattern"),
        }
    }
}

/// Salted masking function.
#[derive(Debug, Clone, Default)]
pub struct Masker {
    salt: String,
}

impl Masker {
    /// Creates a masker; an empty salt is allowed.
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// Masks a value, special-casing short e-mail addresses, URLs and
    /// file names.
    ///
    /// - `joe@example.com`: local part and domain prefix masked, `.com` kept
    /// - `https://user@host.example.org:8080/path?q=v#frag`: scheme, port,
    ///   final host label and query keys kept, everything else masked
    /// - `report.pdf`: stem masked, extension kept
    pub fn mask(&self, s: &str) -> String {
        if s.len() < SPECIAL_CASE_LIMIT {
            let patterns = MaskPatterns::instance();

            if !s.contains(' ') && patterns.email.is_match(s) {
                if let Some(masked) = self.mask_email(s) {
                    return masked;
                }
            }

            if let Some(masked) = self.mask_url(s) {
                return masked;
            }

            if let Some(found) = patterns.extension.find(s) {
                let (stem, extension) = s.split_at(found.start());
                return format!("{}{}", self.mask_word(stem), extension);
            }
        }

        self.mask_word(s)
    }

    /// Scrambles letters and nonzero digits, preserving everything else.
    pub fn mask_word(&self, s: &str) -> String {
        let mut rng = seed::salted_rng_for(&self.salt, s);
        s.chars()
            .map(|c| match c {
                'a'..='z' => char::from(b'a' + (rng.random::<u32>() % 26) as u8),
                'A'..='Z' => char::from(b'A' + (rng.random::<u32>() % 26) as u8),
                '1'..='9' => char::from(b'1' + (rng.random::<u32>() % 9) as u8),
                other => other,
            })
            .collect()
    }

    fn mask_email(&self, s: &str) -> Option<String> {
        let (local, domain) = s.rsplit_once('@')?;
        match domain.rfind('.') {
            Some(dot) if dot > 0 => {
                let (prefix, tld) = domain.split_at(dot);
                Some(format!(
                    "{}@{}{}",
                    self.mask_word(local),
                    self.mask_word(prefix),
                    tld
                ))
            }
            _ => Some(format!(
                "{}@{}",
                self.mask_word(local),
                self.mask_word(domain)
            )),
        }
    }

    fn mask_host(&self, host: &str) -> String {
        if host.starts_with('[') {
            return self.mask_word(host);
        }
        match host.rfind('.') {
            Some(dot) => {
                let (prefix, label) = host.split_at(dot);
                format!("{}{}", self.mask_word(prefix), label)
            }
            None => self.mask_word(host),
        }
    }

    fn mask_authority(&self, authority: &str) -> String {
        let (userinfo, host_port) = match authority.rsplit_once('@') {
            Some((userinfo, host_port)) => (Some(userinfo), host_port),
            None => (None, authority),
        };

        let (host, port) = match host_port.rsplit_once(':') {
            Some((host, port))
                if !port.is_empty()
                    && port.bytes().all(|b| b.is_ascii_digit())
                    && !host.ends_with(':') =>
            {
                (host, Some(port))
            }
            _ => (host_port, None),
        };

        let mut out = String::with_capacity(authority.len());
        if let Some(userinfo) = userinfo {
            out.push_str(&self.mask_word(userinfo));
            out.push('@');
        }
        out.push_str(&self.mask_host(host));
        if let Some(port) = port {
            out.push(':');
            out.push_str(port);
        }
        out
    }

    fn mask_query(&self, query: &str) -> String {
        query
            .split('&')
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => format!("{}={}", key, self.mask_word(value)),
                None => pair.to_string(),
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    fn mask_url(&self, s: &str) -> Option<String> {
        let parsed = url::Url::parse(s).ok()?;
        parsed.host_str()?;
        let (scheme, rest) = s.split_once("://")?;

        let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (authority, rest) = rest.split_at(authority_end);

        let (rest, fragment) = match rest.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (rest, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        let mut out = String::with_capacity(s.len());
        out.push_str(scheme);
        out.push_str("://");
        out.push_str(&self.mask_authority(authority));
        out.push_str(&self.mask_word(path));
        if let Some(query) = query {
            out.push('?');
            out.push_str(&self.mask_query(query));
        }
        if let Some(fragment) = fragment {
            out.push('#');
            out.push_str(&self.mask_word(fragment));
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn masker() -> Masker {
        Masker::new("")
    }

    #[test]
    fn test_mask_word_is_deterministic() {
        let m = masker();
        assert_eq!(m.mask_word("Jane Doe 42"), m.mask_word("Jane Doe 42"));
        assert_ne!(m.mask_word("Jane Doe 42"), "Jane Doe 42");
    }

    #[test]
    fn test_mask_word_preserves_shape() {
        let out = masker().mask_word("Ab-0 9z!");
        let chars: Vec<char> = out.chars().collect();
        assert_eq!(chars.len(), 8);
        assert!(chars[0].is_ascii_uppercase());
        assert!(chars[1].is_ascii_lowercase());
        assert_eq!(chars[2], '-');
        assert_eq!(chars[3], '0');
        assert_eq!(chars[4], ' ');
        assert!(('1'..='9').contains(&chars[5]));
        assert!(chars[6].is_ascii_lowercase());
        assert_eq!(chars[7], '!');
    }

    #[test]
    fn test_salt_diversifies() {
        let plain = Masker::new("").mask_word("secret");
        let salted = Masker::new("pepper").mask_word("secret");
        assert_ne!(plain, salted);
        assert_eq!(salted, Masker::new("pepper").mask_word("secret"));
    }

    #[test]
    fn test_mask_email_keeps_tld() {
        let m = masker();
        let out = m.mask("joe@foo.com");
        assert_eq!(out, m.mask("joe@foo.com"));
        assert_eq!(out.len(), "joe@foo.com".len());
        assert_eq!(out.find('@'), Some(3));
        assert!(out.ends_with(".com"));
        assert_ne!(&out[..3], "joe");
        assert_eq!(out, format!("{}@{}.com", m.mask_word("joe"), m.mask_word("foo")));
    }

    #[test]
    fn test_mask_email_shares_domain_mask() {
        let m = masker();
        let a = m.mask("t@example.com");
        let b = m.mask("p@example.com");
        assert_eq!(a[2..], b[2..]);
    }

    #[test]
    fn test_mask_email_without_dot() {
        let m = masker();
        let out = m.mask("root@localhost");
        assert_eq!(out, format!("{}@{}", m.mask_word("root"), m.mask_word("localhost")));
    }

    #[test]
    fn test_mask_extension() {
        let m = masker();
        let out = m.mask("quarterly report.pdf");
        assert!(out.ends_with(".pdf"));
        assert_eq!(out, format!("{}.pdf", m.mask_word("quarterly report")));
    }

    #[test]
    fn test_mask_url() {
        let m = masker();
        let input = "https://alice@files.example.org:8443/users/42/avatar?size=large&v=2#top";
        let out = m.mask(input);

        assert_eq!(out.len(), input.len());
        assert!(out.starts_with("https://"));
        assert!(out.contains(".org:8443/"));
        assert!(out.contains("?size="));
        assert!(out.contains("&v="));
        assert!(!out.contains("alice"));
        assert!(!out.contains("files"));
        assert!(!out.contains("users"));
        assert!(!out.contains("large"));
    }

    #[test]
    fn test_long_values_skip_special_cases() {
        let m = masker();
        let long = format!("{}@example.com", "a".repeat(SPECIAL_CASE_LIMIT));
        assert_eq!(m.mask(&long), m.mask_word(&long));
    }

    #[test]
    fn test_non_ascii_passes_through() {
        let out = masker().mask_word("Zoë Ørsted");
        assert_eq!(out.chars().nth(2), Some('ë'));
        assert_eq!(out.chars().nth(4), Some('Ø'));
    }

    proptest! {
        /// Masking never changes characters outside [a-zA-Z1-9] and keeps byte length.
        #[test]
        fn prop_mask_preserves_shape(input in "[a-zA-Z0-9 @./:?&=#_-]{0,64}") {
            let out = masker().mask(&input);
            prop_assert_eq!(out.len(), input.len());
            for (a, b) in input.chars().zip(out.chars()) {
                if a.is_ascii_lowercase() {
                    prop_assert!(b.is_ascii_lowercase());
                } else if a.is_ascii_uppercase() {
                    prop_assert!(b.is_ascii_uppercase());
                } else if ('1'..='9').contains(&a) {
                    prop_assert!(('1'..='9').contains(&b));
                } else {
                    prop_assert_eq!(a, b);
                }
            }
        }

        /// The same input always masks to the same output.
        #[test]
        fn prop_mask_is_deterministic(input in ".{0,64}") {
            prop_assert_eq!(masker().mask(&input), masker().mask(&input));
        }
    }
}
