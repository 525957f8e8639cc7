/// Normalized subscriber email: validated against `local@domain.tld`, trimmed and lowercased.
/// This is the uniqueness key of the subscribers collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<SubscriberEmail, String> {
        if !matches_email_pattern(&email) {
            return Err(format!("{} email is not valid", email));
        }

        Ok(Self(email.trim_matches(is_pattern_whitespace).to_lowercase()))
    }
}

/// Mirrors `^[^\s@]+@[^\s@]+\.[^\s@]+$`: no whitespace anywhere, exactly one `@`, and a dot in the
/// domain part with at least one character on each side of it.
fn matches_email_pattern(email: &str) -> bool {
    if email.chars().any(is_pattern_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // The regex backtracks over every dot in the domain, so any dot with a non-empty head and tail
    // is enough.
    domain
        .char_indices()
        .filter(|(_, c)| *c == '.')
        .any(|(idx, _)| idx > 0 && idx + 1 < domain.len())
}

/// The `\s` class of ECMAScript regular expressions. It differs from `char::is_whitespace`: it
/// includes U+FEFF and excludes U+0085.
fn is_pattern_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t'
            | '\n'
            | '\u{0B}'
            | '\u{0C}'
            | '\r'
            | ' '
            | '\u{A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
