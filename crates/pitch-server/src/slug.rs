//! Public slug generation.
//!
//! A slug is the project name reduced to `[a-z0-9-]`, followed by a
//! random suffix. Uniqueness is enforced by the publish transaction;
//! callers retry with a fresh slug on collision.

use rand::Rng;
use rand::distr::Alphanumeric;

const MAX_STEM_LEN: usize = 40;
const SUFFIX_LEN: usize = 6;

fn stem(project_name: &str) -> String {
    let mut out = String::new();
    let mut pending_dash = false;
    for c in project_name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if out.len() >= MAX_STEM_LEN {
            break;
        }
    }
    if out.is_empty() {
        out.push_str("pitch");
    }
    out
}

/// A fresh slug candidate for `project_name`.
pub fn generate(project_name: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}-{suffix}", stem(project_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_collapses_punctuation() {
        assert_eq!(stem("Acme & Sons, Ltd."), "acme-sons-ltd");
        assert_eq!(stem("  --  "), "pitch");
        assert_eq!(stem("Café Rouge"), "caf-rouge");
    }

    #[test]
    fn generated_slug_is_url_safe() {
        let slug = generate("Acme Consulting");
        assert!(slug.starts_with("acme-consulting-"));
        assert_eq!(slug.len(), "acme-consulting-".len() + SUFFIX_LEN);
        assert!(
            slug.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        );
    }

    #[test]
    fn long_names_are_truncated() {
        let slug = generate(&"x".repeat(200));
        assert!(slug.len() <= MAX_STEM_LEN + 1 + SUFFIX_LEN);
    }

    #[test]
    fn candidates_differ() {
        assert_ne!(generate("Acme"), generate("Acme"));
    }
}
