//! URL cleaning for header links.

use url::Url;

/// Normalizes a user-supplied link into an absolute URL.
///
/// A missing `http(s)://` scheme is replaced by `https://`. Anything that does not
/// parse afterwards yields `None`; a malformed string is never passed through.
pub fn clean_url(input: &str) -> Option<String> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    let candidate = if has_http_scheme(s) {
        s.to_string()
    } else {
        format!("https://{s}")
    };
    let url = Url::parse(&candidate).ok()?;
    url.host_str()?;
    Some(url.to_string())
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_is_prepended() {
        assert_eq!(
            clean_url("linkedin.com/in/jdoe").as_deref(),
            Some("https://linkedin.com/in/jdoe")
        );
    }

    #[test]
    fn test_existing_scheme_kept() {
        assert_eq!(
            clean_url("http://github.com/jdoe").as_deref(),
            Some("http://github.com/jdoe")
        );
        assert_eq!(
            clean_url("HTTPS://Example.com/Me").as_deref(),
            Some("https://example.com/Me")
        );
    }

    #[test]
    fn test_bare_host_gets_root_path() {
        assert_eq!(
            clean_url("jdoe.dev").as_deref(),
            Some("https://jdoe.dev/")
        );
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(clean_url("not a url at all"), None);
        assert_eq!(clean_url(""), None);
        assert_eq!(clean_url("   "), None);
        assert_eq!(clean_url("https://"), None);
    }

    #[test]
    fn test_cleaning_is_stable() {
        let once = clean_url("jdoe.dev/projects").unwrap();
        assert_eq!(clean_url(&once).as_deref(), Some(once.as_str()));
    }
}
