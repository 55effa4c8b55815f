//! Push credentials and keeping them out of logs and results.
//!
//! A token is only ever embedded into the remote URL handed to git. Anything
//! that flows back out (stderr, error details) goes through [`redact`] first.

use std::fmt;

/// Replacement text for a redacted secret.
const MASK: &str = "***";

/// A bearer token used to authenticate pushes.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Credential(token.into())
    }

    /// Read a token from the named environment variable. Empty values count as unset.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Credential)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({MASK})")
    }
}

/// Embed the token as userinfo in an `http://` or `https://` URL.
///
/// Any userinfo already present is replaced. Other URL forms (SSH, local
/// paths) are returned unchanged since they authenticate differently.
pub fn authenticated_url(url: &str, credential: Option<&Credential>) -> String {
    let Some(credential) = credential else {
        return url.to_string();
    };

    let Some((scheme, rest)) = url
        .strip_prefix("https://")
        .map(|r| ("https://", r))
        .or_else(|| url.strip_prefix("http://").map(|r| ("http://", r)))
    else {
        return url.to_string();
    };

    let host_end = rest.find('/').unwrap_or(rest.len());
    let rest = match rest[..host_end].rfind('@') {
        Some(at) => &rest[at + 1..],
        None => rest,
    };

    format!("{scheme}{}@{rest}", credential.expose())
}

/// Strip userinfo from an `http(s)://` URL so it can be displayed.
pub fn display_url(url: &str) -> String {
    for scheme in ["https://", "http://"] {
        if let Some(rest) = url.strip_prefix(scheme) {
            let host_end = rest.find('/').unwrap_or(rest.len());
            if let Some(at) = rest[..host_end].rfind('@') {
                return format!("{scheme}{}", &rest[at + 1..]);
            }
        }
    }
    url.to_string()
}

/// Mask every occurrence of the token in `text`.
pub fn redact(text: &str, credential: Option<&Credential>) -> String {
    match credential {
        Some(c) if !c.expose().is_empty() => text.replace(c.expose(), MASK),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_debug_hides_token() {
        let c = Credential::new("ghp_secret");
        assert_eq!(format!("{c:?}"), "Credential(***)");
    }

    #[test]
    fn test_authenticated_url_https() {
        let c = Credential::new("tok");
        assert_eq!(
            authenticated_url("https://github.com/owner/repo.git", Some(&c)),
            "https://tok@github.com/owner/repo.git"
        );
    }

    #[test]
    fn test_authenticated_url_replaces_existing_userinfo() {
        let c = Credential::new("fresh");
        assert_eq!(
            authenticated_url("https://stale@github.com/owner/repo.git", Some(&c)),
            "https://fresh@github.com/owner/repo.git"
        );
    }

    #[test]
    fn test_authenticated_url_leaves_other_forms() {
        let c = Credential::new("tok");
        assert_eq!(
            authenticated_url("git@github.com:owner/repo.git", Some(&c)),
            "git@github.com:owner/repo.git"
        );
        assert_eq!(
            authenticated_url("/srv/git/logs.git", Some(&c)),
            "/srv/git/logs.git"
        );
        assert_eq!(
            authenticated_url("https://github.com/owner/repo.git", None),
            "https://github.com/owner/repo.git"
        );
    }

    #[test]
    fn test_display_url_strips_token() {
        assert_eq!(
            display_url("https://tok@github.com/owner/repo.git"),
            "https://github.com/owner/repo.git"
        );
        assert_eq!(display_url("/srv/git/logs.git"), "/srv/git/logs.git");
    }

    #[test]
    fn test_redact() {
        let c = Credential::new("s3cr3t");
        let text = "fatal: unable to access 'https://s3cr3t@github.com/o/r.git/'";
        let redacted = redact(text, Some(&c));
        assert!(!redacted.contains("s3cr3t"));
        assert!(redacted.contains("https://***@github.com"));
        assert_eq!(redact(text, None), text);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("ACHIEVEMENT_LOG_TEST_TOKEN", "  abc  ");
        assert_eq!(
            Credential::from_env("ACHIEVEMENT_LOG_TEST_TOKEN").map(|c| c.expose().to_string()),
            Some("abc".to_string())
        );

        std::env::set_var("ACHIEVEMENT_LOG_TEST_TOKEN", "");
        assert!(Credential::from_env("ACHIEVEMENT_LOG_TEST_TOKEN").is_none());

        std::env::remove_var("ACHIEVEMENT_LOG_TEST_TOKEN");
        assert!(Credential::from_env("ACHIEVEMENT_LOG_TEST_TOKEN").is_none());
    }
}
