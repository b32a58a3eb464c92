// ABOUTME: Application name derived from the source repository name.
// ABOUTME: Sanitized to the hostname-safe subset the platform accepts for routes.

use std::fmt;

/// Name under which the application is pushed. Derived from the repository
/// name, since routes are minted from the app name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppName(String);

impl AppName {
    /// Build an app name from a repository name: lowercase, anything outside
    /// `[a-z0-9]` collapses to a hyphen, leading/trailing hyphens stripped.
    pub fn from_repo(repo: &str) -> Self {
        let mut name = String::with_capacity(repo.len());
        let mut last_hyphen = false;
        for c in repo.chars() {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() {
                name.push(c);
                last_hyphen = false;
            } else if !last_hyphen {
                name.push('-');
                last_hyphen = true;
            }
        }
        let name = name.trim_matches('-').to_string();
        if name.is_empty() {
            Self("app".to_string())
        } else {
            Self(name)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_simple_names() {
        assert_eq!(AppName::from_repo("guestbook").as_str(), "guestbook");
    }

    #[test]
    fn lowercases_and_collapses_punctuation() {
        assert_eq!(AppName::from_repo("My_App.rs").as_str(), "my-app-rs");
    }

    #[test]
    fn strips_edge_hyphens() {
        assert_eq!(AppName::from_repo("--weird--").as_str(), "weird");
    }

    #[test]
    fn falls_back_when_nothing_survives() {
        assert_eq!(AppName::from_repo("___").as_str(), "app");
    }
}
