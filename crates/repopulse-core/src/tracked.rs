use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A repository the user follows, identified by `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackedRepository {
    pub full_name: String,
}

impl TrackedRepository {
    pub fn parse(raw: &str) -> Result<Self> {
        let full_name = raw.trim();
        let (owner, name) = full_name
            .split_once('/')
            .ok_or_else(|| Error::InvalidRepository(format!("expected owner/name, got '{}'", raw)))?;

        if !is_valid_segment(owner) || !is_valid_segment(name) || name.contains('/') {
            return Err(Error::InvalidRepository(format!(
                "expected owner/name, got '{}'",
                raw
            )));
        }

        Ok(Self {
            full_name: full_name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        self.full_name.split('/').next().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.full_name.split('/').nth(1).unwrap_or_default()
    }
}

impl std::fmt::Display for TrackedRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_name)
    }
}

impl std::str::FromStr for TrackedRepository {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_names() {
        let repo = TrackedRepository::parse("octocat/Hello-World").unwrap();
        assert_eq!(repo.owner(), "octocat");
        assert_eq!(repo.name(), "Hello-World");
        assert_eq!(repo.to_string(), "octocat/Hello-World");

        assert!(TrackedRepository::parse(" rust-lang/rust.vim ").is_ok());
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        for raw in ["", "octocat", "/repo", "owner/", "a/b/c", "owner/..", "own er/repo"] {
            assert!(TrackedRepository::parse(raw).is_err(), "accepted '{}'", raw);
        }
    }
}
