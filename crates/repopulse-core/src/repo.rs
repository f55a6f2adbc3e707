use serde::{Deserialize, Serialize};

/// Search/trending view of a hosted repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stars: u32,
    pub url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_zh: Option<String>,
}

impl RepoSummary {
    pub fn new(full_name: String, url: String) -> Self {
        Self {
            full_name,
            description: None,
            stars: 0,
            url,
            language: None,
            name_zh: None,
            description_zh: None,
        }
    }

    /// Short name, e.g. `rust` for `rust-lang/rust`
    pub fn name(&self) -> &str {
        self.full_name
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.full_name)
    }
}
