use crate::{
    model::LanguageModel,
    schema::{parse_entries, TranslationEntry},
    Result,
};
use repopulse_core::{ActivityItem, RepoSummary};
use std::sync::Arc;

/// Records per model call
const BATCH_SIZE: usize = 20;

/// Translated `(name, description)` pair; `None` where nothing came back
pub type Translation = (Option<String>, Option<String>);

/// Batch translator over a [`LanguageModel`], using a JSON-array reply format
#[derive(Clone)]
pub struct Translator {
    model: Arc<dyn LanguageModel>,
    target_language: String,
}

impl Translator {
    pub fn new(model: Arc<dyn LanguageModel>, target_language: &str) -> Self {
        Self {
            model,
            target_language: target_language.to_string(),
        }
    }

    /// Translate `(name, description)` pairs.
    ///
    /// The output always has exactly one entry per input, in input order.
    /// Replies with missing, extra or unparseable entries are padded with
    /// `None`; only a failed model call is an error.
    pub async fn batch_translate(&self, items: &[(String, Option<String>)]) -> Result<Vec<Translation>> {
        let mut output = Vec::with_capacity(items.len());

        for chunk in items.chunks(BATCH_SIZE) {
            output.extend(self.translate_chunk(chunk).await?);
        }

        Ok(output)
    }

    async fn translate_chunk(&self, items: &[(String, Option<String>)]) -> Result<Vec<Translation>> {
        let mut result: Vec<Translation> = vec![(None, None); items.len()];
        if items.iter().all(|(name, desc)| name.trim().is_empty() && desc.is_none()) {
            return Ok(result);
        }

        let reply = self.model.complete(&self.build_prompt(items)).await?;

        let entries = match parse_entries(&reply) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Unparseable translation reply, leaving {} items untranslated: {}", items.len(), e);
                return Ok(result);
            }
        };

        if entries.len() != items.len() {
            tracing::warn!(
                "Translation count mismatch: requested {}, received {}",
                items.len(),
                entries.len()
            );
        }

        for TranslationEntry {
            index,
            name,
            description,
        } in entries
        {
            match result.get_mut(index) {
                Some(slot) => *slot = (non_empty(name), non_empty(description)),
                None => tracing::warn!("Dropping translation with out-of-range index {}", index),
            }
        }

        Ok(result)
    }

    fn build_prompt(&self, items: &[(String, Option<String>)]) -> String {
        let records: Vec<serde_json::Value> = items
            .iter()
            .enumerate()
            .map(|(index, (name, description))| {
                serde_json::json!({
                    "index": index,
                    "name": name,
                    "description": description,
                })
            })
            .collect();

        format!(
            r#"Translate the "name" and "description" of each record below into {language}.

Return ONLY a JSON array with exactly {count} objects, one per input record, in this form:
[{{"index": 0, "name": "...", "description": "..."}}]

Keep each "index" unchanged. Use null where the input field is null. Keep code identifiers, project names and URLs as they are.

Records:
{records}"#,
            language = language_name(&self.target_language),
            count = items.len(),
            records = serde_json::Value::Array(records),
        )
    }

    /// Fill `name_zh`/`description_zh` on repository summaries
    pub async fn translate_repos(&self, repos: &mut [RepoSummary]) -> Result<()> {
        let pairs: Vec<(String, Option<String>)> = repos
            .iter()
            .map(|r| (r.name().to_string(), r.description.clone()))
            .collect();

        let translated = self.batch_translate(&pairs).await?;
        for (repo, (name, description)) in repos.iter_mut().zip(translated) {
            repo.name_zh = name;
            repo.description_zh = description;
        }
        Ok(())
    }

    /// Fill `title_zh`/`description_zh` on activity items
    pub async fn translate_items(&self, items: &mut [ActivityItem]) -> Result<()> {
        let pairs: Vec<(String, Option<String>)> = items
            .iter()
            .map(|i| (i.headline().to_string(), i.description.as_deref().map(truncate)))
            .collect();

        let translated = self.batch_translate(&pairs).await?;
        for (item, (title, description)) in items.iter_mut().zip(translated) {
            item.title_zh = title;
            item.description_zh = description;
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Long bodies are cut to keep prompts bounded
fn truncate(text: &str) -> String {
    const LIMIT: usize = 500;
    match text.char_indices().nth(LIMIT) {
        Some((byte, _)) => format!("{}...", &text[..byte]),
        None => text.to_string(),
    }
}

pub(crate) fn language_name(code: &str) -> &str {
    match code.to_lowercase().as_str() {
        "zh" | "zh-cn" | "zh_cn" => "Simplified Chinese",
        "zh-tw" | "zh_tw" => "Traditional Chinese",
        "en" => "English",
        "ja" => "Japanese",
        "ko" => "Korean",
        _ => code,
    }
}
