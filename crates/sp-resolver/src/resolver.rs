// resolver.rs — Candidate extraction and vernacular rendering.
//
// Candidates are quoted strings plus capitalized multi-word phrases. For
// each candidate the top mappings come back scored; when the top two are
// within a tight band a cheap LLM picks the winner, otherwise the top
// score stands. Output is a bounded bullet list; any failure anywhere
// yields the empty string.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use uuid::Uuid;

use sp_llm::{ChatMessage, ChatRequest, LlmAdapter};

use crate::mapping::{MappingStore, ScoredMapping};

/// Candidates per task and mappings fetched per candidate.
const MAX_CANDIDATES: usize = 5;
const TOP_K: usize = 3;

/// Score band within which the LLM breaks the tie.
const TIE_BAND: f64 = 0.1;

/// Minimum similarity worth mentioning at all.
const MIN_SCORE: f64 = 0.3;

/// Upper bound on the rendered vernacular block.
const MAX_VERNACULAR_CHARS: usize = 300;

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]{2,60})"|'([^']{2,60})'"#).unwrap());
static CAPITALIZED_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)+)\b").unwrap());

/// Extract candidate entity phrases from a task description.
pub fn extract_candidates(task: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    for capture in QUOTED.captures_iter(task) {
        if let Some(m) = capture.get(1).or_else(|| capture.get(2)) {
            push_unique(&mut candidates, m.as_str());
        }
    }

    for capture in CAPITALIZED_PHRASE.captures_iter(task) {
        if let Some(m) = capture.get(1) {
            push_unique(&mut candidates, m.as_str());
        }
    }

    candidates.truncate(MAX_CANDIDATES);
    candidates
}

fn push_unique(candidates: &mut Vec<String>, phrase: &str) {
    let trimmed = phrase.trim();
    if !trimmed.is_empty() && !candidates.iter().any(|c| c.eq_ignore_ascii_case(trimmed)) {
        candidates.push(trimmed.to_string());
    }
}

/// Resolves user vocabulary to script IDs for prompt injection.
pub struct EntityResolver<'a> {
    store: &'a dyn MappingStore,
    /// Cheap model used only for near-tie selection.
    llm: Option<&'a dyn LlmAdapter>,
    tie_break_model: String,
}

impl<'a> EntityResolver<'a> {
    pub fn new(store: &'a dyn MappingStore) -> Self {
        Self {
            store,
            llm: None,
            tie_break_model: String::new(),
        }
    }

    /// Enable LLM tie-breaking and return self (builder pattern).
    pub fn with_llm(mut self, llm: &'a dyn LlmAdapter, model: impl Into<String>) -> Self {
        self.llm = Some(llm);
        self.tie_break_model = model.into();
        self
    }

    /// Produce the tenant-vernacular block for a task, or the empty
    /// string when nothing resolves.
    pub async fn resolve(&self, tenant_id: Uuid, task: &str) -> String {
        let mut lines = Vec::new();

        for candidate in extract_candidates(task) {
            let scored = match self.store.search_similar(tenant_id, &candidate, TOP_K).await {
                Ok(scored) => scored,
                Err(err) => {
                    debug!(error = %err, "mapping search failed; skipping candidate");
                    continue;
                }
            };

            let Some(best) = self.select(&candidate, &scored).await else {
                continue;
            };
            if best.score < MIN_SCORE {
                continue;
            }

            let line = format!(
                "- \"{}\" → {}",
                best.mapping.natural_name, best.mapping.script_id
            );
            let rendered_len: usize =
                lines.iter().map(|l: &String| l.len() + 1).sum::<usize>() + line.len();
            if rendered_len > MAX_VERNACULAR_CHARS {
                break;
            }
            lines.push(line);
        }

        lines.join("\n")
    }

    async fn select(&self, candidate: &str, scored: &[ScoredMapping]) -> Option<ScoredMapping> {
        let top = scored.first()?;
        let Some(runner_up) = scored.get(1) else {
            return Some(top.clone());
        };

        if top.score - runner_up.score > TIE_BAND {
            return Some(top.clone());
        }

        // Near tie: let the cheap model choose, falling back to the top.
        let Some(llm) = self.llm else {
            return Some(top.clone());
        };

        let options: Vec<String> = scored
            .iter()
            .map(|s| format!("{} ({})", s.mapping.script_id, s.mapping.natural_name))
            .collect();
        let request = ChatRequest {
            model: self.tie_break_model.clone(),
            max_tokens: 64,
            system: "Pick the script ID that best matches the user's phrase. \
                     Reply with the script ID only."
                .to_string(),
            messages: vec![ChatMessage::user_text(format!(
                "Phrase: {}\nOptions:\n{}",
                candidate,
                options.join("\n")
            ))],
            tools: Vec::new(),
        };

        match llm.create_message(&request).await {
            Ok(response) => {
                let answer = response.text();
                let answer = answer.trim();
                scored
                    .iter()
                    .find(|s| answer.contains(&s.mapping.script_id))
                    .cloned()
                    .or_else(|| Some(top.clone()))
            }
            Err(err) => {
                debug!(error = %err, "tie-break call failed; taking top score");
                Some(top.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolverError;
    use crate::mapping::EntityMapping;
    use crate::trigram::similarity;
    use async_trait::async_trait;

    struct FixtureStore {
        mappings: Vec<EntityMapping>,
    }

    #[async_trait]
    impl MappingStore for FixtureStore {
        async fn upsert_mapping(&self, _mapping: EntityMapping) -> Result<(), ResolverError> {
            Ok(())
        }

        async fn search_similar(
            &self,
            tenant_id: Uuid,
            phrase: &str,
            k: usize,
        ) -> Result<Vec<ScoredMapping>, ResolverError> {
            let mut scored: Vec<ScoredMapping> = self
                .mappings
                .iter()
                .filter(|m| m.tenant_id == tenant_id)
                .map(|m| ScoredMapping {
                    score: similarity(phrase, &m.natural_name),
                    mapping: m.clone(),
                })
                .filter(|s| s.score > 0.0)
                .collect();
            scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
            scored.truncate(k);
            Ok(scored)
        }
    }

    #[test]
    fn extracts_quoted_and_capitalized_phrases() {
        let candidates =
            extract_candidates("Show revenue by \"Sales Channel\" for Acme Corp this month");
        assert!(candidates.contains(&"Sales Channel".to_string()));
        assert!(candidates.contains(&"Acme Corp".to_string()));
    }

    #[test]
    fn candidates_are_deduplicated() {
        let candidates = extract_candidates("\"Sales Channel\" vs Sales Channel");
        assert_eq!(
            candidates
                .iter()
                .filter(|c| c.eq_ignore_ascii_case("sales channel"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn resolves_known_entity_to_script_id() {
        let tenant = Uuid::new_v4();
        let store = FixtureStore {
            mappings: vec![EntityMapping::new(
                tenant,
                "custom_field",
                "custbody_channel",
                "Sales Channel",
            )],
        };

        let resolver = EntityResolver::new(&store);
        let vernacular = resolver
            .resolve(tenant, "How much revenue per \"Sales Channel\" today?")
            .await;
        assert_eq!(vernacular, "- \"Sales Channel\" → custbody_channel");
    }

    #[tokio::test]
    async fn unknown_entities_yield_empty_string() {
        let store = FixtureStore { mappings: vec![] };
        let resolver = EntityResolver::new(&store);
        let vernacular = resolver
            .resolve(Uuid::new_v4(), "total for \"Quantum Flux\" today")
            .await;
        assert!(vernacular.is_empty());
    }

    #[tokio::test]
    async fn other_tenants_mappings_are_invisible() {
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();
        let store = FixtureStore {
            mappings: vec![EntityMapping::new(
                tenant_a,
                "custom_field",
                "custbody_channel",
                "Sales Channel",
            )],
        };

        let resolver = EntityResolver::new(&store);
        let vernacular = resolver
            .resolve(tenant_b, "revenue by \"Sales Channel\"")
            .await;
        assert!(vernacular.is_empty());
    }

    #[tokio::test]
    async fn output_stays_within_the_character_budget() {
        let tenant = Uuid::new_v4();
        let mappings = (0..10)
            .map(|i| {
                EntityMapping::new(
                    tenant,
                    "custom_field",
                    format!("custbody_field_with_long_name_{}", i),
                    format!("Widget Field {}", i),
                )
            })
            .collect();
        let store = FixtureStore { mappings };
        let resolver = EntityResolver::new(&store);

        let task = (0..10)
            .map(|i| format!("\"Widget Field {}\"", i))
            .collect::<Vec<_>>()
            .join(" and ");
        let vernacular = resolver.resolve(tenant, &task).await;
        assert!(vernacular.len() <= MAX_VERNACULAR_CHARS);
    }
}
