// intent.rs — Fast heuristic intent classification.
//
// Rules are checked in order and the first match wins, so ordering is
// load-bearing: workspace-development phrases come first ("write a
// script" is development, not documentation), analysis phrases come
// before data-query phrases ("compare sales" must not be caught by the
// bare "sales" patterns), and a short numeric-only message short-circuits
// straight to data query. No rule match means ambiguous, which sends the
// coordinator to LLM planning.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Route categories for the classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Documentation,
    DataQuery,
    WorkspaceDev,
    Analysis,
    Ambiguous,
}

static NUMERIC_LOOKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#?\d{4,}$").unwrap());

static WORKSPACE_DEV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xi)
        \b(?:
            write\s+(?:a\s+)?(?:suite)?script |
            create\s+(?:a\s+)?(?:suite)?script |
            refactor\s+(?:the\s+)?(?:suite)?script |
            review\s+(?:the\s+)?(?:change|changeset|patch|code|script|pr) |
            propose\s+(?:a\s+)?(?:change|patch) |
            jest\s+test |
            unit\s+test |
            write\s+(?:a\s+)?test |
            workspace\s+file |
            read\s+(?:the\s+)?file |
            list\s+(?:the\s+)?files |
            search\s+(?:the\s+)?(?:workspace|codebase|scripts?) |
            sdf\s+(?:validate|deploy|project) |
            user\s*event\s*script |
            scheduled\s*script |
            suitelet |
            restlet |
            client\s*script |
            file\s*cabinet
        )\b",
    )
    .unwrap()
});

static DOCUMENTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xi)
        \b(?:
            how\s+(?:do|does|to|can)\s+(?:i|you|we) |
            what\s+is\s+(?:a|an|the)?\s*(?:suiteql|suitescript|netsuite|record\s+type) |
            explain\s+(?:the\s+)?(?:syntax|error|api|concept|difference) |
            documentation\s+(?:for|about|on) |
            error\s+(?:code|message)[\s:] |
            netsuite\s+(?:api|help|docs|documentation|reference|guide) |
            suiteql\s+(?:syntax|reference|docs|help) |
            suitescript\s+(?:api|module|reference|docs|help) |
            what\s+(?:tables?|fields?|columns?)\s+(?:are|does|do|should) |
            governance\s+(?:limit|unit|usage)
        )\b",
    )
    .unwrap()
});

static ANALYSIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xi)
        \b(?:
            (?:compare|comparison)\s+ |
            (?:trend|trending)\s+(?:for|of|in|over) |
            month\s*-?\s*over\s*-?\s*month |
            year\s*-?\s*over\s*-?\s*year |
            growth\s+(?:rate|trend|in) |
            (?:analyze|analyse)\s+(?:the\s+)? |
            (?:breakdown|break\s+down)\s+(?:the\s+|of\s+)?(?:data|sales|revenue|order|transaction) |
            (?:top|bottom)\s+\d+\s+(?:customer|item|product|vendor|category)s? |
            (?:chart|graph|visuali[sz]e)\s+(?:the\s+)?(?:data|sales|revenue)
        )",
    )
    .unwrap()
});

static DATA_QUERY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?xi)
        (?:
            \b(?:
                show\s+(?:me\s+)?(?:the\s+)?(?:latest|recent|last|all|open|pending|total) |
                (?:find|get|pull|fetch|retrieve|query)\s+ |
                how\s+many\s+(?:order|invoice|transaction|payment|bill|customer|item|vendor|sales)s? |
                sales\s+(?:order|total|amount|revenue|data|report) |
                revenue\s+(?:by|for|from|today|this|last) |
                (?:today|this\s+(?:week|month|quarter|year)|last\s+(?:week|month|quarter|year))(?:'s)?\s+(?:order|invoice|transaction|sales|revenue|payment) |
                tell\s+me\s+about\s+(?:[\#]|order|invoice|customer|transaction) |
                suiteql\s+(?:query|select) |
                run\s+(?:a\s+)?(?:query|suiteql|sql) |
                balance\s+(?:sheet|due|outstanding) |
                accounts?\s+(?:receivable|payable) |
                inventory\s+(?:levels?|count|on\s*hand|available)
            )\b |
            [\#]\d{4,} |
            (?:^|\s)(?:SO|INV|PO|JE|VB|RMA)\d{3,}
        )"#,
    )
    .unwrap()
});

/// Classify a user message without an LLM call.
pub fn classify_intent(user_message: &str) -> IntentType {
    let text = user_message.trim();

    // Bare document numbers are data lookups.
    if NUMERIC_LOOKUP.is_match(text) {
        return IntentType::DataQuery;
    }

    if WORKSPACE_DEV.is_match(text) {
        return IntentType::WorkspaceDev;
    }
    if DOCUMENTATION.is_match(text) {
        return IntentType::Documentation;
    }
    if ANALYSIS.is_match(text) {
        return IntentType::Analysis;
    }
    if DATA_QUERY.is_match(text) {
        return IntentType::DataQuery;
    }

    IntentType::Ambiguous
}
