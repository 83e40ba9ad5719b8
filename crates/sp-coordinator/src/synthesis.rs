// synthesis.rs — Synthesis prompt and agent-output sanitization.
//
// The synthesis call sees the user's question and compact agent
// summaries, nothing else. Internal reasoning blocks and raw SQL fences
// are stripped from agent data before it reaches the prompt, so they can
// never leak into the user-facing answer.

use once_cell::sync::Lazy;
use regex::Regex;

use sp_agents::AgentResult;

/// Prompt for the synthesis call. Persona, constraints, and formatting
/// only; tool inventories and dialect rules belong on the specialists.
pub const SYNTHESIS_PROMPT: &str = "\
You are synthesising the final answer for the user based on specialist agent results.

LANGUAGE: Always respond in English only.

FORMAT:
1. Start with a direct answer to the user's question in 1-2 sentences.
2. If agents returned data rows, present them in a markdown table. Include all rows.
3. If results returned 0 rows, say so clearly and suggest possible reasons.
4. If agents failed or timed out, briefly explain what happened and ASK the user
   a clarifying question to help narrow the search.

RULES:
- Preserve all numeric values EXACTLY as returned. Never round or convert.
- Do NOT fabricate data. Only use what agents returned.
- Be concise. No filler phrases or disclaimers.
- Format currency values with commas and 2 decimal places.
- Do NOT show raw SQL queries, tool call JSON, or internal parameters to the user.
- Do NOT echo the agents' <reasoning> blocks or internal planning text.
- Do NOT include tool names, tool IDs, or API call details.
";

/// Clarifying questions used when no agent produced anything usable.
pub const CLARIFYING_QUESTIONS: &[&str] = &[
    "Could you tell me the exact record type or transaction number you're interested in?",
    "Which date range should I look at?",
    "Could you rephrase the question with the specific field or table name?",
];

static REASONING_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<reasoning>.*?</reasoning>").unwrap());
static SQL_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)```sql.*?```").unwrap());

/// Strip internal blocks from agent output before synthesis.
pub fn sanitize_agent_data(data: &str) -> String {
    let without_reasoning = REASONING_BLOCK.replace_all(data, "");
    SQL_FENCE.replace_all(&without_reasoning, "").trim().to_string()
}

/// Render the per-agent outcome summaries fed to the synthesis call.
pub fn render_agent_summaries(results: &[AgentResult]) -> String {
    results
        .iter()
        .map(|result| {
            if result.success {
                format!(
                    "<agent name=\"{}\" status=\"ok\">\n{}\n</agent>",
                    result.agent_name,
                    sanitize_agent_data(&result.data)
                )
            } else {
                format!(
                    "<agent name=\"{}\" status=\"failed\">\n{}\n</agent>",
                    result.agent_name,
                    result.error.as_deref().unwrap_or("unknown failure")
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The canned answer for a turn with zero usable agent results. Never
/// fabricates data; always ends with a clarifying question.
pub fn no_results_answer(turn_index: usize) -> String {
    let question = CLARIFYING_QUESTIONS[turn_index % CLARIFYING_QUESTIONS.len()];
    format!(
        "I wasn't able to retrieve that information. None of the lookups \
         I tried returned usable results.\n\n{}",
        question
    )
}
