// plan.rs — LLM planning for ambiguous intents.
//
// When no heuristic matches, the cheap model emits a JSON plan. The plan
// is validated against the known agent names and the step bound; anything
// unparseable or out of contract is coerced to a single data-query step
// carrying the raw user message, so a bad planner response can never take
// the turn down.

use serde::Deserialize;
use tracing::warn;

use sp_agents::AGENT_NAMES;

/// Upper bound on planner steps.
pub const MAX_PLAN_STEPS: usize = 4;

/// Prompt for the planning call.
pub const PLAN_PROMPT: &str = "\
You are a coordinator that classifies user questions and routes to specialist agents.
LANGUAGE: Always respond in English only.

Available specialists:
- suiteql: Expert SuiteQL engineer for ANY data retrieval from NetSuite \
(orders, invoices, customers, items, financial data, custom records).
- rag: Documentation/knowledge search. Use for 'how-to', error lookups, \
API reference, feature explanations.
- analysis: Data interpretation (aggregations, trends, comparisons). \
REQUIRES data from suiteql first.
- workspace: SuiteScript workspace operations: read/write/search files, \
propose code changes, review changesets.

Given the user's question, output ONLY a JSON plan (no markdown, no explanation):
{
  \"reasoning\": \"Brief explanation\",
  \"steps\": [
    {\"agent\": \"suiteql\", \"task\": \"Detailed task description\"}
  ],
  \"parallel\": false
}

RULES:
- Use the FEWEST agents necessary. Most questions need only 1 agent.
- For data questions: just suiteql. For docs: just rag. For code: just workspace.
- For complex analysis: suiteql then analysis (2 steps, sequential).
- For data questions involving dates, include the explicit date in the task.
- Maximum 4 steps.
";

/// One planned dispatch.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PlanStep {
    pub agent: String,
    pub task: String,
}

/// The validated plan for one turn.
#[derive(Debug, Clone)]
pub struct CoordinatorPlan {
    pub reasoning: String,
    pub steps: Vec<PlanStep>,
    pub parallel: bool,
}

impl CoordinatorPlan {
    /// The coercion target for any planning failure.
    pub fn fallback(user_message: &str) -> Self {
        Self {
            reasoning: "Fallback to data query".to_string(),
            steps: vec![PlanStep {
                agent: "suiteql".to_string(),
                task: user_message.to_string(),
            }],
            parallel: false,
        }
    }

    /// A single-step plan for a fixed route agent.
    pub fn single(agent: &str, task: &str) -> Self {
        Self {
            reasoning: String::new(),
            steps: vec![PlanStep {
                agent: agent.to_string(),
                task: task.to_string(),
            }],
            parallel: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    steps: Vec<PlanStep>,
    #[serde(default)]
    parallel: bool,
}

/// Parse and validate planner output, coercing failures to the fallback.
pub fn parse_plan(raw_text: &str, user_message: &str) -> CoordinatorPlan {
    // Tolerate surrounding prose by isolating the outermost braces.
    let trimmed = raw_text.trim();
    let candidate = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => {
            warn!("planner output had no JSON object; using fallback");
            return CoordinatorPlan::fallback(user_message);
        }
    };

    let raw: RawPlan = match serde_json::from_str(candidate) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, "planner output failed to parse; using fallback");
            return CoordinatorPlan::fallback(user_message);
        }
    };

    if raw.steps.is_empty() || raw.steps.len() > MAX_PLAN_STEPS {
        warn!(steps = raw.steps.len(), "planner step count out of bounds; using fallback");
        return CoordinatorPlan::fallback(user_message);
    }
    if raw
        .steps
        .iter()
        .any(|step| !AGENT_NAMES.contains(&step.agent.as_str()))
    {
        warn!("planner named an unknown agent; using fallback");
        return CoordinatorPlan::fallback(user_message);
    }

    CoordinatorPlan {
        reasoning: raw.reasoning,
        steps: raw.steps,
        parallel: raw.parallel,
    }
}
