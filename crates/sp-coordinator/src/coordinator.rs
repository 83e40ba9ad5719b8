// coordinator.rs — The multi-agent coordinator.
//
// One turn: classify (heuristics, then LLM planning for the ambiguous
// remainder), dispatch specialists under a shared output-token budget,
// synthesize, stream. Specialist failures degrade into the answer; only
// a dropped event receiver (caller cancellation) aborts the turn, and it
// does so between calls, never mid-write.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use sp_agents::{
    analysis_spec, rag_spec, suiteql_spec, workspace_spec, AgentResult, AgentRunner, AgentSpec,
    ToolCallRecord,
};
use sp_llm::{ChatMessage, ChatRequest, LlmAdapter, StreamEvent};
use sp_policy::{PolicyProfile, PolicyStore};
use sp_resolver::{EntityResolver, MappingStore};
use sp_tools::{Dispatcher, ToolContext};

use crate::intent::{classify_intent, IntentType};
use crate::plan::{parse_plan, CoordinatorPlan, PlanStep, PLAN_PROMPT};
use crate::route::route_for;
use crate::stream::ChatEvent;
use crate::synthesis::{no_results_answer, render_agent_summaries, SYNTHESIS_PROMPT};

/// Models and limits for one coordinator instance.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Model used by every specialist.
    pub specialist_model: String,
    /// Cheap model for planning and entity tie-breaks.
    pub planner_model: String,
    /// Model for the final synthesis call.
    pub synthesis_model: String,
    /// Output-token budget shared by all agent calls in one turn.
    pub agent_token_budget: u64,
    /// Whether a failed step may insert repair steps once.
    pub repair_retry: bool,
    /// Tenant custom-field catalogue injected into the suiteql prompt.
    pub field_catalogue: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            specialist_model: "specialist-small".to_string(),
            planner_model: "planner-small".to_string(),
            synthesis_model: "synthesis-large".to_string(),
            agent_token_budget: 60_000,
            repair_retry: true,
            field_catalogue: String::new(),
        }
    }
}

/// The non-streaming result of a turn.
#[derive(Debug, Clone)]
pub struct CoordinatorResult {
    pub content: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub intent: IntentType,
}

/// Coordinates routing, specialist dispatch, and synthesis.
pub struct Coordinator {
    llm: Arc<dyn LlmAdapter>,
    runner: AgentRunner,
    dispatcher: Arc<Dispatcher>,
    policies: Arc<dyn PolicyStore>,
    mappings: Arc<dyn MappingStore>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(
        llm: Arc<dyn LlmAdapter>,
        runner: AgentRunner,
        dispatcher: Arc<Dispatcher>,
        policies: Arc<dyn PolicyStore>,
        mappings: Arc<dyn MappingStore>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            llm,
            runner,
            dispatcher,
            policies,
            mappings,
            config,
        }
    }

    /// Run one turn, streaming events as they happen. The stream ends
    /// with exactly one `Message` event unless the receiver is dropped.
    pub fn run_streaming(
        self: &Arc<Self>,
        ctx: ToolContext,
        user_message: String,
    ) -> ReceiverStream<ChatEvent> {
        let (tx, rx) = mpsc::channel(32);
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            coordinator.run_turn(ctx, user_message, tx).await;
        });
        ReceiverStream::new(rx)
    }

    /// Run one turn to completion, returning the terminal message.
    pub async fn run(
        self: &Arc<Self>,
        ctx: ToolContext,
        user_message: String,
    ) -> CoordinatorResult {
        let intent = classify_intent(&user_message);
        let mut stream = self.run_streaming(ctx, user_message);

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        while let Some(event) = stream.next().await {
            if let ChatEvent::Message {
                content: message,
                tool_calls: calls,
            } = event
            {
                content = message;
                tool_calls = calls;
            }
        }

        CoordinatorResult {
            content,
            tool_calls,
            intent,
        }
    }

    async fn run_turn(&self, ctx: ToolContext, user_message: String, tx: mpsc::Sender<ChatEvent>) {
        // The active policy is loaded once and immutable for the turn.
        let policy = match self.policies.get_active(ctx.tenant_id).await {
            Ok(policy) => policy,
            Err(err) => {
                warn!(error = %err, "policy load failed; continuing without policy");
                None
            }
        };

        let plan = self.route(&ctx, &user_message).await;
        info!(
            tenant_id = %ctx.tenant_id,
            correlation_id = %ctx.correlation_id,
            steps = plan.steps.len(),
            parallel = plan.parallel,
            "turn planned"
        );

        let vernacular = if plan.steps.iter().any(|step| step.agent == "suiteql") {
            let resolver = EntityResolver::new(self.mappings.as_ref())
                .with_llm(self.llm.as_ref(), &self.config.planner_model);
            resolver.resolve(ctx.tenant_id, &user_message).await
        } else {
            String::new()
        };

        let results = self
            .dispatch(&ctx, plan, policy.as_ref(), &vernacular, &tx)
            .await;

        self.synthesize(&user_message, results, tx).await;
    }

    async fn route(&self, _ctx: &ToolContext, user_message: &str) -> CoordinatorPlan {
        let intent = classify_intent(user_message);
        if let Some(route) = route_for(intent) {
            let steps = route
                .agents
                .iter()
                .map(|agent| PlanStep {
                    agent: (*agent).to_string(),
                    task: user_message.to_string(),
                })
                .collect();
            return CoordinatorPlan {
                reasoning: format!("heuristic:{:?}", intent),
                steps,
                parallel: route.parallel,
            };
        }

        // Ambiguous: ask the cheap model for a plan.
        let request = ChatRequest {
            model: self.config.planner_model.clone(),
            max_tokens: 1024,
            system: PLAN_PROMPT.to_string(),
            messages: vec![ChatMessage::user_text(user_message)],
            tools: Vec::new(),
        };
        match self.llm.create_message(&request).await {
            Ok(response) => parse_plan(&response.text(), user_message),
            Err(err) => {
                warn!(error = %err, "planner call failed; using fallback plan");
                CoordinatorPlan::fallback(user_message)
            }
        }
    }

    fn spec_for(&self, agent: &str, vernacular: &str) -> AgentSpec {
        match agent {
            "suiteql" => suiteql_spec(
                self.dispatcher.catalog(),
                &self.config.field_catalogue,
                vernacular,
            ),
            "rag" => rag_spec(Vec::new()),
            "workspace" => workspace_spec(self.dispatcher.catalog()),
            _ => analysis_spec(),
        }
    }

    async fn dispatch(
        &self,
        ctx: &ToolContext,
        plan: CoordinatorPlan,
        policy: Option<&PolicyProfile>,
        vernacular: &str,
        tx: &mpsc::Sender<ChatEvent>,
    ) -> Vec<AgentResult> {
        let mut results: Vec<AgentResult> = Vec::new();
        let mut spent_output_tokens: u64 = 0;
        let mut repair_inserted = false;

        if plan.parallel && plan.steps.len() > 1 {
            // Fan out siblings and join; a failed sibling is just a
            // failed result, never an exception to its peers.
            let tasks: Vec<_> = plan
                .steps
                .iter()
                .map(|step| {
                    let spec = self.spec_for(&step.agent, vernacular);
                    async move {
                        self.runner
                            .run(
                                &spec,
                                &self.config.specialist_model,
                                &step.task,
                                None,
                                policy,
                                ctx,
                            )
                            .await
                    }
                })
                .collect();

            for step in &plan.steps {
                let _ = tx
                    .send(ChatEvent::ToolStatus {
                        agent: step.agent.clone(),
                        status: "running".to_string(),
                    })
                    .await;
            }
            let mut joined = futures::future::join_all(tasks).await;
            for result in &joined {
                let _ = tx
                    .send(ChatEvent::ToolStatus {
                        agent: result.agent_name.clone(),
                        status: if result.success { "completed" } else { "failed" }.to_string(),
                    })
                    .await;
            }
            results.append(&mut joined);
            return results;
        }

        let mut queue: VecDeque<PlanStep> = plan.steps.into();
        while let Some(step) = queue.pop_front() {
            if spent_output_tokens >= self.config.agent_token_budget {
                warn!(
                    agent = %step.agent,
                    spent_output_tokens,
                    "token budget exhausted; skipping remaining steps"
                );
                let _ = tx
                    .send(ChatEvent::ToolStatus {
                        agent: step.agent.clone(),
                        status: "skipped".to_string(),
                    })
                    .await;
                continue;
            }

            if tx
                .send(ChatEvent::ToolStatus {
                    agent: step.agent.clone(),
                    status: "running".to_string(),
                })
                .await
                .is_err()
            {
                // Receiver dropped: stop starting new LLM or tool calls.
                return results;
            }

            let prior = prior_results_payload(&results);
            let spec = self.spec_for(&step.agent, vernacular);
            let result = self
                .runner
                .run(
                    &spec,
                    &self.config.specialist_model,
                    &step.task,
                    prior.as_ref(),
                    policy,
                    ctx,
                )
                .await;

            spent_output_tokens += result.tokens_used.output_tokens;
            let _ = tx
                .send(ChatEvent::ToolStatus {
                    agent: result.agent_name.clone(),
                    status: if result.success { "completed" } else { "failed" }.to_string(),
                })
                .await;

            // Bounded repair: one rag lookup plus one retry of the
            // failed data-query step.
            if !result.success
                && self.config.repair_retry
                && !repair_inserted
                && step.agent == "suiteql"
            {
                repair_inserted = true;
                queue.push_front(step.clone());
                queue.push_front(PlanStep {
                    agent: "rag".to_string(),
                    task: format!(
                        "Look up the correct table and field names needed for: {}",
                        step.task
                    ),
                });
            }

            results.push(result);
        }

        results
    }

    async fn synthesize(
        &self,
        user_message: &str,
        results: Vec<AgentResult>,
        tx: mpsc::Sender<ChatEvent>,
    ) {
        let tool_calls: Vec<ToolCallRecord> = results
            .iter()
            .flat_map(|result| result.tool_calls.clone())
            .collect();

        let usable = results
            .iter()
            .any(|result| result.success && !result.data.trim().is_empty());

        if !usable {
            // Nothing to synthesize from; apologize and ask, never invent.
            let content = no_results_answer(0);
            let _ = tx
                .send(ChatEvent::TextChunk {
                    text: content.clone(),
                })
                .await;
            let _ = tx
                .send(ChatEvent::Message {
                    content,
                    tool_calls,
                })
                .await;
            return;
        }

        let request = ChatRequest {
            model: self.config.synthesis_model.clone(),
            max_tokens: 8192,
            system: SYNTHESIS_PROMPT.to_string(),
            messages: vec![ChatMessage::user_text(format!(
                "Question: {}\n\nAgent results:\n{}",
                user_message,
                render_agent_summaries(&results)
            ))],
            tools: Vec::new(),
        };

        let mut stream = match self.llm.stream_message(&request).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "synthesis stream failed to start");
                let content = no_results_answer(1);
                let _ = tx
                    .send(ChatEvent::Message {
                        content,
                        tool_calls,
                    })
                    .await;
                return;
            }
        };

        let mut full_content = String::new();
        while let Some(event) = stream.next().await {
            match event {
                Ok(StreamEvent::Text(text)) => {
                    full_content.push_str(&text);
                    if tx.send(ChatEvent::TextChunk { text }).await.is_err() {
                        // Cancelled: drop the synthesis stream promptly.
                        return;
                    }
                }
                Ok(StreamEvent::Response(response)) => {
                    // The terminal response is authoritative.
                    full_content = response.text();
                }
                Err(err) => {
                    warn!(error = %err, "synthesis stream error");
                    break;
                }
            }
        }

        let _ = tx
            .send(ChatEvent::Message {
                content: full_content,
                tool_calls,
            })
            .await;
    }
}

fn prior_results_payload(results: &[AgentResult]) -> Option<Value> {
    let successful: Vec<Value> = results
        .iter()
        .filter(|result| result.success)
        .map(|result| json!({"agent": result.agent_name, "data": result.data}))
        .collect();
    if successful.is_empty() {
        None
    } else {
        Some(Value::Array(successful))
    }
}
