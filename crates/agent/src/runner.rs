//! The orchestration loop implementation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use toolweave_core::session::{TranscriptStore, UsageSink};
use toolweave_core::tool::ToolRegistry;
use toolweave_core::transport::{CompletionTransport, GenerationRequest};
use toolweave_core::turn::Turn;

use crate::dispatch::{self, ArgumentErrorPolicy};
use crate::error::AgentError;
use crate::termination::{self, TerminationMode};

const DEFAULT_SYSTEM_PROMPT: &str =
    "you are a helpful assistant that can use tools to answer questions";

/// The agent loop: generation step, tool dispatch, termination detection,
/// all under an iteration budget.
///
/// One `Agent` owns its collaborators for the duration of each [`run`]
/// call; it is the sole writer to the transcript store, and it never
/// issues a new generation step until every invocation request from the
/// previous round has an appended result turn.
///
/// [`run`]: Agent::run
pub struct Agent {
    /// The completion transport to use
    transport: Arc<dyn CompletionTransport>,

    /// The model to request
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Tool registry, fixed for the agent's lifetime
    registry: Arc<ToolRegistry>,

    /// Transcript store (append + full read)
    store: Arc<dyn TranscriptStore>,

    /// Per-round usage records go here, best-effort
    usage_sink: Arc<dyn UsageSink>,

    /// Fixed system turn appended at the start of every run
    system_prompt: String,

    /// Maximum rounds per run
    max_iterations: u32,

    /// Which termination convention this deployment uses
    mode: TerminationMode,

    /// What to do when raw arguments fail to decode
    argument_policy: ArgumentErrorPolicy,
}

impl Agent {
    /// Create a new agent loop.
    pub fn new(
        transport: Arc<dyn CompletionTransport>,
        model: impl Into<String>,
        registry: Arc<ToolRegistry>,
        store: Arc<dyn TranscriptStore>,
        usage_sink: Arc<dyn UsageSink>,
    ) -> Self {
        Self {
            transport,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            registry,
            store,
            usage_sink,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 20,
            mode: TerminationMode::default(),
            argument_policy: ArgumentErrorPolicy::default(),
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the default max tokens per response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of rounds per run.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Override the fixed system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Pick the termination convention.
    pub fn with_termination_mode(mut self, mode: TerminationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Pick the argument decode failure policy.
    pub fn with_argument_policy(mut self, policy: ArgumentErrorPolicy) -> Self {
        self.argument_policy = policy;
        self
    }

    /// Drive the loop from an initial prompt to a terminal payload.
    ///
    /// Appends the system and user turns, then repeats rounds of
    /// generation step, usage record, dispatch, and result appends until
    /// the terminal payload arrives, a protocol violation fires, or the
    /// iteration budget runs out.
    pub async fn run(
        &self,
        prompt: impl Into<String>,
    ) -> Result<serde_json::Value, AgentError> {
        let prompt = prompt.into();
        info!(model = %self.model, mode = ?self.mode, "Starting agent run");

        self.store.append(Turn::system(&self.system_prompt)).await?;
        self.store.append(Turn::user(prompt)).await?;

        let tools = self.registry.definitions();

        for round in 1..=self.max_iterations {
            debug!(round, "Agent loop round");

            let turns = self.store.all().await?;
            let response = self
                .transport
                .complete(GenerationRequest {
                    model: self.model.clone(),
                    turns,
                    tools: tools.clone(),
                    tool_choice: self.mode.tool_choice(),
                    temperature: self.temperature,
                    max_tokens: self.max_tokens,
                })
                .await?;

            if let Some(usage) = response.usage
                && let Err(e) = self.usage_sink.record(usage).await
            {
                warn!(round, error = %e, "Usage sink failed, continuing");
            }

            let assistant = response.assistant;

            if assistant.invocations.is_empty() {
                return match self.mode {
                    TerminationMode::FinalTool => Err(AgentError::NoToolCalls { round }),
                    TerminationMode::StructuredReply => {
                        let payload =
                            termination::terminal_from_reply(&assistant.content, round)?;
                        self.store.append(assistant).await?;
                        info!(round, "Run terminated with a structured reply");
                        Ok(payload)
                    }
                };
            }

            // Resolve before appending anything: a protocol violation
            // must leave the transcript without any turn from the
            // failing round.
            let plan = dispatch::resolve_round(
                &self.registry,
                &assistant.invocations,
                self.argument_policy,
                round,
            )?;

            self.store.append(assistant.clone()).await?;

            let execution = dispatch::execute_round(plan, self.argument_policy, round).await?;

            for turn in execution.results {
                self.store.append(turn).await?;
            }

            if let Some(payload) = execution.terminal {
                // Single terminal-answer assistant turn, kept for audit.
                self.store
                    .append(Turn::assistant(payload.to_string(), Vec::new()))
                    .await?;
                info!(round, "Run terminated via the terminal tool");
                return Ok(payload);
            }
        }

        Err(AgentError::IterationBudgetExceeded {
            budget: self.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use toolweave_core::error::{StoreError, ToolError, TransportError};
    use toolweave_core::tool::Tool;
    use toolweave_core::transport::{GenerationResponse, Usage};
    use toolweave_core::turn::{InvocationRequest, Role};
    use toolweave_session::InMemoryTranscript;
    use toolweave_telemetry::UsageLedger;

    /// A transport that plays back a fixed script of responses.
    struct ScriptedTransport {
        script: Mutex<VecDeque<GenerationResponse>>,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(script: Vec<GenerationResponse>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionTransport for ScriptedTransport {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TransportError::Network("script exhausted".into()))
        }
    }

    fn round_with_calls(calls: &[(&str, &str, &str)]) -> GenerationResponse {
        GenerationResponse {
            assistant: Turn::assistant(
                "",
                calls
                    .iter()
                    .map(|(id, name, args)| InvocationRequest {
                        id: (*id).into(),
                        tool_name: (*name).into(),
                        raw_arguments: (*args).into(),
                    })
                    .collect(),
            ),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        }
    }

    fn round_with_text(content: &str) -> GenerationResponse {
        GenerationResponse {
            assistant: Turn::assistant(content, Vec::new()),
            usage: None,
            model: "mock-model".into(),
        }
    }

    struct WeatherTool;

    #[async_trait]
    impl Tool for WeatherTool {
        fn name(&self) -> &str {
            "get_weather"
        }
        fn description(&self) -> &str {
            "Look up the weather for a city"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": { "city": { "type": "string" } },
                "required": ["city"]
            })
        }
        async fn invoke(
            &self,
            arguments: serde_json::Value,
        ) -> Result<serde_json::Value, ToolError> {
            let city = arguments["city"]
                .as_str()
                .ok_or_else(|| ToolError::InvalidArguments("Missing 'city' argument".into()))?;
            Ok(serde_json::json!({ "city": city, "weather": "sunny" }))
        }
    }

    struct RespondTool;

    #[async_trait]
    impl Tool for RespondTool {
        fn name(&self) -> &str {
            "respond"
        }
        fn description(&self) -> &str {
            "Return the final answer"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": { "answer": { "type": "string" } },
                "required": ["answer"]
            })
        }
        async fn invoke(
            &self,
            arguments: serde_json::Value,
        ) -> Result<serde_json::Value, ToolError> {
            Ok(arguments)
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::new(vec![Arc::new(WeatherTool)], Some(Arc::new(RespondTool))).unwrap())
    }

    fn agent(
        transport: Arc<ScriptedTransport>,
    ) -> (Agent, Arc<InMemoryTranscript>, Arc<UsageLedger>) {
        let store = Arc::new(InMemoryTranscript::new());
        let ledger = Arc::new(UsageLedger::new());
        let agent = Agent::new(
            transport,
            "mock-model",
            registry(),
            store.clone(),
            ledger.clone(),
        );
        (agent, store, ledger)
    }

    #[tokio::test]
    async fn weather_then_respond_scenario() {
        let transport = ScriptedTransport::new(vec![
            round_with_calls(&[("call_1", "get_weather", r#"{"city":"Paris"}"#)]),
            round_with_calls(&[("call_2", "respond", r#"{"answer":"It is sunny in Paris"}"#)]),
            // Extra scripted round that must never be requested.
            round_with_text("unreachable"),
        ]);
        let (agent, store, ledger) = agent(transport.clone());

        let payload = agent.run("What is the weather in Paris?").await.unwrap();
        assert_eq!(payload["answer"], "It is sunny in Paris");

        // Terminal payload ends the loop: no third generation step.
        assert_eq!(transport.calls(), 2);

        let turns = store.all().await.unwrap();
        // system, user, assistant(call), tool result, assistant(call), audit turn
        assert_eq!(turns.len(), 6);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1].role, Role::User);

        let results: Vec<_> = turns.iter().filter(|t| t.role == Role::Tool).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].answers.as_deref(), Some("call_1"));
        assert!(results[0].content.contains(r#""city":"Paris""#));
        assert!(results[0].content.contains("sunny"));

        // Audit turn carries the payload itself.
        assert!(turns[5].content.contains("It is sunny in Paris"));

        // One usage record per round that reported usage.
        assert_eq!(ledger.records().await.len(), 2);
    }

    #[tokio::test]
    async fn unknown_tool_fails_and_leaves_transcript_clean() {
        let transport = ScriptedTransport::new(vec![round_with_calls(&[(
            "call_7",
            "nonexistent",
            "{}",
        )])]);
        let (agent, store, _) = agent(transport);

        let err = agent.run("hi").await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::UnknownTool { round: 1, ref call_id, ref tool_name }
                if call_id == "call_7" && tool_name == "nonexistent"
        ));

        // Only turns appended strictly before the failing round remain.
        let turns = store.all().await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1].role, Role::User);
    }

    #[tokio::test]
    async fn budget_exhausted_after_exactly_one_round() {
        let transport = ScriptedTransport::new(vec![
            round_with_calls(&[("call_1", "get_weather", r#"{"city":"Oslo"}"#)]),
            round_with_calls(&[("call_2", "get_weather", r#"{"city":"Oslo"}"#)]),
        ]);
        let (agent, store, _) = agent(transport.clone());
        let agent = agent.with_max_iterations(1);

        let err = agent.run("weather forever").await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::IterationBudgetExceeded { budget: 1 }
        ));
        assert_eq!(transport.calls(), 1);

        // The one completed round is fully recorded.
        let turns = store.all().await.unwrap();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[3].role, Role::Tool);
    }

    #[tokio::test]
    async fn no_tool_calls_is_a_protocol_violation_under_final_tool_mode() {
        let transport = ScriptedTransport::new(vec![round_with_text("Paris is sunny.")]);
        let (agent, store, _) = agent(transport);

        let err = agent.run("weather?").await.unwrap_err();
        assert!(matches!(err, AgentError::NoToolCalls { round: 1 }));

        let turns = store.all().await.unwrap();
        assert_eq!(turns.len(), 2);
    }

    #[tokio::test]
    async fn structured_reply_mode_terminates_on_json_reply() {
        let transport = ScriptedTransport::new(vec![
            round_with_calls(&[("call_1", "get_weather", r#"{"city":"Paris"}"#)]),
            round_with_text(r#"{"answer":"It is sunny in Paris"}"#),
        ]);
        let (agent, store, _) = agent(transport);
        let agent = agent.with_termination_mode(TerminationMode::StructuredReply);

        let payload = agent.run("weather?").await.unwrap();
        assert_eq!(payload["answer"], "It is sunny in Paris");

        // The terminal reply itself is the last appended turn.
        let turns = store.all().await.unwrap();
        let last = turns.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.content.contains("sunny in Paris"));
    }

    #[tokio::test]
    async fn structured_reply_mode_rejects_free_text() {
        let transport = ScriptedTransport::new(vec![round_with_text("just words")]);
        let (agent, _, _) = agent(transport);
        let agent = agent.with_termination_mode(TerminationMode::StructuredReply);

        let err = agent.run("weather?").await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::MissingTerminalPayload { round: 1, .. }
        ));
    }

    #[tokio::test]
    async fn report_policy_surfaces_decode_errors_to_the_model() {
        let transport = ScriptedTransport::new(vec![
            round_with_calls(&[("call_1", "get_weather", "not json at all")]),
            round_with_calls(&[("call_2", "respond", r#"{"answer":"recovered"}"#)]),
        ]);
        let (agent, store, _) = agent(transport);
        let agent = agent.with_argument_policy(ArgumentErrorPolicy::Report);

        let payload = agent.run("weather?").await.unwrap();
        assert_eq!(payload["answer"], "recovered");

        let turns = store.all().await.unwrap();
        let error_turn = turns
            .iter()
            .find(|t| t.role == Role::Tool && t.content.starts_with("Error:"))
            .unwrap();
        assert_eq!(error_turn.answers.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn fail_policy_aborts_on_decode_error() {
        let transport = ScriptedTransport::new(vec![round_with_calls(&[(
            "call_1",
            "get_weather",
            "not json at all",
        )])]);
        let (agent, _, _) = agent(transport);

        let err = agent.run("weather?").await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::ArgumentDecode { round: 1, ref call_id, .. } if call_id == "call_1"
        ));
    }

    #[tokio::test]
    async fn terminal_sibling_invocations_still_produce_results() {
        let transport = ScriptedTransport::new(vec![round_with_calls(&[
            ("call_1", "get_weather", r#"{"city":"Rome"}"#),
            ("call_2", "respond", r#"{"answer":"Rome is sunny"}"#),
        ])]);
        let (agent, store, _) = agent(transport);

        let payload = agent.run("weather?").await.unwrap();
        assert_eq!(payload["answer"], "Rome is sunny");

        // The non-terminal sibling got its result turn; the terminal one did not.
        let turns = store.all().await.unwrap();
        let results: Vec<_> = turns.iter().filter(|t| t.role == Role::Tool).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].answers.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn usage_sink_failure_does_not_abort_the_round() {
        struct FailingSink;

        #[async_trait]
        impl UsageSink for FailingSink {
            async fn record(&self, _usage: Usage) -> Result<(), StoreError> {
                Err(StoreError::Append("sink offline".into()))
            }
        }

        let transport = ScriptedTransport::new(vec![round_with_calls(&[(
            "call_1",
            "respond",
            r#"{"answer":"done"}"#,
        )])]);
        let store = Arc::new(InMemoryTranscript::new());
        let agent = Agent::new(
            transport,
            "mock-model",
            registry(),
            store,
            Arc::new(FailingSink),
        );

        let payload = agent.run("hi").await.unwrap();
        assert_eq!(payload["answer"], "done");
    }

    #[tokio::test]
    async fn transport_errors_pass_through_unmodified() {
        // Empty script: the transport fails on the first round.
        let transport = ScriptedTransport::new(vec![]);
        let (agent, _, _) = agent(transport);

        let err = agent.run("hi").await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::Transport(TransportError::Network(_))
        ));
    }
}
