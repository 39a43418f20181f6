//! Per-turn tool allow-lists handed to agents.
//!
//! A [`Toolkit`] is built for one player and one turn. Informational tools
//! return text and leave the turn open; terminal tools produce the
//! [`Action`] that ends it. Every tool reads through a [`GameStateView`],
//! so nothing an agent calls can reach a hidden field.

use crate::briefing::BriefingBuilder;
use crate::knowledge_base::KnowledgeBase;
use derive_getters::Getters;
use derive_new::new;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use regex::Regex;
use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strictly_werewolf_core::{Ability, Action, GameStateView, PlayerId, TargetClass, Team};
use tracing::{debug, instrument, warn};

static THINK_BLOCK: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").ok());

const ABSTAIN_WORDS: [&str; 4] = ["no_one", "no one", "none", "abstain"];

/// Which turn a toolkit serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnKind {
    /// Role reveal before the first night.
    GameStart,
    /// Notes-only turn after dawn or the vote.
    Reflection,
    /// Pack chat before night abilities.
    WolfChat,
    /// Night ability turn; `None` when the role has nothing to do.
    Night(Option<Ability>),
    /// One speaking turn.
    Discussion,
    /// The day vote.
    Vote,
}

/// Limits and switches for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct ToolkitSettings {
    /// Invocations before the fallback is forced.
    pub max_rounds: usize,
    /// Speech is cut to this many characters.
    pub max_speech_length: usize,
    /// Whether `send_dm` is offered during discussion.
    pub allow_dms: bool,
    /// Shuffle name lists returned by tools.
    pub randomize_names: bool,
    /// Seed for name shuffling.
    pub seed: u64,
}

/// Published description of one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
pub struct ToolSpec {
    /// Invocation name.
    name: &'static str,
    /// What the tool does.
    description: &'static str,
    /// Argument summary for text prompts.
    parameters: &'static str,
    /// Whether a successful call ends the turn.
    terminal: bool,
    /// JSON schema for object-style arguments.
    schema: serde_json::Value,
}

impl ToolSpec {
    fn plain(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            parameters: "",
            terminal: false,
            schema: serde_json::Value::Null,
        }
    }

    fn with_args<T: JsonSchema>(name: &'static str, description: &'static str, parameters: &'static str) -> Self {
        Self {
            name,
            description,
            parameters,
            terminal: false,
            schema: serde_json::to_value(schema_for!(T)).unwrap_or_default(),
        }
    }

    fn ends_turn(mut self) -> Self {
        self.terminal = true;
        self
    }
}

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ToolResult {
    /// Tool that was called.
    tool_name: String,
    /// Text returned to the agent.
    output: String,
    /// Present when the call ended the turn.
    action: Option<Action>,
}

impl ToolResult {
    fn info(tool: &str, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool.to_string(),
            output: output.into(),
            action: None,
        }
    }

    fn done(tool: &str, action: Action) -> Self {
        Self {
            tool_name: tool.to_string(),
            output: format!("[Action submitted: {}]", tool),
            action: Some(action),
        }
    }

    /// Whether this result ends the turn.
    pub fn is_terminal(&self) -> bool {
        self.action.is_some()
    }

    /// Consumes the result, yielding its action.
    pub fn into_action(self) -> Option<Action> {
        self.action
    }
}

/// Target argument.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TargetArgs {
    /// Player name.
    #[serde(alias = "name", alias = "target", alias = "player")]
    pub player_name: String,
}

/// Speech argument.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MessageArgs {
    /// What to say.
    #[serde(alias = "text", alias = "content")]
    pub message: String,
}

/// Note argument.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct NoteArgs {
    /// Note text.
    #[serde(alias = "note", alias = "message", alias = "content")]
    pub text: String,
}

/// Assessment arguments.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AssessmentArgs {
    /// Player being assessed.
    #[serde(alias = "name", alias = "player")]
    pub player_name: String,
    /// Assessment text.
    #[serde(alias = "assessment", alias = "note")]
    pub text: String,
}

/// Direct message arguments.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DirectMessageArgs {
    /// Recipient.
    #[serde(alias = "name", alias = "to")]
    pub player_name: String,
    /// Message text.
    #[serde(alias = "text", alias = "content")]
    pub message: String,
}

fn json_args<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        serde_json::from_str(trimmed).ok()
    } else {
        None
    }
}

fn bare(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string()
}

/// Removes `<think>` blocks, trims and truncates speech.
pub fn clean_speech(text: &str, max_len: usize) -> String {
    let stripped = match THINK_BLOCK.as_ref() {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    };
    stripped.trim().chars().take(max_len).collect::<String>().trim_end().to_string()
}

/// Splits a `USE: tool(args)` line into tool name and raw arguments.
pub fn parse_invocation(line: &str) -> Option<(String, String)> {
    let rest = line.trim().strip_prefix("USE:")?.trim();
    match (rest.find('('), rest.rfind(')')) {
        (Some(open), Some(close)) if close > open => {
            Some((rest[..open].trim().to_string(), rest[open + 1..close].to_string()))
        }
        (None, None) if !rest.is_empty() => Some((rest.to_string(), String::new())),
        _ => None,
    }
}

/// Tool allow-list for one player's turn.
#[derive(Debug)]
pub struct Toolkit<'a> {
    kind: TurnKind,
    view: GameStateView<'a>,
    briefings: &'a BriefingBuilder,
    kb: &'a mut KnowledgeBase,
    settings: ToolkitSettings,
    specs: Vec<ToolSpec>,
    rng: StdRng,
    invocations: usize,
    outbox: Vec<(PlayerId, String)>,
    reasoning: Vec<String>,
}

impl<'a> Toolkit<'a> {
    /// Builds the allow-list for `kind`.
    ///
    /// `wolf_say` is only offered to pack members, whatever the turn kind.
    pub fn new(
        kind: TurnKind,
        view: GameStateView<'a>,
        briefings: &'a BriefingBuilder,
        kb: &'a mut KnowledgeBase,
        settings: ToolkitSettings,
    ) -> Self {
        let mut specs = common_specs();
        match &kind {
            TurnKind::Discussion => {
                specs.push(
                    ToolSpec::with_args::<MessageArgs>("speak", "Say something to all players.", "message")
                        .ends_turn(),
                );
                if settings.allow_dms {
                    specs.push(ToolSpec::with_args::<DirectMessageArgs>(
                        "send_dm",
                        "Send a private message to one player.",
                        "player_name, message",
                    ));
                }
            }
            TurnKind::WolfChat if *view.my_player().team() == Team::Werewolf => specs.push(
                ToolSpec::with_args::<MessageArgs>("wolf_say", "Say something to your pack only.", "message")
                    .ends_turn(),
            ),
            TurnKind::WolfChat => warn!(
                player = %view.my_player().player_id(),
                "Pack chat requested for a non-pack player; wolf_say withheld"
            ),
            TurnKind::Vote => specs.push(
                ToolSpec::with_args::<TargetArgs>(
                    "vote",
                    "Vote to eliminate a player, or 'no_one' to abstain.",
                    "player_name",
                )
                .ends_turn(),
            ),
            TurnKind::Night(Some(_)) => specs.push(
                ToolSpec::with_args::<TargetArgs>("use_ability", "Use your night ability on a player.", "player_name")
                    .ends_turn(),
            ),
            TurnKind::Night(None) | TurnKind::GameStart | TurnKind::Reflection => {}
        }
        debug!(
            player = %view.my_player().player_id(),
            tools = specs.len(),
            "Toolkit built"
        );
        Self {
            kind,
            view,
            briefings,
            kb,
            settings,
            specs,
            rng: StdRng::seed_from_u64(settings.seed),
            invocations: 0,
            outbox: Vec::new(),
            reasoning: Vec::new(),
        }
    }

    /// Turn this toolkit serves.
    pub fn kind(&self) -> &TurnKind {
        &self.kind
    }

    /// The owner's view.
    pub fn view(&self) -> GameStateView<'a> {
        self.view
    }

    /// Published tool descriptions.
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Names of the offered tools.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.specs.iter().map(|s| s.name).collect()
    }

    /// Whether a tool is offered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.specs.iter().any(|s| s.name == name)
    }

    /// Invocations allowed this turn.
    pub fn max_rounds(&self) -> usize {
        self.settings.max_rounds
    }

    /// Invocations made so far.
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// Whether the invocation budget is spent.
    pub fn exhausted(&self) -> bool {
        self.invocations >= self.settings.max_rounds
    }

    /// Read-only access to the owner's knowledge base.
    pub fn knowledge(&self) -> &KnowledgeBase {
        self.kb
    }

    /// Safe terminal action for this turn.
    pub fn fallback_action(&self) -> Action {
        match self.kind {
            TurnKind::Vote => Action::abstain(),
            _ => Action::no_action("pass_turn"),
        }
    }

    /// Display names the phase's terminal tool accepts.
    pub fn valid_targets(&self) -> Vec<String> {
        let ids = match &self.kind {
            TurnKind::Night(Some(ability)) => self.ability_targets(ability),
            _ => self.other_alive(),
        };
        self.briefings.names().names(&ids)
    }

    /// Attaches private reasoning to this turn.
    pub fn record_reasoning(&mut self, text: impl Into<String>) {
        self.reasoning.push(text.into());
    }

    /// Drains recorded reasoning.
    pub fn take_reasoning(&mut self) -> Vec<String> {
        std::mem::take(&mut self.reasoning)
    }

    /// Drains queued direct messages as (recipient, text).
    pub fn take_outbox(&mut self) -> Vec<(PlayerId, String)> {
        std::mem::take(&mut self.outbox)
    }

    /// Tool list rendered for a text prompt.
    pub fn format_for_prompt(&self) -> String {
        let mut lines = vec!["=== Available Tools ===".to_string()];
        for spec in &self.specs {
            let marker = if spec.terminal { " [TERMINAL]" } else { "" };
            lines.push(format!("- {}({}){}: {}", spec.name, spec.parameters, marker, spec.description));
        }
        lines.push(String::new());
        lines.push("Call one tool per line as: USE: tool_name(args)".to_string());
        lines.push("Arguments may be plain text or a JSON object. A [TERMINAL] tool ends your turn.".to_string());
        lines.join("\n")
    }

    /// Runs one tool call.
    ///
    /// Once the budget is spent, a non-terminal result is turned into the
    /// turn's fallback action.
    #[instrument(skip(self, args), fields(player = %self.view.my_player().player_id(), round = self.invocations + 1))]
    pub fn invoke(&mut self, tool: &str, args: &str) -> ToolResult {
        self.invocations += 1;
        let result = if self.has_tool(tool) {
            self.dispatch(tool, args)
        } else {
            ToolResult::info(
                tool,
                format!(
                    "Error: unknown tool '{}'. Available tools: {}",
                    tool,
                    self.tool_names().join(", ")
                ),
            )
        };
        if result.is_terminal() || !self.exhausted() {
            return result;
        }
        let fallback = self.fallback_action();
        warn!(%fallback, "Tool budget exhausted, forcing fallback");
        ToolResult {
            tool_name: result.tool_name,
            output: format!("{}\nTool budget exhausted. Your turn ends with {}.", result.output, fallback),
            action: Some(fallback),
        }
    }

    fn dispatch(&mut self, tool: &str, args: &str) -> ToolResult {
        match tool {
            "get_alive_players" => {
                let names = self.shuffled(self.briefings.names().names(&self.view_alive()));
                ToolResult::info(tool, format!("Alive players: {}", names.join(", ")))
            }
            "get_all_players" => {
                let lines: Vec<String> = self
                    .view
                    .all_players()
                    .iter()
                    .map(|p| format!("{}: {}", p.name(), if *p.is_alive() { "alive" } else { "eliminated" }))
                    .collect();
                ToolResult::info(tool, lines.join("\n"))
            }
            "get_day_events" => {
                let events = self.briefings.day_events(&self.view);
                if events.is_empty() {
                    ToolResult::info(tool, "(no events today)")
                } else {
                    ToolResult::info(tool, events.join("\n"))
                }
            }
            "get_vote_history" => ToolResult::info(tool, self.briefings.vote_history(&self.view)),
            "read_notes" => ToolResult::info(tool, self.kb.read_notes()),
            "write_notes" => {
                let text = json_args::<NoteArgs>(args).map(|a| a.text).unwrap_or_else(|| bare(args));
                ToolResult::info(tool, self.kb.write_notes(&text))
            }
            "assess_player" => {
                let (name, text) = match json_args::<AssessmentArgs>(args) {
                    Some(a) => (a.player_name, a.text),
                    None => match args.split_once(':') {
                        Some((name, text)) => (bare(name), text.trim().to_string()),
                        None => (String::new(), String::new()),
                    },
                };
                ToolResult::info(tool, self.kb.assess_player(&name, &text))
            }
            "read_assessments" => ToolResult::info(tool, self.kb.read_assessments()),
            "pass_turn" => {
                let mut result = ToolResult::done(tool, Action::no_action("pass_turn"));
                result.output = "Turn passed.".to_string();
                result
            }
            "speak" | "wolf_say" => {
                let raw = json_args::<MessageArgs>(args).map(|a| a.message).unwrap_or_else(|| args.to_string());
                let content = clean_speech(&raw, self.settings.max_speech_length);
                if content.is_empty() {
                    ToolResult::info(tool, "Error: message is empty. Say something or use pass_turn.")
                } else {
                    ToolResult::done(tool, Action::Speak { content })
                }
            }
            "send_dm" => self.send_dm(tool, args),
            "vote" => self.vote(tool, args),
            "use_ability" => self.use_ability(tool, args),
            _ => ToolResult::info(tool, format!("Error: tool '{}' is not available.", tool)),
        }
    }

    fn vote(&mut self, tool: &str, args: &str) -> ToolResult {
        let raw = json_args::<TargetArgs>(args).map(|a| a.player_name).unwrap_or_else(|| bare(args));
        if raw.is_empty() || ABSTAIN_WORDS.contains(&raw.to_lowercase().as_str()) {
            return ToolResult::done(tool, Action::abstain());
        }
        let valid = self.other_alive();
        match self.briefings.names().resolve(&raw) {
            Some(id) if valid.contains(&id) => ToolResult::done(tool, Action::Vote { target: Some(id) }),
            _ => self.invalid_target(tool, &raw, &valid),
        }
    }

    fn use_ability(&mut self, tool: &str, args: &str) -> ToolResult {
        let TurnKind::Night(Some(ability)) = &self.kind else {
            return ToolResult::info(tool, "Error: you have no ability to use now.");
        };
        let name = ability.name().clone();
        let valid = self.ability_targets(ability);
        let raw = json_args::<TargetArgs>(args).map(|a| a.player_name).unwrap_or_else(|| bare(args));
        match self.briefings.names().resolve(&raw) {
            Some(id) if valid.contains(&id) => ToolResult::done(
                tool,
                Action::UseAbility {
                    ability: name,
                    target: id,
                },
            ),
            _ => self.invalid_target(tool, &raw, &valid),
        }
    }

    fn send_dm(&mut self, tool: &str, args: &str) -> ToolResult {
        let (name, text) = match json_args::<DirectMessageArgs>(args) {
            Some(a) => (a.player_name, a.message),
            None => match args.split_once(':') {
                Some((name, text)) => (bare(name), text.to_string()),
                None => return ToolResult::info(tool, "Error: use send_dm(player_name: message)."),
            },
        };
        let valid = self.other_alive();
        let Some(id) = self.briefings.names().resolve(&name).filter(|id| valid.contains(id)) else {
            return self.invalid_target(tool, &name, &valid);
        };
        let content = clean_speech(&text, self.settings.max_speech_length);
        if content.is_empty() {
            return ToolResult::info(tool, "Error: message is empty.");
        }
        let recipient = self.briefings.names().name(&id);
        self.outbox.push((id, content));
        ToolResult::info(tool, format!("Message to {} queued.", recipient))
    }

    fn invalid_target(&mut self, tool: &str, raw: &str, valid: &[PlayerId]) -> ToolResult {
        let names = self.shuffled(self.briefings.names().names(valid));
        debug!(tool, target = raw, "Invalid target rejected");
        ToolResult::info(
            tool,
            format!("Error: '{}' is not a valid target. Valid targets: {}", raw, names.join(", ")),
        )
    }

    fn view_alive(&self) -> Vec<PlayerId> {
        alive_ids(&self.view)
    }

    fn other_alive(&self) -> Vec<PlayerId> {
        vote_targets(&self.view)
    }

    fn ability_targets(&self, ability: &Ability) -> Vec<PlayerId> {
        ability_targets(&self.view, ability)
    }

    fn shuffled(&mut self, mut names: Vec<String>) -> Vec<String> {
        if self.settings.randomize_names {
            names.shuffle(&mut self.rng);
        }
        names
    }
}

fn alive_ids(view: &GameStateView<'_>) -> Vec<PlayerId> {
    view.alive_players()
        .iter()
        .map(|p| p.player_id().clone())
        .collect()
}

/// Living players other than the viewer.
pub fn vote_targets(view: &GameStateView<'_>) -> Vec<PlayerId> {
    let me = view.my_player().player_id();
    alive_ids(view).into_iter().filter(|id| id != me).collect()
}

/// Living players the viewer may target with `ability`.
///
/// Opponents are judged by what the viewer knows: pack members exclude
/// their allies, everyone else only excludes themselves.
pub fn ability_targets(view: &GameStateView<'_>, ability: &Ability) -> Vec<PlayerId> {
    let me = view.my_player().player_id();
    let allies: Vec<PlayerId> = view
        .known_allies()
        .iter()
        .map(|a| a.player_id().clone())
        .collect();
    alive_ids(view)
        .into_iter()
        .filter(|id| match ability.targets() {
            TargetClass::AliveAny => true,
            TargetClass::AliveOthers => id != me,
            TargetClass::AliveOpponents => id != me && !allies.contains(id),
        })
        .collect()
}

fn common_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec::plain("get_alive_players", "List the players still in the game."),
        ToolSpec::plain("get_all_players", "List every player and whether they are alive."),
        ToolSpec::plain("get_day_events", "Describe what has happened today."),
        ToolSpec::plain("get_vote_history", "Show every vote cast so far."),
        ToolSpec::plain("read_notes", "Read your private notes."),
        ToolSpec::with_args::<NoteArgs>("write_notes", "Add a private note.", "text"),
        ToolSpec::with_args::<AssessmentArgs>(
            "assess_player",
            "Record your assessment of a player.",
            "player_name: text",
        ),
        ToolSpec::plain("read_assessments", "Read your player assessments."),
        ToolSpec::plain("pass_turn", "End your turn without acting.").ends_turn(),
    ]
}
