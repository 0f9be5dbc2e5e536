//! Response parser (§4.E): extracts ordered speech/emote/command/goal/
//! plan/step actions from raw LLM output.
//!
//! Grounded on `WrldBld-Game`'s `use_cases/queues/response_parser.rs`:
//! `regex_lite::Regex` tag-extraction with `static ...: LazyLock<Regex>`
//! compiled patterns, the same crate and the same "one static regex per
//! tag family" shape, generalized from that file's XML-tag grammar to
//! this spec's bracket-delimited markup grammar. Its
//! `value_objects/dialogue_markers.rs` offset-tracking approach to
//! interleaving delimited spans with residual prose is reused for the
//! span-collection/walk algorithm below.

use std::sync::LazyLock;

use regex_lite::Regex;

use loreweave_shared::{
    is_forbidden_command, GoalDirective, ParsedCommand, PlanDirective, StepAction, StepDirective,
};

/// One action extracted from a response, in the order it should execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NpcAction {
    Speech(String),
    Emote(String),
    Command(ParsedCommand),
    Goal(GoalDirective),
    Plan(PlanDirective),
    Step(StepDirective),
}

/// Hard cap on executed actions per response (§4.E, §8).
pub const MAX_ACTIONS_PER_RESPONSE: usize = 3;
const MAX_SPEECH_SENTENCES: usize = 3;
const MAX_SPEECH_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Command,
    Goal,
    Plan,
    Step,
    Delimited,
}

struct Span {
    start: usize,
    end: usize,
    kind: Kind,
    inner: String,
}

static CMD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[\[\{]cmd:\s*([A-Za-z'_]+)([^\]\}]*)[\]\}]").expect("valid regex"));
static GOAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[goal:\s*([^\]]*)\]").expect("valid regex"));
static GOAL_BARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bgoal:(clear|done|complete|none)\b(?:\s+([A-Za-z_]+))?").expect("valid regex")
});
static PLAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[plan:\s*([^\]]*)\]").expect("valid regex"));
static STEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[step:\s*([^\]]*)\]").expect("valid regex"));
static STEP_BARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bstep:(?:([A-Za-z_]+):)?(done|complete|skip|next)\b").expect("valid regex")
});
static ASTERISK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("valid regex"));
static BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]").expect("valid regex"));

/// `[goal:<content>]` / bare `goal:clear|done|complete|none [type]` inner
/// text → directive.
fn parse_goal_content(content: &str) -> Option<GoalDirective> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    let mut parts = content.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or_default().to_lowercase();
    let rest = parts.next().map(str::trim).filter(|s| !s.is_empty());

    match head.as_str() {
        "clear" => Some(GoalDirective::Clear(rest.map(str::to_string))),
        "done" | "complete" | "none" => Some(GoalDirective::Done(rest.map(str::to_string))),
        goal_type => Some(GoalDirective::Upsert {
            goal_type: goal_type.to_string(),
            target: rest.map(str::to_string),
        }),
    }
}

/// `[plan:[<goalType>:]step1|step2|…]` inner text → directive. The
/// goal-type prefix is detected by scanning the segment before the first
/// colon for the step delimiter `|`; if present, there is no prefix
/// (§4.E).
fn parse_plan_content(content: &str) -> Option<PlanDirective> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    let (goal_type, steps_part) = match content.find(':') {
        Some(idx) if !content[..idx].contains('|') => {
            (Some(content[..idx].trim().to_string()), &content[idx + 1..])
        }
        _ => (None, content),
    };
    let steps: Vec<String> = steps_part
        .split('|')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if steps.is_empty() {
        return None;
    }
    Some(PlanDirective { goal_type, steps })
}

fn parse_step_action(word: &str) -> Option<StepAction> {
    match word.to_lowercase().as_str() {
        "done" | "complete" => Some(StepAction::Done),
        "skip" | "next" => Some(StepAction::Skip),
        _ => None,
    }
}

/// `[step:[<goalType>:]done|complete|skip|next]` inner text → directive.
fn parse_step_content(content: &str) -> Option<StepDirective> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    if let Some(idx) = content.find(':') {
        let (prefix, action_word) = (content[..idx].trim(), content[idx + 1..].trim());
        if let Some(action) = parse_step_action(action_word) {
            return Some(StepDirective { goal_type: Some(prefix.to_string()), action });
        }
    }
    parse_step_action(content).map(|action| StepDirective { goal_type: None, action })
}

/// Whether `s` starts or ends with a quote character (straight or
/// "smart"), the rule that re-classifies a delimited (`*…*` / `[…]`)
/// span as speech instead of an emote (§4.E).
fn looks_quoted(s: &str) -> bool {
    let s = s.trim();
    let starts = s.starts_with(['"', '\'', '\u{201c}', '\u{2018}']);
    let ends = s.ends_with(['"', '\'', '\u{201d}', '\u{2019}']);
    starts || ends
}

fn strip_quotes(s: &str) -> String {
    s.trim()
        .trim_matches(['"', '\'', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'])
        .trim()
        .to_string()
}

/// First-person emote rewrite: "I smile" → "smiles"; "I dance" →
/// "dances"; verbs ending in ch/sh/x/z/s take "-es".
fn rewrite_first_person(text: &str) -> String {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    if let Some(remainder) = lower.strip_prefix("i ") {
        let original_remainder = &trimmed[trimmed.len() - remainder.len()..];
        let mut words = original_remainder.splitn(2, char::is_whitespace);
        let verb = words.next().unwrap_or_default();
        let rest = words.next().unwrap_or_default();
        if verb.is_empty() {
            return trimmed.to_string();
        }
        let verb_lower = verb.to_lowercase();
        let suffix = if verb_lower.ends_with("ch")
            || verb_lower.ends_with("sh")
            || verb_lower.ends_with('x')
            || verb_lower.ends_with('z')
            || verb_lower.ends_with('s')
        {
            "es"
        } else {
            "s"
        };
        let conjugated = format!("{verb}{suffix}");
        return if rest.is_empty() { conjugated } else { format!("{conjugated} {rest}") };
    }
    trimmed.to_string()
}

fn is_pure_punctuation(s: &str) -> bool {
    !s.chars().any(|c| c.is_alphanumeric())
}

/// Truncate speech to ≤3 sentences or ≤300 chars, whichever is shorter,
/// appending an ellipsis when truncated.
fn truncate_speech(s: &str) -> String {
    let mut sentence_count = 0;
    let mut cut_at = s.len();
    for (idx, ch) in s.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            sentence_count += 1;
            if sentence_count == MAX_SPEECH_SENTENCES {
                cut_at = idx + ch.len_utf8();
                break;
            }
        }
    }
    let mut truncated = s[..cut_at].to_string();
    let sentence_truncated = cut_at < s.len();

    if truncated.chars().count() > MAX_SPEECH_CHARS {
        let char_cut: String = truncated.chars().take(MAX_SPEECH_CHARS).collect();
        return format!("{}...", char_cut.trim_end());
    }
    if sentence_truncated {
        truncated = truncated.trim_end().to_string();
    }
    truncated
}

fn push_span(spans: &mut Vec<Span>, start: usize, end: usize, kind: Kind, inner: String) {
    spans.push(Span { start, end, kind, inner });
}

/// Scan every markup family, then filter overlapping spans keeping
/// whichever started earliest (§4.E: "sorts them by position, removes
/// overlaps keeping earliest").
fn collect_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();

    for caps in CMD_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let args = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        push_span(&mut spans, whole.start(), whole.end(), Kind::Command, format!("{name} {args}"));
    }
    for caps in GOAL_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let inner = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        push_span(&mut spans, whole.start(), whole.end(), Kind::Goal, inner.to_string());
    }
    for caps in GOAL_BARE_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let action = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let arg = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let inner = if arg.is_empty() { action.to_string() } else { format!("{action} {arg}") };
        push_span(&mut spans, whole.start(), whole.end(), Kind::Goal, inner);
    }
    for caps in PLAN_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let inner = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        push_span(&mut spans, whole.start(), whole.end(), Kind::Plan, inner.to_string());
    }
    for caps in STEP_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let inner = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        push_span(&mut spans, whole.start(), whole.end(), Kind::Step, inner.to_string());
    }
    for caps in STEP_BARE_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let prefix = caps.get(1).map(|m| m.as_str());
        let action = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let inner = match prefix {
            Some(p) => format!("{p}:{action}"),
            None => action.to_string(),
        };
        push_span(&mut spans, whole.start(), whole.end(), Kind::Step, inner);
    }
    for caps in ASTERISK_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let inner = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        push_span(&mut spans, whole.start(), whole.end(), Kind::Delimited, inner.to_string());
    }
    for caps in BRACKET_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let inner = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let lower = inner.trim_start().to_lowercase();
        if lower.starts_with("cmd:") || lower.starts_with("goal:") || lower.starts_with("plan:")
            || lower.starts_with("step:")
        {
            continue;
        }
        push_span(&mut spans, whole.start(), whole.end(), Kind::Delimited, inner.to_string());
    }

    spans.sort_by_key(|s| s.start);
    let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
    let mut cursor = 0usize;
    for span in spans {
        if span.start >= cursor {
            cursor = span.end;
            kept.push(span);
        }
    }
    kept
}

fn speech_action(text: &str) -> Option<NpcAction> {
    let stripped = strip_quotes(text);
    if stripped.is_empty() || is_pure_punctuation(&stripped) {
        return None;
    }
    Some(NpcAction::Speech(truncate_speech(&stripped)))
}

fn span_to_action(span: &Span) -> Option<NpcAction> {
    match span.kind {
        Kind::Command => {
            let mut parts = span.inner.splitn(2, char::is_whitespace);
            let name = parts.next().unwrap_or_default().to_string();
            let args = parts.next().unwrap_or_default().trim().to_string();
            if name.is_empty() {
                return None;
            }
            if is_forbidden_command(&name) {
                // Forbidden: silently dropped, no feedback entry (§7).
                return None;
            }
            Some(NpcAction::Command(ParsedCommand { name, args }))
        }
        Kind::Goal => parse_goal_content(&span.inner).map(NpcAction::Goal),
        Kind::Plan => parse_plan_content(&span.inner).map(NpcAction::Plan),
        Kind::Step => parse_step_content(&span.inner).map(NpcAction::Step),
        Kind::Delimited => {
            if looks_quoted(&span.inner) {
                speech_action(&span.inner)
            } else {
                let emote = rewrite_first_person(&span.inner);
                if emote.is_empty() || is_pure_punctuation(&emote) {
                    None
                } else {
                    Some(NpcAction::Emote(emote))
                }
            }
        }
    }
}

/// Parse raw LLM output into an ordered, capped action list (§4.E).
pub fn parse_npc_response(raw: &str) -> Vec<NpcAction> {
    let spans = collect_spans(raw);
    let mut actions = Vec::new();
    let mut cursor = 0usize;

    for span in &spans {
        if actions.len() >= MAX_ACTIONS_PER_RESPONSE {
            break;
        }
        if span.start > cursor {
            if let Some(action) = speech_action(&raw[cursor..span.start]) {
                actions.push(action);
                if actions.len() >= MAX_ACTIONS_PER_RESPONSE {
                    break;
                }
            }
        }
        if let Some(action) = span_to_action(span) {
            actions.push(action);
        }
        cursor = span.end;
    }

    if actions.len() < MAX_ACTIONS_PER_RESPONSE && cursor < raw.len() {
        if let Some(action) = speech_action(&raw[cursor..]) {
            actions.push(action);
        }
    }

    actions.truncate(MAX_ACTIONS_PER_RESPONSE);
    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_scenario_yields_speech_then_emote() {
        let actions = parse_npc_response("Greetings, traveler. *bows*");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0], NpcAction::Speech("Greetings, traveler.".to_string()));
        assert_eq!(actions[1], NpcAction::Emote("bows".to_string()));
    }

    #[test]
    fn first_person_emote_is_rewritten_to_third_person() {
        let actions = parse_npc_response("*I smile*");
        assert_eq!(actions, vec![NpcAction::Emote("smiles".to_string())]);
    }

    #[test]
    fn verbs_ending_in_sibilant_take_es() {
        let actions = parse_npc_response("*I dance*");
        assert_eq!(actions, vec![NpcAction::Emote("dances".to_string())]);
    }

    #[test]
    fn goal_markup_from_scenario_two() {
        let actions = parse_npc_response("I'll help. [goal:deliver package player]");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0], NpcAction::Speech("I'll help.".to_string()));
        assert_eq!(
            actions[1],
            NpcAction::Goal(GoalDirective::Upsert {
                goal_type: "deliver".to_string(),
                target: Some("package player".to_string()),
            })
        );
    }

    #[test]
    fn step_done_markup_parses_with_no_prefix() {
        let actions = parse_npc_response("[step:done]");
        assert_eq!(
            actions,
            vec![NpcAction::Step(StepDirective { goal_type: None, action: StepAction::Done })]
        );
    }

    #[test]
    fn plan_prefix_detection_follows_pipe_heuristic() {
        // No pipe before the first colon -> "deliver" is a goal-type prefix.
        let with_prefix = parse_plan_content("deliver:find alice|give package").unwrap();
        assert_eq!(with_prefix.goal_type.as_deref(), Some("deliver"));
        assert_eq!(with_prefix.steps, vec!["find alice", "give package"]);

        // A pipe appears before the first colon -> no prefix.
        let without_prefix = parse_plan_content("say hello|say: goodbye").unwrap();
        assert_eq!(without_prefix.goal_type, None);
        assert_eq!(without_prefix.steps, vec!["say hello", "say: goodbye"]);
    }

    #[test]
    fn forbidden_command_markup_is_dropped_silently() {
        let actions = parse_npc_response("Sure. [cmd:quit]");
        assert_eq!(actions, vec![NpcAction::Speech("Sure.".to_string())]);
    }

    #[test]
    fn action_cap_stops_at_three() {
        let actions = parse_npc_response("[cmd:go north] [cmd:go south] [cmd:go east] [cmd:go west]");
        assert_eq!(actions.len(), MAX_ACTIONS_PER_RESPONSE);
    }

    #[test]
    fn quoted_bracket_text_is_reclassified_as_speech() {
        let actions = parse_npc_response("[\"Wait for me!\"]");
        assert_eq!(actions, vec![NpcAction::Speech("Wait for me!".to_string())]);
    }

    #[test]
    fn pure_punctuation_is_dropped() {
        let actions = parse_npc_response("...   ***");
        assert!(actions.is_empty());
    }

    #[test]
    fn long_speech_is_truncated_with_ellipsis() {
        let long = "a".repeat(400);
        let actions = parse_npc_response(&long);
        match &actions[0] {
            NpcAction::Speech(s) => {
                assert!(s.ends_with("..."));
                assert!(s.chars().count() <= MAX_SPEECH_CHARS + 3);
            }
            other => panic!("expected speech, got {other:?}"),
        }
    }

    #[test]
    fn speech_over_three_sentences_is_cut_to_three() {
        let text = "One. Two. Three. Four.";
        let actions = parse_npc_response(text);
        assert_eq!(actions, vec![NpcAction::Speech("One. Two. Three.".to_string())]);
    }
}
