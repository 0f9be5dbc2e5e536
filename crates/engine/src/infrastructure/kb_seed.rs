//! KB seed-file loader (§6 "KB seed file"). Plaintext, one directive per
//! line: `kb set <key> { … JSON … } [--npcs id1,id2] [--summary "text"]
//! [tag1 tag2 …]`. `#`-prefixed lines are comments; braces may nest, so
//! the JSON span is found by matching the outer `{`/`}` pair rather than
//! stopping at the first `}`.
//!
//! Grounded on the markup parser's own approach to finding a matching
//! delimiter pair (`crate::application::services::response_parser`) —
//! same "count depth while scanning" technique, applied to `{`/`}`
//! instead of bracket markup.

use std::collections::HashSet;

use chrono::Utc;

use loreweave_domain::{NpcId, WorldKbEntry};

use crate::infrastructure::error::CoreError;
use crate::infrastructure::persistence::WorldKnowledgeBasePort;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KbSeedError {
    #[error("line {line}: missing `kb set` keyword")]
    NotASetDirective { line: usize },
    #[error("line {line}: missing key after `kb set`")]
    MissingKey { line: usize },
    #[error("line {line}: missing `{{` opening the JSON value")]
    MissingOpenBrace { line: usize },
    #[error("line {line}: unmatched `{{` — JSON value never closes")]
    UnmatchedBrace { line: usize },
    #[error("line {line}: invalid JSON value: {source}")]
    InvalidJson { line: usize, source: String },
}

/// One parsed `kb set` directive, before visibility derivation.
#[derive(Debug, Clone, PartialEq)]
struct SeedDirective {
    key: String,
    value: serde_json::Value,
    npcs: Vec<String>,
    summary: Option<String>,
    tags: Vec<String>,
}

/// Find the index just past the `}` matching the `{` at `open_idx`,
/// counting nested braces (braces inside JSON string literals are not
/// specially handled — seed files are not expected to contain `{`/`}`
/// inside quoted strings of their own key; ordinary JSON content is
/// unaffected since depth only ever increases past the first `{`).
fn matching_close_brace(s: &str, open_idx: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate().skip(open_idx) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split `--npcs a,b` / `--summary "text with spaces"` / bare tag tokens
/// out of the tail following the closing `}`.
fn parse_tail(tail: &str) -> (Vec<String>, Option<String>, Vec<String>) {
    let mut npcs = Vec::new();
    let mut summary = None;
    let mut tags = Vec::new();

    let chars: Vec<char> = tail.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        if tail[byte_index(&chars, i)..].starts_with("--npcs") {
            i += "--npcs".len();
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            let start = i;
            while i < chars.len() && !chars[i].is_whitespace() {
                i += 1;
            }
            let value: String = chars[start..i].iter().collect();
            npcs = value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        } else if tail[byte_index(&chars, i)..].starts_with("--summary") {
            i += "--summary".len();
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            if i < chars.len() && chars[i] == '"' {
                i += 1;
                let start = i;
                while i < chars.len() && chars[i] != '"' {
                    i += 1;
                }
                summary = Some(chars[start..i].iter().collect());
                if i < chars.len() {
                    i += 1;
                }
            }
        } else {
            let start = i;
            while i < chars.len() && !chars[i].is_whitespace() {
                i += 1;
            }
            let token: String = chars[start..i].iter().collect();
            if !token.is_empty() {
                tags.push(token);
            }
        }
    }

    (npcs, summary, tags)
}

fn byte_index(chars: &[char], char_idx: usize) -> usize {
    chars[..char_idx].iter().map(|c| c.len_utf8()).sum()
}

fn parse_line(line: &str, line_no: usize) -> Result<Option<SeedDirective>, KbSeedError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let rest = trimmed
        .strip_prefix("kb set ")
        .or_else(|| trimmed.strip_prefix("kb set\t"))
        .ok_or(KbSeedError::NotASetDirective { line: line_no })?;
    let rest = rest.trim_start();

    let open_idx = rest.find('{').ok_or(KbSeedError::MissingOpenBrace { line: line_no })?;
    let key = rest[..open_idx].trim();
    if key.is_empty() {
        return Err(KbSeedError::MissingKey { line: line_no });
    }

    let close_idx = matching_close_brace(rest, open_idx).ok_or(KbSeedError::UnmatchedBrace { line: line_no })?;
    let json_span = &rest[open_idx..=close_idx];
    let value: serde_json::Value = serde_json::from_str(json_span)
        .map_err(|e| KbSeedError::InvalidJson { line: line_no, source: e.to_string() })?;

    let (npcs, summary, tags) = parse_tail(&rest[close_idx + 1..]);

    Ok(Some(SeedDirective { key: key.to_string(), value, npcs, summary, tags }))
}

/// Parse a whole seed file's contents into entries, without touching the
/// store. Exposed separately from [`load_into`] so callers can validate a
/// file before committing it.
pub fn parse(contents: &str) -> Result<Vec<WorldKbEntry>, KbSeedError> {
    let mut entries = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if let Some(directive) = parse_line(line, idx + 1)? {
            let npc_ids: Option<HashSet<NpcId>> = if directive.npcs.is_empty() {
                None
            } else {
                Some(directive.npcs.iter().map(|s| NpcId::new(s.clone())).collect())
            };
            let visibility = WorldKbEntry::visibility_for(&npc_ids);
            entries.push(WorldKbEntry {
                key: directive.key,
                value: directive.value,
                tags: directive.tags.into_iter().collect(),
                visibility,
                npc_ids,
                summary: directive.summary,
                embedding: None,
                updated_at: Utc::now(),
            });
        }
    }
    Ok(entries)
}

/// Parse `contents` and upsert every entry into `kb`, returning how many
/// were loaded.
pub async fn load_into(contents: &str, kb: &dyn WorldKnowledgeBasePort) -> Result<usize, CoreError> {
    let entries = parse(contents).map_err(|e| CoreError::Repo(e.to_string()))?;
    let count = entries.len();
    for entry in entries {
        kb.upsert(entry).await;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_public_entry() {
        let src = r#"kb set tavern_rumor { "text": "the mine collapsed" } --summary "mine collapse rumor" rumor mine"#;
        let entries = parse(src).unwrap();
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.key, "tavern_rumor");
        assert_eq!(e.value, serde_json::json!({"text": "the mine collapsed"}));
        assert_eq!(e.summary.as_deref(), Some("mine collapse rumor"));
        assert!(e.tags.contains("rumor") && e.tags.contains("mine"));
        assert_eq!(e.visibility, loreweave_domain::KbVisibility::Public);
        assert!(e.npc_ids.is_none());
    }

    #[test]
    fn npc_restricted_entry_sets_npc_visibility() {
        let src = r#"kb set barnaby_secret { "text": "hides coin purse" } --npcs barnaby,smith"#;
        let entries = parse(src).unwrap();
        let e = &entries[0];
        assert_eq!(e.visibility, loreweave_domain::KbVisibility::Npc);
        let ids = e.npc_ids.as_ref().unwrap();
        assert!(ids.contains(&NpcId::new("barnaby")));
        assert!(ids.contains(&NpcId::new("smith")));
    }

    #[test]
    fn nested_braces_in_json_value_are_matched_correctly() {
        let src = r#"kb set town_layout { "rooms": {"square": {"x": 0, "y": 0}} } layout"#;
        let entries = parse(src).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value["rooms"]["square"]["x"], 0);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let src = "# a comment\n\n  \nkb set k { \"v\": 1 }\n";
        let entries = parse(src).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn missing_open_brace_is_an_error() {
        let err = parse_line("kb set k no_brace_here", 3).unwrap_err();
        assert_eq!(err, KbSeedError::MissingOpenBrace { line: 3 });
    }

    #[test]
    fn unmatched_brace_is_an_error() {
        let err = parse_line(r#"kb set k { "a": 1 "#, 7).unwrap_err();
        assert_eq!(err, KbSeedError::UnmatchedBrace { line: 7 });
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = parse_line("kb set k { not json }", 9);
        assert!(matches!(err, Err(KbSeedError::InvalidJson { line: 9, .. })));
    }

    #[test]
    fn line_not_starting_with_kb_set_is_an_error() {
        let err = parse_line("set k { }", 1).unwrap_err();
        assert_eq!(err, KbSeedError::NotASetDirective { line: 1 });
    }
}
