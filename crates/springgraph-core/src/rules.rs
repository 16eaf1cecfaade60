//! C2 — rule-driven logical-name / description extraction.
//!
//! The rule set itself is configuration (spec.md: "authoring of rule files
//! is external"); this module only defines the abstraction the core
//! consumes and its extraction algorithm. Compiled patterns are cached by
//! template string and treated as immutable once published, matching the
//! read-mostly cache spec.md §5 calls for.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructKind {
    Class,
    Method,
    Field,
    Mapper,
    Sql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    Line,
    Block,
    Either,
}

#[derive(Debug, Clone)]
pub struct LogicalNameRuleSet {
    pub comment_style: CommentStyle,
    /// Per-kind template strings with a `{logical_name}` placeholder.
    pub pattern_templates: HashMap<ConstructKind, Vec<String>>,
    /// Lines ignored while walking upward from the declaration.
    pub skip_tokens: Vec<String>,
    /// Deterministic transformations applied when no pattern matches.
    pub fallback_rules: Vec<FallbackRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackRule {
    /// Split `camelCase`/`PascalCase` identifiers into space-separated words.
    SplitCamelCase,
    /// Use the declaration's identifier verbatim.
    Identity,
}

impl Default for LogicalNameRuleSet {
    fn default() -> Self {
        LogicalNameRuleSet {
            comment_style: CommentStyle::Either,
            pattern_templates: HashMap::new(),
            skip_tokens: Vec::new(),
            fallback_rules: vec![FallbackRule::SplitCamelCase],
        }
    }
}

static PATTERN_CACHE: Lazy<RwLock<HashMap<String, Regex>>> = Lazy::new(|| RwLock::new(HashMap::new()));

fn compiled_pattern(template: &str) -> Option<Regex> {
    if let Some(re) = PATTERN_CACHE.read().ok()?.get(template) {
        return Some(re.clone());
    }
    let escaped = regex::escape(template).replace(r"\{logical_name\}", "(?P<logical_name>.+?)");
    let re = Regex::new(&format!("^{}$", escaped)).ok()?;
    PATTERN_CACHE.write().ok()?.insert(template.to_string(), re.clone());
    Some(re)
}

/// Output of a single extraction: both fields may be empty but extraction
/// itself never fails — spec.md §4.2, "Extraction never throws".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedName {
    pub logical_name: String,
    pub description: String,
}

impl LogicalNameRuleSet {
    /// Walk the comment lines immediately preceding `declaration_offset` in
    /// `source_text`, skipping configured tokens, and try each template for
    /// `kind` in order. Falls back to a deterministic transform of
    /// `declaration_identifier` when nothing matches.
    pub fn extract(
        &self,
        source_text: &str,
        kind: ConstructKind,
        declaration_offset: usize,
        declaration_identifier: &str,
    ) -> ExtractedName {
        let preceding = &source_text[..declaration_offset.min(source_text.len())];
        let candidate_lines: Vec<&str> = preceding
            .lines()
            .rev()
            .take_while(|line| {
                let trimmed = line.trim();
                !trimmed.is_empty() || self.skip_tokens.iter().any(|t| trimmed == t)
            })
            .collect();

        if let Some(templates) = self.pattern_templates.get(&kind) {
            for line in &candidate_lines {
                let trimmed = line.trim_start_matches(['/', '*']).trim();
                if self.skip_tokens.iter().any(|t| trimmed == t) {
                    continue;
                }
                for template in templates {
                    if let Some(re) = compiled_pattern(template) {
                        if let Some(caps) = re.captures(trimmed) {
                            if let Some(name) = caps.name("logical_name") {
                                return ExtractedName {
                                    logical_name: name.as_str().trim().to_string(),
                                    description: trimmed.to_string(),
                                };
                            }
                        }
                    }
                }
            }
        }

        for fallback in &self.fallback_rules {
            match fallback {
                FallbackRule::SplitCamelCase => {
                    return ExtractedName {
                        logical_name: split_camel_case(declaration_identifier),
                        description: String::new(),
                    };
                }
                FallbackRule::Identity => {
                    return ExtractedName {
                        logical_name: declaration_identifier.to_string(),
                        description: String::new(),
                    };
                }
            }
        }

        ExtractedName::default()
    }
}

fn split_camel_case(identifier: &str) -> String {
    let mut out = String::new();
    for (i, ch) in identifier.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            out.push(' ');
        }
        out.extend(ch.to_lowercase());
    }
    out
}
