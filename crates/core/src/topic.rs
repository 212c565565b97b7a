//! Topic labeller.
//!
//! Turns a free-form request such as "帮我写一个关于产品营销的文案" or
//! "please help me write about product marketing" into a short topic tag
//! that groups versions for numbering. The heuristic is deterministic and
//! driven entirely by the token lists in [`TopicLexicon`], so it can be
//! tuned or localised without touching the numbering engine.
//!
//! Lengths are measured in display units: one CJK character, one symbol,
//! or one run of Latin word characters. Whitespace is free.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a topic label in display units.
pub const MAX_TOPIC_UNITS: usize = 10;

/// Units of object kept in front of a transform verb ("代码优化").
pub const TRANSFORM_OBJECT_UNITS: usize = 4;

/// Label used when neither the residual nor the raw input yields anything.
pub const DEFAULT_TOPIC: &str = "untitled";

// ---------------------------------------------------------------------------
// Lexicon
// ---------------------------------------------------------------------------

/// Token lists driving [`derive_topic`].
///
/// Latin tokens match ASCII case-insensitively and only on word
/// boundaries; CJK tokens match anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicLexicon {
    /// Leading request framing ("请帮我", "please help me"). Longest match wins.
    pub request_prefixes: Vec<String>,
    /// Sentence-final particles and punctuation ("吗", "？", "?").
    pub trailing_particles: Vec<String>,
    /// Topic-introducing connectives ("关于", "about").
    pub connectives: Vec<String>,
    /// Clause delimiters; everything from the first one on is dropped.
    pub clause_delimiters: Vec<String>,
    /// Descriptor + noun-type suffixes ("的文案", " copy").
    pub descriptor_suffixes: Vec<String>,
    /// Bare noun-type suffixes, only stripped from over-long residuals.
    pub bare_suffixes: Vec<String>,
    /// Markers that make a bare suffix part of a compound ("的").
    pub descriptor_markers: Vec<String>,
    /// Verbs that turn the label into "{object}{verb}" ("优化", "optimize").
    pub transform_verbs: Vec<String>,
    /// Filler right after a transform verb ("这段", "this passage").
    pub transform_fillers: Vec<String>,
    /// Last-resort label.
    pub fallback_label: String,
}

fn tokens(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

impl Default for TopicLexicon {
    fn default() -> Self {
        Self {
            request_prefixes: tokens(&[
                "请帮我生成一个",
                "请帮我创建一个",
                "请帮我写一个",
                "请帮我写个",
                "请帮我",
                "帮我生成一个",
                "帮我创建一个",
                "帮我写一个",
                "帮我写个",
                "帮我",
                "帮忙",
                "请生成一个",
                "请创建一个",
                "请写一个",
                "请",
                "我想创建一个",
                "我想生成一个",
                "我想写一个",
                "我想",
                "我要写一个",
                "我要",
                "能否",
                "可以",
                "麻烦",
                "写一个",
                "写个",
                "生成一个",
                "生成",
                "创建一个",
                "创建",
                "please help me write an",
                "please help me write a",
                "please help me write",
                "please help me",
                "please write an",
                "please write a",
                "please",
                "help me write an",
                "help me write a",
                "help me write",
                "help me",
                "i want to write an",
                "i want to write a",
                "i want to create a",
                "i want to",
                "i'd like to",
                "can you",
                "could you",
                "write an",
                "write a",
                "generate an",
                "generate a",
                "generate",
                "create an",
                "create a",
                "create",
            ]),
            trailing_particles: tokens(&["吗", "呢", "吧", "啊", "。", "？", "！", "?", "!", "."]),
            connectives: tokens(&["关于", "about", "regarding"]),
            clause_delimiters: tokens(&["，", ","]),
            descriptor_suffixes: tokens(&[
                "的文案",
                "的文档",
                "的指南",
                "的介绍",
                "的建议",
                "的攻略",
                "的演讲稿",
                "的说明",
                " copy",
                " document",
                " guide",
                " introduction",
                " suggestions",
                " speech",
                " description",
            ]),
            bare_suffixes: tokens(&["文案", "介绍", "建议", "攻略", "演讲稿", "说明"]),
            descriptor_markers: tokens(&["的"]),
            transform_verbs: tokens(&["优化", "optimize", "improve", "polish"]),
            transform_fillers: tokens(&["这段", "这篇", "this passage", "this paragraph", "this text"]),
            fallback_label: DEFAULT_TOPIC.to_string(),
        }
    }
}

impl TopicLexicon {
    /// Parse a lexicon from JSON. Missing lists fall back to the built-in defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let lexicon: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Invalid topic lexicon: {e}")))?;
        lexicon.validate()?;
        Ok(lexicon)
    }

    /// The fallback label must itself be a valid topic.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fallback = self.fallback_label.trim();
        if fallback.is_empty() {
            return Err(CoreError::Validation(
                "Topic lexicon fallback_label must not be empty".to_string(),
            ));
        }
        let units = unit_count(fallback);
        if units > MAX_TOPIC_UNITS {
            return Err(CoreError::Validation(format!(
                "Topic lexicon fallback_label exceeds {MAX_TOPIC_UNITS} units (got {units})"
            )));
        }
        Ok(())
    }

    /// Fallback label, clamped to a valid topic even for hand-built lexicons.
    fn fallback(&self) -> String {
        let label = truncate_units(self.fallback_label.trim(), MAX_TOPIC_UNITS).trim();
        if label.is_empty() {
            DEFAULT_TOPIC.to_string()
        } else {
            label.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Display units
// ---------------------------------------------------------------------------

fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x3040..=0x30FF | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xAC00..=0xD7AF
            | 0xF900..=0xFAFF | 0x20000..=0x2FA1F
    )
}

fn is_word_char(c: char) -> bool {
    (c.is_alphanumeric() && !is_cjk(c)) || matches!(c, '\'' | '-' | '_')
}

/// Count display units in `text`.
pub fn unit_count(text: &str) -> usize {
    let mut units = 0;
    let mut in_word = false;
    for c in text.chars() {
        if c.is_whitespace() {
            in_word = false;
            continue;
        }
        let word = is_word_char(c);
        if !(word && in_word) {
            units += 1;
        }
        in_word = word;
    }
    units
}

/// Keep at most `max` display units of `text`.
pub fn truncate_units(text: &str, max: usize) -> &str {
    let mut units = 0;
    let mut in_word = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            in_word = false;
            continue;
        }
        let word = is_word_char(c);
        if !(word && in_word) {
            if units == max {
                return text[..i].trim_end();
            }
            units += 1;
        }
        in_word = word;
    }
    text
}

// ---------------------------------------------------------------------------
// Token matching
// ---------------------------------------------------------------------------

/// Whether `token` occurs in `haystack` at byte offset `at`.
fn matches_at(haystack: &str, at: usize, token: &str) -> bool {
    let end = at + token.len();
    if token.is_empty()
        || end > haystack.len()
        || !haystack.is_char_boundary(at)
        || !haystack.is_char_boundary(end)
    {
        return false;
    }
    if !haystack.as_bytes()[at..end].eq_ignore_ascii_case(token.as_bytes()) {
        return false;
    }
    let starts_word = token.chars().next().is_some_and(is_word_char);
    let ends_word = token.chars().next_back().is_some_and(is_word_char);
    if starts_word && haystack[..at].chars().next_back().is_some_and(is_word_char) {
        return false;
    }
    if ends_word && haystack[end..].chars().next().is_some_and(is_word_char) {
        return false;
    }
    true
}

fn longest_prefix<'t>(text: &str, list: &'t [String]) -> Option<&'t str> {
    list.iter()
        .map(String::as_str)
        .filter(|t| matches_at(text, 0, t))
        .max_by_key(|t| t.len())
}

fn longest_suffix<'t>(text: &str, list: &'t [String]) -> Option<&'t str> {
    list.iter()
        .map(String::as_str)
        .filter(|t| t.len() <= text.len() && matches_at(text, text.len() - t.len(), t))
        .max_by_key(|t| t.len())
}

/// Earliest occurrence of any token, as `(offset, token_len)`.
fn find_first(text: &str, list: &[String]) -> Option<(usize, usize)> {
    text.char_indices().find_map(|(at, _)| {
        list.iter()
            .filter(|t| matches_at(text, at, t))
            .map(|t| (at, t.len()))
            .max_by_key(|&(_, len)| len)
    })
}

fn strip_prefix_once<'a>(text: &'a str, list: &[String]) -> &'a str {
    match longest_prefix(text, list) {
        Some(token) => text[token.len()..].trim(),
        None => text,
    }
}

/// Append `verb` after `object`, with a space only between two Latin words.
fn join_units(object: &str, verb: &str) -> String {
    if object.is_empty() {
        return verb.to_string();
    }
    let needs_space = object.chars().next_back().is_some_and(is_word_char)
        && verb.chars().next().is_some_and(is_word_char);
    if needs_space {
        format!("{object} {verb}")
    } else {
        format!("{object}{verb}")
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive a topic label from free-form input. Always returns a non-empty
/// label of at most [`MAX_TOPIC_UNITS`] display units.
///
/// # Examples
///
/// ```
/// use verso_core::topic::{derive_topic, TopicLexicon};
///
/// let lexicon = TopicLexicon::default();
/// assert_eq!(derive_topic("帮我写一个关于产品营销的文案", &lexicon), "产品营销");
/// assert_eq!(derive_topic("帮我优化这段代码", &lexicon), "代码优化");
/// ```
pub fn derive_topic(raw_input: &str, lexicon: &TopicLexicon) -> String {
    let mut residual = raw_input.trim();

    residual = strip_prefix_once(residual, &lexicon.request_prefixes);

    if let Some(token) = longest_suffix(residual, &lexicon.trailing_particles) {
        residual = residual[..residual.len() - token.len()].trim();
    }

    if let Some((at, len)) = find_first(residual, &lexicon.connectives) {
        residual = residual[at + len..].trim();
    }

    if let Some((at, _)) = find_first(residual, &lexicon.clause_delimiters) {
        residual = residual[..at].trim();
    }

    let label = match longest_prefix(residual, &lexicon.transform_verbs) {
        Some(verb_token) => {
            let verb = &residual[..verb_token.len()];
            let object = strip_prefix_once(residual[verb.len()..].trim(), &lexicon.transform_fillers);
            join_units(truncate_units(object, TRANSFORM_OBJECT_UNITS), verb)
        }
        None => strip_document_suffix(residual, lexicon).to_string(),
    };

    let label = truncate_units(&label, MAX_TOPIC_UNITS).trim();
    if !label.is_empty() {
        return label.to_string();
    }

    let fallback = truncate_units(raw_input, MAX_TOPIC_UNITS).trim();
    if !fallback.is_empty() {
        return fallback.to_string();
    }
    lexicon.fallback()
}

/// Drop a trailing "descriptor + noun type" suffix, or a bare noun type
/// from an over-long residual.
fn strip_document_suffix<'a>(residual: &'a str, lexicon: &TopicLexicon) -> &'a str {
    if let Some(token) = longest_suffix(residual, &lexicon.descriptor_suffixes) {
        return residual[..residual.len() - token.len()].trim();
    }

    if unit_count(residual) <= MAX_TOPIC_UNITS {
        return residual;
    }

    let stripped = lexicon
        .bare_suffixes
        .iter()
        .map(String::as_str)
        .filter(|t| t.len() < residual.len() && matches_at(residual, residual.len() - t.len(), t))
        .filter(|t| {
            let head = &residual[..residual.len() - t.len()];
            longest_suffix(head, &lexicon.descriptor_markers).is_none()
        })
        .max_by_key(|t| t.len());

    match stripped {
        Some(token) => residual[..residual.len() - token.len()].trim(),
        None => residual,
    }
}

/// Normalise an explicitly supplied topic: trimmed, non-blank, truncated to
/// [`MAX_TOPIC_UNITS`].
pub fn normalize_topic(topic: &str) -> Result<String, CoreError> {
    let trimmed = truncate_units(topic.trim(), MAX_TOPIC_UNITS).trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Topic must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
