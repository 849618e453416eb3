//! Line classification: an ordered set of anchored patterns, each tagged with
//! what a match means for the stream parser.

pub mod rules;

use crate::record::Measurement;
use regex::{Captures, Regex};
use std::fmt;
use thiserror::Error;
use tracing::trace;

pub use rules::Preset;

/// What kind of line a rule recognizes. The derived order is the priority in
/// which rules are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleKind {
    Comment,
    Marker,
    Data,
}

/// The outcome of a successful match.
#[derive(Debug, Clone, PartialEq)]
pub enum TaggedMatch {
    Comment,
    /// Starts a new series; carries its label.
    Marker(String),
    Data(Measurement),
}

/// A data line matched its shape but a captured field is not a valid number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}` value {text:?}")]
pub struct FieldError {
    pub field: &'static str,
    pub text: String,
}

pub type Extract = fn(&Captures<'_>) -> Result<Measurement, FieldError>;

enum Extractor {
    Comment,
    Marker,
    Data(Extract),
}

pub struct Rule {
    name: &'static str,
    pattern: Regex,
    extractor: Extractor,
}

impl Rule {
    /// Lines matching `pattern` are skipped silently.
    pub fn comment(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Self::build(name, pattern, Extractor::Comment)
    }

    /// Lines matching `pattern` set the series label to the `label` group.
    pub fn marker(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Self::build(name, pattern, Extractor::Marker)
    }

    pub fn data(name: &'static str, pattern: &str, extract: Extract) -> Result<Self, regex::Error> {
        Self::build(name, pattern, Extractor::Data(extract))
    }

    fn build(name: &'static str, pattern: &str, extractor: Extractor) -> Result<Self, regex::Error> {
        // matches must start at position 0, whatever alternations the pattern holds
        let pattern = Regex::new(&format!("^(?:{})", pattern))?;
        Ok(Self {
            name,
            pattern,
            extractor,
        })
    }

    pub fn kind(&self) -> RuleKind {
        match self.extractor {
            Extractor::Comment => RuleKind::Comment,
            Extractor::Marker => RuleKind::Marker,
            Extractor::Data(_) => RuleKind::Data,
        }
    }

    fn apply(&self, line: &str) -> Option<Result<TaggedMatch, FieldError>> {
        let caps = self.pattern.captures(line)?;
        Some(match self.extractor {
            Extractor::Comment => Ok(TaggedMatch::Comment),
            Extractor::Marker => {
                let label = caps.name("label").map_or("", |m| m.as_str());
                Ok(TaggedMatch::Marker(label.to_string()))
            }
            Extractor::Data(extract) => extract(&caps).map(TaggedMatch::Data),
        })
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

#[derive(Debug)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    /// Rules are reordered comment → marker → data; order within a kind is kept.
    pub fn new(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(Rule::kind);
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First matching rule wins; `Ok(None)` for lines no rule recognizes.
    pub fn classify(&self, line: &str) -> Result<Option<TaggedMatch>, FieldError> {
        for rule in &self.rules {
            if let Some(result) = rule.apply(line) {
                trace!(rule = rule.name, "matched");
                return result.map(Some);
            }
        }
        Ok(None)
    }
}
