//! Placeholder substitution for macro change values.
//!
//! Two placeholders are recognised:
//! - `@token` becomes the target token's id
//! - `@@token` becomes a literal `@token`, left for the macro runner
//!
//! Whitespace before a placeholder collapses to a single space.

use crate::error::DefinitionError;
use crate::ids::EntityId;

const TARGET: &str = "@token";
const DEFERRED: &str = "@@token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// Replaced by the target token's id
    Target,
    /// Rendered as a literal `@token`
    Deferred,
}

/// A parsed macro argument string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroTemplate {
    segments: Vec<Segment>,
}

impl MacroTemplate {
    pub fn parse(value: &str) -> Result<Self, DefinitionError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = value;
        let mut consumed = 0;

        while let Some(at) = rest.find('@') {
            let tail = &rest[at..];
            let (placeholder, len) = if tail.starts_with(DEFERRED) {
                (Some(Segment::Deferred), DEFERRED.len())
            } else if tail.starts_with(TARGET) {
                (Some(Segment::Target), TARGET.len())
            } else {
                (None, 1)
            };

            match placeholder {
                Some(segment) => {
                    let follows_ident = tail[len..]
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_alphanumeric() || c == '_');
                    if follows_ident {
                        return Err(DefinitionError::AmbiguousPlaceholder {
                            value: value.to_string(),
                            offset: consumed + at,
                        });
                    }
                    literal.push_str(rest[..at].trim_end());
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                None => literal.push_str(&rest[..at + len]),
            }

            consumed += at + len;
            rest = &rest[at + len..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    pub fn has_placeholders(&self) -> bool {
        self.segments
            .iter()
            .any(|s| !matches!(s, Segment::Literal(_)))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Substitute the target token's id
    pub fn render(&self, target: &EntityId) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Target => {
                    out.push(' ');
                    out.push_str(target.as_str());
                }
                Segment::Deferred => {
                    out.push(' ');
                    out.push_str(TARGET);
                }
            }
        }
        out
    }
}
