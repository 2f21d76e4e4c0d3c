//! Naming convention compiler
//!
//! A series describes how its cut folders are named with a template such as
//! `{series}_{episode}_{scene}_{cut}{stage}`. Compiling the template yields a
//! case-insensitive, fully anchored regex plus the ordered list of fields its
//! capture groups correspond to.
//!
//! Placeholders are tried at each position in a fixed order: longest token
//! first, ties broken alphabetically. Literal text is regex-escaped. A `{` or
//! `}` that does not belong to a known placeholder, or a placeholder used
//! twice, is rejected with [`Code::ParseFailed`].

use crate::identity::CutIdentity;
use regex::{Regex, RegexBuilder};
use setman_common::{Code, Error, Result};
use std::fmt;

/// A field a naming convention can encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Series,
    Episode,
    Scene,
    Cut,
    Stage,
    Take,
}

/// Placeholder scan order: longest token first, then alphabetical
const SCAN_ORDER: [Field; 6] = [
    Field::Episode,
    Field::Series,
    Field::Scene,
    Field::Stage,
    Field::Take,
    Field::Cut,
];

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Series => "series",
            Field::Episode => "episode",
            Field::Scene => "scene",
            Field::Cut => "cut",
            Field::Stage => "stage",
            Field::Take => "take",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Field::Series => "{series}",
            Field::Episode => "{episode}",
            Field::Scene => "{scene}",
            Field::Cut => "{cut}",
            Field::Stage => "{stage}",
            Field::Take => "{take}",
        }
    }

    /// Capture group substituted for the placeholder
    fn fragment(&self) -> &'static str {
        match self {
            Field::Series | Field::Take => "([A-Za-z0-9]+)",
            Field::Episode | Field::Scene | Field::Cut => "([0-9]+)",
            Field::Stage => "([A-Za-z0-9_]+)",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compiled naming convention
///
/// Always built from its template; there is no way to swap the template
/// without recompiling.
#[derive(Debug, Clone)]
pub struct NamingConvention {
    template: String,
    regex: Regex,
    fields: Vec<Field>,
}

impl NamingConvention {
    /// Compile a template into a matcher
    pub fn compile(template: &str) -> Result<Self> {
        let mut pattern = String::with_capacity(template.len() * 2);
        let mut fields: Vec<Field> = Vec::new();

        let mut p = 0;
        while p < template.len() {
            let rest = &template[p..];

            if let Some(field) = SCAN_ORDER
                .iter()
                .find(|f| rest.starts_with(f.placeholder()))
            {
                if fields.contains(field) {
                    return Err(Error::with_message(
                        Code::ParseFailed,
                        format!(
                            "Placeholder {} appears more than once in '{}'",
                            field.placeholder(),
                            template
                        ),
                    ));
                }
                fields.push(*field);
                pattern.push_str(field.fragment());
                p += field.placeholder().len();
                continue;
            }

            let ch = rest.chars().next().unwrap_or_default();
            match ch {
                '{' => {
                    let message = match rest.find('}') {
                        Some(end) => format!(
                            "Unknown placeholder {} in '{}'",
                            &rest[..=end],
                            template
                        ),
                        None => format!("Unbalanced '{{' in '{}'", template),
                    };
                    return Err(Error::with_message(Code::ParseFailed, message));
                }
                '}' => {
                    return Err(Error::with_message(
                        Code::ParseFailed,
                        format!("Unbalanced '}}' in '{}'", template),
                    ));
                }
                _ => {
                    let mut buf = [0u8; 4];
                    pattern.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
                    p += ch.len_utf8();
                }
            }
        }

        let regex = RegexBuilder::new(&format!("^(?:{})$", pattern))
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                Error::with_message(
                    Code::ParseFailed,
                    format!("Naming convention '{}' did not compile: {}", template, e),
                )
            })?;

        tracing::debug!(
            template = %template,
            pattern = %regex.as_str(),
            fields = fields.len(),
            "Compiled naming convention"
        );

        Ok(Self {
            template: template.to_string(),
            regex,
            fields,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Fields in capture-group order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    /// Compiled regex source
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Render a folder name for an identity
    ///
    /// Returns `None` when the identity lacks a field the template needs.
    /// Numbers are written without padding; a take of 2 is written as `r`
    /// only if `retake_as_r` is set.
    pub fn render(&self, identity: &CutIdentity, retake_as_r: bool) -> Option<String> {
        let mut out = self.template.clone();
        for field in &self.fields {
            let value = match field {
                Field::Series => identity.series.clone()?,
                Field::Episode => identity.episode?.to_string(),
                Field::Scene => identity.scene?.to_string(),
                Field::Cut => identity.number?.to_string(),
                Field::Stage => identity.stage.clone()?,
                Field::Take => match identity.take? {
                    2 if retake_as_r => "r".to_string(),
                    n => format!("t{}", n),
                },
            };
            out = out.replacen(field.placeholder(), &value, 1);
        }
        Some(out)
    }
}

impl PartialEq for NamingConvention {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
    }
}

impl Eq for NamingConvention {}
