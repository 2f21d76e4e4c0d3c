//! Cut identity parsing
//!
//! Recovers a [`CutIdentity`] from a folder name using a compiled
//! [`NamingConvention`]. Parsing is a full-string match: a name that merely
//! contains a matching substring is rejected.

use crate::naming::{Field, NamingConvention};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinates of a cut as encoded in its folder name
///
/// Fields the naming convention does not encode stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CutIdentity {
    pub series: Option<String>,
    pub episode: Option<u32>,
    pub scene: Option<u32>,
    pub number: Option<u32>,
    pub stage: Option<String>,
    /// Revision ordinal; an `r` take is the second take
    pub take: Option<u32>,
}

impl CutIdentity {
    /// Keep only the fields a convention encodes
    pub fn restricted_to(&self, fields: &[Field]) -> Self {
        let keep = |f: Field| fields.contains(&f);
        Self {
            series: self.series.clone().filter(|_| keep(Field::Series)),
            episode: self.episode.filter(|_| keep(Field::Episode)),
            scene: self.scene.filter(|_| keep(Field::Scene)),
            number: self.number.filter(|_| keep(Field::Cut)),
            stage: self.stage.clone().filter(|_| keep(Field::Stage)),
            take: self.take.filter(|_| keep(Field::Take)),
        }
    }

    /// Same slot, comparing text fields without regard to ASCII case
    pub fn same_as(&self, other: &Self) -> bool {
        opt_text_eq(&self.series, &other.series)
            && self.episode == other.episode
            && self.scene == other.scene
            && self.number == other.number
            && opt_text_eq(&self.stage, &other.stage)
            && self.take == other.take
    }
}

impl fmt::Display for CutIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(series) = &self.series {
            parts.push(format!("series={}", series));
        }
        if let Some(episode) = self.episode {
            parts.push(format!("episode={}", episode));
        }
        if let Some(scene) = self.scene {
            parts.push(format!("scene={}", scene));
        }
        if let Some(number) = self.number {
            parts.push(format!("cut={}", number));
        }
        if let Some(stage) = &self.stage {
            parts.push(format!("stage={}", stage));
        }
        if let Some(take) = self.take {
            parts.push(format!("take={}", take));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

pub(crate) fn opt_text_eq(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

/// Production stage a label belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Layout
    Lo,
    /// Key animation
    Ka,
    Ls,
    /// Second key (genga)
    Gs,
    Other,
}

impl Stage {
    /// Classify a stage label; the flag is set for `_r` retake labels
    pub fn classify(label: &str) -> (Stage, bool) {
        let lower = label.to_ascii_lowercase();
        let (base, retake) = match lower.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (lower.as_str(), false),
        };
        let stage = match base {
            "lo" => Stage::Lo,
            "ka" => Stage::Ka,
            "ls" => Stage::Ls,
            "gs" => Stage::Gs,
            _ => Stage::Other,
        };
        (stage, retake)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Lo => "lo",
            Stage::Ka => "ka",
            Stage::Ls => "ls",
            Stage::Gs => "gs",
            Stage::Other => "other",
        }
    }
}

/// Parse a folder name into an identity
///
/// `None` on non-match, and on any captured value that cannot be converted
/// (numeric overflow, a take with no trailing digits).
pub fn parse_cut_name(convention: &NamingConvention, name: &str) -> Option<CutIdentity> {
    let captures = convention.regex().captures(name)?;

    let mut identity = CutIdentity::default();

    for (i, field) in convention.fields().iter().enumerate() {
        // Group 0 is the whole match
        let value = captures.get(i + 1)?.as_str();

        match field {
            Field::Series => identity.series = Some(value.to_string()),
            Field::Stage => identity.stage = Some(value.to_string()),
            Field::Episode => identity.episode = Some(parse_number(name, *field, value)?),
            Field::Scene => identity.scene = Some(parse_number(name, *field, value)?),
            Field::Cut => identity.number = Some(parse_number(name, *field, value)?),
            Field::Take => {
                identity.take = if value.eq_ignore_ascii_case("r") {
                    Some(2)
                } else {
                    let take = last_integer_sequence_of(value);
                    if take.is_none() {
                        tracing::debug!(name = %name, take = %value, "Take has no trailing digits");
                    }
                    Some(take?)
                };
            }
        }
    }

    Some(identity)
}

fn parse_number(name: &str, field: Field, value: &str) -> Option<u32> {
    match value.parse::<u32>() {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::debug!(name = %name, field = %field, value = %value, error = %e, "Numeric field did not convert");
            None
        }
    }
}

/// Trailing run of ASCII digits parsed as a number
///
/// `"t12"` gives 12, `"2b"` gives `None`.
pub fn last_integer_sequence_of(sequence: &str) -> Option<u32> {
    let digits = sequence
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    sequence[sequence.len() - digits..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convention(template: &str) -> NamingConvention {
        NamingConvention::compile(template).unwrap()
    }

    #[test]
    fn test_parse_reference_example() {
        let nc = convention("{series}_{episode}_{scene}_{cut}{stage}");
        let id = parse_cut_name(&nc, "ABC_01_02_003lo").unwrap();
        assert_eq!(id.series.as_deref(), Some("ABC"));
        assert_eq!(id.episode, Some(1));
        assert_eq!(id.scene, Some(2));
        assert_eq!(id.number, Some(3));
        assert_eq!(id.stage.as_deref(), Some("lo"));
        assert_eq!(id.take, None);
    }

    #[test]
    fn test_parse_requires_full_match() {
        let nc = convention("{series}_{cut}");
        assert!(parse_cut_name(&nc, "ABC_12").is_some());
        assert!(parse_cut_name(&nc, "xABC_12 copy").is_none());
        assert!(parse_cut_name(&nc, "ABC_12/").is_none());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let nc = convention("c{cut}_{stage}");
        let id = parse_cut_name(&nc, "C010_LO").unwrap();
        assert_eq!(id.number, Some(10));
        assert_eq!(id.stage.as_deref(), Some("LO"));
    }

    #[test]
    fn test_take_r_means_second_take() {
        let nc = convention("{cut}_{take}");
        assert_eq!(parse_cut_name(&nc, "5_r").unwrap().take, Some(2));
        assert_eq!(parse_cut_name(&nc, "5_R").unwrap().take, Some(2));
    }

    #[test]
    fn test_take_uses_trailing_digits() {
        let nc = convention("{cut}_{take}");
        assert_eq!(parse_cut_name(&nc, "5_t3").unwrap().take, Some(3));
        assert_eq!(parse_cut_name(&nc, "5_v2x10").unwrap().take, Some(10));
    }

    #[test]
    fn test_take_without_digits_fails() {
        let nc = convention("{cut}_{take}");
        assert!(parse_cut_name(&nc, "5_final").is_none());
    }

    #[test]
    fn test_numeric_overflow_is_recoverable() {
        let nc = convention("{cut}");
        assert!(parse_cut_name(&nc, "99999999999999999999").is_none());
    }

    #[test]
    fn test_last_integer_sequence_of() {
        assert_eq!(last_integer_sequence_of("t12"), Some(12));
        assert_eq!(last_integer_sequence_of("007"), Some(7));
        assert_eq!(last_integer_sequence_of("2b"), None);
        assert_eq!(last_integer_sequence_of(""), None);
    }

    #[test]
    fn test_roundtrip_through_render() {
        let templates = [
            "{series}_{episode}_{scene}_{cut}{stage}",
            "{stage}-{cut}-{take}",
            "ep{episode}c{cut}",
            "{series}{episode}_{cut}_{stage}_{take}",
        ];
        let identity = CutIdentity {
            series: Some("XYZ".into()),
            episode: Some(4),
            scene: Some(12),
            number: Some(130),
            stage: Some("ka".into()),
            take: Some(3),
        };

        for template in templates {
            let nc = convention(template);
            let expected = identity.restricted_to(nc.fields());
            let name = nc.render(&expected, false).unwrap();
            let parsed = parse_cut_name(&nc, &name).unwrap();
            assert_eq!(parsed, expected, "template {template} name {name}");
        }
    }

    #[test]
    fn test_stage_classification() {
        assert_eq!(Stage::classify("lo"), (Stage::Lo, false));
        assert_eq!(Stage::classify("KA_r"), (Stage::Ka, true));
        assert_eq!(Stage::classify("gs"), (Stage::Gs, false));
        assert_eq!(Stage::classify("bg"), (Stage::Other, false));
    }

    #[test]
    fn test_same_as_ignores_text_case() {
        let a = CutIdentity {
            stage: Some("LO".into()),
            number: Some(1),
            ..Default::default()
        };
        let b = CutIdentity {
            stage: Some("lo".into()),
            number: Some(1),
            ..Default::default()
        };
        assert!(a.same_as(&b));
        assert_ne!(a, b);
    }
}
