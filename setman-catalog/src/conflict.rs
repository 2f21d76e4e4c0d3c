//! Cut identity collisions
//!
//! Two cuts *match* when they share episode, scene and number, and
//! *conflict* when they also share a stage label. Checks are linear scans
//! over an episode's cuts.

use crate::catalog::Episode;
use crate::cut::Cut;
use crate::ids::CutId;

/// Same episode handle, scene and number
pub fn matches(a: &Cut, b: &Cut) -> bool {
    a.episode() == b.episode() && a.scene() == b.scene() && a.number() == b.number()
}

/// Matching cuts with the same stage label (ASCII case ignored)
pub fn conflicts(a: &Cut, b: &Cut) -> bool {
    matches(a, b) && a.same_stage(b)
}

/// Every active then archived cut in `episode` that conflicts with `candidate`
///
/// `skip` names the candidate's own slot when it already lives in `episode`;
/// only that slot is excluded. A copy of a stored cut is not the cut itself.
pub fn find_conflicts(episode: &Episode, candidate: &Cut, skip: Option<CutId>) -> Vec<CutId> {
    episode
        .active()
        .iter()
        .chain(episode.archived())
        .copied()
        .filter(|&id| Some(id) != skip)
        .filter(|&id| {
            episode
                .cut(id)
                .map(|existing| conflicts(existing, candidate))
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::CutIdentity;
    use crate::ids::{EpisodeId, SeriesId};
    use std::path::PathBuf;
    use uuid::Uuid;

    fn cut(episode: usize, scene: Option<u32>, number: u32, stage: &str) -> Cut {
        let identity = CutIdentity {
            scene,
            number: Some(number),
            stage: Some(stage.to_string()),
            ..Default::default()
        };
        Cut::new(EpisodeId(episode), format!("ep/{}{}", number, stage), identity).unwrap()
    }

    #[test]
    fn test_matches_is_reflexive_and_symmetric() {
        let a = cut(0, Some(1), 3, "lo");
        let b = cut(0, Some(1), 3, "ka");
        let c = cut(0, Some(2), 3, "lo");

        assert!(matches(&a, &a));
        assert_eq!(matches(&a, &b), matches(&b, &a));
        assert!(matches(&a, &b));
        assert!(!matches(&a, &c));
        assert!(!matches(&c, &a));
    }

    #[test]
    fn test_conflicts_implies_matches() {
        let cuts = [
            cut(0, Some(1), 3, "lo"),
            cut(0, Some(1), 3, "LO"),
            cut(0, Some(1), 3, "ka"),
            cut(1, Some(1), 3, "lo"),
            cut(0, None, 3, "lo"),
        ];
        for a in &cuts {
            for b in &cuts {
                if conflicts(a, b) {
                    assert!(matches(a, b));
                }
            }
        }
        assert!(conflicts(&cuts[0], &cuts[1]));
        assert!(!conflicts(&cuts[0], &cuts[2]));
        assert!(!conflicts(&cuts[0], &cuts[3]));
        assert!(!conflicts(&cuts[0], &cuts[4]));
    }

    #[test]
    fn test_find_conflicts_only_skips_named_slot() {
        let mut ep = Episode::new(EpisodeId(0), Uuid::new_v4(), SeriesId(0), 1, PathBuf::from("ep"));
        let id = ep.insert_cut(cut(0, Some(1), 3, "lo")).unwrap();
        let copy = ep.cut(id).unwrap().clone();

        assert_eq!(find_conflicts(&ep, &copy, None), vec![id]);
        assert!(find_conflicts(&ep, &copy, Some(id)).is_empty());
    }
}
