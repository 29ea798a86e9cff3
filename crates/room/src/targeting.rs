//! Attack target selection policies

use rand::{Rng, RngCore};

use crate::room::{Member, PlayerId};

/// Chooses which living opponent receives an attack.
///
/// `candidates` already excludes the attacker and eliminated members.
pub trait TargetingPolicy: Send + Sync {
    fn choose(
        &self,
        attacker: &Member,
        candidates: &[&Member],
        rng: &mut dyn RngCore,
    ) -> Option<PlayerId>;
}

/// Uniformly random living opponent
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTarget;

impl TargetingPolicy for RandomTarget {
    fn choose(
        &self,
        _attacker: &Member,
        candidates: &[&Member],
        rng: &mut dyn RngCore,
    ) -> Option<PlayerId> {
        if candidates.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..candidates.len());
        Some(candidates[idx].id.clone())
    }
}

/// Opponent with the highest reported score, earliest joiner on ties
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestThreat;

impl TargetingPolicy for HighestThreat {
    fn choose(
        &self,
        _attacker: &Member,
        candidates: &[&Member],
        _rng: &mut dyn RngCore,
    ) -> Option<PlayerId> {
        candidates
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.score.cmp(&b.score).then(ib.cmp(ia)))
            .map(|(_, m)| m.id.clone())
    }
}

/// Hit back whoever last attacked us, falling back to a random opponent
#[derive(Debug, Clone, Copy, Default)]
pub struct Retaliate;

impl TargetingPolicy for Retaliate {
    fn choose(
        &self,
        attacker: &Member,
        candidates: &[&Member],
        rng: &mut dyn RngCore,
    ) -> Option<PlayerId> {
        if let Some(last) = attacker.last_attacker.as_deref() {
            if candidates.iter().any(|m| m.id == last) {
                return Some(last.to_string());
            }
        }
        RandomTarget.choose(attacker, candidates, rng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetingKind {
    #[default]
    Random,
    HighestThreat,
    Retaliate,
}

impl TargetingKind {
    pub const ALL: [TargetingKind; 3] = [
        TargetingKind::Random,
        TargetingKind::HighestThreat,
        TargetingKind::Retaliate,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "random" => Some(TargetingKind::Random),
            "highest_threat" => Some(TargetingKind::HighestThreat),
            "retaliate" => Some(TargetingKind::Retaliate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetingKind::Random => "random",
            TargetingKind::HighestThreat => "highest_threat",
            TargetingKind::Retaliate => "retaliate",
        }
    }

    pub fn policy(&self) -> Box<dyn TargetingPolicy> {
        match self {
            TargetingKind::Random => Box::new(RandomTarget),
            TargetingKind::HighestThreat => Box::new(HighestThreat),
            TargetingKind::Retaliate => Box::new(Retaliate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn member(id: &str, score: u32, last_attacker: Option<&str>) -> Member {
        Member {
            id: id.to_string(),
            name: id.to_string(),
            is_dead: false,
            score,
            last_attacker: last_attacker.map(str::to_string),
        }
    }

    #[test]
    fn test_no_candidates() {
        let mut rng = StdRng::seed_from_u64(1);
        let me = member("a", 0, None);
        for kind in TargetingKind::ALL {
            assert_eq!(kind.policy().choose(&me, &[], &mut rng), None);
        }
    }

    #[test]
    fn test_highest_threat_prefers_score_then_join_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let me = member("a", 0, None);
        let b = member("b", 500, None);
        let c = member("c", 500, None);
        let d = member("d", 100, None);
        let picked = HighestThreat.choose(&me, &[&b, &c, &d], &mut rng);
        assert_eq!(picked.as_deref(), Some("b"));
    }

    #[test]
    fn test_retaliate_targets_last_attacker_when_alive() {
        let mut rng = StdRng::seed_from_u64(1);
        let me = member("a", 0, Some("c"));
        let b = member("b", 0, None);
        let c = member("c", 0, None);
        assert_eq!(Retaliate.choose(&me, &[&b, &c], &mut rng).as_deref(), Some("c"));

        // Attacker gone: falls back to someone still standing
        let picked = Retaliate.choose(&me, &[&b], &mut rng);
        assert_eq!(picked.as_deref(), Some("b"));
    }

    #[test]
    fn test_kind_strings() {
        for kind in TargetingKind::ALL {
            assert_eq!(TargetingKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(TargetingKind::from_str("nearest"), None);
    }
}
