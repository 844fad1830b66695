use std::fmt::{self, Debug, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KoRule {
    /// Only the position before the opponent's last move may not recur.
    Simple,
    /// No earlier position may recur.
    PositionalSuperko,
    /// No earlier position may recur with the same player to move.
    SituationalSuperko,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringSystem {
    AreaScoring,
    TerritoryScoring,
}

/// How many consecutive passes end the game and start life-and-death
/// settling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeAndDeathSettlingRule {
    TwoPasses,
    ThreePasses,
}

/// Who moves first after play is resumed to settle a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeResolutionRule {
    /// Play continues strictly alternating.
    AlternatingPlay,
    /// The players may choose who moves first after resuming.
    NonAlternatingPlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FourPassesRule {
    NoSpecialMeaning,
    /// Four consecutive passes end the game with all stones alive.
    FourPassesEndTheGame,
}

/// The rule axes consulted by move legality, game ending and scoring.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Rules {
    pub ko: KoRule,
    pub scoring: ScoringSystem,
    pub settling: LifeAndDeathSettlingRule,
    pub dispute_resolution: DisputeResolutionRule,
    pub four_passes: FourPassesRule,
}

impl Rules {
    pub const NAMED_RULES: &'static [(&'static str, Rules)] = &[
        ("japanese", Rules::japanese()),
        ("chinese", Rules::chinese()),
        ("aga", Rules::aga()),
        ("igs", Rules::igs()),
    ];

    pub const fn japanese() -> Self {
        Rules {
            ko: KoRule::Simple,
            scoring: ScoringSystem::TerritoryScoring,
            settling: LifeAndDeathSettlingRule::TwoPasses,
            dispute_resolution: DisputeResolutionRule::NonAlternatingPlay,
            four_passes: FourPassesRule::NoSpecialMeaning,
        }
    }

    pub const fn chinese() -> Self {
        Rules {
            ko: KoRule::PositionalSuperko,
            scoring: ScoringSystem::AreaScoring,
            settling: LifeAndDeathSettlingRule::TwoPasses,
            dispute_resolution: DisputeResolutionRule::AlternatingPlay,
            four_passes: FourPassesRule::NoSpecialMeaning,
        }
    }

    /// American Go Association rules.
    pub const fn aga() -> Self {
        Rules {
            ko: KoRule::SituationalSuperko,
            scoring: ScoringSystem::AreaScoring,
            settling: LifeAndDeathSettlingRule::ThreePasses,
            dispute_resolution: DisputeResolutionRule::AlternatingPlay,
            four_passes: FourPassesRule::FourPassesEndTheGame,
        }
    }

    /// Internet Go Server rules.
    pub const fn igs() -> Self {
        Rules {
            ko: KoRule::Simple,
            scoring: ScoringSystem::TerritoryScoring,
            settling: LifeAndDeathSettlingRule::TwoPasses,
            dispute_resolution: DisputeResolutionRule::AlternatingPlay,
            four_passes: FourPassesRule::FourPassesEndTheGame,
        }
    }

    pub fn named(name: &str) -> Option<Rules> {
        Rules::NAMED_RULES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, rules)| rules)
    }

    pub fn is_area_scoring(&self) -> bool {
        self.scoring == ScoringSystem::AreaScoring
    }

    /// Consecutive passes that end the game.
    pub fn passes_to_end(&self) -> usize {
        match self.settling {
            LifeAndDeathSettlingRule::TwoPasses => 2,
            LifeAndDeathSettlingRule::ThreePasses => 3,
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules::japanese()
    }
}

impl Debug for Rules {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = Rules::NAMED_RULES.iter().find(|(_, r)| r == self).map(|(n, _)| n);
        if let Some(name) = name {
            write!(f, "Rules({:?})", name)
        } else {
            f.debug_struct("Rules")
                .field("ko", &self.ko)
                .field("scoring", &self.scoring)
                .field("settling", &self.settling)
                .field("dispute_resolution", &self.dispute_resolution)
                .field("four_passes", &self.four_passes)
                .finish()
        }
    }
}
