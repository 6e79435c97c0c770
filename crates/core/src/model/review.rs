use serde::{Deserialize, Serialize};

//
// ─── REVIEW CLASSIFICATION ────────────────────────────────────────────────────
//

/// How the scheduler reads a single performance score.
///
/// - `Strong`: recalled well, the streak grows and the ease factor rises
/// - `Neutral`: passable, scheduling state is carried over unchanged
/// - `Weak`: recall failed, the streak resets and the ease factor drops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewClassification {
    Strong,
    Neutral,
    Weak,
}

impl ReviewClassification {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewClassification::Strong => "strong",
            ReviewClassification::Neutral => "neutral",
            ReviewClassification::Weak => "weak",
        }
    }
}

impl std::fmt::Display for ReviewClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde_name() {
        for c in [
            ReviewClassification::Strong,
            ReviewClassification::Neutral,
            ReviewClassification::Weak,
        ] {
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(json, format!("\"{c}\""));
        }
    }
}
