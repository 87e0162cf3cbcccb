use jobmatch_config::Thresholds;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchTier {
	/// Accepted without arbitration.
	High,
	/// Ambiguous; needs arbitration.
	Medium,
	Low,
}

pub fn classify(score: f32, thresholds: &Thresholds) -> MatchTier {
	if score >= thresholds.high {
		MatchTier::High
	} else if score >= thresholds.medium {
		MatchTier::Medium
	} else {
		MatchTier::Low
	}
}
