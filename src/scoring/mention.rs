use crate::catalog::MentionDistribution;

const MIDPOINT_SANS_MENTION: f64 = 11.0;
const MIDPOINT_ASSEZ_BIEN: f64 = 13.0;
const MIDPOINT_BIEN: f64 = 15.0;
const MIDPOINT_TRES_BIEN: f64 = 17.0;
const MIDPOINT_FELICITATIONS: f64 = 19.0;

/// Weighted mean of honours-band midpoints. `None` when the distribution is
/// empty or not a usable set of non-negative weights.
pub fn estimate_grade(mentions: &MentionDistribution) -> Option<f64> {
    let weights = [
        (mentions.sans_mention, MIDPOINT_SANS_MENTION),
        (mentions.assez_bien, MIDPOINT_ASSEZ_BIEN),
        (mentions.bien, MIDPOINT_BIEN),
        (mentions.tres_bien, MIDPOINT_TRES_BIEN),
        (mentions.felicitations, MIDPOINT_FELICITATIONS),
    ];
    if weights.iter().any(|(w, _)| !w.is_finite() || *w < 0.0) {
        return None;
    }
    let total: f64 = weights.iter().map(|(w, _)| w).sum();
    if total <= 0.0 {
        return None;
    }
    Some(weights.iter().map(|(w, mid)| w * mid).sum::<f64>() / total)
}
