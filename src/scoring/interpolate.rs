/// (grade difference, grade score) anchors, sorted by difference.
pub const GRADE_ANCHORS: [(f64, f64); 6] = [
    (-3.0, 10.0),
    (-2.0, 35.0),
    (-1.0, 50.0),
    (0.0, 70.0),
    (1.0, 90.0),
    (2.0, 100.0),
];

/// Linear interpolation over sorted anchors, clamped to the end anchors.
/// NaN maps to the first anchor.
pub fn interpolate(anchors: &[(f64, f64)], x: f64) -> f64 {
    let (Some(first), Some(last)) = (anchors.first(), anchors.last()) else {
        return 0.0;
    };
    if x.is_nan() || x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }
    for pair in anchors.windows(2) {
        let (d1, s1) = pair[0];
        let (d2, s2) = pair[1];
        if x <= d2 {
            return s1 + (x - d1) / (d2 - d1) * (s2 - s1);
        }
    }
    last.1
}

pub fn grade_score(diff: f64) -> f64 {
    interpolate(&GRADE_ANCHORS, diff)
}
