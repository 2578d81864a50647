//! Temporal overlap scoring
//!
//! Measures how much of the drawing interval and the speaking interval
//! coincide, as a Jaccard similarity of the two time spans.

/// Jaccard overlap of two millisecond intervals, in [0, 1]
///
/// Invalid intervals (start after end) and disjoint intervals yield 0.
/// Two identical intervals yield exactly 1.0, including the degenerate
/// case of two equal instants. Symmetric in its arguments.
pub fn overlap_ratio(a_start: u64, a_end: u64, b_start: u64, b_end: u64) -> f64 {
    if a_start > a_end || b_start > b_end {
        return 0.0;
    }
    // Two equal instants coincide completely
    if a_start == b_start && a_end == b_end {
        return 1.0;
    }

    let overlap_start = a_start.max(b_start);
    let overlap_end = a_end.min(b_end);
    if overlap_start >= overlap_end {
        return 0.0;
    }

    let overlap = (overlap_end - overlap_start) as f64;
    let len_a = (a_end - a_start) as f64;
    let len_b = (b_end - b_start) as f64;
    let union = len_a + len_b - overlap;
    if union <= 0.0 {
        return 0.0;
    }
    (overlap / union).clamp(0.0, 1.0)
}

/// Concurrency score for a stroke, [0, 100]
///
/// `None` means no utterance was heard for the stroke; that is a real
/// synchronization failure and scores 0, not an error.
pub fn concurrency_score(
    stroke_start: u64,
    stroke_end: u64,
    speech: Option<(u64, u64)>,
) -> f64 {
    match speech {
        Some((speech_start, speech_end)) => {
            overlap_ratio(stroke_start, stroke_end, speech_start, speech_end) * 100.0
        }
        None => 0.0,
    }
}
