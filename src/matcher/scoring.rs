//! Subsequence scoring.
//!
//! A query matches a target when every query character appears in the
//! target in order. Among matching targets, tighter and earlier matches
//! score higher:
//!
//! - base score for any match
//! - +10 per character in each run of two or more consecutive matches
//! - +50 per character of a run anchored at the first target character
//! - +1 per word-start match (after a space, `-`, `_`, `.`, `/` or `(`)
//! - span penalty: up to 255 points for gaps between first and last match
//! - position penalty: up to 100 points for a late first match
//!
//! Both inputs are expected to be folded already (see
//! [`crate::scanner::path_utils::fold_for_match`]).

/// Score awarded to every match before bonuses.
pub const BASE_SCORE: u32 = 100;

const CONSECUTIVE_BONUS: u32 = 10;
const PREFIX_BONUS: u32 = 50;
const WORD_START_BONUS: u32 = 1;
const MAX_SPAN_PENALTY: usize = 255;
const MAX_POSITION_PENALTY: usize = 100;

/// Score a folded query against a folded target.
///
/// Returns `None` when the query is not an ordered subsequence of the target.
/// An empty query matches everything with [`BASE_SCORE`].
#[must_use]
pub fn score_chars(query: &[char], target: &[char]) -> Option<u32> {
    if query.is_empty() {
        return Some(BASE_SCORE);
    }

    let positions = find_match_positions(query, target)?;
    let first = positions[0];
    let last = positions[positions.len() - 1];

    let mut score = BASE_SCORE;

    // Consecutive run bonus: runs of ≥2 consecutively matched characters
    let mut run_length: u32 = 1;
    for window in positions.windows(2) {
        if window[1] == window[0] + 1 {
            run_length += 1;
        } else {
            if run_length >= 2 {
                score = score.saturating_add(run_length * CONSECUTIVE_BONUS);
            }
            run_length = 1;
        }
    }
    if run_length >= 2 {
        score = score.saturating_add(run_length * CONSECUTIVE_BONUS);
    }

    if first == 0 {
        let prefix_len = positions
            .iter()
            .enumerate()
            .take_while(|(i, &pos)| pos == *i)
            .count() as u32;
        score = score.saturating_add(prefix_len * PREFIX_BONUS);
    }

    let word_starts = positions
        .iter()
        .filter(|&&pos| pos == 0 || is_separator(target[pos - 1]))
        .count() as u32;
    score = score.saturating_add(word_starts * WORD_START_BONUS);

    // Gaps inside the matched span
    let gaps = (last - first + 1) - positions.len();
    score = score.saturating_add((MAX_SPAN_PENALTY - gaps.min(MAX_SPAN_PENALTY)) as u32);
    score = score.saturating_add((MAX_POSITION_PENALTY - first.min(MAX_POSITION_PENALTY)) as u32);

    Some(score)
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '-' | '_' | '.' | '/' | '(' | '[')
}

/// Find positions in `target` where each character of `query` matches.
///
/// A greedy forward scan establishes where the earliest complete match ends.
/// A backward scan from that end then finds the latest start that still
/// completes, which tightens the span: for `"ab"` in `"a__xab"` the match
/// is `[4, 5]` rather than `[0, 5]`. Returns `None` if not all characters
/// match.
#[must_use]
pub fn find_match_positions(query: &[char], target: &[char]) -> Option<Vec<usize>> {
    if query.is_empty() {
        return Some(Vec::new());
    }

    // Forward pass: end of the earliest complete match
    let mut qi = 0;
    let mut end = None;
    for (ti, &tc) in target.iter().enumerate() {
        if tc == query[qi] {
            qi += 1;
            if qi == query.len() {
                end = Some(ti);
                break;
            }
        }
    }
    let end = end?;

    // Backward pass: latest start that still reaches `end`
    let mut qi = query.len();
    let mut start = end;
    for ti in (0..=end).rev() {
        if target[ti] == query[qi - 1] {
            qi -= 1;
            if qi == 0 {
                start = ti;
                break;
            }
        }
    }

    // Forward again from the tightened start to record positions
    let mut positions = Vec::with_capacity(query.len());
    let mut qi = 0;
    for (offset, &tc) in target[start..=end].iter().enumerate() {
        if qi < query.len() && tc == query[qi] {
            positions.push(start + offset);
            qi += 1;
        }
    }

    Some(positions)
}
