//! Typo suggestions for warp_intent
//!
//! Nearest-match search used for both whole-command correction (`gti` ->
//! `git`) and subcommand correction (`git stauts` -> `status`).

/// Default maximum edit distance for a suggestion
pub const DEFAULT_MAX_DISTANCE: usize = 2;

/// Find the closest candidate to `input` within `max_distance` edits.
///
/// Comparison is case-insensitive and returns the candidate as given. Exact
/// matches are never suggested. Ties at the minimum distance prefer a
/// candidate starting with the same character as `input`, then the first one
/// in iteration order.
pub fn find_typo_suggestion<I, S>(input: &str, candidates: I, max_distance: usize) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let input_lower = input.to_lowercase();
    let input_len = input_lower.chars().count();
    let input_first = input_lower.chars().next()?;

    // (distance, shares first char, candidate)
    let mut best: Option<(usize, bool, String)> = None;

    for candidate in candidates {
        let candidate = candidate.as_ref();
        let candidate_lower = candidate.to_lowercase();

        if input_len.abs_diff(candidate_lower.chars().count()) > max_distance {
            continue;
        }

        let distance = edit_distance(&input_lower, &candidate_lower);
        if distance == 0 || distance > max_distance {
            continue;
        }

        let same_first = candidate_lower.chars().next() == Some(input_first);
        let better = match &best {
            None => true,
            Some((best_distance, best_same_first, _)) => {
                distance < *best_distance
                    || (distance == *best_distance && same_first && !best_same_first)
            }
        };

        if better {
            best = Some((distance, same_first, candidate.to_string()));
        }
    }

    best.map(|(_, _, candidate)| candidate)
}

/// Edit distance where an adjacent transposition counts as one edit
/// (optimal string alignment variant of Damerau-Levenshtein).
pub fn edit_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut matrix = vec![vec![0usize; len2 + 1]; len1 + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] { 0 } else { 1 };
            let mut value = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);

            if i > 1
                && j > 1
                && s1_chars[i - 1] == s2_chars[j - 2]
                && s1_chars[i - 2] == s2_chars[j - 1]
            {
                value = value.min(matrix[i - 2][j - 2] + 1);
            }

            matrix[i][j] = value;
        }
    }

    matrix[len1][len2]
}
