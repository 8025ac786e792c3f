//! Word frequency statistics over a set of descriptions.

use crate::models::WordStatResult;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Count lower-cased words across all descriptions.
///
/// Words are split on anything outside `[A-Za-z0-9_]`. The result is sorted
/// by count descending; equal counts keep the order in which the words were
/// first seen.
pub fn analyze(descriptions: &[String]) -> WordStatResult {
    let mut frequencies: Vec<(String, u64)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for description in descriptions {
        let lowered = description.to_lowercase();
        for word in lowered
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|w| !w.is_empty())
        {
            match positions.get(word) {
                Some(&i) => frequencies[i].1 += 1,
                None => {
                    positions.insert(word.to_string(), frequencies.len());
                    frequencies.push((word.to_string(), 1));
                }
            }
        }
    }

    // Stable sort keeps first-seen order among ties
    frequencies.sort_by_key(|(_, count)| Reverse(*count));

    WordStatResult { frequencies }
}
