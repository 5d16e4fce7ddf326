use std::collections::BTreeSet;

use crate::keywords::keywords;

/// Share of the query keywords present in a document, from 0.0 to 1.0.
pub fn relevance(query: &BTreeSet<String>, document: &str) -> f64 {
    if query.is_empty() {
        return 0.0;
    }

    let document = keywords(document);
    let hits = query.intersection(&document).count();
    hits as f64 / query.len() as f64
}

/// Order items by keyword overlap with `query`, most relevant first.
///
/// Items with equal relevance keep their input order, so callers can pass a
/// pre-shuffled or pre-sorted list and only the relevance decides precedence.
pub fn rank_by_relevance<T, F>(query: &str, items: Vec<T>, text: F) -> Vec<(T, f64)>
where
    F: Fn(&T) -> String,
{
    let query = keywords(query);

    let mut ranked: Vec<(T, f64)> = items
        .into_iter()
        .map(|item| {
            let score = relevance(&query, &text(&item));
            (item, score)
        })
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}
