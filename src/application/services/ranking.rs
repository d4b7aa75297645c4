use crate::domain::Embedding;

/// An item annotated with its cosine similarity to the query.
#[derive(Debug, Clone)]
pub struct Ranked<T> {
    pub item: T,
    pub similarity: f32,
}

/// Score `items` against `query`, keep those at or above `threshold`,
/// sort descending and truncate to `top_k`.
///
/// Items without an embedding score 0 ("no evidence"), so they fall below
/// any positive threshold instead of erroring. Ties keep insertion order:
/// the sort is stable, which keeps results deterministic.
pub fn rank_by_similarity<T, F>(
    query: &Embedding,
    items: Vec<T>,
    embedding_of: F,
    threshold: f32,
    top_k: usize,
) -> Vec<Ranked<T>>
where
    F: Fn(&T) -> Option<&Embedding>,
{
    let mut ranked: Vec<Ranked<T>> = items
        .into_iter()
        .map(|item| {
            let similarity = embedding_of(&item)
                .map(|e| query.cosine_similarity(e))
                .unwrap_or(0.0);
            Ranked { item, similarity }
        })
        .filter(|r| r.similarity >= threshold)
        .collect();

    ranked.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(top_k);
    ranked
}
