use std::collections::HashMap;

use crate::models::{GenreId, Movie};

/// Most frequent genres across `movies`, most frequent first.
///
/// Every genre id of every movie counts once, so a movie with three genres adds
/// three increments. Genres with equal counts keep the order in which they were
/// first encountered.
pub fn extract_top_genres(movies: &[Movie], limit: usize) -> Vec<GenreId> {
    let mut counts: HashMap<GenreId, usize> = HashMap::new();
    let mut encounter_order: Vec<GenreId> = Vec::new();

    for genre_id in movies.iter().flat_map(|movie| movie.genre_ids.iter()) {
        let count = counts.entry(*genre_id).or_insert_with(|| {
            encounter_order.push(*genre_id);
            0
        });
        *count += 1;
    }

    // Stable sort preserves encounter order among ties
    encounter_order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    encounter_order.truncate(limit);
    encounter_order
}
