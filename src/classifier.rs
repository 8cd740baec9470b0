//! Content category detection from URL, group and name heuristics

use crate::models::Category;

const MOVIE_GROUP_WORDS: [&str; 3] = ["film", "movie", "vod"];
const SERIES_GROUP_WORDS: [&str; 3] = ["serie", "season", "saison"];
const MOVIE_EXTENSIONS: [&str; 3] = ["mp4", "mkv", "avi"];
const LIVE_EXTENSIONS: [&str; 2] = ["ts", "m3u8"];

/// Classify a stream. First match wins:
/// URL path segment, then group keyword, then file extension, then TV.
pub fn classify(url: &str, group: &str, _name: &str) -> Category {
    let url = url.to_lowercase();
    let group = group.to_lowercase();

    if url.contains("/movie/") {
        return Category::Movie;
    }
    if url.contains("/series/") {
        return Category::Series;
    }
    if url.contains("/live/") {
        return Category::Tv;
    }

    if MOVIE_GROUP_WORDS.iter().any(|w| group.contains(w)) {
        return Category::Movie;
    }
    if SERIES_GROUP_WORDS.iter().any(|w| group.contains(w)) {
        return Category::Series;
    }

    match url_extension(&url) {
        Some(ext) if MOVIE_EXTENSIONS.contains(&ext) => Category::Movie,
        Some(ext) if LIVE_EXTENSIONS.contains(&ext) => Category::Tv,
        _ => Category::Tv,
    }
}

/// Text after the last '.', with any query string removed
fn url_extension(url: &str) -> Option<&str> {
    let (_, ext) = url.rsplit_once('.')?;
    Some(ext.split('?').next().unwrap_or(ext))
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
