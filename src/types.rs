use chrono::{DateTime, Utc};

use crate::richtext::RichText;

/// Listing record for the post index.
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub slug: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// One page of the post index: ordered summaries plus the opaque cursor
/// for the following page. Only the content API produces these.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub results: Vec<PostSummary>,
    pub next_page: Option<String>,
}

/// Full post record for the reading screen.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub author: String,
    pub banner_url: Option<String>,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub last_publication_date: Option<DateTime<Utc>>,
    pub sections: Vec<Section>,
}

/// A titled slice of the post body.
#[derive(Debug, Clone)]
pub struct Section {
    pub heading: String,
    pub body: RichText,
}

impl PostDetail {
    /// Estimated reading time in minutes at ~200 words per minute,
    /// counted over the body text (headings excluded).
    pub fn reading_minutes(&self) -> u64 {
        let words: usize = self
            .sections
            .iter()
            .map(|s| s.body.plain_text().split_whitespace().count())
            .sum();
        (words as u64).div_ceil(200)
    }

    /// True when the post was edited after first publication.
    pub fn edited(&self) -> bool {
        match (self.first_publication_date, self.last_publication_date) {
            (Some(first), Some(last)) => last > first,
            (None, Some(_)) => true,
            _ => false,
        }
    }
}

/// Slug and title of a chronologically adjacent post.
#[derive(Debug, Clone)]
pub struct AdjacentPost {
    pub slug: String,
    pub title: String,
}

/// Which chronological neighbor of a post to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbor {
    Previous,
    Next,
}

/// Everything the reading screen shows: the post plus its neighbors.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: PostDetail,
    pub previous: Option<AdjacentPost>,
    pub next: Option<AdjacentPost>,
}

/// "15 Mar 2021" for listing rows and bylines.
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(d) => d.format("%d %b %Y").to_string(),
        None => "unpublished".to_string(),
    }
}

/// "16 Mar 2021, 10:30" for edit timestamps.
pub fn format_datetime(date: DateTime<Utc>) -> String {
    date.format("%d %b %Y, %H:%M").to_string()
}
