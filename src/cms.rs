use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{BylineError, Result};
use crate::richtext::RichText;
use crate::types::{AdjacentPost, Neighbor, PostDetail, PostPage, PostSummary, Section};

/// The hosted content API, seen through the narrow seam the app needs.
/// Pagination cursors returned in a `PostPage` are opaque and must be fed
/// back to `fetch_page` verbatim.
#[async_trait]
pub trait ContentSource: Send + Sync + std::fmt::Debug {
    /// First page of the published post index (or the preview ref's index).
    async fn query_posts(&self, preview: Option<&str>) -> Result<PostPage>;

    /// Fetch a continuation cursor exactly as the API handed it out.
    async fn fetch_page(&self, cursor: &str) -> Result<PostPage>;

    /// Full post by slug. A slug the API does not know is `NotFound`.
    async fn get_post(&self, slug: &str, preview: Option<&str>) -> Result<PostDetail>;

    /// The chronologically adjacent post, if any.
    async fn neighbor(
        &self,
        id: &str,
        direction: Neighbor,
        preview: Option<&str>,
    ) -> Result<Option<AdjacentPost>>;
}

pub struct Cms {
    client: Client,
    endpoint: String,
    token: Option<String>,
    page_size: u32,
}

impl std::fmt::Debug for Cms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cms")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Cms {
    pub fn new(endpoint: String, token: Option<String>, page_size: u32) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
            page_size,
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BylineError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(BylineError::Fetch(format!("content API {}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| BylineError::Malformed(e.to_string()))
    }

    /// The repository's current master ref, resolved from the API root.
    async fn master_ref(&self) -> Result<String> {
        let root: ApiRoot = serde_json::from_value(self.get_json(&self.endpoint).await?)
            .map_err(|e| BylineError::Malformed(e.to_string()))?;
        root.refs
            .into_iter()
            .find(|r| r.is_master)
            .map(|r| r.ref_id)
            .ok_or_else(|| BylineError::Malformed("API root has no master ref".to_string()))
    }

    async fn resolve_ref(&self, preview: Option<&str>) -> Result<String> {
        match preview {
            Some(r) => Ok(r.to_string()),
            None => self.master_ref().await,
        }
    }

    fn search_url(&self, content_ref: &str, predicate: &str, extra: &str) -> String {
        let mut url = format!(
            "{}/documents/search?ref={}&q={}{}",
            self.endpoint,
            urlencoding::encode(content_ref),
            urlencoding::encode(predicate),
            extra
        );
        if let Some(token) = &self.token {
            url.push_str(&format!("&access_token={}", urlencoding::encode(token)));
        }
        url
    }

    async fn search(&self, url: &str) -> Result<(Vec<ApiDocument>, Option<String>)> {
        decode_page(self.get_json(url).await?)
    }
}

#[async_trait]
impl ContentSource for Cms {
    async fn query_posts(&self, preview: Option<&str>) -> Result<PostPage> {
        let content_ref = self.resolve_ref(preview).await?;
        let url = self.search_url(
            &content_ref,
            r#"[[at(document.type,"post")]]"#,
            &format!(
                "&pageSize={}&orderings={}",
                self.page_size,
                urlencoding::encode("[document.first_publication_date desc]")
            ),
        );
        let (docs, next_page) = self.search(&url).await?;
        Ok(PostPage {
            results: docs.into_iter().map(summary_from_doc).collect(),
            next_page,
        })
    }

    async fn fetch_page(&self, cursor: &str) -> Result<PostPage> {
        let (docs, next_page) = self.search(cursor).await?;
        Ok(PostPage {
            results: docs.into_iter().map(summary_from_doc).collect(),
            next_page,
        })
    }

    async fn get_post(&self, slug: &str, preview: Option<&str>) -> Result<PostDetail> {
        let content_ref = self.resolve_ref(preview).await?;
        let url = self.search_url(
            &content_ref,
            &format!(r#"[[at(my.post.uid,"{}")]]"#, slug),
            "&pageSize=1",
        );
        let (docs, _) = self.search(&url).await?;
        docs.into_iter()
            .next()
            .map(detail_from_doc)
            .ok_or_else(|| BylineError::NotFound(slug.to_string()))
    }

    async fn neighbor(
        &self,
        id: &str,
        direction: Neighbor,
        preview: Option<&str>,
    ) -> Result<Option<AdjacentPost>> {
        let content_ref = self.resolve_ref(preview).await?;
        // `after` skips results up to the given document in the current
        // ordering: ascending yields the next newer post, descending the
        // next older one.
        let ordering = match direction {
            Neighbor::Next => "[document.first_publication_date]",
            Neighbor::Previous => "[document.first_publication_date desc]",
        };
        let url = self.search_url(
            &content_ref,
            r#"[[at(document.type,"post")]]"#,
            &format!(
                "&pageSize=1&after={}&orderings={}",
                urlencoding::encode(id),
                urlencoding::encode(ordering)
            ),
        );
        let (docs, _) = self.search(&url).await?;
        Ok(docs.into_iter().next().map(|doc| AdjacentPost {
            title: doc.data.title,
            slug: doc.uid.unwrap_or_else(|| "unknown".to_string()),
        }))
    }
}

// Wire shapes of the content API.

#[derive(Deserialize)]
struct ApiRoot {
    refs: Vec<ApiRef>,
}

#[derive(Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    ref_id: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

#[derive(Deserialize)]
struct ApiPage {
    results: Vec<ApiDocument>,
    next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiDocument {
    id: String,
    uid: Option<String>,
    first_publication_date: Option<String>,
    last_publication_date: Option<String>,
    #[serde(default)]
    data: ApiPostData,
}

#[derive(Debug, Deserialize, Default)]
struct ApiPostData {
    #[serde(default)]
    title: String,
    #[serde(default)]
    subtitle: String,
    #[serde(default)]
    author: String,
    banner: Option<ApiImage>,
    #[serde(default)]
    content: Vec<ApiSection>,
}

#[derive(Debug, Deserialize)]
struct ApiImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSection {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    body: RichText,
}

/// A paginated body must carry both `results` and `next_page`; anything
/// else is malformed, even if it otherwise decodes.
fn decode_page(value: Value) -> Result<(Vec<ApiDocument>, Option<String>)> {
    if value.get("results").is_none() || value.get("next_page").is_none() {
        return Err(BylineError::Malformed(
            "page body missing results/next_page".to_string(),
        ));
    }
    let page: ApiPage =
        serde_json::from_value(value).map_err(|e| BylineError::Malformed(e.to_string()))?;
    Ok((page.results, page.next_page))
}

fn parse_datetime(s: Option<&str>) -> Option<chrono::DateTime<chrono::Utc>> {
    s.and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&chrono::Utc))
}

fn summary_from_doc(doc: ApiDocument) -> PostSummary {
    PostSummary {
        slug: doc.uid.unwrap_or_else(|| "unknown".to_string()),
        first_publication_date: parse_datetime(doc.first_publication_date.as_deref()),
        title: doc.data.title,
        subtitle: doc.data.subtitle,
        author: doc.data.author,
    }
}

fn detail_from_doc(doc: ApiDocument) -> PostDetail {
    PostDetail {
        id: doc.id,
        slug: doc.uid.unwrap_or_else(|| "unknown".to_string()),
        title: doc.data.title,
        author: doc.data.author,
        banner_url: doc.data.banner.and_then(|b| b.url),
        first_publication_date: parse_datetime(doc.first_publication_date.as_deref()),
        last_publication_date: parse_datetime(doc.last_publication_date.as_deref()),
        sections: doc
            .data
            .content
            .into_iter()
            .map(|s| Section {
                heading: s.heading,
                body: s.body,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_json() -> Value {
        json!({
            "id": "XyZ123",
            "uid": "first-post",
            "first_publication_date": "2021-03-15T10:30:00+00:00",
            "last_publication_date": "2021-03-16T08:00:00+00:00",
            "data": {
                "title": "First post",
                "subtitle": "On beginnings",
                "author": "Jo Writer",
                "banner": { "url": "https://img.example/banner.png" },
                "content": [
                    {
                        "heading": "Intro",
                        "body": [
                            { "type": "paragraph", "text": "hello there", "spans": [] }
                        ]
                    }
                ]
            }
        })
    }

    #[test]
    fn page_decodes_results_and_cursor() {
        let value = json!({
            "results": [doc_json()],
            "next_page": "https://cms.example/page2"
        });
        let (docs, next) = decode_page(value).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(next.as_deref(), Some("https://cms.example/page2"));
    }

    #[test]
    fn page_with_null_cursor_is_terminal() {
        let value = json!({ "results": [], "next_page": null });
        let (docs, next) = decode_page(value).unwrap();
        assert!(docs.is_empty());
        assert!(next.is_none());
    }

    #[test]
    fn page_missing_cursor_field_is_malformed() {
        let err = decode_page(json!({ "results": [] })).unwrap_err();
        assert!(matches!(err, BylineError::Malformed(_)));
    }

    #[test]
    fn page_missing_results_field_is_malformed() {
        let err = decode_page(json!({ "next_page": null })).unwrap_err();
        assert!(matches!(err, BylineError::Malformed(_)));
    }

    #[test]
    fn summary_maps_listing_fields() {
        let doc: ApiDocument = serde_json::from_value(doc_json()).unwrap();
        let summary = summary_from_doc(doc);
        assert_eq!(summary.slug, "first-post");
        assert_eq!(summary.title, "First post");
        assert_eq!(summary.subtitle, "On beginnings");
        assert_eq!(summary.author, "Jo Writer");
        assert_eq!(
            summary.first_publication_date.unwrap().to_rfc3339(),
            "2021-03-15T10:30:00+00:00"
        );
    }

    #[test]
    fn detail_maps_banner_and_sections() {
        let doc: ApiDocument = serde_json::from_value(doc_json()).unwrap();
        let detail = detail_from_doc(doc);
        assert_eq!(detail.id, "XyZ123");
        assert_eq!(detail.banner_url.as_deref(), Some("https://img.example/banner.png"));
        assert_eq!(detail.sections.len(), 1);
        assert_eq!(detail.sections[0].heading, "Intro");
        assert_eq!(detail.sections[0].body.plain_text(), "hello there");
        assert!(detail.edited());
    }

    #[test]
    fn missing_dates_stay_unset() {
        let doc: ApiDocument = serde_json::from_value(json!({
            "id": "A1",
            "uid": "draft",
            "first_publication_date": null,
            "last_publication_date": null,
            "data": { "title": "Draft" }
        }))
        .unwrap();
        let summary = summary_from_doc(doc);
        assert!(summary.first_publication_date.is_none());
    }

    #[test]
    fn master_ref_is_picked_from_root() {
        let root: ApiRoot = serde_json::from_value(json!({
            "refs": [
                { "id": "preview", "ref": "prev-ref", "isMasterRef": false },
                { "id": "master", "ref": "main-ref", "isMasterRef": true }
            ]
        }))
        .unwrap();
        let master = root.refs.into_iter().find(|r| r.is_master).unwrap();
        assert_eq!(master.ref_id, "main-ref");
    }
}
