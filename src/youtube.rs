// YouTube comment fetching via the Data API v3 commentThreads endpoint.
//
// Comment fetching never fails from the caller's point of view: a bad URL,
// a missing API key, or an HTTP error is logged and yields an empty list,
// which the aggregator reports as "no comments found".

use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Largest page the commentThreads endpoint will return.
const MAX_PAGE_SIZE: usize = 100;

static YOUTUBE_URL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/(watch\?v=|embed/|v/|.+\?v=)?([^&=%\?]{11})",
    )
    .ok()
});

/// True when the text starts with something that looks like a YouTube video link.
pub fn is_youtube_url(text: &str) -> bool {
    extract_video_id(text).is_some()
}

/// The 11-character video id from a YouTube link.
pub fn extract_video_id(url: &str) -> Option<String> {
    let re = YOUTUBE_URL.as_ref()?;
    let captures = re.captures(url.trim())?;
    captures.get(6).map(|m| m.as_str().to_string())
}

/// Anything that can supply the comments for a video link.
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Up to `limit` top-level comments, in the order the source returns them.
    async fn fetch_comments(&self, url: &str, limit: usize) -> Vec<String>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadsResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThread {
    snippet: ThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_original: String,
}

pub struct YoutubeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YoutubeClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_API_URL)
    }

    /// Point the client at a different API root (used by tests and proxies).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("tenor/0.1 (comment-sentiment)")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Fetch one page of comment threads.
    async fn get_page(
        &self,
        video_id: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<CommentThreadsResponse> {
        let url = format!("{}/commentThreads", self.base_url);
        let page_size = page_size.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("videoId", video_id),
            ("maxResults", page_size.as_str()),
            ("textFormat", "plainText"),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .context("YouTube API request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("YouTube API returned {}: {}", status, body);
        }

        response
            .json::<CommentThreadsResponse>()
            .await
            .context("Failed to parse YouTube commentThreads response")
    }

    /// Walk pages until `limit` comments are collected or the thread list ends.
    pub async fn try_fetch_comments(&self, url: &str, limit: usize) -> Result<Vec<String>> {
        if self.api_key.is_empty() {
            anyhow::bail!("YOUTUBE_API_KEY not set");
        }
        let video_id = extract_video_id(url)
            .with_context(|| format!("Not a YouTube video URL: {url}"))?;

        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        while comments.len() < limit {
            let page_size = (limit - comments.len()).min(MAX_PAGE_SIZE);
            let page = self
                .get_page(&video_id, page_size, page_token.as_deref())
                .await?;

            comments.extend(
                page.items
                    .into_iter()
                    .map(|thread| thread.snippet.top_level_comment.snippet.text_original),
            );

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        comments.truncate(limit);
        debug!(video_id = %video_id, count = comments.len(), "Fetched YouTube comments");
        Ok(comments)
    }
}

#[async_trait]
impl CommentSource for YoutubeClient {
    async fn fetch_comments(&self, url: &str, limit: usize) -> Vec<String> {
        match self.try_fetch_comments(url, limit).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(url = url, error = %e, "Failed to fetch YouTube comments");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizes_common_url_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://youtu.be/dQw4w9WgXcQ",
            "www.youtube-nocookie.com/embed/dQw4w9WgXcQ",
            "youtube.com/v/dQw4w9WgXcQ",
        ] {
            assert!(is_youtube_url(url), "should match: {url}");
            assert_eq!(extract_video_id(url).as_deref(), Some("dQw4w9WgXcQ"), "{url}");
        }
    }

    #[test]
    fn test_rejects_plain_text_and_other_sites() {
        assert!(!is_youtube_url("I loved this movie"));
        assert!(!is_youtube_url("https://vimeo.com/123456789"));
        assert!(!is_youtube_url("check https://youtu.be/dQw4w9WgXcQ"));
        assert!(!is_youtube_url(""));
    }

    #[test]
    fn test_parses_comment_threads_page() {
        let json = r#"{
            "nextPageToken": "abc",
            "items": [
                {"snippet": {"topLevelComment": {"snippet": {"textOriginal": "first!"}}}},
                {"snippet": {"topLevelComment": {"snippet": {"textOriginal": "great video"}}}}
            ]
        }"#;
        let page: CommentThreadsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
        assert_eq!(page.items[1].snippet.top_level_comment.snippet.text_original, "great video");
    }

    #[tokio::test]
    async fn test_missing_key_yields_empty_list() {
        let client = YoutubeClient::new("").unwrap();
        let comments = client
            .fetch_comments("https://youtu.be/dQw4w9WgXcQ", 10)
            .await;
        assert!(comments.is_empty());
    }

    #[tokio::test]
    async fn test_bad_url_yields_empty_list() {
        let client = YoutubeClient::new("key").unwrap();
        assert!(client.fetch_comments("not a url", 10).await.is_empty());
    }
}
