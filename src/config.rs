use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Content API root, e.g. "https://myblog.cdn.example.io/api/v2".
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the access token, if the
    /// repository needs one.
    pub token_env: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token_env: None,
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    20
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SiteConfig {
    /// Public base URL of the published blog, for open/yank.
    pub url: Option<String>,
    /// GitHub repository ("owner/name") hosting the comment threads.
    pub comments_repo: Option<String>,
}

impl SiteConfig {
    pub fn post_url(&self, slug: &str) -> Option<String> {
        self.url
            .as_ref()
            .map(|base| format!("{}/post/{}", base.trim_end_matches('/'), slug))
    }

    pub fn comments_url(&self, slug: &str) -> Option<String> {
        self.comments_repo.as_ref().map(|repo| {
            format!(
                "https://github.com/{}/issues?q={}",
                repo,
                urlencoding::encode(slug)
            )
        })
    }
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("byline").join("config.toml"))
}

impl Config {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        toml::from_str::<Config>(&content).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[api]
endpoint = "https://myblog.cdn.example.io/api/v2"
token_env = "CMS_TOKEN"
page_size = 10

[site]
url = "https://blog.example.com/"
comments_repo = "someone/blog-comments"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.api.endpoint.as_deref(),
            Some("https://myblog.cdn.example.io/api/v2")
        );
        assert_eq!(config.api.token_env.as_deref(), Some("CMS_TOKEN"));
        assert_eq!(config.api.page_size, 10);
        assert_eq!(
            config.site.comments_repo.as_deref(),
            Some("someone/blog-comments")
        );
    }

    #[test]
    fn page_size_defaults_when_omitted() {
        let config: Config = toml::from_str("[api]\nendpoint = \"https://x\"\n").unwrap();
        assert_eq!(config.api.page_size, 20);
        assert!(config.api.token_env.is_none());
    }

    #[test]
    fn empty_config_is_usable() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.api.endpoint.is_none());
        assert_eq!(config.api.page_size, 20);
    }

    #[test]
    fn post_url_joins_base_and_slug() {
        let site = SiteConfig {
            url: Some("https://blog.example.com/".to_string()),
            comments_repo: None,
        };
        assert_eq!(
            site.post_url("my-post").as_deref(),
            Some("https://blog.example.com/post/my-post")
        );
        assert!(SiteConfig::default().post_url("my-post").is_none());
    }

    #[test]
    fn comments_url_targets_the_discussion_repo() {
        let site = SiteConfig {
            url: None,
            comments_repo: Some("someone/blog-comments".to_string()),
        };
        assert_eq!(
            site.comments_url("my post").as_deref(),
            Some("https://github.com/someone/blog-comments/issues?q=my%20post")
        );
    }
}
