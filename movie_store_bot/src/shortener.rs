use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::{config::Config, error::Error};

/// Where to send links to shorten. The API is the one most ad-link shorteners share:
/// `GET https://<domain>/api?api=<key>&url=<link>` answering `{"shortenedUrl": "..."}`.
struct Target {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

#[derive(Deserialize)]
struct ShortenResponse {
    #[serde(rename = "shortenedUrl")]
    shortened_url: Option<String>,
}

/// Best-effort link shortener. Never fails: if anything goes wrong, the link stays as it was.
pub struct Shortener {
    target: Option<Target>,
}

impl Shortener {
    /// A shortener that hands every link back untouched.
    pub fn disabled() -> Self {
        Self { target: None }
    }

    pub fn new(endpoint: Url, api_key: String, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            target: Some(Target {
                client,
                endpoint,
                api_key,
            }),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        if !config.use_shortener {
            return Ok(Self::disabled());
        }

        let endpoint = match Url::parse(&format!("https://{}/api", config.shortener_domain.trim())) {
            Ok(url) => url,
            Err(e) => {
                log::warn!(
                    "Shortener domain {:?} is unusable, not shortening links: {e}",
                    config.shortener_domain
                );
                return Ok(Self::disabled());
            }
        };

        Self::new(
            endpoint,
            config.shortener_api.clone(),
            Duration::from_secs(config.shortener_timeout_secs),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Shortened version of `url`, or `url` itself if shortening is off or didn't work out.
    pub async fn shorten(&self, url: &Url) -> Url {
        let Some(target) = &self.target else {
            return url.clone();
        };

        match target.request(url).await {
            Ok(short) => short,
            Err(e) => {
                log::warn!("Failed to shorten {url}: {e}");
                url.clone()
            }
        }
    }
}

impl Target {
    async fn request(&self, url: &Url) -> Result<Url, Error> {
        let body = self
            .client
            .get(self.endpoint.clone())
            .query(&[("api", self.api_key.as_str()), ("url", url.as_str())])
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let response: ShortenResponse =
            serde_json::from_slice(&body).map_err(|_| Error::BadShortenerResponse)?;

        response
            .shortened_url
            .and_then(|x| Url::parse(&x).ok())
            .ok_or(Error::BadShortenerResponse)
    }
}
