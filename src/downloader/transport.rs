use crate::utils::config::DownloaderSettings;
use crate::utils::error::TiktokError;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use tracing::debug;

/// Chunks of a media body as they arrive
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, TiktokError>>;

/// HTTP access used by the pipeline
///
/// This keeps page parsing and file writing independent of the HTTP stack,
/// so the whole pipeline can run against canned responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Identifier for log lines (e.g. "reqwest")
    fn id(&self) -> &'static str;

    /// GET a page and return its body as text
    async fn fetch_page(&self, url: &str) -> Result<String, TiktokError>;

    /// GET a media file as a stream of chunks
    async fn fetch_media(&self, url: &str) -> Result<ByteStream, TiktokError>;
}

/// [`Transport`] backed by two reqwest clients
///
/// Pages and media use separate clients because they differ in timeout and
/// in whether TLS certificates are checked.
pub struct ReqwestTransport {
    page_client: Client,
    media_client: Client,
}

impl ReqwestTransport {
    pub fn new(settings: &DownloaderSettings) -> Result<Self, TiktokError> {
        let page_client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.page_timeout)
            .danger_accept_invalid_certs(
                settings.no_check_certificate || !settings.check_page_certificate,
            )
            .build()?;

        // Bounds each connect and read, not the whole transfer
        let media_client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .connect_timeout(settings.media_timeout)
            .read_timeout(settings.media_timeout)
            .danger_accept_invalid_certs(settings.no_check_certificate)
            .build()?;

        Ok(Self {
            page_client,
            media_client,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn id(&self) -> &'static str {
        "reqwest"
    }

    async fn fetch_page(&self, url: &str) -> Result<String, TiktokError> {
        let response = self.page_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TiktokError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    async fn fetch_media(&self, url: &str) -> Result<ByteStream, TiktokError> {
        let response = self.media_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TiktokError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        debug!(
            "Media response for {}: {:?} bytes announced",
            url,
            response.content_length()
        );

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(TiktokError::from))
            .boxed())
    }
}
