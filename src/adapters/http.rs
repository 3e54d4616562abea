use crate::config::settings::CompareSettings;
use crate::core::resolver::EndpointLocator;
use crate::core::{OfferSource, RawOfferDocument};
use crate::domain::session::Session;
use crate::utils::error::{CompareError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, REFERER};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// 以 HTTP 存取訂房網站：抓頁面取 API 路徑，再呼叫內部 API
pub struct HttpOfferSource {
    client: Client,
    origin: String,
    accept_language: String,
    locale: String,
    page_timeout: Duration,
    api_timeout: Duration,
    locator: EndpointLocator,
}

impl HttpOfferSource {
    pub fn from_settings(settings: &CompareSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| CompareError::ConfigError {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            origin: settings.site_origin.trim_end_matches('/').to_string(),
            accept_language: settings.accept_language.clone(),
            locale: settings.locale.clone(),
            page_timeout: settings.page_timeout(),
            api_timeout: settings.api_timeout(),
            locator: EndpointLocator::new(
                settings.marker_selector.clone(),
                settings.endpoint_key.clone(),
            ),
        })
    }

    /// 每個請求都帶相同的語系標頭與 cookie
    fn with_identity(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        let request = request
            .header(ACCEPT_LANGUAGE, self.accept_language.as_str())
            .header("ag-language-locale", self.locale.as_str());
        match session.cookie_header() {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        }
    }

    fn endpoint_url(&self, endpoint_path: &str) -> String {
        if endpoint_path.starts_with("http://") || endpoint_path.starts_with("https://") {
            return endpoint_path.to_string();
        }
        if endpoint_path.starts_with('/') {
            format!("{}{}", self.origin, endpoint_path)
        } else {
            format!("{}/{}", self.origin, endpoint_path)
        }
    }
}

#[async_trait]
impl OfferSource for HttpOfferSource {
    async fn resolve(&self, page_url: &str, session: &Session) -> Result<String> {
        let resolution_error = |reason: String| CompareError::ResolutionError {
            url: page_url.to_string(),
            reason,
        };

        tracing::debug!("🌐 GET page {}", page_url);
        let response = self
            .with_identity(self.client.get(page_url), session)
            .timeout(self.page_timeout)
            .send()
            .await
            .map_err(|e| resolution_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(resolution_error(format!("page returned HTTP {}", status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| resolution_error(format!("failed to read page body: {}", e)))?;

        let endpoint = self
            .locator
            .endpoint_from_page(&html)
            .map_err(|e| resolution_error(e.to_string()))?;
        tracing::debug!("🔎 Resolved endpoint {}", endpoint);
        Ok(endpoint)
    }

    async fn fetch(
        &self,
        endpoint_path: &str,
        page_url: &str,
        session: &Session,
    ) -> Result<RawOfferDocument> {
        let endpoint_url = self.endpoint_url(endpoint_path);
        let fetch_error = |reason: String| CompareError::FetchError {
            url: endpoint_url.clone(),
            reason,
        };

        tracing::debug!("📡 GET api {}", endpoint_url);
        let response = self
            .with_identity(self.client.get(&endpoint_url), session)
            .header(REFERER, page_url)
            .header(ACCEPT, "application/json")
            .timeout(self.api_timeout)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("API returned HTTP {}", status)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| fetch_error(format!("response is not valid JSON: {}", e)))?;

        Ok(RawOfferDocument {
            endpoint_url,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn source_for(server: &MockServer) -> HttpOfferSource {
        let settings = CompareSettings {
            site_origin: server.base_url(),
            page_timeout_secs: 2,
            api_timeout_secs: 2,
            ..CompareSettings::default()
        };
        HttpOfferSource::from_settings(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_sends_identity_and_decodes_path() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/hotel/seoul.html")
                .query_param("cid", "1881505")
                .header("ag-language-locale", "ko-kr")
                .header_exists("accept-language");
            then.status(200).header("Content-Type", "text/html").body(
                r#"<html><script data-selenium="script-initparam">var apiUrl = "/api/offer?cid=1881505&amp;los=1";</script></html>"#,
            );
        });

        let source = source_for(&server);
        let page_url = server.url("/hotel/seoul.html?cid=1881505");
        let endpoint = source.resolve(&page_url, &Session::default()).await.unwrap();

        page_mock.assert();
        assert_eq!(endpoint, "/api/offer?cid=1881505&los=1");
    }

    #[tokio::test]
    async fn test_resolve_fails_on_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/hotel/seoul.html");
            then.status(503);
        });

        let source = source_for(&server);
        let err = source
            .resolve(&server.url("/hotel/seoul.html?cid=1"), &Session::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::ResolutionError { .. }));
    }

    #[tokio::test]
    async fn test_resolve_fails_without_marker() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/hotel/seoul.html");
            then.status(200).body("<html><body>Access denied</body></html>");
        });

        let source = source_for(&server);
        let err = source
            .resolve(&server.url("/hotel/seoul.html?cid=1"), &Session::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_fetch_sends_referer_and_parses_json() {
        let server = MockServer::start();
        let page_url = server.url("/hotel/seoul.html?cid=7");
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/offer")
                .query_param("cid", "7")
                .header("referer", page_url.as_str());
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"hotelInfo": {"name": "H"}}));
        });

        let source = source_for(&server);
        let raw = source
            .fetch("/api/offer?cid=7", &page_url, &Session::default())
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(raw.body["hotelInfo"]["name"], "H");
        assert_eq!(raw.endpoint_url, server.url("/api/offer?cid=7"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_json_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/offer");
            then.status(200).body("<html>captcha</html>");
        });

        let source = source_for(&server);
        let err = source
            .fetch("/api/offer", &server.url("/h.html"), &Session::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::FetchError { .. }));
    }

    #[test]
    fn test_endpoint_url_joining() {
        let settings = CompareSettings {
            site_origin: "https://www.agoda.com/".to_string(),
            ..CompareSettings::default()
        };
        let source = HttpOfferSource::from_settings(&settings).unwrap();
        assert_eq!(source.endpoint_url("/api/x"), "https://www.agoda.com/api/x");
        assert_eq!(source.endpoint_url("api/x"), "https://www.agoda.com/api/x");
        assert_eq!(source.endpoint_url("https://cdn.example/x"), "https://cdn.example/x");
    }
}
