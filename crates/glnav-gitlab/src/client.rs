//! GitLab REST v4 HTTP client.
//!
//! Thin wrapper over `reqwest` that knows the API prefix, the
//! `PRIVATE-TOKEN` header, offset pagination and how GitLab reports errors.
//! Paths are passed as segment lists so IDs such as branch names are
//! percent-encoded correctly.

use std::time::Duration;

use glnav_core::{ConfigProvider, Error, Record, Result};
use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info};

/// Authentication header carrying the personal access token.
pub const TOKEN_HEADER: &str = "PRIVATE-TOKEN";
/// Page size requested when listing.
pub const PER_PAGE: u32 = 100;
/// Header GitLab uses to announce the next page.
pub const NEXT_PAGE_HEADER: &str = "x-next-page";

/// Authenticated-ish handle on one GitLab instance.
#[derive(Clone, Debug)]
pub struct GitlabClient {
    http: reqwest::Client,
    base: Url,
    instance: String,
    token: String,
}

impl GitlabClient {
    /// Create a client for `instance_url` (e.g. `https://gitlab.com`).
    ///
    /// No request is made; call [`authenticate`](Self::authenticate) to
    /// verify the token.
    pub fn new(instance_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let instance = instance_url.trim().trim_end_matches('/').to_string();
        let mut base = Url::parse(&instance)
            .map_err(|e| Error::config(format!("invalid GitLab URL '{instance}': {e}")))?;
        base.path_segments_mut()
            .map_err(|_| Error::config(format!("GitLab URL '{instance}' cannot be a base URL")))?
            .pop_if_empty()
            .extend(["api", "v4"]);

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base,
            instance,
            token: token.into(),
        })
    }

    /// Create a client from configuration.
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(
            &config.instance_url()?,
            config.private_token()?,
            config.request_timeout(),
        )
    }

    /// Instance URL as configured, without the API prefix.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Full URL of an API path.
    pub fn url<S: AsRef<str>>(&self, segments: &[S]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config(format!("'{}' cannot be a base URL", self.instance)))?
            .extend(segments.iter().map(AsRef::as_ref));
        Ok(url)
    }

    /// Verify the token by fetching the current user.
    ///
    /// # Errors
    ///
    /// [`Error::Authentication`] when the token is rejected and
    /// [`Error::Connection`] when the instance cannot be reached.
    pub async fn authenticate(&self) -> Result<Record> {
        let url = self.url(&["user"])?;
        let response = self
            .http
            .get(url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| Error::connection(&self.instance, e.to_string()))?;
        let value = read_json(check(response).await?).await?;
        let user = Record::try_from(value)?;
        info!(
            instance = %self.instance,
            user = %user.text("username").unwrap_or_default(),
            "authenticated"
        );
        Ok(user)
    }

    /// `GET` one resource.
    pub async fn get<S: AsRef<str>>(&self, segments: &[S], query: &[(&str, String)]) -> Result<Value> {
        let mut url = self.url(segments)?;
        append_query(&mut url, query);
        let response = self.send(self.http.get(url.clone()), &url).await?;
        read_json(response).await
    }

    /// `GET` every page of a list.
    pub async fn get_all<S: AsRef<str>>(&self, segments: &[S]) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut page = Some("1".to_string());
        while let Some(current) = page {
            let mut url = self.url(segments)?;
            append_query(
                &mut url,
                &[("per_page", PER_PAGE.to_string()), ("page", current)],
            );
            let response = self.send(self.http.get(url.clone()), &url).await?;
            page = next_page(response.headers());
            match read_json(response).await? {
                Value::Array(batch) => items.extend(batch),
                Value::Null => {}
                other => {
                    return Err(Error::invalid_data(format!(
                        "expected a list from {url}, got {other}"
                    )));
                }
            }
        }
        debug!(count = items.len(), "listed");
        Ok(items)
    }

    /// `GET` raw bytes.
    pub async fn get_bytes<S: AsRef<str>>(&self, segments: &[S]) -> Result<Vec<u8>> {
        let url = self.url(segments)?;
        let response = self.send(self.http.get(url.clone()), &url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::operation(format!("failed to read {url}: {e}")))?;
        Ok(bytes.to_vec())
    }

    /// `POST` with an optional JSON body.
    pub async fn post<S: AsRef<str>>(&self, segments: &[S], body: Option<&Value>) -> Result<Value> {
        self.with_body(Method::POST, segments, body).await
    }

    /// `PUT` a JSON body.
    pub async fn put<S: AsRef<str>>(&self, segments: &[S], body: &Value) -> Result<Value> {
        self.with_body(Method::PUT, segments, Some(body)).await
    }

    /// `DELETE` one resource.
    pub async fn delete<S: AsRef<str>>(&self, segments: &[S]) -> Result<()> {
        let url = self.url(segments)?;
        self.send(self.http.delete(url.clone()), &url).await?;
        Ok(())
    }

    async fn with_body<S: AsRef<str>>(
        &self,
        method: Method,
        segments: &[S],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url(segments)?;
        let mut request = self.http.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.send(request, &url).await?;
        read_json(response).await
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response> {
        debug!(%url, "request");
        let response = request
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| Error::operation(format!("request to {url} failed: {e}")))?;
        check(response).await
    }
}

fn append_query(url: &mut Url, query: &[(&str, String)]) {
    if query.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for (key, value) in query {
        pairs.append_pair(key, value);
    }
}

/// Next page number announced by the response, if any.
pub fn next_page(headers: &HeaderMap) -> Option<String> {
    headers
        .get(NEXT_PAGE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

async fn read_json(response: Response) -> Result<Value> {
    let text = response
        .text()
        .await
        .map_err(|e| Error::operation(format!("failed to read response: {e}")))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text)
        .map_err(|e| Error::Serialization(format!("invalid JSON from GitLab: {e}")))
}

/// Map a non-success response to an [`Error`].
///
/// GitLab reports failures as `{"message": ...}` or `{"error": ...}`; the
/// message may itself be a structure (validation errors per field).
pub fn status_error(status: StatusCode, body: &str) -> Error {
    let reported = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        match v.get("message").or_else(|| v.get("error"))? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    });
    let message = reported.unwrap_or_else(|| match body.trim() {
        "" => status.canonical_reason().unwrap_or("no message").to_string(),
        text => text.to_string(),
    });

    match status.as_u16() {
        401 => Error::authentication(message),
        404 => Error::not_found(message),
        code => Error::remote(code, message),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(uri: &str) -> GitlabClient {
        GitlabClient::new(uri, "glpat-test", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_appends_api_prefix_and_encodes_segments() {
        let c = client("https://gitlab.example.com/");
        let url = c.url(&["projects", "5", "repository", "branches", "feature/x"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gitlab.example.com/api/v4/projects/5/repository/branches/feature%2Fx"
        );
    }

    #[test]
    fn test_url_keeps_instance_sub_path() {
        let c = client("https://example.com/gitlab");
        assert_eq!(
            c.url(&["user"]).unwrap().as_str(),
            "https://example.com/gitlab/api/v4/user"
        );
    }

    #[test]
    fn test_invalid_instance_url_is_config_error() {
        let err = GitlabClient::new("not a url", "t", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_status_error_mapping() {
        let err = status_error(StatusCode::NOT_FOUND, r#"{"message":"404 Project Not Found"}"#);
        assert!(matches!(err, Error::NotFound(ref m) if m == "404 Project Not Found"));

        let err = status_error(StatusCode::UNAUTHORIZED, r#"{"message":"401 Unauthorized"}"#);
        assert!(matches!(err, Error::Authentication(_)));

        let err = status_error(StatusCode::FORBIDDEN, r#"{"error":"insufficient_scope"}"#);
        assert!(matches!(err, Error::Remote { status: 403, ref message } if message == "insufficient_scope"));

        let err = status_error(StatusCode::BAD_REQUEST, r#"{"message":{"title":["can't be blank"]}}"#);
        assert!(matches!(err, Error::Remote { status: 400, ref message } if message.contains("can't be blank")));

        let err = status_error(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(err, Error::Remote { status: 502, ref message } if message == "Bad Gateway"));
    }

    #[test]
    fn test_next_page_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(next_page(&headers), None);
        headers.insert(NEXT_PAGE_HEADER, HeaderValue::from_static(""));
        assert_eq!(next_page(&headers), None);
        headers.insert(NEXT_PAGE_HEADER, HeaderValue::from_static("3"));
        assert_eq!(next_page(&headers).as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_authenticate_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/user"))
            .and(header(TOKEN_HEADER, "glpat-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "username": "ada"})))
            .expect(1)
            .mount(&server)
            .await;

        let user = client(&server.uri()).authenticate().await.unwrap();
        assert_eq!(user.text("username").as_deref(), Some("ada"));
    }

    #[tokio::test]
    async fn test_authenticate_rejected_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "401 Unauthorized"})))
            .mount(&server)
            .await;

        let err = client(&server.uri()).authenticate().await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_authenticate_unreachable_instance() {
        let err = client("http://127.0.0.1:9").authenticate().await.unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }

    #[tokio::test]
    async fn test_get_all_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "100"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 1}, {"id": 2}]))
                    .insert_header(NEXT_PAGE_HEADER, "2"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 3}]))
                    .insert_header(NEXT_PAGE_HEADER, ""),
            )
            .mount(&server)
            .await;

        let items = client(&server.uri()).get_all(&["projects"]).await.unwrap();
        let ids: Vec<i64> = items.iter().map(|v| v["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v4/projects/5/issues/9"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "404 Issue Not Found"})))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .delete(&["projects", "5", "issues", "9"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_post_empty_response_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v4/projects/5/issues/1/reset_spent_time"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let value = client(&server.uri())
            .post(&["projects", "5", "issues", "1", "reset_spent_time"], None)
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }
}
