use crate::errors::{FetchError, TransportError};
use crate::headers::Headers;
use bytes::Bytes;
use http::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use http::{Method, StatusCode};
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

const DEFAULT_USER_AGENT: &str = concat!("jsonpoll/", env!("CARGO_PKG_VERSION"));

/// Everything one HTTP exchange produced, including what was sent.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status_code: StatusCode,
    pub headers: Headers,
    pub body: Bytes,
    pub request_method: Method,
    pub request_headers: Headers,
}

/// Executes single HTTP requests.
///
/// Cloning is cheap and clones share the underlying connection pool, so one
/// fetcher can serve any number of collectors.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: reqwest::Client,
    default_headers: HeaderMap,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        Self::with_default_headers(HeaderMap::new())
    }

    /// Fetcher that sends `headers` on every request, on top of the built-in
    /// `User-Agent` and `Accept`, which `headers` may override.
    ///
    /// The client itself carries no default headers: everything is applied
    /// to the request before it is recorded, so request metadata always shows
    /// what was sent.
    pub fn with_default_headers(headers: HeaderMap) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // Replaces the built-in values per name and keeps repeated values
        default_headers.extend(headers);

        Fetcher {
            client: reqwest::Client::new(),
            default_headers,
        }
    }

    /// Sends one request and reads the whole response into memory.
    ///
    /// `budget` covers connecting, sending, receiving headers and collecting
    /// the body. When it runs out the request is dropped, which closes the
    /// connection, and a [`TransportError::Timeout`] is returned.
    ///
    /// The status code is not checked: error responses are returned like any
    /// other.
    pub async fn execute(
        &self,
        url: &Url,
        method: &Method,
        body: &str,
        budget: Duration,
    ) -> Result<RawResponse, FetchError> {
        let mut builder = self.client.request(method.clone(), url.clone());
        if !body.is_empty() {
            builder = builder.body(body.to_owned());
        }

        let mut request = builder.build().map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;

        // Defaults live here rather than on the client so the recorded
        // request headers match what goes on the wire.
        for (name, value) in &self.default_headers {
            if !request.headers().contains_key(name) {
                request.headers_mut().insert(name, value.clone());
            }
        }

        let request_method = request.method().clone();
        let request_headers = Headers::from(request.headers());

        let exchange = async {
            let response = self
                .client
                .execute(request)
                .await
                .map_err(|e| classify_send_error(url, budget, e))?;

            let status_code = response.status();
            let headers = Headers::from(response.headers());

            // `bytes` consumes the response, the connection goes back to the
            // pool or is closed whether or not the read succeeds.
            let body = response
                .bytes()
                .await
                .map_err(|e| classify_body_error(url, budget, e))?;

            Ok::<_, FetchError>((status_code, headers, body))
        };

        let (status_code, headers, body) = timeout(budget, exchange)
            .await
            .map_err(|_| TransportError::Timeout {
                url: url.to_string(),
                timeout: budget,
            })??;

        tracing::debug!(
            url = %url,
            status = status_code.as_u16(),
            bytes = body.len(),
            "Fetched response"
        );

        Ok(RawResponse {
            status_code,
            headers,
            body,
            request_method,
            request_headers,
        })
    }
}

// A client built with its own timeout can time out before our budget does.
fn classify_send_error(url: &Url, budget: Duration, source: reqwest::Error) -> FetchError {
    let url = url.to_string();
    let err = if source.is_timeout() {
        TransportError::Timeout {
            url,
            timeout: budget,
        }
    } else if source.is_connect() {
        TransportError::Connect { url, source }
    } else {
        TransportError::Request { url, source }
    };
    err.into()
}

fn classify_body_error(url: &Url, budget: Duration, source: reqwest::Error) -> FetchError {
    if source.is_timeout() {
        return classify_send_error(url, budget, source);
    }

    FetchError::Io {
        url: url.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{MockResponse, start_mock_server, start_truncating_server};

    fn url(port: u16, path: &str) -> Url {
        Url::parse(&format!("http://127.0.0.1:{port}{path}")).unwrap()
    }

    #[tokio::test]
    async fn test_execute_success() {
        let server = start_mock_server(MockResponse::json(200, r#"{"value": 42}"#)).await;
        let fetcher = Fetcher::new();

        let raw = fetcher
            .execute(
                &url(server.port, "/stats"),
                &Method::GET,
                "",
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(raw.status_code, StatusCode::OK);
        assert_eq!(raw.body.as_ref(), br#"{"value": 42}"#);
        assert_eq!(
            raw.headers.get("content-type"),
            Some(&["application/json".to_string()][..])
        );
        assert_eq!(raw.request_method, Method::GET);
        assert_eq!(
            raw.request_headers.get("user-agent"),
            Some(&[DEFAULT_USER_AGENT.to_string()][..])
        );
        assert_eq!(
            raw.request_headers.get("accept"),
            Some(&["application/json".to_string()][..])
        );

        let seen = server.requests().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::GET);
        assert_eq!(seen[0].path, "/stats");
        assert!(seen[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_execute_sends_method_and_body() {
        let server = start_mock_server(MockResponse::json(201, "{}")).await;
        let fetcher = Fetcher::new();

        let raw = fetcher
            .execute(
                &url(server.port, "/"),
                &Method::POST,
                "query=all",
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(raw.status_code, StatusCode::CREATED);
        assert_eq!(raw.request_method, Method::POST);

        let seen = server.requests().await;
        assert_eq!(seen[0].method, Method::POST);
        assert_eq!(seen[0].body, "query=all");
        assert_eq!(
            seen[0].headers.get(USER_AGENT).unwrap(),
            &HeaderValue::from_static(DEFAULT_USER_AGENT)
        );
    }

    #[tokio::test]
    async fn test_error_status_is_not_an_error() {
        let server = start_mock_server(MockResponse::json(503, r#"{"status": "down"}"#)).await;
        let raw = Fetcher::new()
            .execute(
                &url(server.port, "/"),
                &Method::GET,
                "",
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(raw.status_code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(raw.body.as_ref(), br#"{"status": "down"}"#);
    }

    #[tokio::test]
    async fn test_execute_timeout() {
        let server = start_mock_server(
            MockResponse::json(200, "{}").with_delay(Duration::from_secs(5)),
        )
        .await;

        let result = Fetcher::new()
            .execute(
                &url(server.port, "/"),
                &Method::GET,
                "",
                Duration::from_millis(100),
            )
            .await;

        assert!(matches!(
            result.unwrap_err(),
            FetchError::Transport(TransportError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_default_headers_are_sent_and_recorded() {
        let server = start_mock_server(MockResponse::json(200, "{}")).await;

        let mut extra = HeaderMap::new();
        extra.insert("x-api-key", HeaderValue::from_static("secret"));
        extra.insert(ACCEPT, HeaderValue::from_static("*/*"));
        let fetcher = Fetcher::with_default_headers(extra);

        let raw = fetcher
            .execute(&url(server.port, "/"), &Method::GET, "", Duration::from_secs(5))
            .await
            .unwrap();

        let seen = server.requests().await;
        assert_eq!(
            seen[0].headers.get("x-api-key").unwrap(),
            &HeaderValue::from_static("secret")
        );
        assert_eq!(
            raw.request_headers.get("x-api-key"),
            Some(&["secret".to_string()][..])
        );

        // Overrides replace the built-in value instead of adding to it
        assert_eq!(seen[0].headers.get_all(ACCEPT).iter().count(), 1);
        assert_eq!(
            raw.request_headers.get("accept"),
            Some(&["*/*".to_string()][..])
        );
        assert!(raw.request_headers.get("user-agent").is_some());
    }

    #[tokio::test]
    async fn test_truncated_body_is_io_error() {
        let port = start_truncating_server().await;

        let result = Fetcher::new()
            .execute(&url(port, "/"), &Method::GET, "", Duration::from_secs(5))
            .await;

        assert!(matches!(result.unwrap_err(), FetchError::Io { .. }));
    }

    #[tokio::test]
    async fn test_execute_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = Fetcher::new()
            .execute(&url(port, "/"), &Method::GET, "", Duration::from_secs(5))
            .await;

        assert!(matches!(
            result.unwrap_err(),
            FetchError::Transport(TransportError::Connect { .. })
        ));
    }
}
