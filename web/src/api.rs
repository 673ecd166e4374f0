use std::rc::Rc;

use async_trait::async_trait;
use gloo::net::http::Request;
use minigames_protocol::{ApiError, ApiRequest, ApiResponse, Method, ScoreClient, Transport};
use web_sys::RequestCredentials;

/// `fetch` with cookies against the configured API base.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BrowserTransport {
    base_url: Rc<str>,
}

impl BrowserTransport {
    pub(crate) fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

fn network(err: gloo::net::Error) -> ApiError {
    ApiError::Network(err.to_string())
}

#[async_trait(?Send)]
impl Transport for BrowserTransport {
    async fn send(&self, request: &ApiRequest) -> minigames_protocol::Result<ApiResponse> {
        let url = request.url(&self.base_url);
        let builder = match request.method() {
            Method::Get => Request::get(&url),
            Method::Post => Request::post(&url),
        }
        .credentials(RequestCredentials::Include);

        let pending = match request.body()? {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(body),
            None => builder.build(),
        }
        .map_err(network)?;

        log::trace!("{} {}", request.method().as_str(), url);
        let response = pending.send().await.map_err(network)?;
        let status = response.status();
        let body = response.text().await.map_err(network)?;
        Ok(ApiResponse { status, body })
    }
}

pub(crate) type Api = Rc<ScoreClient<BrowserTransport>>;

pub(crate) fn connect(base_url: &str) -> Api {
    Rc::new(ScoreClient::new(BrowserTransport::new(base_url)))
}
