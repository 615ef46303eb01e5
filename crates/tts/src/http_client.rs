use std::{sync::OnceLock, time::Duration};

use reqwest::{
    Client,
    header::{self, HeaderMap, HeaderValue},
};

/// Vendor calls block the caller until they finish or this timeout fires
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Common HTTP client shared by every speech provider
pub fn http_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();

    CLIENT
        .get_or_init(|| {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

            Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .pool_idle_timeout(Some(Duration::from_secs(5)))
                .tcp_nodelay(true)
                .tcp_keepalive(Some(Duration::from_secs(60)))
                .user_agent(concat!("saythis/", env!("CARGO_PKG_VERSION")))
                .default_headers(headers)
                .build()
                .expect("Failed to build default HTTP client")
        })
        .clone()
}
