use core::time::Duration;

use reqwest::Client;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/105.0.0.0 Safari/537.36";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the single HTTP client shared by the fetcher and every collaborator.
pub fn client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
}

/// GETs `url` and returns its body.
///
/// Every failure (connect, timeout, non-2xx, undecodable body) is logged and
/// degrades to an empty string, which callers read as "no data".
pub async fn fetch(client: &Client, url: &str) -> String {
    let res: reqwest::Result<String> = async {
        client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
    .await;

    match res {
        Ok(body) => {
            tracing::debug!(target: "fetch", "{url}: {} bytes", body.len());
            body
        }
        Err(e) => {
            tracing::error!(target: "fetch", "request to {url} failed: {e}");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_yields_empty_body() {
        let client = client(Duration::from_secs(2)).unwrap();
        // Port 9 (discard) is normally closed on test hosts.
        let body = fetch(&client, "http://127.0.0.1:9/data-center").await;
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn invalid_url_yields_empty_body() {
        let client = client(DEFAULT_TIMEOUT).unwrap();
        assert_eq!(fetch(&client, "not a url").await, "");
    }
}
