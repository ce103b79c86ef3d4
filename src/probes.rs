use reqwest::Client;
use url::Url;

/// Whether `{origin}/robots.txt` answers a HEAD request successfully
pub async fn has_robots_txt(client: &Client, origin: &Url) -> bool {
    resource_exists(client, origin, "/robots.txt").await
}

/// Whether `{origin}/sitemap.xml` answers a HEAD request successfully
pub async fn has_sitemap(client: &Client, origin: &Url) -> bool {
    resource_exists(client, origin, "/sitemap.xml").await
}

async fn resource_exists(client: &Client, origin: &Url, path: &str) -> bool {
    let Ok(url) = origin.join(path) else {
        return false;
    };

    match client.head(url.clone()).send().await {
        Ok(response) => {
            let status = response.status();
            status.is_success() || status.is_redirection()
        }
        Err(e) => {
            tracing::info!(url = %url, error = %e, "Probe request failed");
            false
        }
    }
}
