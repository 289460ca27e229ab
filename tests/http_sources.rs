//! End-to-end tests of the HTTP clients against a throwaway local server.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use feedwatch::{
    Aggregator, AggregatorConfig, FeedClient, FeedError, FeedSource, GitHubRepos,
    RepositoryClient, RepositoryError, RssSource,
};

/// A canned HTTP response served for every connection.
#[derive(Clone)]
struct Canned {
    status: &'static str,
    content_type: &'static str,
    body: String,
}

impl Canned {
    fn ok(content_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            status: "200 OK",
            content_type,
            body: body.into(),
        }
    }

    fn status(status: &'static str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: String::new(),
        }
    }
}

/// Serve `response` on an ephemeral port until the test ends.
async fn serve(response: Canned) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let response = response.clone();
            tokio::spawn(async move {
                // Read until the end of the request headers.
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    response.status,
                    response.content_type,
                    response.body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(response.body.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

/// A server that accepts connections and never answers.
async fn serve_silence() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    format!("http://{addr}")
}

const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Local</title>
    <link>http://localhost</link>
    <description>Local feed</description>
    <item><title>One</title><link>https://example.com/1</link></item>
    <item><title>Two</title></item>
    <item><title>Three</title><link>https://example.com/3</link></item>
    <item><title>Four</title><link>https://example.com/4</link></item>
    <item><title>Five</title><link>https://example.com/5</link></item>
  </channel>
</rss>"#;

const REPOS: &str = r#"[
  {"id": 1, "name": "Alpha", "stargazers_count": 3, "html_url": "https://github.com/u/Alpha"},
  {"id": 2, "name": "beta", "stargazers_count": 9, "html_url": "https://github.com/u/beta"},
  {"id": 3, "name": "ALPHA2", "stargazers_count": 3, "html_url": "https://github.com/u/ALPHA2"}
]"#;

/// Like [`feedwatch::http_client`], but never routed through a proxy.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(feedwatch::USER_AGENT)
        .no_proxy()
        .build()
        .unwrap()
}

fn rss_source(name: &str, base: &str) -> RssSource {
    RssSource::new(
        FeedSource::new(name, format!("{base}/feed.xml")),
        client(),
    )
}

#[tokio::test]
async fn rss_source_fetches_and_truncates() {
    let base = serve(Canned::ok("application/rss+xml", RSS)).await;

    let items = rss_source("local", &base).fetch(3).await.unwrap();
    let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();

    assert_eq!(titles, ["One", "Three", "Four"]);
}

#[tokio::test]
async fn rss_source_reports_non_success_status() {
    let base = serve(Canned::status("404 Not Found")).await;

    let err = rss_source("local", &base).fetch(3).await.unwrap_err();
    assert!(matches!(err, FeedError::Status { status: 404, .. }), "{err}");
}

#[tokio::test]
async fn rss_source_reports_malformed_body() {
    let base = serve(Canned::ok("text/html", "<html><body>maintenance</body></html>")).await;

    let err = rss_source("local", &base).fetch(3).await.unwrap_err();
    assert!(matches!(err, FeedError::Parse(_)), "{err}");
}

#[tokio::test]
async fn github_repos_decodes_listing() {
    let base = serve(Canned::ok("application/json", REPOS)).await;

    let listing = GitHubRepos::new(format!("{base}/users/u/repos"), client());
    let repos = listing.fetch().await.unwrap();

    assert_eq!(repos.len(), 3);
    assert_eq!(repos[1].name, "beta");
    assert_eq!(repos[1].popularity, 9);
    assert_eq!(repos[1].url, "https://github.com/u/beta");
}

#[tokio::test]
async fn github_repos_reports_status() {
    let base = serve(Canned::status("403 Forbidden")).await;

    let listing = GitHubRepos::new(format!("{base}/users/u/repos"), client())
        .with_token(Some("secret".into()));
    let err = listing.fetch().await.unwrap_err();

    assert!(matches!(err, RepositoryError::Status { status: 403, .. }), "{err}");
}

#[tokio::test]
async fn aggregator_isolates_a_silent_source() {
    let good = serve(Canned::ok("application/rss+xml", RSS)).await;
    let also_good = serve(Canned::ok("application/rss+xml", RSS)).await;
    let silent = serve_silence().await;
    let repos = serve(Canned::ok("application/json", REPOS)).await;

    let timeout = Duration::from_millis(500);
    let config = AggregatorConfig {
        sources: vec![
            FeedSource::new("good", format!("{good}/feed.xml")),
            FeedSource::new("silent", format!("{silent}/feed.xml")),
            FeedSource::new("also good", format!("{also_good}/feed.xml")),
        ],
        repository_endpoint: format!("{repos}/users/u/repos"),
        repository_token: None,
        item_cap: 3,
        timeout,
    };
    let aggregator = Aggregator::from_config(&config, client());

    let started = std::time::Instant::now();
    let report = aggregator.refresh().await;
    assert!(started.elapsed() < timeout * 4, "took {:?}", started.elapsed());

    let feeds = aggregator.feed_snapshot();
    assert_eq!(feeds.get("good").unwrap().len(), 3);
    assert_eq!(feeds.get("also good").unwrap().len(), 3);
    assert!(feeds.get("silent").unwrap().is_empty());

    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(report.warnings[0].error, FeedError::Timeout(_)));

    let names: Vec<String> = aggregator.search("alpha").into_iter().map(|r| r.name).collect();
    assert_eq!(names, ["Alpha", "ALPHA2"]);
}
