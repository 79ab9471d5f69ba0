//! End-to-end sync runs against a mock HTTP server
//!
//! Sources, stream HEAD checks, the knowledge-base API and the schedule guide are
//! all served by one `MockServer`; the classifier is an in-test stub.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use playlist_sync::config::Config;
use playlist_sync::errors::{AppError, AppResult};
use playlist_sync::ingestor::{StateStore, SyncOrchestrator};
use playlist_sync::models::LiveStatus;
use playlist_sync::proxy::{FeedService, render_m3u};
use playlist_sync::services::CompletionClient;
use playlist_sync::services::classifier::{category_prompt, english_prompt};
use playlist_sync::sources::parse_m3u;
use playlist_sync::utils::StandardHttpClient;

/// Answers known prompts, fails everything else
#[derive(Default)]
struct ScriptedCompletion {
    replies: HashMap<String, String>,
}

impl ScriptedCompletion {
    fn admit(mut self, name: &str, category: &str) -> Self {
        self.replies.insert(english_prompt(name), "Yes".to_string());
        self.replies.insert(category_prompt(name), category.to_string());
        self
    }

    fn reject(mut self, name: &str) -> Self {
        self.replies.insert(english_prompt(name), "No".to_string());
        self
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> AppResult<String> {
        self.replies
            .get(prompt)
            .cloned()
            .ok_or_else(|| AppError::external_service("scripted", "no reply"))
    }
}

fn orchestrator(server: &MockServer, completion: ScriptedCompletion) -> SyncOrchestrator {
    let mut config = Config::default();
    config.sync.source_timeout = Duration::from_secs(2);
    config.sync.probe_timeout = Duration::from_secs(2);
    config.sync.lookup_timeout = Duration::from_secs(2);
    config.sync.max_concurrency = 4;
    config.artwork.search_endpoint = format!("{}/w/api.php", server.uri());
    config.artwork.logo_base_url = "https://logos.example.com/".to_string();
    config.schedule.url = format!("{}/guide.xml", server.uri());
    config.schedule.timeout = Duration::from_secs(2);

    let http_client = Arc::new(StandardHttpClient::new().unwrap());
    SyncOrchestrator::from_config(&config, http_client, Arc::new(completion), StateStore::new())
}

async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn head_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

async fn no_search_hits(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("list", "search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"query": {"search": []}})),
        )
        .mount(server)
        .await;
}

fn playlist(server: &MockServer, items: &[(&str, &str, &str)]) -> String {
    let mut text = String::from("#EXTM3U\n");
    for (id, name, stream) in items {
        text.push_str(&format!(
            "#EXTINF:-1 tvg-id=\"{id}\" tvg-logo=\"\" group-title=\"News\",{name}\n{}{stream}\n",
            server.uri()
        ));
    }
    text
}

#[tokio::test]
async fn test_same_channel_from_two_sources_is_renamed() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/one.m3u",
        200,
        &playlist(&server, &[("n24", "News24", "/stream/one")]),
    )
    .await;
    serve(
        &server,
        "/two.m3u",
        200,
        &playlist(&server, &[("n25", "News24", "/stream/two")]),
    )
    .await;
    head_status(&server, "/stream/one", 200).await;
    head_status(&server, "/stream/two", 503).await;
    no_search_hits(&server).await;

    let orchestrator = orchestrator(&server, ScriptedCompletion::default().admit("News24", "News"));
    let state = orchestrator
        .sync(&[
            format!("{}/one.m3u", server.uri()),
            format!("{}/two.m3u", server.uri()),
        ])
        .await
        .unwrap();

    let names: Vec<&str> = state.entries.iter().map(|e| e.display_name.as_str()).collect();
    assert_eq!(names, vec!["News24", "News24 2"]);

    assert_eq!(state.entries[0].id, "n24");
    assert_eq!(state.entries[1].id, "n25");
    assert!(state.entries[0].stream_url.ends_with("/stream/one"));
    assert!(state.entries[1].stream_url.ends_with("/stream/two"));
    assert_eq!(state.entries[0].live_status, Some(LiveStatus::Live));
    assert_eq!(state.entries[1].live_status, Some(LiveStatus::Offline));
    assert_eq!(state.entries[0].logo_url, "https://logos.example.com/n24.png");
    assert_eq!(state.entries[1].logo_url, "https://logos.example.com/n25.png");
    assert_eq!(state.entries[0].category, "News");
}

#[tokio::test]
async fn test_slow_early_responses_stay_with_their_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.m3u"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(playlist(
                    &server,
                    &[("a", "Alpha News", "/stream/a"), ("b", "Beta News", "/stream/b")],
                ))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    serve(
        &server,
        "/fast.m3u",
        200,
        &playlist(&server, &[("c", "Gamma News", "/stream/c")]),
    )
    .await;

    Mock::given(method("HEAD"))
        .and(path("/stream/a"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;
    head_status(&server, "/stream/b", 404).await;
    head_status(&server, "/stream/c", 206).await;

    // Only the first entry's artwork resolves, and its search answers last
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("srsearch", "Alpha News television channel logo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"query": {"search": [{"title": "Alpha News"}]}}))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("prop", "images"))
        .and(query_param("titles", "Alpha News"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "query": {"pages": [{"images": [{"title": "File:Alpha.svg"}]}]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("prop", "imageinfo"))
        .and(query_param("titles", "File:Alpha.svg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "query": {"pages": [{"imageinfo": [{"url": "https://upload.example.org/Alpha.svg"}]}]}
        })))
        .mount(&server)
        .await;
    no_search_hits(&server).await;

    let completion = ScriptedCompletion::default()
        .admit("Alpha News", "News")
        .admit("Beta News", "News")
        .admit("Gamma News", "News");
    let orchestrator = orchestrator(&server, completion);

    let state = orchestrator
        .sync(&[
            format!("{}/slow.m3u", server.uri()),
            format!("{}/fast.m3u", server.uri()),
        ])
        .await
        .unwrap();

    let ids: Vec<&str> = state.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    let (alpha, beta, gamma) = (&state.entries[0], &state.entries[1], &state.entries[2]);
    assert_eq!(alpha.display_name, "Alpha News");
    assert!(alpha.stream_url.ends_with("/stream/a"));
    assert_eq!(alpha.live_status, Some(LiveStatus::Live));
    assert_eq!(alpha.logo_url, "https://upload.example.org/Alpha.svg");

    assert_eq!(beta.display_name, "Beta News");
    assert!(beta.stream_url.ends_with("/stream/b"));
    assert_eq!(beta.live_status, Some(LiveStatus::Offline));
    assert_eq!(beta.logo_url, "https://logos.example.com/b.png");

    assert_eq!(gamma.display_name, "Gamma News");
    assert!(gamma.stream_url.ends_with("/stream/c"));
    assert_eq!(gamma.live_status, Some(LiveStatus::Live));
    assert_eq!(gamma.logo_url, "https://logos.example.com/c.png");
}

#[tokio::test]
async fn test_no_sources_is_rejected_and_nothing_is_published() {
    let server = MockServer::start().await;
    let orchestrator = orchestrator(&server, ScriptedCompletion::default());
    let feed = FeedService::new(orchestrator.state().clone());

    assert!(matches!(
        orchestrator.sync(&[]).await,
        Err(AppError::NoSourcesConfigured)
    ));
    assert!(matches!(
        feed.current_feed().await,
        Err(AppError::NothingAvailable)
    ));
}

#[tokio::test]
async fn test_unreachable_source_does_not_abort_sync() {
    let server = MockServer::start().await;
    serve(&server, "/broken.m3u", 500, "oops").await;
    serve(
        &server,
        "/good.m3u",
        200,
        &playlist(
            &server,
            &[("n24", "News24", "/stream/n24"), ("es1", "Noticias Uno", "/stream/es1")],
        ),
    )
    .await;
    head_status(&server, "/stream/n24", 206).await;
    no_search_hits(&server).await;

    let completion = ScriptedCompletion::default()
        .admit("News24", "News")
        .reject("Noticias Uno");
    let orchestrator = orchestrator(&server, completion);

    let state = orchestrator
        .sync(&[
            format!("{}/broken.m3u", server.uri()),
            format!("{}/good.m3u", server.uri()),
        ])
        .await
        .unwrap();

    assert_eq!(state.entries.len(), 1);
    assert_eq!(state.entries[0].display_name, "News24");
    assert_eq!(state.entries[0].live_status, Some(LiveStatus::Live));
    assert_eq!(state.stats.sources_failed, 1);
    assert_eq!(state.stats.entries_filtered, 1);
}

#[tokio::test]
async fn test_stable_inputs_give_identical_snapshots() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/list.m3u",
        200,
        &playlist(
            &server,
            &[
                ("a", "Alpha News", "/stream/a"),
                ("b", "Beta News", "/stream/b"),
                ("a2", "Alpha News", "/stream/a2"),
            ],
        ),
    )
    .await;
    head_status(&server, "/stream/a", 200).await;
    no_search_hits(&server).await;

    let completion = ScriptedCompletion::default()
        .admit("Alpha News", "News")
        .admit("Beta News", "News");
    let orchestrator = orchestrator(&server, completion);
    let sources = vec![format!("{}/list.m3u", server.uri())];

    let first = orchestrator.sync(&sources).await.unwrap();
    let second = orchestrator.sync(&sources).await.unwrap();

    assert_eq!(first.entries, second.entries);
    assert_eq!(first.stats, second.stats);
    assert!(second.synced_at >= first.synced_at);
}

#[tokio::test]
async fn test_rendered_feed_round_trips_committed_fields() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/list.m3u",
        200,
        &playlist(
            &server,
            &[("n24", "News24", "/stream/n24"), ("", "Headline Now", "/stream/hn")],
        ),
    )
    .await;
    serve(
        &server,
        "/guide.xml",
        200,
        r#"<tv>
  <channel id="n24"><display-name>News24</display-name></channel>
  <programme start="20260101060000 +0000" stop="20260101070000 +0000" channel="n24"><title>Morning</title></programme>
</tv>"#,
    )
    .await;
    no_search_hits(&server).await;

    let completion = ScriptedCompletion::default()
        .admit("News24", "News")
        .admit("Headline Now", "News");
    let orchestrator = orchestrator(&server, completion);

    let state = orchestrator
        .sync(&[format!("{}/list.m3u", server.uri())])
        .await
        .unwrap();
    assert_eq!(state.entries[0].schedule.len(), 1);
    assert_eq!(state.entries[0].schedule[0].title, "Morning");

    let reparsed = parse_m3u(&render_m3u(&state));
    assert_eq!(reparsed.len(), state.entries.len());
    for (parsed, committed) in reparsed.iter().zip(&state.entries) {
        assert_eq!(parsed.id, committed.id);
        assert_eq!(parsed.display_name, committed.display_name);
        assert_eq!(parsed.name_hint, committed.name_hint);
        assert_eq!(parsed.logo_url, committed.logo_url);
        assert_eq!(parsed.category, committed.category);
        assert_eq!(parsed.stream_url, committed.stream_url);
    }

    let feed = FeedService::new(orchestrator.state().clone());
    let guide = feed.current_guide().await.unwrap();
    assert!(guide.contains("<title>Morning</title>"));
}
