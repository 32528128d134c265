//! Fake board service built on wiremock

use board_backup::{AssetKind, Config};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A mock service plus an output directory for one test
pub struct FakeService {
    pub server: MockServer,
    pub output: TempDir,
}

impl FakeService {
    /// Start an empty fake service
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            output: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    /// Base URL of the fake service
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Config pointing every endpoint and asset host at the fake service
    pub fn config(&self) -> Config {
        Config {
            base_url: self.uri(),
            output_dir: self.output.path().to_path_buf(),
            asset_host_template: format!("{}/trello-{{kind}}", self.server.address()),
            ..Default::default()
        }
    }

    /// URL of an asset hosted by the fake service
    pub fn asset_url(&self, kind: AssetKind, rest: &str) -> String {
        format!("{}/trello-{}/{}", self.uri(), kind.plural(), rest)
    }

    /// Members endpoint answering with `username` for the token cookie
    pub async fn mount_member(&self, username: &str) {
        Mock::given(method("GET"))
            .and(path("/1/members/me"))
            .and(header("cookie", format!("token={}", super::TOKEN).as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "m1", "username": username})),
            )
            .mount(&self.server)
            .await;
    }

    /// Boards endpoint answering with `boards`
    pub async fn mount_boards(&self, boards: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/1/Members/me/boards"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(boards)))
            .mount(&self.server)
            .await;
    }

    /// Export endpoint for one board, expected `times` times
    pub async fn mount_export(&self, short_link: &str, body: String, times: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/b/{short_link}.json")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Asset bytes at `url`, expected `times` times
    pub async fn mount_asset(&self, url: &str, body: &[u8], times: u64) {
        let asset_path = url
            .strip_prefix(&self.uri())
            .expect("asset url must be on the fake service")
            .to_string();
        Mock::given(method("GET"))
            .and(path(asset_path))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Output directory
    pub fn output_dir(&self) -> &Path {
        self.output.path()
    }

    /// Every export file written into the output directory
    pub fn export_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.output_dir())
            .expect("output dir readable")
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("trello_") && n.ends_with(".json"))
            })
            .collect();
        files.sort();
        files
    }
}

/// An address nothing listens on
pub fn dead_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}
