use std::path::{Path, PathBuf};
use std::process::Output;

use serde_json::json;
use tempfile::TempDir;
use tokio::process::Command;

/// Isolated home directory and session file for one test.
pub struct TestEnv {
    pub home: TempDir,
    pub api_url: String,
}

impl TestEnv {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            home: TempDir::new().unwrap(),
            api_url: api_url.into(),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.home.path().join("session.json")
    }

    /// Write a logged-in session file directly.
    pub fn seed_session(&self, access: &str, refresh: &str) {
        let user = json!({"id": "u1", "email": "admin@example.com", "role": "Admin", "nickname": "root"});
        let entries = json!({"at": access, "rt": refresh, "user": user.to_string()});
        std::fs::write(self.store_path(), entries.to_string()).unwrap();
    }

    pub fn stored(&self) -> Option<serde_json::Value> {
        let content = std::fs::read_to_string(self.store_path()).ok()?;
        Some(serde_json::from_str(&content).unwrap())
    }

    /// Run the CLI binary against the mock API.
    pub async fn run(&self, args: &[&str]) -> Output {
        run_cli(args, self.home.path(), Some(&self.api_url), &self.store_path()).await
    }
}

pub async fn run_cli(args: &[&str], home: &Path, api_url: Option<&str>, store: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_backoffice"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env("BACKOFFICE_STORE", store);
    cmd.env_remove("BACKOFFICE_PASSWORD");
    cmd.env_remove("RUST_LOG");
    match api_url {
        Some(url) => cmd.env("BACKOFFICE_API_URL", url),
        None => cmd.env_remove("BACKOFFICE_API_URL"),
    };
    cmd.output().await.expect("Failed to execute CLI")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "CLI command failed\nstdout: {}\nstderr: {}",
        stdout(output),
        stderr(output)
    );
}
