use serde::Deserialize;

/// GitHub `star` webhook payload.
///
/// Only the fields the notification pipeline needs are modeled; serde ignores
/// the rest of GitHub's payload. `action`, `repository` and `sender` are
/// required — a payload missing any of them is rejected as invalid.
#[derive(Debug, Clone, Deserialize)]
pub struct StarEvent {
    pub action: String,
    pub repository: Repository,
    pub sender: Sender,
    pub starred_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub description: Option<String>,
    pub stargazers_count: Option<i64>,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    pub login: String,
    pub avatar_url: Option<String>,
}
