use crate::error::ApiError;
use crate::models::github::StarEvent;
use crate::models::push::Notification;

const GITHUB_BADGE_URL: &str = "https://github.githubassets.com/favicons/favicon.png";

/// The star action GitHub sends when a repository gains a star.
pub const STAR_ACTION: &str = "started";

/// Result of translating a validated webhook event.
///
/// Non-star actions are a legitimate, non-error outcome; modeling them as a
/// variant keeps callers from forgetting the check.
#[derive(Debug)]
pub enum StarEventOutcome {
    Notify(Notification),
    Ignored { action: String },
}

/// Parse the raw webhook body. Unparsable JSON or missing required fields
/// (action, repository, sender) reject the request; nothing is defaulted.
pub fn parse_star_event(body: &[u8]) -> Result<StarEvent, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidPayload(e.to_string()))
}

/// Translate a validated event into a push notification, or an `Ignored`
/// outcome for any action other than "started".
pub fn translate(event: &StarEvent) -> StarEventOutcome {
    if event.action != STAR_ACTION {
        return StarEventOutcome::Ignored {
            action: event.action.clone(),
        };
    }

    let repo = &event.repository;
    let title = format!("⭐ New Star on {}", repo.full_name);

    let mut body = format!("{} starred your repository", event.sender.login);
    if let Some(description) = repo.description.as_deref().filter(|d| !d.is_empty()) {
        body.push_str(&format!("\n\n{description}"));
    }
    body.push_str(&format!("\n\n⭐ {} stars", repo.stargazers_count.unwrap_or(0)));
    if let Some(starred_at) = &event.starred_at {
        body.push_str(&format!("\n🕐 {starred_at}"));
    }

    let url = repo
        .html_url
        .clone()
        .unwrap_or_else(|| format!("https://github.com/{}", repo.full_name));

    StarEventOutcome::Notify(Notification {
        title,
        body,
        icon: event.sender.avatar_url.clone(),
        badge: Some(GITHUB_BADGE_URL.to_string()),
        image: None,
        url: Some(url),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started_event() -> StarEvent {
        parse_star_event(
            br#"{
                "action": "started",
                "repository": {
                    "full_name": "acme/widget",
                    "description": "A widget",
                    "stargazers_count": 42,
                    "html_url": "https://github.com/acme/widget"
                },
                "sender": {"login": "alice", "avatar_url": "https://avatars.example/alice.png"},
                "starred_at": "2024-05-01T12:00:00Z"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_started_action_builds_one_notification() {
        let outcome = translate(&started_event());
        let StarEventOutcome::Notify(n) = outcome else {
            panic!("expected a notification");
        };
        assert!(n.title.contains("acme/widget"));
        assert!(n.body.starts_with("alice starred your repository"));
        assert!(n.body.contains("A widget"));
        assert!(n.body.contains("42 stars"));
        assert!(n.body.contains("2024-05-01T12:00:00Z"));
        assert_eq!(n.icon.as_deref(), Some("https://avatars.example/alice.png"));
        assert_eq!(n.url.as_deref(), Some("https://github.com/acme/widget"));
    }

    #[test]
    fn test_other_actions_are_ignored() {
        let mut event = started_event();
        event.action = "deleted".to_string();
        assert!(matches!(
            translate(&event),
            StarEventOutcome::Ignored { action } if action == "deleted"
        ));
    }

    #[test]
    fn test_empty_description_is_skipped_and_url_falls_back() {
        let mut event = started_event();
        event.repository.description = Some(String::new());
        event.repository.html_url = None;
        event.repository.stargazers_count = None;
        event.starred_at = None;

        let StarEventOutcome::Notify(n) = translate(&event) else {
            panic!("expected a notification");
        };
        assert_eq!(
            n.body,
            "alice starred your repository\n\n⭐ 0 stars"
        );
        assert_eq!(n.url.as_deref(), Some("https://github.com/acme/widget"));
    }

    #[test]
    fn test_missing_required_fields_reject_payload() {
        assert!(matches!(
            parse_star_event(br#"{"action": "started"}"#),
            Err(ApiError::InvalidPayload(_))
        ));
        assert!(matches!(
            parse_star_event(b"not json"),
            Err(ApiError::InvalidPayload(_))
        ));
    }
}
