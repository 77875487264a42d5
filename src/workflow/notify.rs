use tracing::warn;

use crate::context::AppContext;
use crate::domain::notification::{NotificationDraft, NotificationExtras, NotificationKind};
use crate::domain::user::UserProfile;

/// Notifies every known profile about one event, the acting user included.
/// One row per profile, written in a single bulk insert keyed by the event.
/// Fan-out must never fail the action that triggered it, so errors only log.
pub async fn fan_out(
    ctx: &AppContext,
    kind: NotificationKind,
    title: &str,
    message: &str,
    extras: NotificationExtras,
) {
    let profiles = match ctx.directory.list_profiles(&ctx.session).await {
        Ok(profiles) => profiles,
        Err(err) => {
            warn!("skipping {} fan-out, directory unavailable: {err}", kind.as_str());
            return;
        }
    };
    if profiles.is_empty() {
        warn!("no profiles to notify about {}", kind.as_str());
        return;
    }

    let drafts = fan_out_drafts(&profiles, kind, title, message, &extras);
    let recipients = drafts.len();
    if let Err(err) = ctx.notifications.create_many(&ctx.session, drafts).await {
        warn!("failed to write {recipients} {} notifications: {err}", kind.as_str());
    }
}

/// One draft per profile, deduplicated by recipient id.
pub fn fan_out_drafts(
    profiles: &[UserProfile],
    kind: NotificationKind,
    title: &str,
    message: &str,
    extras: &NotificationExtras,
) -> Vec<NotificationDraft> {
    let mut seen: Vec<&str> = Vec::with_capacity(profiles.len());
    profiles
        .iter()
        .filter(|profile| {
            if seen.contains(&profile.id.as_str()) {
                false
            } else {
                seen.push(&profile.id);
                true
            }
        })
        .map(|profile| NotificationDraft {
            user_id: profile.id.clone(),
            kind,
            title: title.to_string(),
            message: message.to_string(),
            extras: Some(extras.clone()),
        })
        .collect()
}

/// Targeted single-recipient notification; same soft-failure contract as
/// `fan_out`.
pub async fn notify_user(
    ctx: &AppContext,
    user_id: &str,
    kind: NotificationKind,
    title: &str,
    message: &str,
    extras: NotificationExtras,
) {
    let draft = NotificationDraft {
        user_id: user_id.to_string(),
        kind,
        title: title.to_string(),
        message: message.to_string(),
        extras: Some(extras),
    };
    if let Err(err) = ctx
        .notifications
        .create_many(&ctx.session, vec![draft])
        .await
    {
        warn!("failed to notify {user_id} about {}: {err}", kind.as_str());
    }
}

/// `@token` references in a comment body. Tokens may carry word characters,
/// dots, dashes and `@` so plain email addresses work.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        if ch != '@' {
            continue;
        }
        // A mention starts at the beginning or after whitespace, otherwise
        // the '@' is the middle of an email address already captured.
        let at_start = index == 0
            || text[..index]
                .chars()
                .next_back()
                .is_some_and(char::is_whitespace);
        if !at_start {
            continue;
        }
        let mut token = String::new();
        while let Some((_, next)) = chars.peek() {
            if next.is_alphanumeric() || matches!(next, '_' | '.' | '-' | '@') {
                token.push(*next);
                chars.next();
            } else {
                break;
            }
        }
        let token = token.trim_end_matches(['.', '-']).to_string();
        if !token.is_empty() && !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// Matches mention tokens against the directory: full email, email local
/// part, or display name (case-insensitive, spaces ignored).
pub fn resolve_mentions<'a>(
    tokens: &[String],
    profiles: &'a [UserProfile],
) -> Vec<&'a UserProfile> {
    let mut resolved: Vec<&UserProfile> = Vec::new();
    for token in tokens {
        let needle = token.to_lowercase();
        let hit = profiles.iter().find(|profile| {
            let email = profile.email.to_lowercase();
            let local_part = email.split('@').next().unwrap_or_default().to_string();
            let name = profile
                .full_name
                .as_deref()
                .unwrap_or_default()
                .to_lowercase()
                .replace(' ', "");
            needle == email || needle == local_part || (!name.is_empty() && needle == name)
        });
        if let Some(profile) = hit {
            if !resolved.iter().any(|existing| existing.id == profile.id) {
                resolved.push(profile);
            }
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, email: &str, full_name: Option<&str>) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            email: email.to_string(),
            full_name: full_name.map(str::to_string),
        }
    }

    #[test]
    fn one_draft_per_profile_including_the_actor() {
        let profiles = vec![
            profile("u-1", "ana@example.com", Some("Ana Lima")),
            profile("u-2", "bruno@example.com", None),
            profile("u-3", "clara@example.com", Some("Clara Dias")),
        ];
        let drafts = fan_out_drafts(
            &profiles,
            NotificationKind::NewTicket,
            "Nova demanda criada",
            "Ana criou uma nova demanda",
            &NotificationExtras {
                ticket_id: Some(7),
                author_id: Some("u-1".to_string()),
                comment_id: None,
            },
        );
        assert_eq!(drafts.len(), 3);
        assert!(drafts.iter().any(|d| d.user_id == "u-1"));
        assert!(drafts.iter().all(|d| d.kind == NotificationKind::NewTicket));
    }

    #[test]
    fn duplicate_profiles_collapse_to_one_draft() {
        let profiles = vec![
            profile("u-1", "ana@example.com", None),
            profile("u-1", "ana@example.com", None),
        ];
        let drafts = fan_out_drafts(
            &profiles,
            NotificationKind::Comment,
            "t",
            "m",
            &NotificationExtras::default(),
        );
        assert_eq!(drafts.len(), 1);
    }

    #[test]
    fn extracts_mention_tokens() {
        let text = "Segue @ana e @bruno@example.com, valeu. a@b nao conta";
        assert_eq!(
            extract_mentions(text),
            vec!["ana".to_string(), "bruno@example.com".to_string()]
        );
    }

    #[test]
    fn repeated_mentions_collapse() {
        assert_eq!(extract_mentions("@ana @ana"), vec!["ana".to_string()]);
        assert!(extract_mentions("sem mencoes").is_empty());
    }

    #[test]
    fn resolves_by_email_local_part_and_name() {
        let profiles = vec![
            profile("u-1", "ana@example.com", Some("Ana Lima")),
            profile("u-2", "bruno@example.com", None),
        ];
        let tokens = vec![
            "AnaLima".to_string(),
            "bruno@example.com".to_string(),
            "ninguem".to_string(),
        ];
        let resolved = resolve_mentions(&tokens, &profiles);
        let ids: Vec<&str> = resolved.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["u-1", "u-2"]);
    }

    #[test]
    fn resolved_mentions_are_unique() {
        let profiles = vec![profile("u-1", "ana@example.com", Some("Ana"))];
        let tokens = vec!["ana".to_string(), "ana@example.com".to_string()];
        assert_eq!(resolve_mentions(&tokens, &profiles).len(), 1);
    }
}
