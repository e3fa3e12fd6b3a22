//! `parley history` — maintenance commands over the local session store.

use std::io::Write;

use chrono::{DateTime, Utc};

use parley_sessions::{Session, SessionStore};

pub fn list(store: &SessionStore) {
    let sessions = store.list_sessions();
    if sessions.is_empty() {
        println!("No saved conversations.");
        return;
    }
    let now = Utc::now();
    for session in &sessions {
        println!("{}", format_row(session, now));
    }
}

pub fn show(store: &SessionStore, id: &str) -> anyhow::Result<()> {
    let session = store
        .get_session(id)
        .ok_or_else(|| anyhow::anyhow!("no saved conversation with id {id}"))?;

    if let Some(saved) = session.saved_at() {
        println!("# {} (saved {})", session.id, saved.format("%Y-%m-%d %H:%M:%S UTC"));
    } else {
        println!("# {}", session.id);
    }
    for turn in &session.messages {
        println!("\n[{}]\n{}", turn.role, turn.content);
    }
    Ok(())
}

pub fn delete(store: &SessionStore, id: &str) -> anyhow::Result<()> {
    if store.get_session(id).is_none() {
        eprintln!("No saved conversation with id {id}");
        return Ok(());
    }
    store.delete_session(id)?;
    println!("Deleted {id}");
    Ok(())
}

pub fn clear(store: &SessionStore, yes: bool) -> anyhow::Result<()> {
    let count = store.list_sessions().len();
    if count == 0 {
        println!("No saved conversations.");
        return Ok(());
    }
    if !yes && !confirm(&format!("Delete all {count} saved conversation(s)? [y/N] "))? {
        println!("Aborted.");
        return Ok(());
    }
    store.clear_all()?;
    println!("Cleared {count} conversation(s).");
    Ok(())
}

// ── Formatting ──────────────────────────────────────────────────────

/// One listing line: id, age, turn count, preview.
pub fn format_row(session: &Session, now: DateTime<Utc>) -> String {
    let age = session
        .saved_at()
        .map(|t| relative_age(t, now))
        .unwrap_or_else(|| "-".into());
    format!(
        "{}  {:>8}  {:>3} msgs  {}",
        session.id,
        age,
        session.messages.len(),
        session.preview()
    )
}

/// Coarse "time ago" label.
pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    match secs {
        0..=59 => "just now".into(),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use parley_domain::Turn;

    #[test]
    fn relative_age_buckets() {
        let now = Utc::now();
        assert_eq!(relative_age(now, now), "just now");
        assert_eq!(relative_age(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(relative_age(now - Duration::hours(3), now), "3h ago");
        assert_eq!(relative_age(now - Duration::days(2), now), "2d ago");
        // Clock skew: saved "in the future".
        assert_eq!(relative_age(now + Duration::minutes(1), now), "just now");
    }

    #[test]
    fn row_shows_id_count_and_preview() {
        let now = Utc::now();
        let session = Session {
            id: "abc123".into(),
            messages: vec![Turn::user("Hello there"), Turn::assistant("Hi!")],
            timestamp: now.timestamp_millis(),
        };
        let row = format_row(&session, now);
        assert!(row.starts_with("abc123"));
        assert!(row.contains("2 msgs"));
        assert!(row.ends_with("Hello there"));
    }
}
