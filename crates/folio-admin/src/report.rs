//! Text rendering of the admin account state

use std::fmt::Write;

use folio_core::{
    lockout::describe_secs, AuthService, Clock, KeyValueStore, PolicyReport, Result,
};

/// Multi-line summary of session, lockout and password age
pub fn render_status<S, C>(service: &AuthService<S, C>) -> Result<String>
where
    S: KeyValueStore + Clone,
    C: Clock + Clone,
{
    let lockout = service.lockout_status()?;
    let age_days = service.password_age_days()?;
    let changed = service.password_last_changed()?;

    let mut out = String::new();
    let _ = writeln!(out, "Session:          {:?}", service.state());
    let _ = writeln!(
        out,
        "Failed attempts:  {}/{}",
        lockout.failed_attempts, lockout.max_attempts
    );
    match service.last_failed_attempt()? {
        Some(at) => {
            let _ = writeln!(out, "Last failure:     {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        None => {
            let _ = writeln!(out, "Last failure:     never");
        }
    }
    if lockout.locked {
        let _ = writeln!(
            out,
            "Lockout:          LOCKED ({} remaining)",
            describe_secs(lockout.remaining_secs)
        );
    } else {
        let _ = writeln!(out, "Lockout:          open");
    }
    let _ = writeln!(
        out,
        "Password changed: {} ({} days ago)",
        changed.format("%Y-%m-%d"),
        age_days
    );
    if service.password_expired()? {
        let _ = writeln!(
            out,
            "                  password is past the recommended age; consider changing it"
        );
    }

    Ok(out)
}

/// Policy result as a checklist
pub fn render_policy(report: &PolicyReport) -> String {
    if report.is_valid() {
        return "Password meets all requirements.\n".to_string();
    }

    let mut out = String::from("Password does not meet the requirements:\n");
    for error in report.errors() {
        let _ = writeln!(out, "  - {}", error);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{policy, AuthConfig, ManualClock, MemoryStore};
    use std::sync::Arc;

    #[test]
    fn test_status_mentions_lockout() {
        let config = AuthConfig {
            default_password: "Default!Pass1".into(),
            ..Default::default()
        };
        let mut service = AuthService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::starting_now()),
            &config,
        )
        .unwrap();

        let text = render_status(&service).unwrap();
        assert!(text.contains("Failed attempts:  0/5"));
        assert!(text.contains("Lockout:          open"));
        assert!(text.contains("Last failure:     never"));

        for _ in 0..5 {
            service.login("wrong").unwrap();
        }
        let text = render_status(&service).unwrap();
        assert!(text.contains("LOCKED (15 minutes remaining)"));
    }

    #[test]
    fn test_render_policy() {
        assert_eq!(
            render_policy(&policy::validate("Str0ng!Passw0rd")),
            "Password meets all requirements.\n"
        );
        let text = render_policy(&policy::validate("short"));
        assert_eq!(text.lines().count(), 5);
    }
}
