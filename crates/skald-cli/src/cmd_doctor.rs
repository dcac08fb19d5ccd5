use std::time::Duration;

use skald_hook::{gate, hooklog, DispatchConfig};
use skald_store::StoreConfig;

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// `skald doctor` — report the state of both halves of the relay as seen
/// from this machine. Read-only; errs on the side of telling the user what
/// each finding means for them.
pub fn execute() -> anyhow::Result<()> {
    let mut problems = 0usize;

    println!("hook:");
    match DispatchConfig::from_env() {
        Some(api) => {
            println!("  SKALD_API_URL: {}", api.url);
            println!(
                "  SKALD_API_KEY: {}",
                if api.api_key.is_some() { "set" } else { "not set" }
            );
            match probe_health(&api.url) {
                Some(Ok(())) => println!("  endpoint health: ok"),
                Some(Err(e)) => {
                    println!("  endpoint health: unreachable ({e})");
                    problems += 1;
                }
                None => println!("  endpoint health: skipped (URL has no /api/transcripts suffix)"),
            }
        }
        None => {
            println!("  SKALD_API_URL: not set — hook invocations will upload nothing");
            problems += 1;
        }
    }
    let marker = gate::marker_path("");
    if marker.exists() {
        println!("  upload marker: present ({})", marker.display());
    } else {
        println!(
            "  upload marker: absent ({}) — run `skald enable` to opt this project in",
            marker.display()
        );
    }
    println!("  hook log: {}", hooklog::log_path().display());

    println!("server:");
    match StoreConfig::from_env() {
        Ok(StoreConfig::Sqlite {
            db_path,
            collection,
        }) => println!(
            "  store: sqlite ({}, collection {collection})",
            db_path.display()
        ),
        Ok(StoreConfig::Blob { root, bucket }) => {
            println!("  store: blob ({}, bucket {bucket})", root.display())
        }
        Err(e) => {
            println!("  store: not configured ({e}) — only needed where `skald serve` runs");
        }
    }
    println!(
        "  SKALD_SHARED_SECRET: {}",
        if std::env::var("SKALD_SHARED_SECRET")
            .map(|s| !s.is_empty())
            .unwrap_or(false)
        {
            "set"
        } else {
            "not set (endpoint accepts unauthenticated uploads)"
        }
    );

    // Informational only: findings are for the human, not an exit code.
    if problems > 0 {
        println!("{problems} problem(s) found");
    } else {
        println!("ok");
    }
    Ok(())
}

/// GET the health route next to the configured ingest URL.
fn probe_health(api_url: &str) -> Option<Result<(), String>> {
    let base = api_url.strip_suffix("/api/transcripts")?;
    let health_url = format!("{base}/api/health");
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(HEALTH_PROBE_TIMEOUT))
        .build()
        .new_agent();
    Some(match agent.get(&health_url).call() {
        Ok(_) => Ok(()),
        Err(e) => Err(e.to_string()),
    })
}
