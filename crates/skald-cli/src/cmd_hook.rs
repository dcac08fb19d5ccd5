use std::io::Read;

/// `skald hook` — invoked by the host tool on its hook events.
///
/// Always exits 0: any failure here would surface inside someone's coding
/// session, and losing one upload is cheaper than that. Diagnostics go to
/// the hook log, never to the host's stdout/stderr.
pub fn execute() -> anyhow::Result<()> {
    let mut stdin_buf = String::new();
    if std::io::stdin().read_to_string(&mut stdin_buf).is_err() {
        return Ok(());
    }

    let _ = skald_hook::run_hook_from_stdin(&stdin_buf);
    Ok(())
}
