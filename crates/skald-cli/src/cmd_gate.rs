use skald_hook::gate;

/// `skald enable` — create the opt-in marker for the current project.
pub fn enable() -> anyhow::Result<()> {
    let path = gate::write_marker("")?;
    println!("Uploads enabled ({})", path.display());
    Ok(())
}

/// `skald disable` — remove the opt-in marker if present.
pub fn disable() -> anyhow::Result<()> {
    if gate::remove_marker("")? {
        println!("Uploads disabled");
    } else {
        println!("Uploads were not enabled");
    }
    Ok(())
}
