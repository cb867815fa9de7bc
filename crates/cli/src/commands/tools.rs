//! `toolweave tools` — List the registered tools.

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let registry = toolweave_tools::default_registry()?;

    println!();
    for def in registry.definitions() {
        let marker = if registry.is_terminal(&def.name) {
            " (terminal)"
        } else {
            ""
        };
        println!("  {}{}", def.name, marker);
        println!("    {}", def.description);
    }
    println!();

    Ok(())
}
