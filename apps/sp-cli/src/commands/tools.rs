// tools.rs — Print the governed tool catalog.

use sp_tools::{sanitize_tool_name, ToolCatalog};

pub fn run() -> anyhow::Result<()> {
    let catalog = ToolCatalog::new();

    println!(
        "{:<36} {:<34} {:>8} {:>8}",
        "TOOL", "LLM NAME", "TIMEOUT", "PER MIN"
    );
    for descriptor in catalog.iter() {
        let timeout = descriptor
            .timeout
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "--".to_string());
        println!(
            "{:<36} {:<34} {:>8} {:>8}",
            descriptor.name,
            sanitize_tool_name(descriptor.name),
            timeout,
            descriptor.rate_limit_per_minute,
        );
    }
    Ok(())
}
