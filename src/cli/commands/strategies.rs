//! List strategies command.

use anyhow::Result;
use trading_strategies::StrategyRegistry;

pub async fn run() -> Result<()> {
    let registry = StrategyRegistry::new();

    println!("Available Strategies");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for metadata in registry.list() {
        println!("  {}", metadata.name);
        println!("  ───────────────────────────────────────────────────────");
        for parameter in &metadata.parameters {
            println!(
                "    {} ({}{}) - {}",
                parameter.name,
                parameter.type_tag,
                if parameter.required { ", required" } else { "" },
                parameter.description
            );
        }
        println!();
        for step in &metadata.flow {
            println!("    {step}");
        }
        println!();
    }

    println!("Start one with POST /api/strategies/start {{\"kind\": \"<name>\", ...}}");

    Ok(())
}
