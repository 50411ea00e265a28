use anyhow::Context;
use routine_core::config;
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing routine in: {}", root.display());
    let created = config::init_project(root)
        .with_context(|| format!("failed to initialize {}", root.display()))?;
    if created {
        println!("  created: .routine/config.yaml");
    } else {
        println!("  exists:  .routine/config.yaml");
    }
    println!("\nNext: routine goal set --title \"<your goal>\"");
    Ok(())
}
