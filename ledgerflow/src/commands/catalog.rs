// ledgerflow/src/commands/catalog.rs
//
// USE CASE: Show the entity catalog as the bronze layer will see it.

use comfy_table::{Table, presets::UTF8_FULL};
use std::path::{Path, PathBuf};

use ledgerflow_core::domain::catalog::{CatalogIssue, EntityCatalog};

pub fn execute(project_dir: PathBuf, check: bool) -> anyhow::Result<()> {
    let config = super::load_config(&project_dir)?;
    let sources = &config.sources;

    let (catalog, mut report) = EntityCatalog::build(&sources.entities, &sources.conventions)?;
    report.issues.extend(catalog.check_presence(&project_dir));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Entity", "Database", "Budget"]);
    for entity in catalog.entities() {
        table.add_row(vec![
            entity.code.to_string(),
            presence(&project_dir, &entity.database),
            presence(&project_dir, &entity.budget),
        ]);
    }
    println!("\n📒 Entity catalog ({} entities)", catalog.len());
    println!("{table}");

    for issue in &report.issues {
        let marker = if issue.is_fatal(sources.strict) { "❌" } else { "⚠️ " };
        println!("   {} {}", marker, issue);
    }

    let fatal: Vec<&CatalogIssue> = report.fatal(sources.strict).collect();
    if fatal.is_empty() {
        println!("✅ Catalog is valid.");
    } else if check {
        eprintln!("\n❌ {} fatal catalog issue(s).", fatal.len());
        std::process::exit(1);
    } else {
        println!("\n⚠️  {} fatal catalog issue(s). Bronze will refuse to run.", fatal.len());
    }
    Ok(())
}

fn presence(project_dir: &Path, relative: &Path) -> String {
    let mark = if project_dir.join(relative).exists() { "✅" } else { "❌" };
    format!("{} {}", mark, relative.display())
}
