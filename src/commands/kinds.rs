//! `dashsync kinds` - list the resource kinds available on the server

use anyhow::Result;
use colored::Colorize;

use super::Session;
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let backend = session.connect()?;
    let registry = session.registry(&backend)?;

    ui::header(&format!("Resource kinds ({})", registry.len()));
    for desc in registry.descriptors() {
        let note = if desc.is_synthetic() {
            " (provisioning API)".dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<28} {:<24} {}{note}",
            desc.plural.bold(),
            desc.singular,
            desc.kind.to_string().dimmed()
        );
    }
    Ok(())
}
