use anyhow::{Result, bail};

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::{Config, ContextConfig, config_path};
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    let path = config_path(ctx.config_path.as_deref())?;

    match cmd {
        ConfigCommand::View => {
            let config = Config::load(&path)?;
            print!("{}", toml::to_string_pretty(&config.redacted())?);
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommand::UseContext { name } => {
            let mut config = Config::load(&path)?;
            if !config.contexts.contains_key(&name) {
                bail!("Unknown context '{name}'");
            }
            config.current_context = Some(name.clone());
            config.save(&path)?;
            ui::success(&format!("Switched to context '{name}'"));
            Ok(())
        }
        ConfigCommand::SetContext {
            name,
            server,
            token,
            org_id,
            stack_id,
            namespace,
        } => {
            let mut config = Config::load(&path)?;
            let created = !config.contexts.contains_key(&name);
            config.contexts.entry(name.clone()).or_default().merge(ContextConfig {
                server,
                token,
                org_id,
                stack_id,
                namespace,
            });
            if config.current_context.is_none() {
                config.current_context = Some(name.clone());
            }
            config.save(&path)?;

            let verb = if created { "Created" } else { "Updated" };
            ui::success(&format!("{verb} context '{name}'"));
            ui::kv("config", &path.display().to_string());
            Ok(())
        }
    }
}
