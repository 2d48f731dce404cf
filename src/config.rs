//! Connection contexts stored in `~/.config/dashsync/config.toml`
//!
//! ```toml
//! current-context = "prod"
//!
//! [contexts.prod]
//! server = "https://grafana.example.com"
//! token = "glsa_..."
//! org-id = 1
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("dashsync"))
}

/// Config file location: the explicit path (tilde-expanded) or the default
pub fn config_path(explicit: Option<&str>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(PathBuf::from(shellexpand::tilde(path).as_ref())),
        None => Ok(config_dir()?.join("config.toml")),
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
    #[serde(default)]
    pub contexts: BTreeMap<String, ContextConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContextConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ContextConfig {
    /// Namespace for generic objects: explicit, then stack, then org
    pub fn namespace(&self) -> String {
        if let Some(ns) = self.namespace.as_deref().filter(|ns| !ns.trim().is_empty()) {
            return ns.trim().to_string();
        }
        if let Some(stack) = self.stack_id {
            return format!("stacks-{stack}");
        }
        match self.org_id {
            None | Some(1) => "default".to_string(),
            Some(org) => format!("org-{org}"),
        }
    }

    /// Merge the fields set in `other` over this context
    pub fn merge(&mut self, other: ContextConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.org_id.is_some() {
            self.org_id = other.org_id;
        }
        if other.stack_id.is_some() {
            self.stack_id = other.stack_id;
        }
        if other.namespace.is_some() {
            self.namespace = other.namespace;
        }
    }
}

/// Command-line and environment overrides
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub context: Option<String>,
    pub server: Option<String>,
    pub token: Option<String>,
}

impl Config {
    /// Load the config file; a missing file is an empty config
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e).with_context(|| format!("Could not read {}", path.display())),
        };
        toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Save the config file, creating its directory
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Could not encode config")?;
        fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))
    }

    /// The effective context: the selected one with overrides applied.
    ///
    /// Naming a context that doesn't exist is an error; having no context at
    /// all is fine as long as overrides supply a server.
    pub fn resolve(&self, overrides: &Overrides) -> Result<(String, ContextConfig)> {
        let name = overrides
            .context
            .clone()
            .or_else(|| self.current_context.clone())
            .unwrap_or_else(|| "default".to_string());

        let mut ctx = match self.contexts.get(&name) {
            Some(ctx) => ctx.clone(),
            None if overrides.context.is_some() => bail!("Unknown context '{name}'"),
            None => ContextConfig::default(),
        };

        ctx.merge(ContextConfig {
            server: overrides.server.clone(),
            token: overrides.token.clone(),
            ..ContextConfig::default()
        });
        Ok((name, ctx))
    }

    /// Copy suitable for display, with tokens redacted
    pub fn redacted(&self) -> Self {
        let contexts = self
            .contexts
            .iter()
            .map(|(name, ctx)| {
                let mut ctx = ctx.clone();
                if ctx.token.is_some() {
                    ctx.token = Some("**REDACTED**".to_string());
                }
                (name.clone(), ctx)
            })
            .collect();
        Self {
            current_context: self.current_context.clone(),
            contexts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_resolution() {
        let mut ctx = ContextConfig::default();
        assert_eq!(ctx.namespace(), "default");
        ctx.org_id = Some(1);
        assert_eq!(ctx.namespace(), "default");
        ctx.org_id = Some(3);
        assert_eq!(ctx.namespace(), "org-3");
        ctx.stack_id = Some(1234);
        assert_eq!(ctx.namespace(), "stacks-1234");
        ctx.namespace = Some("custom".into());
        assert_eq!(ctx.namespace(), "custom");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert!(config.contexts.is_empty());
        assert!(config.current_context.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub/config.toml");
        let mut config = Config::default();
        config.current_context = Some("prod".into());
        config.contexts.insert(
            "prod".into(),
            ContextConfig {
                server: Some("https://grafana.example.com".into()),
                org_id: Some(2),
                ..ContextConfig::default()
            },
        );
        config.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("current-context = \"prod\""));
        assert!(content.contains("org-id = 2"));

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.contexts["prod"], config.contexts["prod"]);
    }

    #[test]
    fn test_resolve_with_overrides() {
        let mut config = Config::default();
        config.current_context = Some("prod".into());
        config.contexts.insert(
            "prod".into(),
            ContextConfig {
                server: Some("https://prod".into()),
                token: Some("secret".into()),
                ..ContextConfig::default()
            },
        );

        let (name, ctx) = config.resolve(&Overrides::default()).unwrap();
        assert_eq!(name, "prod");
        assert_eq!(ctx.server.as_deref(), Some("https://prod"));

        let overrides = Overrides {
            server: Some("http://localhost:3000".into()),
            ..Overrides::default()
        };
        let (_, ctx) = config.resolve(&overrides).unwrap();
        assert_eq!(ctx.server.as_deref(), Some("http://localhost:3000"));
        assert_eq!(ctx.token.as_deref(), Some("secret"));

        let unknown = Overrides {
            context: Some("staging".into()),
            ..Overrides::default()
        };
        assert!(config.resolve(&unknown).is_err());
    }

    #[test]
    fn test_redacted() {
        let mut config = Config::default();
        config.contexts.insert(
            "a".into(),
            ContextConfig {
                token: Some("secret".into()),
                ..ContextConfig::default()
            },
        );
        let shown = config.redacted();
        assert_eq!(shown.contexts["a"].token.as_deref(), Some("**REDACTED**"));
    }

    #[test]
    fn test_config_path_expands_tilde() {
        if dirs::home_dir().is_none() {
            return;
        }
        let path = config_path(Some("~/dashsync.toml")).unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with("dashsync.toml"));
    }
}
