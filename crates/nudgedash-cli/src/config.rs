// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use nudgedash_app::{DEFAULT_REFRESH_INTERVAL, NavigationState, TableBoard};
use nudgedash_client::DEFAULT_ENDPOINT;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "nudgedash";
const CONFIG_VERSION: i64 = 1;
const CONFIG_PATH_ENV: &str = "NUDGEDASH_CONFIG_PATH";
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_INTERVAL: &str = "30s";
const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
    #[serde(default = "default_tables")]
    pub tables: Vec<TableDecl>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            source: Source::default(),
            ui: Ui::default(),
            log: Log::default(),
            tables: default_tables(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    pub endpoint: Option<String>,
    pub interval: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            endpoint: Some(DEFAULT_ENDPOINT.to_owned()),
            interval: Some(DEFAULT_INTERVAL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub second_locked: Option<bool>,
    pub second_label: Option<String>,
    pub bottom: Option<bool>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            second_locked: Some(true),
            second_label: Some("2".to_owned()),
            bottom: Some(false),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableDecl {
    pub id: String,
    pub step: usize,
}

fn default_tables() -> Vec<TableDecl> {
    [
        ("Github_Repository", 0),
        ("Github_Pull_Request", 1),
        ("Github_Issue", 2),
    ]
    .into_iter()
    .map(|(id, step)| TableDecl {
        id: id.to_owned(),
        step,
    })
    .collect()
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` at the top",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(endpoint) = &self.source.endpoint {
            nudgedash_client::parse_endpoint(endpoint)
                .with_context(|| format!("source.endpoint in {}", path.display()))?;
        }

        for (key, raw) in [
            ("source.interval", &self.source.interval),
            ("source.timeout", &self.source.timeout),
        ] {
            if let Some(raw) = raw {
                let parsed = parse_duration(raw)?;
                if parsed <= Duration::ZERO {
                    bail!("{key} in {} must be positive, got {raw}", path.display());
                }
                if parsed > MAX_DURATION {
                    bail!("{key} in {} must be at most 24h, got {raw}", path.display());
                }
            }
        }

        if let Some(label) = &self.ui.second_label
            && label.trim().is_empty()
        {
            bail!("ui.second_label in {} must not be empty", path.display());
        }

        self.board()
            .with_context(|| format!("invalid [[tables]] in {}", path.display()))?;
        Ok(())
    }

    pub fn endpoint(&self) -> &str {
        self.source.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn refresh_interval(&self) -> Result<Duration> {
        match &self.source.interval {
            Some(raw) => parse_duration(raw),
            None => Ok(DEFAULT_REFRESH_INTERVAL),
        }
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.source.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn navigation(&self) -> NavigationState {
        NavigationState::new(
            self.ui.second_locked.unwrap_or(true),
            self.ui.second_label.as_deref().unwrap_or("2"),
            self.ui.bottom.unwrap_or(false),
        )
    }

    pub fn board(&self) -> Result<TableBoard> {
        let mut board = TableBoard::new();
        for table in &self.tables {
            board.declare(&table.id, table.step)?;
        }
        Ok(board)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }
        let data_root = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("cannot resolve data directory; set [log].path"))?;
        Ok(data_root.join(APP_NAME).join(format!("{APP_NAME}.log")))
    }

    pub fn example_config(path: &Path) -> String {
        let mut out = format!(
            "# nudgedash config\n# Place this file at: {}\n\nversion = 1\n\n[source]\nendpoint = \"{}\"\ninterval = \"{}\"\ntimeout = \"{}\"\n\n[ui]\nsecond_locked = true\nsecond_label = \"2\"\n# Show the step tabs below the tables.\nbottom = false\n\n[log]\n# Optional. Default is the platform data dir (for example ~/.local/share/nudgedash/nudgedash.log)\n# path = \"/absolute/path/to/nudgedash.log\"\n",
            path.display(),
            DEFAULT_ENDPOINT,
            DEFAULT_INTERVAL,
            DEFAULT_TIMEOUT,
        );
        out.push_str("\n# One entry per dataset; id is the dataset name with spaces replaced by `_`.\n");
        for table in default_tables() {
            out.push_str(&format!(
                "\n[[tables]]\nid = \"{}\"\nstep = {}\n",
                table.id, table.step
            ));
        }
        out
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 30s)")
}
