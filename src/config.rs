use anyhow::{anyhow, bail, Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, env, fs, path::Path};

use crate::classifier::CategoryRule;
use crate::scheduler::SummaryOffset;

pub const CONFIG_PATH_VAR: &str = "POINTWATCH_CONFIG";
/// Upper bound for the `getUpdates` long-poll timeout.
pub const MAX_POLL_TIMEOUT_SECS: u64 = 300;

/// Process configuration, loaded once and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bot_token: String,
    /// Chat that is watched and that receives every report.
    pub chat_id: Option<i64>,
    /// Username whose messages are counted, without the leading `@`.
    pub target_sender: String,
    /// Full category set, in matching order.
    pub categories: Vec<CategoryRule>,
    pub summary_at: SummaryOffset,
    /// Offset applied to times shown in reports. Bucket keys stay UTC.
    pub display_utc_offset_minutes: i32,
    pub poll_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: None,
            target_sender: "MyCAEVC_bot".into(),
            categories: vec![
                CategoryRule::new("P1", ["P1 "]),
                CategoryRule::new("P2", ["P2 "]),
                CategoryRule::new("P3", ["P3 "]),
                CategoryRule::new("P4", ["P4 "]),
            ],
            summary_at: SummaryOffset::default(),
            display_utc_offset_minutes: 0,
            poll_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Optional JSON file from `POINTWATCH_CONFIG`, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("BOT_TOKEN") {
            self.bot_token = token;
        }
        if let Some(chat) = lookup("CHAT_ID") {
            let id = chat
                .trim()
                .parse::<i64>()
                .with_context(|| format!("CHAT_ID must be an integer, got {chat:?}"))?;
            self.chat_id = Some(id);
        }
        if let Some(sender) = lookup("TARGET_BOT_USERNAME") {
            self.target_sender = sender;
        }
        if let Some(at) = lookup("SUMMARY_AT") {
            self.summary_at = at.parse()?;
        }
        if let Some(offset) = lookup("DISPLAY_UTC_OFFSET_MINUTES") {
            self.display_utc_offset_minutes = offset.trim().parse().with_context(|| {
                format!("DISPLAY_UTC_OFFSET_MINUTES must be an integer, got {offset:?}")
            })?;
        }
        self.target_sender = self.target_sender.trim_start_matches('@').to_string();
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            bail!("BOT_TOKEN is required");
        }
        if self.chat_id.is_none() {
            bail!("CHAT_ID is required");
        }
        if self.target_sender.trim().is_empty() {
            bail!("target sender must not be empty");
        }
        if self.categories.is_empty() {
            bail!("at least one category must be configured");
        }

        let mut seen = HashSet::new();
        for rule in &self.categories {
            let label = rule.category.label();
            if label.trim().is_empty() {
                bail!("category labels must not be empty");
            }
            if !seen.insert(label) {
                bail!("duplicate category {label}");
            }
            if rule.patterns.is_empty() {
                bail!("category {label} has no patterns");
            }
            if rule.patterns.iter().any(String::is_empty) {
                bail!("category {label} has an empty pattern");
            }
        }

        if self.poll_timeout_secs > MAX_POLL_TIMEOUT_SECS {
            bail!(
                "poll timeout of {}s exceeds {MAX_POLL_TIMEOUT_SECS}s",
                self.poll_timeout_secs
            );
        }

        self.summary_at.validate()?;
        self.display_offset()?;
        Ok(())
    }

    pub fn chat_id(&self) -> Result<i64> {
        self.chat_id.ok_or_else(|| anyhow!("CHAT_ID is required"))
    }

    pub fn display_offset(&self) -> Result<FixedOffset> {
        self.display_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                anyhow!(
                    "display offset of {} minutes is out of range",
                    self.display_utc_offset_minutes
                )
            })
    }
}
