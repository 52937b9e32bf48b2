use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use stamina::{
    config::{Config, KNOWN_KEYS, Settings},
    types::{OutputFmt, best_suggestion, emit},
};

use crate::cli::ConfigCmd;

pub fn handle(cmd: ConfigCmd, mut cfg: Config, config_path: &Path, fmt: OutputFmt) -> Result<()> {
    match cmd {
        ConfigCmd::List => emit(fmt, &cfg.map, || {
            if cfg.map.is_empty() {
                println!("{}", "(no config set)".dimmed());
            } else {
                println!("{}", "Config:".cyan().bold());
                for (k, v) in &cfg.map {
                    println!("  {} = {}", k.green(), v);
                }
            }
        }),

        ConfigCmd::Get { key } => match cfg.map.get(&key) {
            Some(val) => println!("{}", val),
            None => println!("{} key `{}` not found", "warning:".yellow().bold(), key),
        },

        ConfigCmd::Set { key, val } => {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                let known: Vec<String> = KNOWN_KEYS.iter().map(|k| k.to_string()).collect();
                let hint = best_suggestion(&key, &known)
                    .map(|s| format!(" (did you mean `{}`?)", s.green()))
                    .unwrap_or_default();
                println!("{} `{}` is not a known key{}", "warning:".yellow().bold(), key, hint);
            }

            cfg.map.insert(key.clone(), val.clone());
            Settings::from_config(&cfg)?;
            cfg.save(config_path)?;
            println!("{} set `{}` = `{}`", "info:".blue().bold(), key.green(), val);
        }

        ConfigCmd::Unset { key } => {
            if cfg.map.remove(&key).is_some() {
                cfg.save(config_path)?;
                println!("{} removed `{}`", "info:".blue().bold(), key.green());
            } else {
                println!("{} key `{}` not found", "warning:".yellow().bold(), key);
            }
        }
    }

    Ok(())
}
