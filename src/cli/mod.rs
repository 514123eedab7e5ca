// CLI module for doccache-chat
// Author: kelexine (https://github.com/kelexine)

use crate::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

/// doccache-chat - Browser chat over a Gemini context-cached document
#[derive(Parser, Debug, Default)]
#[command(name = "doccache-chat", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (default: ~/.doccache-chat/config.toml)
    #[arg(short, long, env = "DOCCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Document to upload and cache
    #[arg(short, long)]
    pub document: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the HTTP server to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Cache lifetime in seconds
    #[arg(long)]
    pub ttl: Option<u64>,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(document) = &self.document {
            config.document.path = document.to_string_lossy().to_string();
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ttl) = self.ttl {
            config.document.ttl_seconds = ttl;
        }
    }
}
