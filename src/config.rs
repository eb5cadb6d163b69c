//! Configuração carregada a partir de `minerva.toml`.
//!
//! Valores ausentes no arquivo usam defaults. As variáveis de ambiente
//! `MINERVA_API_URL` e `MINERVA_API_KEY` têm precedência sobre o arquivo.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "minerva.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// URL base do backend de agendamentos. Vazio usa o calendário em memória.
    #[serde(default)]
    pub api_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Tempo máximo de uma chamada de agendamento.
    #[serde(default = "default_booking_timeout_ms")]
    pub booking_timeout_ms: u64,

    /// Sequência usada no código das OS criadas pela CLI.
    #[serde(default = "default_sequence_start")]
    pub sequence_start: u32,
}

fn default_booking_timeout_ms() -> u64 {
    15_000
}

fn default_sequence_start() -> u32 {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            booking_timeout_ms: default_booking_timeout_ms(),
            sequence_start: default_sequence_start(),
        }
    }
}

impl AppConfig {
    /// Carrega `minerva.toml` do diretório atual, ou os defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str::<AppConfig>(&contents)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("MINERVA_API_URL")
            && !url.is_empty()
        {
            self.api_url = url;
        }
        if let Some(key) = var("MINERVA_API_KEY")
            && !key.is_empty()
        {
            self.api_key = key;
        }
    }

    pub fn booking_timeout(&self) -> Duration {
        Duration::from_millis(self.booking_timeout_ms)
    }

    /// Há backend remoto configurado?
    pub fn has_remote(&self) -> bool {
        !self.api_url.is_empty() && !self.api_key.is_empty()
    }
}
