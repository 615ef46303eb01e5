use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Type text, hear it spoken
#[derive(Debug, Parser)]
#[command(name = "saythis", version, about = "Text-to-speech through ElevenLabs, Google Cloud and IBM Watson")]
pub struct Args {
    /// Directory holding config.json and the generated audio
    #[arg(long, global = true, env = "SAYTHIS_HOME")]
    pub data_dir: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `tts=debug`
    #[arg(long, global = true, default_value = "warn", env = "SAYTHIS_LOG")]
    pub log: String,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Synthesize text with the selected provider
    Say {
        /// Text to speak; read from stdin when neither text nor --file is given
        text: Vec<String>,

        /// Read the text from a file
        #[arg(long, short, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Copy the generated audio to this path
        #[arg(long)]
        save_as: Option<PathBuf>,
    },

    /// Show character usage of the selected provider
    Usage,

    /// List the registered providers
    Providers,

    /// Select the provider used for synthesis
    Select {
        /// Provider name, e.g. "Google Cloud"
        name: String,
    },

    /// Inspect or edit the selected provider's settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the selected provider's settings with the credential masked
    Show,

    /// Set one setting; dotted keys reach nested values
    Set {
        /// e.g. `credential`, `voice_id`, `voice_settings.stability`
        key: String,
        /// Parsed as JSON when possible, otherwise taken as a string
        value: String,
    },

    /// Print the path of the config file
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl From<LogFormat> for saythis_telemetry::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Text => Self::Text,
            LogFormat::Json => Self::Json,
        }
    }
}
