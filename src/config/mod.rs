/// Loading of the Discord token from its credential file.
pub mod credentials;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use poise::serenity_prelude::{ActivityData, ChannelId, GatewayIntents, RoleId};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable pointing at the configuration file.
pub const CONFIG_ENV: &str = "CROUSTY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Discord refuses channel names longer than this.
const MAX_CHANNEL_NAME: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read the configuration file {path}: {source}")]
    Unreadable { path: String, source: io::Error },
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] toml::de::Error),
    #[error("Neither [announcer] nor [organizer] is configured, the bot would have nothing to do")]
    NoBotEnabled,
    #[error("The command prefix cannot be empty")]
    EmptyPrefix,
    #[error("The presence name cannot be empty")]
    EmptyPresence,
    #[error("The streaming presence needs an http(s) url, got `{0}`")]
    InvalidStreamUrl(String),
    #[error("The {0} status label must be between 1 and 100 characters")]
    InvalidStatusLabel(&'static str),
}

/// Everything a bot process needs to know about the guild it serves.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// File holding the `TOKEN=<value>` line.
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    /// Prefix of text commands.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    pub presence: Presence,
    /// Enables `ping`, `newtournament` and the join button.
    pub announcer: Option<AnnouncerSettings>,
    /// Enables `create_tournament` and its countdowns.
    pub organizer: Option<OrganizerSettings>,
    pub status: Option<StatusSettings>,
    pub welcome: Option<WelcomeSettings>,
    pub log: Option<LogSettings>,
}

fn default_token_file() -> PathBuf {
    PathBuf::from("bot-token.txt")
}

fn default_prefix() -> String {
    "pjt!".to_string()
}

/// The activity shown under the bot's name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Presence {
    Playing { name: String },
    Streaming { name: String, url: String },
}

impl Presence {
    pub fn name(&self) -> &str {
        match self {
            Self::Playing { name } | Self::Streaming { name, .. } => name,
        }
    }

    /// Falls back to "playing" when the platform rejects the stream url.
    pub fn activity(&self) -> ActivityData {
        match self {
            Self::Playing { name } => ActivityData::playing(name),
            Self::Streaming { name, url } => ActivityData::streaming(name, url.as_str())
                .unwrap_or_else(|_| ActivityData::playing(name)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnouncerSettings {
    /// Linked from every tournament post.
    pub ruleset_channel: ChannelId,
    /// Category that receives ticket channels.
    pub ticket_category: ChannelId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrganizerSettings {
    /// Members with this role may create tournaments without being administrators.
    pub organizer_role: RoleId,
    /// Mentioned when a tournament is announced.
    pub ping_role: RoleId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusSettings {
    /// Renamed whenever the bot connects or disconnects.
    pub channel: ChannelId,
    pub online_label: String,
    pub offline_label: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WelcomeSettings {
    pub channel: ChannelId,
    /// Given to every new member.
    pub role: RoleId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    pub channel: ChannelId,
}

impl Config {
    /// The configuration file named by `CROUSTY_CONFIG`, or `config.toml`.
    pub fn path_from_env() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        contents.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.announcer.is_none() && self.organizer.is_none() {
            return Err(ConfigError::NoBotEnabled);
        }
        if self.prefix.trim().is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.presence.name().trim().is_empty() {
            return Err(ConfigError::EmptyPresence);
        }
        if let Presence::Streaming { url, .. } = &self.presence {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::InvalidStreamUrl(url.clone()));
            }
        }
        if let Some(status) = &self.status {
            let valid = |label: &str| {
                !label.trim().is_empty() && label.chars().count() <= MAX_CHANNEL_NAME
            };
            if !valid(&status.online_label) {
                return Err(ConfigError::InvalidStatusLabel("online"));
            }
            if !valid(&status.offline_label) {
                return Err(ConfigError::InvalidStatusLabel("offline"));
            }
        }
        Ok(())
    }

    /// Gateway intents needed by the enabled features.
    pub fn intents(&self) -> GatewayIntents {
        let mut intents = GatewayIntents::non_privileged();
        if self.announcer.is_some() {
            intents |= GatewayIntents::MESSAGE_CONTENT;
        }
        if self.welcome.is_some() {
            intents |= GatewayIntents::GUILD_MEMBERS;
        }
        intents
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    /// Parses and validates a TOML configuration.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        prefix = "pjt!"

        [presence]
        kind = "streaming"
        name = "Tournaments"
        url = "https://twitch.tv/crousty"

        [announcer]
        ruleset_channel = 1384999264031084565
        ticket_category = 1384154642166059088

        [organizer]
        organizer_role = 3
        ping_role = 4

        [status]
        channel = 5
        online_label = "🟢 bot-online"
        offline_label = "🔴 bot-offline"

        [welcome]
        channel = 6
        role = 7

        [log]
        channel = 8
    "#;

    const ANNOUNCER_ONLY: &str = r#"
        [presence]
        kind = "playing"
        name = "Préparation des tournois..."

        [announcer]
        ruleset_channel = 1
        ticket_category = 2
    "#;

    #[test]
    fn parses_a_full_configuration() {
        let config: Config = FULL.parse().unwrap();

        assert_eq!(config.token_file, PathBuf::from("bot-token.txt"));
        assert_eq!(
            config.announcer.unwrap().ruleset_channel,
            ChannelId::new(1384999264031084565)
        );
        assert_eq!(config.organizer.unwrap().ping_role, RoleId::new(4));
        assert_eq!(config.status.unwrap().offline_label, "🔴 bot-offline");
        assert_eq!(config.welcome.unwrap().role, RoleId::new(7));
        assert_eq!(config.log.unwrap().channel, ChannelId::new(8));
        assert_eq!(
            config.presence,
            Presence::Streaming {
                name: "Tournaments".to_string(),
                url: "https://twitch.tv/crousty".to_string()
            }
        );
    }

    #[test]
    fn optional_sections_default_to_disabled() {
        let config: Config = ANNOUNCER_ONLY.parse().unwrap();

        assert_eq!(config.prefix, "pjt!");
        assert!(config.organizer.is_none());
        assert!(config.status.is_none());
        assert!(config.welcome.is_none());
        assert!(config.log.is_none());
    }

    #[test]
    fn intents_follow_enabled_features() {
        let full: Config = FULL.parse().unwrap();
        assert!(full.intents().contains(GatewayIntents::MESSAGE_CONTENT));
        assert!(full.intents().contains(GatewayIntents::GUILD_MEMBERS));

        let announcer: Config = ANNOUNCER_ONLY.parse().unwrap();
        assert!(announcer.intents().contains(GatewayIntents::MESSAGE_CONTENT));
        assert!(!announcer.intents().contains(GatewayIntents::GUILD_MEMBERS));
    }

    #[test]
    fn a_bot_must_be_enabled() {
        let error = r#"
            [presence]
            kind = "playing"
            name = "Idle"
        "#
        .parse::<Config>()
        .unwrap_err();

        assert!(matches!(error, ConfigError::NoBotEnabled));
    }

    #[test]
    fn rejects_invalid_values() {
        let streaming = ANNOUNCER_ONLY.replace(
            "kind = \"playing\"",
            "kind = \"streaming\"\nurl = \"twitch.tv/crousty\"",
        );
        assert!(matches!(
            streaming.parse::<Config>(),
            Err(ConfigError::InvalidStreamUrl(_))
        ));

        let empty_prefix = format!("prefix = \" \"\n{}", ANNOUNCER_ONLY);
        assert!(matches!(
            empty_prefix.parse::<Config>(),
            Err(ConfigError::EmptyPrefix)
        ));

        let blank_label = format!(
            "{}\n[status]\nchannel = 5\nonline_label = \"\"\noffline_label = \"off\"\n",
            ANNOUNCER_ONLY
        );
        assert!(matches!(
            blank_label.parse::<Config>(),
            Err(ConfigError::InvalidStatusLabel("online"))
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        let typo = ANNOUNCER_ONLY.replace("ruleset_channel", "rulesets_channel");
        assert!(matches!(typo.parse::<Config>(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            Config::load("this/file/does/not/exist.toml"),
            Err(ConfigError::Unreadable { .. })
        ));
    }
}
