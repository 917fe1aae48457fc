use std::str::FromStr;

use poise::serenity_prelude::{ChannelId, Colour, CreateEmbed, CreateEmbedFooter, Mentionable};
use thiserror::Error;

use crate::utils::time::{Schedule, TimeParseError};

use super::Format;

const THUMBNAIL_URL: &str = "https://cdn-icons-png.flaticon.com/512/1055/1055646.png";

/// Discord refuses embed fields with an empty value.
const BLANK: &str = "\u{200b}";

pub const USAGE: &str =
    "newtournament Name/Description/Format/MaxTeams/AdditionalMessage/DD,MM,YYYY,HH:MM";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TournamentParseError {
    #[error("Invalid format. Expected 6 fields separated by `/` but got {0}.")]
    FieldCount(usize),
    #[error("Invalid format `{0}`. Choose from: {}.", Format::tokens())]
    InvalidFormat(String),
    #[error("Max teams must be an integer, got `{0}`.")]
    InvalidMaxTeams(String),
    #[error("Invalid date format. Use: `DD,MM,YYYY,HH:MM` (e.g. 06,07,2025,22:30)")]
    InvalidSchedule(#[from] TimeParseError),
}

/// A tournament described in one line, as typed after `newtournament`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentPost {
    pub title: String,
    pub description: String,
    pub format: Format,
    /// Digits only, shown as typed.
    pub max_teams: String,
    pub note: String,
    pub schedule: Schedule,
}

impl FromStr for TournamentPost {
    type Err = TournamentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').map(str::trim).collect();
        let [title, description, format, max_teams, note, schedule] = parts[..] else {
            return Err(TournamentParseError::FieldCount(parts.len()));
        };

        let format = Format::from_token(format)
            .ok_or_else(|| TournamentParseError::InvalidFormat(format.to_string()))?;

        if max_teams.is_empty() || !max_teams.chars().all(|c| c.is_ascii_digit()) {
            return Err(TournamentParseError::InvalidMaxTeams(max_teams.to_string()));
        }

        Ok(Self {
            title: title.to_string(),
            description: description.to_string(),
            format,
            max_teams: max_teams.to_string(),
            note: note.to_string(),
            schedule: schedule.parse()?,
        })
    }
}

impl TournamentPost {
    pub fn embed(
        &self,
        ruleset_channel: ChannelId,
        organizer_name: &str,
        organizer_avatar: Option<String>,
    ) -> CreateEmbed {
        let mut footer = CreateEmbedFooter::new(format!("Organized by {}", organizer_name));
        if let Some(avatar) = organizer_avatar {
            footer = footer.icon_url(avatar);
        }
        let note = if self.note.is_empty() {
            BLANK.to_string()
        } else {
            self.note.clone()
        };

        CreateEmbed::new()
            .title(format!("Tournament: {}", self.title))
            .description(format!("> {}", self.description))
            .color(Colour::TEAL)
            .fields(vec![
                ("🧩 Format", self.format.to_string(), true),
                ("👥 Max Teams", self.max_teams.clone(), true),
                ("📜 Ruleset", ruleset_channel.mention().to_string(), true),
                ("📅 Schedule", self.schedule.to_discord_full(), true),
                (BLANK, note, false),
            ])
            .thumbnail(THUMBNAIL_URL)
            .footer(footer)
    }
}
