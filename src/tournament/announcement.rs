use std::time::Duration;

use chrono::DateTime;
use poise::serenity_prelude::{
    Colour, CreateEmbed, CreateInputText, CreateQuickModal, InputTextStyle, Mentionable, UserId,
};
use thiserror::Error;

use crate::utils::{
    colour::{parse_hex_colour, ColourParseError},
    time::format_remaining,
};

use super::Format;

/// How long the organizer has to fill in the form.
const FORM_TIMEOUT: Duration = Duration::from_secs(600);

pub const REGISTRATION_CLOSED: &str = "🔒 Registration closed";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("The form came back with {got} fields instead of {expected}.")]
    FieldCount { expected: usize, got: usize },
    #[error(transparent)]
    Colour(#[from] ColourParseError),
    #[error("Max teams must be an integer, got `{0}`.")]
    Capacity(String),
    #[error("`{0}` is not a link, the banner must start with http:// or https://")]
    Banner(String),
}

/// What the organizer typed into the tournament form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentForm {
    pub title: String,
    pub description: String,
    pub colour: Colour,
    pub banner: Option<String>,
    /// Only asked for team formats.
    pub max_teams: Option<u32>,
}

impl TournamentForm {
    /// Builds the form for `mode`. Team formats get an extra max teams field.
    pub fn modal(mode: Format, registration_ends: i64) -> CreateQuickModal {
        let closes = DateTime::from_timestamp(registration_ends, 0)
            .map(|ends| ends.format("%d/%m/%Y %H:%M UTC").to_string())
            .unwrap_or_default();

        let modal = CreateQuickModal::new(format!("New {} tournament", mode))
            .timeout(FORM_TIMEOUT)
            .field(
                CreateInputText::new(InputTextStyle::Short, "Title", "title")
                    .placeholder("Summer Cup")
                    .max_length(200),
            )
            .field(
                CreateInputText::new(InputTextStyle::Paragraph, "Description", "description")
                    .placeholder(format!("{} tournament, registration closes {}", mode, closes))
                    .max_length(2000),
            )
            .field(
                CreateInputText::new(InputTextStyle::Short, "Colour (hex)", "colour")
                    .placeholder("#ff0000")
                    .min_length(6)
                    .max_length(7),
            )
            .field(
                CreateInputText::new(InputTextStyle::Short, "Banner URL", "banner")
                    .placeholder("https://...")
                    .required(false),
            );

        if mode.is_team() {
            modal.field(
                CreateInputText::new(InputTextStyle::Short, "Max teams", "max_teams")
                    .placeholder("16")
                    .max_length(6),
            )
        } else {
            modal
        }
    }

    /// Validates the raw values returned by the form, in the order they were asked.
    pub fn from_inputs(mode: Format, inputs: &[String]) -> Result<Self, FormError> {
        let expected = if mode.is_team() { 5 } else { 4 };
        let (title, description, colour, banner, max_teams) = match inputs {
            [title, description, colour, banner] if !mode.is_team() => {
                (title, description, colour, banner, None)
            }
            [title, description, colour, banner, max_teams] if mode.is_team() => {
                (title, description, colour, banner, Some(max_teams.trim()))
            }
            _ => {
                return Err(FormError::FieldCount {
                    expected,
                    got: inputs.len(),
                })
            }
        };

        let colour = parse_hex_colour(colour)?;

        let banner = match banner.trim() {
            "" => None,
            url if url.starts_with("https://") || url.starts_with("http://") => {
                Some(url.to_string())
            }
            other => return Err(FormError::Banner(other.to_string())),
        };

        let max_teams = match max_teams {
            Some(raw) if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) => Some(
                raw.parse()
                    .map_err(|_| FormError::Capacity(raw.to_string()))?,
            ),
            Some(raw) => return Err(FormError::Capacity(raw.to_string())),
            None => None,
        };

        Ok(Self {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            colour,
            banner,
            max_teams,
        })
    }
}

/// A tournament announcement whose last embed field counts down to the registration deadline.
#[derive(Debug, Clone)]
pub struct Announcement {
    pub form: TournamentForm,
    pub mode: Format,
    pub organizer: UserId,
    /// Unix timestamp of the registration deadline.
    pub registration_ends: i64,
}

impl Announcement {
    pub fn new(form: TournamentForm, mode: Format, organizer: UserId, registration_ends: i64) -> Self {
        Self {
            form,
            mode,
            organizer,
            registration_ends,
        }
    }

    /// The registration field while registration is still open.
    pub fn countdown(&self, remaining: Duration) -> String {
        format!(
            "Closes <t:{}:F>\n⏳ {} left",
            self.registration_ends,
            format_remaining(remaining)
        )
    }

    /// Renders the embed with `registration` as its last field.
    pub fn embed(&self, registration: &str) -> CreateEmbed {
        let mut fields = vec![("🎮 Mode", self.mode.to_string(), true)];
        if let Some(max_teams) = self.form.max_teams {
            fields.push(("👥 Max teams", max_teams.to_string(), true));
        }
        fields.push(("📣 Organizer", self.organizer.mention().to_string(), true));
        fields.push(("🗓️ Registration", registration.to_string(), false));

        let embed = CreateEmbed::new()
            .title(&self.form.title)
            .description(&self.form.description)
            .colour(self.form.colour)
            .fields(fields);

        match &self.form.banner {
            Some(banner) => embed.image(banner),
            None => embed,
        }
    }
}
