use thiserror::Error;

/// Failures shared by several handlers when the guild layout does not match the configuration.
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("You are not in a guild.")]
    NotInAGuild,
    #[error("The {0} feature is not enabled in this bot's configuration.")]
    FeatureDisabled(&'static str),
}
