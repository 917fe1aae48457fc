use poise::serenity_prelude::{
    self as serenity, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, HttpError, ModelError,
};

/// Discord's JSON error code for "Missing Permissions".
const MISSING_PERMISSIONS: isize = 50013;

/// An interaction response only the invoking user can see.
pub fn ephemeral(content: impl Into<String>) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

/// A followup only the invoking user can see, for interactions that were deferred.
pub fn ephemeral_followup(content: impl Into<String>) -> CreateInteractionResponseFollowup {
    CreateInteractionResponseFollowup::new()
        .content(content)
        .ephemeral(true)
}

/// Whether the platform refused a call because the bot lacks a permission.
pub fn is_missing_permissions(error: &serenity::Error) -> bool {
    match error {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            response.error.code == MISSING_PERMISSIONS || response.status_code.as_u16() == 403
        }
        serenity::Error::Model(ModelError::InvalidPermissions { .. }) => true,
        _ => false,
    }
}
