use poise::{serenity_prelude::RoleId, CreateReply};
use tracing::info;

use crate::{utils::error::CommonError, BotContext, BotError};

/// Administrators and holders of the organizer role may run tournament commands.
///
/// Everyone else gets an ephemeral refusal.
pub async fn is_organizer(ctx: BotContext<'_>) -> Result<bool, BotError> {
    let settings = ctx
        .data()
        .config
        .organizer
        .as_ref()
        .ok_or(CommonError::FeatureDisabled("organizer"))?;
    let member = ctx.author_member().await.ok_or(CommonError::NotInAGuild)?;
    let is_admin = member
        .permissions
        .is_some_and(|permissions| permissions.administrator());

    if may_organize(is_admin, &member.roles, settings.organizer_role) {
        return Ok(true);
    }

    info!("{} tried to run {} without permission", ctx.author().name, ctx.command().name);
    ctx.send(
        CreateReply::default()
            .content("❌ You need the Administrator permission or the tournament organizer role to do this.")
            .ephemeral(true),
    )
    .await?;
    Ok(false)
}

pub fn may_organize(is_admin: bool, roles: &[RoleId], organizer_role: RoleId) -> bool {
    is_admin || roles.contains(&organizer_role)
}
