use poise::serenity_prelude::{
    self as serenity, ButtonStyle, Channel, ChannelId, ChannelType, Colour, ComponentInteraction,
    CreateButton, CreateChannel, CreateEmbed, CreateMessage, GuildId, Mentionable,
    PermissionOverwrite, PermissionOverwriteType, Permissions, RoleId, UserId,
};
use tracing::{error, info, instrument, warn};

use crate::{
    config::Config,
    log,
    utils::{
        discord::{ephemeral, ephemeral_followup, is_missing_permissions},
        error::CommonError,
    },
    BotError,
};

/// Prefix of the join button's custom id, followed by the id of the user it is bound to.
const JOIN_PREFIX: &str = "join_tournament:";

/// The "Join Tournament" button, usable only by `author`.
pub fn join_button(author: UserId) -> CreateButton {
    CreateButton::new(join_custom_id(author))
        .label("Join Tournament")
        .style(ButtonStyle::Secondary)
}

pub fn join_custom_id(author: UserId) -> String {
    format!("{}{}", JOIN_PREFIX, author)
}

/// The user a join button is bound to, or `None` if `custom_id` is not a join button.
pub fn parse_join_custom_id(custom_id: &str) -> Option<UserId> {
    custom_id
        .strip_prefix(JOIN_PREFIX)?
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(UserId::new)
}

/// Whether `presser` may use a join button bound to `author`.
#[inline]
pub fn may_join(author: UserId, presser: UserId) -> bool {
    author == presser
}

/// Asks the ticket owner for their team details.
pub fn registration_info_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("🎟️ Tournament Registration")
        .description(
            "Please provide the following information:\n\n\
             1. **Team Name**\n\
             2. **Team Tag**\n\
             3. **Competitive Roster** (list all players using Discord tags, e.g. `User#0001`)",
        )
        .colour(Colour::DARK_GREY)
}

/// @everyone loses sight of the channel, the owner and the bot can read and write in it.
pub fn ticket_overwrites(guild_id: GuildId, owner: UserId, bot: UserId) -> Vec<PermissionOverwrite> {
    let read_write = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
    vec![
        PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: PermissionOverwriteType::Role(RoleId::new(guild_id.get())),
        },
        PermissionOverwrite {
            allow: read_write,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Member(owner),
        },
        PermissionOverwrite {
            allow: read_write | Permissions::EMBED_LINKS,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Member(bot),
        },
    ]
}

/// Handles a press on a join button bound to `author`.
///
/// The press is deferred before any lookup, every later answer is an ephemeral followup.
#[instrument(skip(ctx, config, interaction), fields(user = %interaction.user.name))]
pub async fn handle_join(
    ctx: &serenity::Context,
    config: &Config,
    interaction: &ComponentInteraction,
    author: UserId,
) -> Result<(), BotError> {
    if !may_join(author, interaction.user.id) {
        interaction
            .create_response(ctx, ephemeral("❌ Only the command author can use this button."))
            .await?;
        return Ok(());
    }

    interaction.defer_ephemeral(ctx).await?;

    let (notice, outcome) = match open_ticket(ctx, config, interaction).await {
        Ok(notice) => (notice, Ok(())),
        Err(e) => (format!("❌ An error occurred: {}", e), Err(e)),
    };
    interaction
        .create_followup(ctx, ephemeral_followup(notice))
        .await?;
    outcome
}

/// Creates the ticket channel and greets its owner there.
///
/// Returns the notice for the presser. Missing category and permission problems are notices,
/// not errors.
async fn open_ticket(
    ctx: &serenity::Context,
    config: &Config,
    interaction: &ComponentInteraction,
) -> Result<String, BotError> {
    let settings = config
        .announcer
        .as_ref()
        .ok_or(CommonError::FeatureDisabled("announcer"))?;
    let guild_id = interaction.guild_id.ok_or(CommonError::NotInAGuild)?;

    if !is_category(ctx, settings.ticket_category).await {
        warn!("Ticket category {} not found", settings.ticket_category);
        return Ok("❌ Ticket category not found.".to_string());
    }

    let bot = ctx.cache.current_user().id;
    let builder = CreateChannel::new(format!("ticket-{}", interaction.user.name))
        .kind(ChannelType::Text)
        .category(settings.ticket_category)
        .permissions(ticket_overwrites(guild_id, interaction.user.id, bot));

    let channel = match guild_id.create_channel(ctx, builder).await {
        Ok(channel) => channel,
        Err(e) if is_missing_permissions(&e) => {
            error!("Missing permissions to create a ticket channel: {}", e);
            return Ok("❌ I don't have permission to create your ticket channel.".to_string());
        }
        Err(e) => return Err(e.into()),
    };

    let greeting = CreateMessage::new()
        .content(interaction.user.mention().to_string())
        .embed(registration_info_embed());
    if let Err(e) = channel.send_message(ctx, greeting).await {
        // An ungreeted ticket is useless to its owner.
        if let Err(delete_error) = channel.delete(ctx).await {
            warn!("Could not remove ticket channel {}: {}", channel.id, delete_error);
        }
        if is_missing_permissions(&e) {
            error!("Missing permissions to write in ticket channel {}: {}", channel.id, e);
            return Ok("❌ I don't have permission to write in your ticket channel.".to_string());
        }
        return Err(e.into());
    }

    info!("Created ticket channel {} for {}", channel.id, interaction.user.id);
    let owner = interaction.user.mention().to_string();
    let ticket = channel.mention().to_string();
    log::discord_log_info(
        ctx,
        config,
        "Ticket created",
        vec![("Owner", owner.as_str(), true), ("Channel", ticket.as_str(), true)],
    )
    .await
    .unwrap_or_else(|e| warn!("Error sending ticket log: {:?}", e));

    Ok(format!("✅ Ticket created: {}", channel.mention()))
}

async fn is_category(ctx: &serenity::Context, channel_id: ChannelId) -> bool {
    match channel_id.to_channel(ctx).await {
        Ok(Channel::Guild(channel)) => channel.kind == ChannelType::Category,
        Ok(_) => false,
        Err(e) => {
            warn!("Could not fetch channel {}: {}", channel_id, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_button_is_bound_to_its_author() {
        let author = UserId::new(1234);
        let custom_id = join_custom_id(author);

        assert_eq!(custom_id, "join_tournament:1234");
        assert_eq!(parse_join_custom_id(&custom_id), Some(author));
    }

    #[test]
    fn other_custom_ids_are_ignored() {
        for custom_id in ["resolved", "join_tournament:", "join_tournament:abc", "join_tournament:0"] {
            assert_eq!(parse_join_custom_id(custom_id), None, "{custom_id}");
        }
    }

    #[test]
    fn only_the_author_may_join() {
        let author = UserId::new(1);

        assert!(may_join(author, UserId::new(1)));
        assert!(!may_join(author, UserId::new(2)));
    }

    #[test]
    fn ticket_is_private_to_its_owner_and_the_bot() {
        let guild_id = GuildId::new(10);
        let owner = UserId::new(20);
        let bot = UserId::new(30);
        let overwrites = ticket_overwrites(guild_id, owner, bot);
        assert_eq!(overwrites.len(), 3);

        let everyone = &overwrites[0];
        assert_eq!(everyone.kind, PermissionOverwriteType::Role(RoleId::new(10)));
        assert!(everyone.deny.view_channel());
        assert!(everyone.allow.is_empty());

        let member = &overwrites[1];
        assert_eq!(member.kind, PermissionOverwriteType::Member(owner));
        assert!(member.allow.view_channel());
        assert!(member.allow.send_messages());
        assert!(member.deny.is_empty());

        let own = &overwrites[2];
        assert_eq!(own.kind, PermissionOverwriteType::Member(bot));
        assert!(own.allow.view_channel());
        assert!(own.allow.send_messages());
        assert!(own.allow.embed_links());
        assert!(own.deny.is_empty());
    }
}
