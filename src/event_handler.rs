use poise::serenity_prelude::{
    self as serenity, ChannelId, Colour, ConnectionStage, CreateEmbed, CreateMessage, EditChannel,
    GuildId, Http, Member, Mentionable, OnlineStatus, UserId,
};
use tracing::{info, instrument, warn};

use crate::{
    config::{Config, StatusSettings},
    tickets::{self, parse_join_custom_id},
    BotData, BotError,
};

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, BotError>,
    data: &BotData,
) -> Result<(), BotError> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("Connected as {}", data_about_bot.user.name);
            ctx.set_presence(Some(data.config.presence.activity()), OnlineStatus::Online);
            let guilds: Vec<GuildId> = data_about_bot.guilds.iter().map(|g| g.id).collect();
            announce_online(&ctx.http, &data.config, &guilds).await;
        }
        serenity::FullEvent::ShardStageUpdate { event } => {
            if matches!(event.new, ConnectionStage::Disconnected) {
                warn!("Shard {} disconnected", event.shard_id.0);
                let http = ctx.http.clone();
                let config = data.config.clone();
                tokio::spawn(async move { announce_offline(&http, &config).await });
            }
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            greet(&ctx.http, &data.config, new_member).await;
        }
        serenity::FullEvent::MessageDelete {
            deleted_message_id, ..
        } => {
            if data.countdowns.cancel(*deleted_message_id).await {
                info!("Stopped the countdown of deleted message {}", deleted_message_id);
            }
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => {
            if let Some(author) = parse_join_custom_id(&component.data.custom_id) {
                tickets::handle_join(ctx, &data.config, component, author).await?;
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn status_label(settings: &StatusSettings, online: bool) -> &str {
    if online {
        &settings.online_label
    } else {
        &settings.offline_label
    }
}

async fn rename_status_channel(
    http: &Http,
    channel: ChannelId,
    label: &str,
) -> Result<(), BotError> {
    channel.edit(http, EditChannel::new().name(label)).await?;
    Ok(())
}

/// Renames the status channel online in every guild that owns it. Failures are only logged.
#[instrument(skip_all)]
async fn announce_online(http: &Http, config: &Config, guilds: &[GuildId]) {
    let Some(status) = &config.status else {
        return;
    };
    let label = status_label(status, true);

    let renames = guilds.iter().map(|guild| async move {
        let channels = match guild.channels(http).await {
            Ok(channels) => channels,
            Err(e) => {
                warn!("Could not list the channels of guild {}: {}", guild, e);
                return;
            }
        };
        if !channels.contains_key(&status.channel) {
            return;
        }
        match rename_status_channel(http, status.channel, label).await {
            Ok(()) => info!("Status channel of guild {} renamed to {}", guild, label),
            Err(e) => warn!("Could not rename the status channel of guild {}: {}", guild, e),
        }
    });
    futures::future::join_all(renames).await;
}

/// Renames the status channel offline. Failures are only logged.
#[instrument(skip_all)]
pub async fn announce_offline(http: &Http, config: &Config) {
    let Some(status) = &config.status else {
        return;
    };
    let label = status_label(status, false);
    match rename_status_channel(http, status.channel, label).await {
        Ok(()) => info!("Status channel renamed to {}", label),
        Err(e) => warn!("Could not rename the status channel: {}", e),
    }
}

/// Gives the default role and posts the welcome embed. Neither waits on the other's outcome.
#[instrument(skip_all, fields(member = %member.user.name))]
async fn greet(http: &Http, config: &Config, member: &Member) {
    let Some(welcome) = &config.welcome else {
        return;
    };

    let add_role = async {
        if let Err(e) = member.add_role(http, welcome.role).await {
            warn!("Could not give role {} to {}: {}", welcome.role, member.user.name, e);
        }
    };
    let post_welcome = async {
        let embed = welcome_embed(member.user.id, &member.user.name, member.user.avatar_url());
        if let Err(e) = welcome
            .channel
            .send_message(http, CreateMessage::new().embed(embed))
            .await
        {
            warn!("Could not welcome {}: {}", member.user.name, e);
        }
    };
    tokio::join!(add_role, post_welcome);
}

pub fn welcome_embed(user: UserId, name: &str, avatar: Option<String>) -> CreateEmbed {
    let embed = CreateEmbed::new()
        .title(format!("👋 Welcome, {}!", name))
        .description(format!(
            "Glad to have you here, {}! Keep an eye on the announcements for upcoming tournaments.",
            user.mention()
        ))
        .colour(Colour::DARK_GREEN);
    match avatar {
        Some(avatar) => embed.thumbnail(avatar),
        None => embed,
    }
}
