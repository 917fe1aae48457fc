use poise::{
    serenity_prelude::{
        CreateAllowedMentions, CreateMessage, Mentionable, Message, ModalInteraction,
    },
    CreateReply,
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    commands::checks::is_organizer,
    config::OrganizerSettings,
    countdown::{self, AnnouncementMessage, Deadline},
    log,
    tournament::{
        announcement::{Announcement, TournamentForm},
        Format,
    },
    utils::{
        discord::{ephemeral, is_missing_permissions},
        error::CommonError,
        time::RegistrationDuration,
    },
    BotAppContext, BotContext, BotData, BotError,
};

use super::CommandsContainer;

/// CommandsContainer for the organizer bot's slash commands.
pub struct OrganizerCommands;

impl CommandsContainer for OrganizerCommands {
    type Data = BotData;
    type Error = BotError;

    fn get_all() -> Vec<poise::Command<Self::Data, Self::Error>> {
        vec![create_tournament()]
    }
}

/// Create a tournament announcement with a registration countdown.
#[poise::command(slash_command, guild_only, check = "is_organizer")]
#[instrument(skip(app_ctx))]
async fn create_tournament(
    app_ctx: BotAppContext<'_>,
    #[description = "Team format of the tournament"] mode: Format,
    #[description = "How long registration stays open, e.g. 90m, 2h, 3d or 1w"]
    registration_time: String,
) -> Result<(), BotError> {
    let ctx = BotContext::Application(app_ctx);

    let duration = match registration_time.parse::<RegistrationDuration>() {
        Ok(duration) => duration,
        Err(e) => {
            ctx.send(
                CreateReply::default()
                    .content(format!("❌ {}", e))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    };
    let settings = ctx
        .data()
        .config
        .organizer
        .as_ref()
        .ok_or(CommonError::FeatureDisabled("organizer"))?;

    let deadline = Deadline::after(duration.as_duration());
    let Some(response) = app_ctx
        .interaction
        .quick_modal(
            ctx.serenity_context(),
            TournamentForm::modal(mode, deadline.timestamp),
        )
        .await?
    else {
        info!("{} did not submit the tournament form in time", ctx.author().name);
        return Ok(());
    };

    let form = match TournamentForm::from_inputs(mode, &response.inputs) {
        Ok(form) => form,
        Err(e) => {
            respond(ctx, &response.interaction, format!("❌ {}", e)).await;
            return Ok(());
        }
    };

    let announcement = Announcement::new(form, mode, ctx.author().id, deadline.timestamp);
    let title = announcement.form.title.clone();
    match announce(ctx, settings, announcement, deadline).await {
        Ok(message) => {
            info!(
                "{} announced {} tournament {}, registration open for {}s",
                ctx.author().name,
                mode,
                title,
                duration.as_secs()
            );
            respond(
                ctx,
                &response.interaction,
                format!("✅ Tournament announced: {}", message.link()),
            )
            .await;
            let link = message.link();
            log::discord_log_info(
                ctx,
                &ctx.data().config,
                "Tournament announced",
                vec![("Title", title.as_str(), true), ("Message", link.as_str(), true)],
            )
            .await
            .unwrap_or_else(|e| error!("Error sending announcement log: {:?}", e));
        }
        Err(e) => {
            let notice = match e.downcast_ref::<poise::serenity_prelude::Error>() {
                Some(serenity_error) if is_missing_permissions(serenity_error) => {
                    "❌ I don't have permission to post in this channel.".to_string()
                }
                _ => format!("❌ An error occurred: {}", e),
            };
            error!("Error announcing tournament {}: {:?}", title, e);
            respond(ctx, &response.interaction, notice).await;
        }
    }

    Ok(())
}

/// Posts the announcement in the current channel and starts its countdown.
async fn announce(
    ctx: BotContext<'_>,
    settings: &OrganizerSettings,
    announcement: Announcement,
    deadline: Deadline,
) -> Result<Message, BotError> {
    let http = ctx.serenity_context().http.clone();
    let embed = announcement.embed(&announcement.countdown(deadline.remaining()));
    let message = ctx
        .channel_id()
        .send_message(
            &http,
            CreateMessage::new()
                .content(settings.ping_role.mention().to_string())
                .embed(embed)
                .allowed_mentions(CreateAllowedMentions::new().roles(vec![settings.ping_role])),
        )
        .await?;

    let handle = countdown::spawn(
        AnnouncementMessage {
            http,
            channel_id: message.channel_id,
            message_id: message.id,
            announcement,
        },
        deadline,
    );
    let countdowns = &ctx.data().countdowns;
    countdowns.track(message.id, handle).await;
    debug!("{} countdown(s) running", countdowns.len().await);

    Ok(message)
}

/// Answers the form submission. The form already used up the command's initial response.
async fn respond(ctx: BotContext<'_>, interaction: &ModalInteraction, content: String) {
    if let Err(e) = interaction
        .create_response(ctx.serenity_context(), ephemeral(content))
        .await
    {
        warn!("Error answering the tournament form: {}", e);
    }
}
