use poise::{
    serenity_prelude::{Colour, CreateActionRow, CreateEmbed},
    CreateReply,
};
use rand::Rng;
use tracing::{error, info, instrument};

use crate::{
    log,
    tickets::join_button,
    tournament::post::{TournamentPost, TournamentParseError, USAGE},
    utils::error::CommonError,
    BotContext, BotData, BotError,
};

use super::CommandsContainer;

/// CommandsContainer for the announcer bot's text commands.
pub struct AnnouncerCommands;

impl CommandsContainer for AnnouncerCommands {
    type Data = BotData;
    type Error = BotError;

    fn get_all() -> Vec<poise::Command<Self::Data, Self::Error>> {
        vec![ping(), new_tournament()]
    }
}

/// Pretend latency shown by `ping`, in milliseconds.
fn pseudo_latency() -> u32 {
    rand::thread_rng().gen_range(20..=100)
}

/// Check that the bot is alive.
#[poise::command(prefix_command)]
#[instrument]
async fn ping(ctx: BotContext<'_>) -> Result<(), BotError> {
    let embed = CreateEmbed::new()
        .title("CroustyBot Ping")
        .description(format!("Here's my ping:\n`{} ms`", pseudo_latency()))
        .colour(Colour::BLUE);
    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Announce a tournament with a button to register.
///
/// Usage: `newtournament Name/Description/Format/MaxTeams/AdditionalMessage/DD,MM,YYYY,HH:MM`
#[poise::command(prefix_command, guild_only, rename = "newtournament")]
#[instrument]
async fn new_tournament(
    ctx: BotContext<'_>,
    #[rest] args: Option<String>,
) -> Result<(), BotError> {
    let post = match args.unwrap_or_default().parse::<TournamentPost>() {
        Ok(post) => post,
        Err(error) => {
            ctx.say(rejection(&error, &ctx.data().config.prefix)).await?;
            return Ok(());
        }
    };

    let settings = ctx
        .data()
        .config
        .announcer
        .as_ref()
        .ok_or(CommonError::FeatureDisabled("announcer"))?;
    let author = ctx.author();
    let organizer_name = match ctx.author_member().await {
        Some(member) => member.display_name().to_string(),
        None => author.name.clone(),
    };

    let embed = post.embed(settings.ruleset_channel, &organizer_name, author.avatar_url());
    ctx.send(
        CreateReply::default()
            .embed(embed)
            .components(vec![CreateActionRow::Buttons(vec![join_button(author.id)])]),
    )
    .await?;

    info!("{} announced tournament {}", author.name, post.title);
    log::discord_log_info(
        ctx,
        &ctx.data().config,
        "Tournament announced",
        vec![
            ("Title", post.title.as_str(), true),
            ("Organizer", organizer_name.as_str(), true),
        ],
    )
    .await
    .unwrap_or_else(|e| error!("Error sending announcement log: {:?}", e));

    Ok(())
}

/// The message sent back when the arguments of `newtournament` are invalid.
fn rejection(error: &TournamentParseError, prefix: &str) -> String {
    match error {
        TournamentParseError::FieldCount(_) => {
            format!("❌ Invalid format. Use: `{}{}`", prefix, USAGE)
        }
        other => format!("❌ {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pseudo_latency_stays_in_range() {
        for _ in 0..1000 {
            let latency = pseudo_latency();
            assert!((20..=100).contains(&latency), "{latency}");
        }
    }

    #[test]
    fn rejections_target_the_bad_field() {
        let count = "a/b".parse::<TournamentPost>().unwrap_err();
        assert_eq!(
            rejection(&count, "pjt!"),
            "❌ Invalid format. Use: `pjt!newtournament Name/Description/Format/MaxTeams/AdditionalMessage/DD,MM,YYYY,HH:MM`"
        );

        let format = "Cup/Desc/6v6/8/Note/06,07,2025,22:30"
            .parse::<TournamentPost>()
            .unwrap_err();
        assert_eq!(
            rejection(&format, "pjt!"),
            "❌ Invalid format `6v6`. Choose from: 1v1, 2v2, 3v3, 4v4, 5v5."
        );

        let date = "Cup/Desc/2v2/8/Note/tomorrow"
            .parse::<TournamentPost>()
            .unwrap_err();
        assert_eq!(
            rejection(&date, "pjt!"),
            "❌ Invalid date format. Use: `DD,MM,YYYY,HH:MM` (e.g. 06,07,2025,22:30)"
        );
    }
}
