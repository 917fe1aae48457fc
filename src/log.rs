use std::time::SystemTime;

use poise::serenity_prelude::{CacheHttp, Color, CreateEmbed, CreateMessage};
use tracing::info;

use crate::{config::Config, BotError};

fn now_string() -> String {
    format!(
        "<t:{}:F>",
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    )
}

/// Creates an info log message in the configured log channel, if there is one.
pub async fn discord_log_info(
    cache_http: impl CacheHttp,
    config: &Config,
    title: &str,
    fields: Vec<(&str, &str, bool)>,
) -> Result<(), BotError> {
    info!("ℹ️ {}\n\n{:#?}", title, fields);

    let Some(log) = &config.log else {
        return Ok(());
    };

    let now_string = now_string();
    let fields = fields
        .into_iter()
        .chain([("Happened at", now_string.as_str(), false)]);

    log.channel
        .send_message(
            cache_http,
            CreateMessage::default().embed(
                CreateEmbed::new()
                    .title(format!("ℹ️ {}", title))
                    .fields(fields)
                    .color(Color::BLURPLE),
            ),
        )
        .await?;

    Ok(())
}

/// Creates an error log message in the configured log channel, if there is one.
pub async fn discord_log_error(
    cache_http: impl CacheHttp,
    config: &Config,
    title: &str,
    fields: Vec<(&str, &str, bool)>,
) -> Result<(), BotError> {
    let Some(log) = &config.log else {
        return Ok(());
    };

    let now_string = now_string();
    let fields = fields
        .into_iter()
        .chain([("Seen at", now_string.as_str(), false)]);

    log.channel
        .send_message(
            cache_http,
            CreateMessage::default()
                .content("⚠️ An error occured in a command!")
                .embed(
                    CreateEmbed::new()
                        .title(title)
                        .description("Please check the logs for more information.")
                        .fields(fields)
                        .color(Color::RED),
                ),
        )
        .await?;

    Ok(())
}
