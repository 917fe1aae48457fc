pub mod announcer_commands;
pub mod checks;
pub mod organizer_commands;

use crate::{config::Config, BotData, BotError};

use self::{announcer_commands::AnnouncerCommands, organizer_commands::OrganizerCommands};

/// A way to group commands together.
///
/// Implementors of this trait can return a list of their commands within their own module.
/// Here commands are grouped by the bot that serves them, so that a process only registers
/// the commands its configuration enables.
///
/// The implementors of this trait should not directly "own" the commands.
/// You should simply generate them by running Poise's function and returning the result.
/// This way, you only need to `pub` the implementor and not the commands themselves.
///
/// For example, you can define a type to group greeting commands together.
/// ```ignore
/// pub struct GreetingCommands;
///
/// impl CommandsContainer for GreetingCommands {
///     type Data = BotData;
///     type Error = BotError;
///
///     fn get_all() -> Vec<poise::Command<Self::Data, Self::Error>> {
///         vec![hello()]
///     }
/// }
///
/// #[poise::command(prefix_command)]
/// async fn hello(ctx: BotContext<'_>) -> Result<(), BotError> {
///     ctx.say("Hello!").await?;
///     Ok(())
/// }
/// ```
pub trait CommandsContainer {
    type Data;
    type Error;

    fn get_all() -> Vec<poise::Command<Self::Data, Self::Error>>;
}

/// Every command enabled by `config`.
pub fn enabled_commands(config: &Config) -> Vec<poise::Command<BotData, BotError>> {
    let mut commands = Vec::new();
    if config.announcer.is_some() {
        commands.extend(AnnouncerCommands::get_all());
    }
    if config.organizer.is_some() {
        commands.extend(OrganizerCommands::get_all());
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(config: &str) -> Vec<String> {
        let config: Config = config.parse().unwrap();
        enabled_commands(&config)
            .into_iter()
            .map(|command| command.name)
            .collect()
    }

    #[test]
    fn commands_follow_configured_bots() {
        let presence = "[presence]\nkind = \"playing\"\nname = \"Tournaments\"\n";
        let announcer = "[announcer]\nruleset_channel = 1\nticket_category = 2\n";
        let organizer = "[organizer]\norganizer_role = 3\nping_role = 4\n";

        assert_eq!(
            names(&format!("{presence}{announcer}")),
            vec!["ping", "newtournament"]
        );
        assert_eq!(
            names(&format!("{presence}{organizer}")),
            vec!["create_tournament"]
        );
        assert_eq!(
            names(&format!("{presence}{announcer}{organizer}")),
            vec!["ping", "newtournament", "create_tournament"]
        );
    }
}
