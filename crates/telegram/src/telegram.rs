use crate::config::BotConfig;
use crate::types::Command;
use crate::{callbacks, commands, handlers, utils};
use std::sync::Arc;
use teloxide::{
    dispatching::{dialogue, dialogue::InMemStorage, UpdateHandler},
    prelude::*,
    types::Me,
    utils::command::BotCommands,
};

pub use crate::types::State;

/// Register bot commands in Telegram menu
pub async fn set_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

/// Parse a command written with any accepted prefix or alias
fn parse_command_text(text: &str, bot_username: &str) -> Option<Command> {
    let normalized = utils::normalize_command(text)?;
    Command::parse(&normalized, bot_username).ok()
}

fn parse_command(msg: Message, me: Me) -> Option<Command> {
    parse_command_text(msg.text()?, me.username())
}

/// Text that starts like a command but matched none of ours
fn is_unknown_command(msg: Message) -> bool {
    msg.text().is_some_and(utils::looks_like_command)
}

/// Whether this message announces the bot joining a group
fn bot_was_added(msg: Message, me: Me) -> bool {
    msg.new_chat_members()
        .is_some_and(|members| members.iter().any(|u| u.id == me.id))
}

fn sender_is_admin(msg: Message, cfg: Arc<BotConfig>) -> bool {
    msg.from().is_some_and(|u| cfg.is_admin(u.id.0))
}

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = dptree::filter_map(parse_command)
        .branch(
            case![Command::Start]
                .filter(|msg: Message| msg.chat.is_private())
                .endpoint(commands::start),
        )
        .branch(case![Command::Help].endpoint(commands::help))
        .branch(case![Command::Fb(args)].endpoint(commands::facebook))
        .branch(case![Command::In(args)].endpoint(commands::instagram))
        .branch(case![Command::Tt(args)].endpoint(commands::tiktok))
        .branch(case![Command::Pin(args)].endpoint(commands::pinterest))
        .branch(case![Command::Sp(args)].endpoint(commands::spotify))
        .branch(case![Command::Yt(args)].endpoint(commands::youtube))
        .branch(case![Command::Song(args)].endpoint(commands::song))
        .branch(case![Command::Broadcast].endpoint(commands::broadcast))
        .branch(case![Command::Stats].endpoint(commands::stats))
        .branch(case![Command::Logs].endpoint(commands::logs))
        .branch(case![Command::Restart].endpoint(commands::restart))
        .branch(case![Command::Cancel].endpoint(commands::cancel));

    let message_handler = Update::filter_message()
        .inspect_async(handlers::track_activity)
        .branch(dptree::filter(bot_was_added).endpoint(commands::bot_added))
        .branch(command_handler)
        .branch(
            case![State::AwaitBroadcast]
                .filter(sender_is_admin)
                .branch(dptree::filter(is_unknown_command).endpoint(commands::broadcast_pending))
                .branch(dptree::endpoint(commands::receive_broadcast)),
        );

    // Handle callback queries from inline keyboards
    let callback_handler = Update::filter_callback_query()
        .endpoint(callbacks::handle_callback);

    dialogue::enter::<Update, InMemStorage<State>, State, _>()
        .branch(message_handler)
        .branch(callback_handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: &str = "SmartToolBot";

    #[test]
    fn test_parse_prefixes_and_aliases() {
        assert_eq!(parse_command_text(".send", BOT), Some(Command::Broadcast));
        assert_eq!(parse_command_text("!status@SmartToolBot", BOT), Some(Command::Stats));
        assert_eq!(parse_command_text("/report", BOT), Some(Command::Stats));
        assert_eq!(parse_command_text("!reload", BOT), Some(Command::Restart));
    }

    #[test]
    fn test_parse_download_arguments() {
        assert_eq!(
            parse_command_text("/FB https://fb.watch/abc", BOT),
            Some(Command::Fb("https://fb.watch/abc".to_string()))
        );
        assert_eq!(parse_command_text("/fb", BOT), Some(Command::Fb(String::new())));
        assert_eq!(
            parse_command_text(".song@SmartToolBot https://youtu.be/x", BOT),
            Some(Command::Song("https://youtu.be/x".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_other_text() {
        assert_eq!(parse_command_text("hello", BOT), None);
        assert_eq!(parse_command_text("/foo", BOT), None);
        assert_eq!(parse_command_text("/stats@OtherBot", BOT), None);
    }
}
