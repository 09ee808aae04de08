//! Inline keyboard builders for interactive bot menus

use crate::constants::ADD_ME_RIGHTS;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Callback payloads understood by `callbacks::handle_callback`
pub mod data {
    pub const HELP_MENU: &str = "help_menu";
    pub const ABOUT_ME: &str = "about_me";
    pub const START_MENU: &str = "start_menu";
    pub const CLOSE_LOGS: &str = "close_logs";
}

/// Link that opens the "add to group" flow with the rights the bot needs
pub fn add_me_url(bot_username: &str) -> String {
    format!(
        "https://t.me/{}?startgroup=new&admin={}",
        bot_username, ADD_ME_RIGHTS
    )
}

/// URL button, skipped with a warning if `url` does not parse
fn url_button(text: &str, url: &str) -> Option<InlineKeyboardButton> {
    match url.parse() {
        Ok(parsed) => Some(InlineKeyboardButton::url(text, parsed)),
        Err(e) => {
            tracing::warn!("Skipping button '{}' with invalid url {}: {}", text, url, e);
            None
        }
    }
}

fn rows(rows: Vec<Vec<Option<InlineKeyboardButton>>>) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = rows
        .into_iter()
        .map(|row| row.into_iter().flatten().collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Keyboard under the welcome message
pub fn start_keyboard(bot_username: &str, updates_url: &str) -> InlineKeyboardMarkup {
    rows(vec![
        vec![
            Some(InlineKeyboardButton::callback("⚙️ Help", data::HELP_MENU)),
            url_button("➕ Add Me", &add_me_url(bot_username)),
        ],
        vec![
            url_button("🔄 Updates", updates_url),
            Some(InlineKeyboardButton::callback("ℹ️ About Me", data::ABOUT_ME)),
        ],
    ])
}

/// Single "Back" button returning to the welcome message
pub fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🔙 Back",
        data::START_MENU,
    )]])
}

/// Single "Close" button deleting the logs message
pub fn close_logs_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "❌ Close",
        data::CLOSE_LOGS,
    )]])
}

/// Single link button to the updates channel
pub fn updates_keyboard(label: &str, updates_url: &str) -> InlineKeyboardMarkup {
    rows(vec![vec![url_button(label, updates_url)]])
}

/// Buttons shown to non-admins who try an admin command
pub fn unauthorized_keyboard(developer_url: &str, updates_url: &str) -> InlineKeyboardMarkup {
    rows(vec![vec![
        url_button("👨🏼‍💻 Developer", developer_url),
        url_button("⚙️ Update Channel", updates_url),
    ]])
}

/// Buttons attached to the thank-you message after joining a group
pub fn group_welcome_keyboard(bot_username: &str, developer_url: &str) -> InlineKeyboardMarkup {
    rows(vec![vec![
        url_button("➕ Add Me", &add_me_url(bot_username)),
        url_button("My Dev 👨‍💻", developer_url),
    ]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_add_me_url() {
        let url = add_me_url("SmartToolBot");
        assert!(url.starts_with("https://t.me/SmartToolBot?startgroup=new&admin="));
        assert!(url.ends_with("promote_members"));
    }

    #[test]
    fn test_start_keyboard_layout() {
        let kb = start_keyboard("SmartToolBot", "https://t.me/updates");
        assert_eq!(kb.inline_keyboard.len(), 2);
        assert_eq!(kb.inline_keyboard[0].len(), 2);
        assert_eq!(kb.inline_keyboard[0][0].text, "⚙️ Help");
        assert!(matches!(
            &kb.inline_keyboard[0][0].kind,
            InlineKeyboardButtonKind::CallbackData(d) if d == data::HELP_MENU
        ));
        assert!(matches!(
            &kb.inline_keyboard[1][1].kind,
            InlineKeyboardButtonKind::CallbackData(d) if d == data::ABOUT_ME
        ));
    }

    #[test]
    fn test_invalid_urls_are_skipped() {
        let kb = start_keyboard("SmartToolBot", "not a url");
        assert_eq!(kb.inline_keyboard[1].len(), 1);

        let kb = updates_keyboard("Update Channel", "not a url");
        assert!(kb.inline_keyboard.is_empty());
    }

    #[test]
    fn test_close_logs_keyboard() {
        let kb = close_logs_keyboard();
        assert!(matches!(
            &kb.inline_keyboard[0][0].kind,
            InlineKeyboardButtonKind::CallbackData(d) if d == data::CLOSE_LOGS
        ));
    }
}
