//! Console output formatter for chats, settings and errors

use chrono::{DateTime, Local};
use colored::Colorize;
use talkback_application::SendMessageError;
use talkback_domain::core::string::{preview, truncate};
use talkback_domain::{Chat, ChatId, Role, Settings, Timestamp};

/// Formats session data for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Numbered chat list, newest first. The active chat is marked with `*`.
    pub fn chat_list(chats: &[Chat], active: Option<&ChatId>) -> String {
        if chats.is_empty() {
            return format!("{}\n", "No chats yet. Type /new to start one.".dimmed());
        }

        let mut output = Self::section_header("Chats");
        for (index, chat) in chats.iter().enumerate() {
            let marker = if Some(chat.id()) == active {
                "*".green().bold().to_string()
            } else {
                " ".to_string()
            };
            output.push_str(&format!(
                "{} {:>3}. {}  {}\n",
                marker,
                index + 1,
                truncate(chat.title(), 40).bold(),
                format!(
                    "({} messages, {}, id {})",
                    chat.messages().len(),
                    Self::format_time(chat.updated_at()),
                    Self::short_id(chat.id())
                )
                .dimmed()
            ));
        }
        output
    }

    /// Every message of a chat, oldest first.
    pub fn transcript(chat: &Chat, fallback_prompt: &str) -> String {
        let mut output = Self::section_header(chat.title());
        output.push_str(&format!(
            "{} {}\n",
            "system:".dimmed(),
            preview(chat.effective_system_prompt(fallback_prompt), 100).dimmed()
        ));

        for message in chat.messages() {
            let label = match message.role() {
                Role::User => "you>".green().bold(),
                Role::Assistant => "assistant>".cyan().bold(),
                Role::System => "system>".dimmed(),
            };
            let content = if message.content().is_empty() {
                "(no reply)".dimmed().to_string()
            } else {
                message.content().to_string()
            };
            output.push_str(&format!("\n{} {}\n", label, content));
            if let Some(url) = message.image_url() {
                output.push_str(&format!("  {} {}\n", "image:".dimmed(), url));
            }
        }
        output
    }

    /// Settings with the API key masked.
    pub fn settings(settings: &Settings) -> String {
        let mut output = Self::section_header("Settings");
        let rows = [
            ("endpoint", settings.api_endpoint.clone()),
            ("api_key", settings.masked_api_key()),
            ("bot_id", settings.bot_id.clone()),
            ("system_prompt", preview(&settings.system_prompt, 80)),
        ];
        for (key, value) in rows {
            let value = if value.is_empty() {
                "(not set)".dimmed().to_string()
            } else {
                value
            };
            output.push_str(&format!("  {:<14} {}\n", key.cyan(), value));
        }
        output
    }

    /// A failed send. Balance errors get an explicit call to action.
    pub fn send_error(error: &SendMessageError) -> String {
        if error.is_insufficient_balance() {
            format!(
                "{} {}\n{}",
                "Balance:".yellow().bold(),
                error,
                "Top up the API account, then send the message again.".yellow()
            )
        } else {
            format!("{} {}", "Error:".red().bold(), error)
        }
    }

    pub fn help() -> String {
        let mut output = Self::section_header("Commands");
        for (usage, text) in [
            ("/new", "Start a new chat"),
            ("/list", "List chats"),
            ("/switch <n|id>", "Switch to a chat"),
            ("/rename <title>", "Rename the active chat"),
            ("/delete [n|id]", "Delete a chat (default: active)"),
            ("/history", "Show the active chat"),
            ("/system <prompt>", "Set the system prompt for new chats"),
            ("/settings", "Show settings"),
            ("/set <key> <value>", "Change endpoint, api_key, bot_id or system_prompt"),
            ("/help", "Show this help"),
            ("/quit", "Exit"),
        ] {
            output.push_str(&format!("  {:<20} {}\n", usage.cyan(), text));
        }
        output.push_str(&format!(
            "\n{}\n",
            "Anything else is sent to the active chat. Ctrl-C stops a reply.".dimmed()
        ));
        output
    }

    pub fn welcome() -> String {
        let line = "=".repeat(48);
        format!(
            "{}\n{:^48}\n{}\n{}\n",
            line.cyan(),
            "talkback".bold(),
            line.cyan(),
            "Type /help for commands.".dimmed()
        )
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn format_time(ts: Timestamp) -> String {
        DateTime::from_timestamp_millis(ts)
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    fn short_id(id: &ChatId) -> String {
        id.as_str().chars().take(8).collect()
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
