//! REPL (Read-Eval-Print Loop) for interactive chat

use super::command::ReplCommand;
use crate::ConsoleFormatter;
use crate::ReplyPrinter;
use crate::config::ReplConfig;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use talkback_application::{
    SendMessageInput, SendMessageOutput, SendMessageUseCase, SessionStore,
};
use talkback_domain::{ChatId, SettingsPatch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Interactive chat REPL
///
/// Owns the session store for the duration of the loop; take it back with
/// [`into_store`](Self::into_store) to shut it down.
pub struct ChatRepl {
    store: SessionStore,
    use_case: SendMessageUseCase,
    config: ReplConfig,
}

impl ChatRepl {
    /// Create a new ChatRepl over an initialized store
    pub fn new(store: SessionStore, use_case: SendMessageUseCase) -> Self {
        Self {
            store,
            use_case,
            config: ReplConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn into_store(self) -> SessionStore {
        self.store
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        if let Some(ref path) = self.config.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        println!("{}", ConsoleFormatter::welcome());
        if let Some(chat) = self.store.chats().first() {
            let id = chat.id().clone();
            self.store.set_active_chat(id);
        }
        self.print_active();

        loop {
            let readline = rl.readline(&self.config.prompt);

            match readline {
                Ok(line) => {
                    let line = line.trim();

                    // Skip empty lines
                    if line.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(line);

                    if self.handle(ReplCommand::parse(line)).await {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = self.config.history_file {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    /// Execute one command. Returns true if the REPL should exit.
    pub async fn handle(&mut self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Message(text) => {
                self.send(&text).await;
            }
            ReplCommand::New => {
                let id = self.store.create_chat();
                self.store.set_active_chat(id);
                self.print_active();
            }
            ReplCommand::List => {
                print!(
                    "{}",
                    ConsoleFormatter::chat_list(self.store.chats(), self.store.active_chat_id())
                );
            }
            ReplCommand::Switch(target) => match self.resolve_chat(&target) {
                Some(id) => {
                    self.store.set_active_chat(id);
                    self.print_active();
                }
                None => println!("No chat matches '{}'. Try /list.", target),
            },
            ReplCommand::Rename(title) => match self.store.active_chat_id().cloned() {
                Some(id) => {
                    if self.store.rename_chat(&id, &title) {
                        self.print_active();
                    }
                }
                None => println!("No active chat."),
            },
            ReplCommand::Delete(target) => {
                let id = match target {
                    Some(target) => self.resolve_chat(&target),
                    None => self.store.active_chat_id().cloned(),
                };
                let deleted = id.filter(|id| self.store.delete_chat(id));
                match deleted {
                    Some(id) => {
                        println!("Deleted chat {}.", id);
                        if self.store.active_chat_id().is_none() {
                            println!("{}", "No active chat. Use /switch or /new.".dimmed());
                        }
                    }
                    None => println!("Nothing to delete."),
                }
            }
            ReplCommand::System(prompt) => {
                self.store.update_default_system_prompt(&prompt);
                println!("System prompt for new chats updated.");
            }
            ReplCommand::Settings => {
                print!("{}", ConsoleFormatter::settings(self.store.settings()));
            }
            ReplCommand::Set { key, value } => match settings_patch(&key, value) {
                Some(patch) => {
                    self.store.update_settings(patch);
                    print!("{}", ConsoleFormatter::settings(self.store.settings()));
                }
                None => println!(
                    "Unknown setting '{}'. Use endpoint, api_key, bot_id or system_prompt.",
                    key
                ),
            },
            ReplCommand::History => match self.store.active_chat() {
                Some(chat) => print!(
                    "{}",
                    ConsoleFormatter::transcript(chat, &self.store.settings().system_prompt)
                ),
                None => println!("No active chat."),
            },
            ReplCommand::Help => print!("{}", ConsoleFormatter::help()),
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::MissingArgument(usage) => println!("Usage: {}", usage),
            ReplCommand::Unknown(cmd) => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
        }
        false
    }

    /// Send `text` to the active chat (creating one if needed) and print
    /// the reply as it streams. Ctrl-C stops the reply.
    pub async fn send(&mut self, text: &str) -> Option<SendMessageOutput> {
        if self.store.active_chat().is_none() {
            let id = self.store.create_chat();
            self.store.set_active_chat(id);
            debug!("Created a chat for the first message");
        }

        let token = CancellationToken::new();
        let input = SendMessageInput::new(text).with_cancellation(token.clone());
        let printer = if self.config.show_progress {
            ReplyPrinter::new()
        } else {
            ReplyPrinter::plain()
        };

        let send = self.use_case.execute(&mut self.store, input, &printer);
        tokio::pin!(send);
        let result = loop {
            tokio::select! {
                result = &mut send => break result,
                _ = tokio::signal::ctrl_c() => {
                    debug!("Ctrl-C received, cancelling reply");
                    token.cancel();
                }
            }
        };

        match result {
            Ok(output) => {
                if output.was_cancelled() {
                    println!("{}", "(reply stopped)".dimmed());
                }
                Some(output)
            }
            Err(e) => {
                eprintln!("{}", ConsoleFormatter::send_error(&e));
                None
            }
        }
    }

    /// Resolve a `/list` index (1-based) or a chat id (or unique id prefix).
    fn resolve_chat(&self, target: &str) -> Option<ChatId> {
        resolve_chat(&self.store, target)
    }

    fn print_active(&self) {
        match self.store.active_chat() {
            Some(chat) => println!(
                "{} {} {}",
                "Chat:".cyan().bold(),
                chat.title(),
                format!("({} messages)", chat.messages().len()).dimmed()
            ),
            None => println!("{}", "No chats yet. Type a message or /new.".dimmed()),
        }
    }
}

fn resolve_chat(store: &SessionStore, target: &str) -> Option<ChatId> {
    let chats = store.chats();

    if let Ok(index) = target.parse::<usize>()
        && index >= 1
        && index <= chats.len()
    {
        return Some(chats[index - 1].id().clone());
    }

    if let Some(chat) = chats.iter().find(|c| c.id().as_str() == target) {
        return Some(chat.id().clone());
    }

    let mut prefixed = chats.iter().filter(|c| c.id().as_str().starts_with(target));
    match (prefixed.next(), prefixed.next()) {
        (Some(chat), None) => Some(chat.id().clone()),
        _ => None,
    }
}

fn settings_patch(key: &str, value: String) -> Option<SettingsPatch> {
    let mut patch = SettingsPatch::default();
    match key {
        "endpoint" | "api_endpoint" => patch.api_endpoint = Some(value),
        "api_key" | "key" => patch.api_key = Some(value),
        "bot_id" | "bot" => patch.bot_id = Some(value),
        "system_prompt" | "system" => patch.system_prompt = Some(value.trim().to_string()),
        _ => return None,
    }
    Some(patch)
}
