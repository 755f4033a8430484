//! Line-oriented terminal front end over a `ChatController`.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use colloquy_chat::ChatController;
use colloquy_core::types::{Locale, Message, Notice, NoticeKind, Role, Session, SessionId};
use colloquy_remote::RemoteStore;
use colloquy_speech::ToggleOutcome;

use crate::commands::{self, Command, HELP};

pub struct Repl {
    controller: ChatController,
    remote: Arc<dyn RemoteStore>,
}

impl Repl {
    pub fn new(controller: ChatController, remote: Arc<dyn RemoteStore>) -> Self {
        Self { controller, remote }
    }

    /// Read commands from stdin until `/quit` or end of input.
    pub async fn run(mut self) -> std::io::Result<()> {
        self.controller.start().await;
        self.flush_notices();
        println!("{}", render_sessions(self.controller.sessions(), self.controller.active_session()));
        self.print_transcript();
        println!("Type /help for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let command = match commands::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }
            self.execute(command).await;
            self.flush_notices();
        }

        self.controller.stop_speech();
        tracing::info!("Session ended");
        Ok(())
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Ask(text) => self.ask(text).await,
            Command::Sessions => {
                self.controller.refresh().await;
                println!("{}", render_sessions(self.controller.sessions(), self.controller.active_session()));
            }
            Command::New => {
                if let Some(id) = self.controller.create_session().await {
                    println!("Started new chat {}", id);
                }
            }
            Command::Select(target) => {
                let Some(id) = self.target(&target) else { return };
                if self.controller.select(&id).await {
                    self.print_transcript();
                }
            }
            Command::Rename { target, name } => {
                let Some(id) = self.target(&target) else { return };
                if self.controller.rename_session(&id, &name).await {
                    println!("Renamed to {}", name.trim());
                }
            }
            Command::Delete(target) => {
                let Some(id) = self.target(&target) else { return };
                if self.controller.delete_session(&id).await {
                    println!("Deleted {}", id);
                    println!("{}", render_sessions(self.controller.sessions(), self.controller.active_session()));
                }
            }
            Command::Lang(tag) => match tag.parse::<Locale>() {
                Ok(locale) => {
                    self.controller.set_locale(locale);
                    println!("Language set to {} ({})", locale.label(), locale);
                }
                Err(e) => println!("{}", e),
            },
            Command::Mic => match self.controller.toggle_speech() {
                Some(ToggleOutcome::Started) => println!("Listening..."),
                Some(ToggleOutcome::Stopped) => println!("Stopped listening."),
                None => {}
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }
    }

    async fn ask(&mut self, text: String) {
        if self.controller.active_session().is_none() {
            println!("No chat open. Use /new to start one.");
            return;
        }
        self.controller.set_compose(text);
        let Some(pending) = self.controller.submit() else {
            return;
        };

        println!("Bot is thinking...");
        let outcome = self.remote.ask(pending.request()).await;
        let reply = self.controller.resolve(pending, outcome);
        println!("{}", render_message(&reply));
    }

    fn target(&self, target: &str) -> Option<SessionId> {
        let id = commands::resolve_target(self.controller.sessions(), target);
        if id.is_none() {
            println!("No chat matches {}", target);
        }
        id
    }

    fn print_transcript(&self) {
        for message in self.controller.messages() {
            println!("{}", render_message(message));
        }
    }

    fn flush_notices(&mut self) {
        for notice in self.controller.take_notices() {
            println!("{}", render_notice(&notice));
        }
    }
}

pub fn render_message(message: &Message) -> String {
    match message.role {
        Role::User => format!("You: {}", message.text),
        Role::Bot if message.out_of_context => format!("Bot [out of context]: {}", message.text),
        Role::Bot => format!("Bot: {}", message.text),
    }
}

pub fn render_sessions(sessions: &[Session], active: Option<&SessionId>) -> String {
    if sessions.is_empty() {
        return "No chats yet. Use /new to start one.".to_string();
    }
    sessions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let marker = if Some(&s.id) == active { '*' } else { ' ' };
            let name = if s.name.is_empty() { s.id.as_str() } else { s.name.as_str() };
            format!("{} {}. {}", marker, i + 1, name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_notice(notice: &Notice) -> String {
    let tag = match notice.kind {
        NoticeKind::RemoteUnavailable => "offline",
        NoticeKind::CapabilityUnavailable => "unsupported",
        NoticeKind::Info => "note",
    };
    format!("[{} {}] {}", notice.at.format("%H:%M:%S"), tag, notice.message)
}
