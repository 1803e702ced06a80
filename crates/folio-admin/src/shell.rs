//! Interactive admin session
//!
//! One shell is one session: the authenticated flag lives exactly as long
//! as the shell does. Commands are read line by line; notices raised by the
//! auth core are printed after each command.

use std::sync::Arc;
use std::time::Duration;

use folio_core::{policy, AuthService, Clock, KeyValueStore, MemoryNotifier, Notice, Severity};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

use crate::report::{render_policy, render_status};

const HELP: &str = "\
Commands:
  login <password>              authenticate as admin
  logout                        end the session
  passwd <current> <new>        change the admin password
  status                        show lockout and password age
  whoami                        show the session state
  validate <password>           check a password against the policy
  help                          show this text
  quit                          leave the shell
";

/// A parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Login(String),
    Logout,
    ChangePassword { current: String, new: String },
    Status,
    WhoAmI,
    Validate(String),
    Help,
    Quit,
    Empty,
}

/// Why a line could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

impl ShellCommand {
    /// Parse one input line
    ///
    /// `login` and `validate` take the rest of the line verbatim so their
    /// argument may contain spaces; `passwd` splits on whitespace.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        if trimmed.trim().is_empty() {
            return Ok(Self::Empty);
        }

        let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest),
            None => (trimmed, ""),
        };

        match verb {
            "login" => {
                if rest.is_empty() {
                    return Err(ParseError::Usage("login <password>"));
                }
                Ok(Self::Login(rest.to_string()))
            }
            "logout" => Ok(Self::Logout),
            "passwd" => {
                let mut args = rest.split_whitespace();
                match (args.next(), args.next(), args.next()) {
                    (Some(current), Some(new), None) => Ok(Self::ChangePassword {
                        current: current.to_string(),
                        new: new.to_string(),
                    }),
                    _ => Err(ParseError::Usage("passwd <current> <new>")),
                }
            }
            "status" => Ok(Self::Status),
            "whoami" => Ok(Self::WhoAmI),
            "validate" => {
                if rest.is_empty() {
                    return Err(ParseError::Usage("validate <password>"));
                }
                Ok(Self::Validate(rest.to_string()))
            }
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// Line-driven admin session over an [`AuthService`]
pub struct Shell<S, C> {
    service: AuthService<S, C>,
    notices: Arc<MemoryNotifier>,
    login_delay: Duration,
}

impl<S, C> Shell<S, C>
where
    S: KeyValueStore + Clone,
    C: Clock + Clone,
{
    /// Wrap a service; `notices` must be registered on it so outcomes can
    /// be echoed back to the user
    pub fn new(
        service: AuthService<S, C>,
        notices: Arc<MemoryNotifier>,
        login_delay: Duration,
    ) -> Self {
        Self {
            service,
            notices,
            login_delay,
        }
    }

    pub fn service(&self) -> &AuthService<S, C> {
        &self.service
    }

    /// Read commands until `quit` or end of input
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        output.write_all(b"folio admin shell - type 'help' for commands\n").await?;
        loop {
            output.write_all(self.prompt().as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let command = match ShellCommand::parse(&line) {
                Ok(command) => command,
                Err(e) => {
                    output.write_all(format!("{}\n", e).as_bytes()).await?;
                    continue;
                }
            };

            if command == ShellCommand::Quit {
                break;
            }

            let text = match self.execute(command).await {
                Ok(text) => text,
                Err(e) => {
                    error!(error = %e, "Command failed");
                    format!("error: {}\n", e)
                }
            };
            output.write_all(text.as_bytes()).await?;

            for notice in self.notices.take() {
                output.write_all(render_notice(&notice).as_bytes()).await?;
            }
        }

        self.service.logout();
        self.notices.take();
        output.write_all(b"bye\n").await?;
        output.flush().await?;
        Ok(())
    }

    /// Run one command, returning text for the user
    pub async fn execute(&mut self, command: ShellCommand) -> folio_core::Result<String> {
        match command {
            ShellCommand::Login(password) => {
                // Simulated latency; not part of the core contract
                if !self.login_delay.is_zero() {
                    tokio::time::sleep(self.login_delay).await;
                }
                let outcome = self.service.login(&password)?;
                debug!(success = outcome.is_success(), "Shell login processed");
                Ok(String::new())
            }
            ShellCommand::Logout => {
                self.service.logout();
                Ok(String::new())
            }
            ShellCommand::ChangePassword { current, new } => {
                self.service.change_password(&current, &new)?;
                Ok(String::new())
            }
            ShellCommand::Status => render_status(&self.service),
            ShellCommand::WhoAmI => Ok(format!("{:?}\n", self.service.state())),
            ShellCommand::Validate(password) => Ok(render_policy(&policy::validate(&password))),
            ShellCommand::Help => Ok(HELP.to_string()),
            ShellCommand::Quit | ShellCommand::Empty => Ok(String::new()),
        }
    }

    fn prompt(&self) -> String {
        if self.service.is_authenticated() {
            "admin# ".to_string()
        } else {
            "folio> ".to_string()
        }
    }
}

/// One-line rendering of a notice
pub fn render_notice(notice: &Notice) -> String {
    let marker = match notice.severity {
        Severity::Info => "[ok]",
        Severity::Warning => "[!]",
        Severity::Destructive => "[x]",
    };
    format!("{} {}: {}\n", marker, notice.title, notice.description)
}
