//! Interactive input: password prompts and the confirmation gate.

#[cfg(any(test, feature = "testing"))]
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use dcmanager_client::utils::encode_password;
use tracing::debug;

use crate::error::CliError;

/// Environment variable that turns confirmation prompts on.
pub const CONFIRMATIONS_ENV: &str = "CLI_CONFIRMATIONS";

/// Default confirmation timeout in seconds.
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 10;

/// Password entry attempts before giving up on mismatches.
pub const PASSWORD_ATTEMPTS: usize = 3;

/// Source of interactive answers.
pub trait Prompt {
    /// Shows `message` and reads one line.
    fn read_line(&mut self, message: &str) -> Result<String, CliError>;

    /// Shows `message` and reads one line without echoing it.
    fn read_secret(&mut self, message: &str) -> Result<String, CliError>;

    /// Shows `message` and reads one line, giving up after `timeout`.
    ///
    /// Returns `None` when no answer arrived in time.
    fn read_line_timeout(&mut self, message: &str, timeout: Duration) -> Result<Option<String>, CliError>;
}

/// Reads answers from the terminal; prompts go to stderr.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn read_line(&mut self, message: &str) -> Result<String, CliError> {
        let mut stderr = io::stderr().lock();
        write!(stderr, "{message}")?;
        stderr.flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_secret(&mut self, message: &str) -> Result<String, CliError> {
        if !io::stdin().is_terminal() {
            return self.read_line(message);
        }
        let mut stderr = io::stderr().lock();
        write!(stderr, "{message}")?;
        stderr.flush()?;

        let secret = {
            let _raw = RawMode::enable()?;
            read_hidden()
        };
        // Raw mode swallowed the newline.
        writeln!(stderr)?;
        secret
    }

    fn read_line_timeout(&mut self, message: &str, timeout: Duration) -> Result<Option<String>, CliError> {
        {
            let mut stderr = io::stderr().lock();
            write!(stderr, "{message}")?;
            stderr.flush()?;
        }
        let (tx, rx) = mpsc::channel();
        // The reader stays blocked on stdin after a timeout; the process exits soon after.
        thread::spawn(move || {
            let mut line = String::new();
            let result = io::stdin().lock().read_line(&mut line).map(|_| line);
            let _ = tx.send(result);
        });
        match rx.recv_timeout(timeout) {
            Ok(Ok(line)) => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
            Ok(Err(e)) => Err(CliError::Io(e)),
            Err(_) => {
                eprintln!();
                Ok(None)
            }
        }
    }
}

/// Terminal raw mode, left on drop.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// What a key press does to a hidden entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SecretInput {
    Pending,
    Done,
    Cancelled,
}

fn apply_key(secret: &mut String, key: KeyEvent) -> SecretInput {
    if key.kind != KeyEventKind::Press {
        return SecretInput::Pending;
    }
    match key.code {
        KeyCode::Enter => SecretInput::Done,
        KeyCode::Char('c' | 'd') if key.modifiers.contains(KeyModifiers::CONTROL) => SecretInput::Cancelled,
        KeyCode::Esc => SecretInput::Cancelled,
        KeyCode::Backspace => {
            secret.pop();
            SecretInput::Pending
        }
        KeyCode::Char(c) => {
            secret.push(c);
            SecretInput::Pending
        }
        _ => SecretInput::Pending,
    }
}

/// Collects key presses until Enter; must run in raw mode.
fn read_hidden() -> Result<String, CliError> {
    let mut secret = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        match apply_key(&mut secret, key) {
            SecretInput::Pending => {}
            SecretInput::Done => return Ok(secret),
            SecretInput::Cancelled => {
                return Err(CliError::Confirmation("Password entry cancelled".to_string()));
            }
        }
    }
}

/// Prompt that replays canned answers and records what was asked.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Option<String>>,
    asked: Vec<String>,
    hidden: usize,
}

#[cfg(any(test, feature = "testing"))]
impl ScriptedPrompt {
    /// Creates a prompt that answers with `answers` in order.
    #[must_use]
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(|a| Some(a.into())).collect(),
            asked: Vec::new(),
            hidden: 0,
        }
    }

    /// Queues a timed-out answer.
    #[must_use]
    pub fn then_timeout(mut self) -> Self {
        self.answers.push_back(None);
        self
    }

    /// Messages shown so far.
    #[must_use]
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// How many of the answers were read without echo.
    #[must_use]
    pub const fn hidden(&self) -> usize {
        self.hidden
    }

    fn next(&mut self, message: &str) -> Result<Option<String>, CliError> {
        self.asked.push(message.to_string());
        self.answers.pop_front().ok_or_else(|| {
            CliError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer left"))
        })
    }
}

#[cfg(any(test, feature = "testing"))]
impl Prompt for ScriptedPrompt {
    fn read_line(&mut self, message: &str) -> Result<String, CliError> {
        Ok(self.next(message)?.unwrap_or_default())
    }

    fn read_secret(&mut self, message: &str) -> Result<String, CliError> {
        self.hidden += 1;
        self.read_line(message)
    }

    fn read_line_timeout(&mut self, message: &str, _timeout: Duration) -> Result<Option<String>, CliError> {
        self.next(message)
    }
}

/// Returns the base64-encoded password from `value`, or asks for it twice.
pub fn password_or_prompt(
    prompt: &mut dyn Prompt,
    value: Option<&str>,
    label: &str,
) -> Result<String, CliError> {
    if let Some(value) = value {
        return Ok(encode_password(value));
    }
    for _ in 0..PASSWORD_ATTEMPTS {
        let first = prompt.read_secret(&format!("Enter the {label} password: "))?;
        if first.is_empty() {
            eprintln!("Password cannot be empty");
            continue;
        }
        let second = prompt.read_secret(&format!("Re-enter {label} password to confirm: "))?;
        if first == second {
            return Ok(encode_password(&first));
        }
        eprintln!("Passwords did not match");
    }
    Err(CliError::invalid(format!(
        "No valid {label} password entered after {PASSWORD_ATTEMPTS} attempts"
    )))
}

/// Confirmation gate for destructive commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    enabled: bool,
    timeout: Duration,
}

impl Confirmation {
    /// Creates a gate.
    #[must_use]
    pub const fn new(enabled: bool, timeout: Duration) -> Self {
        Self { enabled, timeout }
    }

    /// A gate that never asks.
    #[must_use]
    pub const fn disabled() -> Self {
        Self::new(false, Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS))
    }

    /// Enabled when `CLI_CONFIRMATIONS=enabled`.
    #[must_use]
    pub fn from_env(timeout: Duration) -> Self {
        let enabled = std::env::var(CONFIRMATIONS_ENV)
            .is_ok_and(|value| value.trim().eq_ignore_ascii_case("enabled"));
        Self::new(enabled, timeout)
    }

    /// True when prompts are shown.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Asks the user to type `yes` before `action` proceeds.
    ///
    /// Passes straight through when disabled or when `skip` (`--yes`) is set.
    pub fn require(&self, prompt: &mut dyn Prompt, action: &str, skip: bool) -> Result<(), CliError> {
        if !self.enabled || skip {
            return Ok(());
        }
        let secs = self.timeout.as_secs();
        let message = format!(
            "WARNING: This will {action}.\nType 'yes' to continue (times out in {secs}s): "
        );
        match prompt.read_line_timeout(&message, self.timeout)? {
            Some(answer) if answer.trim() == "yes" => {
                debug!(action, "confirmed");
                Ok(())
            }
            Some(_) => Err(CliError::Confirmation("Operation cancelled by the user".to_string())),
            None => Err(CliError::Confirmation(format!(
                "No confirmation received within {secs} seconds, operation cancelled"
            ))),
        }
    }
}

impl Default for Confirmation {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn enabled() -> Confirmation {
        Confirmation::new(true, Duration::from_secs(1))
    }

    #[test]
    fn flag_value_is_encoded_without_prompting() {
        let mut prompt = ScriptedPrompt::default();
        let encoded = password_or_prompt(&mut prompt, Some("St8rlingX*"), "sysadmin").expect("ok");
        assert_eq!(encoded, "U3Q4cmxpbmdYKg==");
        assert!(prompt.asked().is_empty());
    }

    #[test]
    fn prompted_password_needs_matching_reentry() {
        let mut prompt = ScriptedPrompt::new(["first", "other", "secret", "secret"]);
        let encoded = password_or_prompt(&mut prompt, None, "sysadmin").expect("ok");
        assert_eq!(encoded, encode_password("secret"));
        assert_eq!(prompt.asked().len(), 4);
        assert_eq!(prompt.hidden(), 4);
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn hidden_entry_edits_and_finishes_on_enter() {
        let mut secret = String::new();
        for c in "pw0x".chars() {
            assert_eq!(apply_key(&mut secret, key(KeyCode::Char(c))), SecretInput::Pending);
        }
        apply_key(&mut secret, key(KeyCode::Backspace));
        apply_key(&mut secret, key(KeyCode::Char('d')));
        assert_eq!(apply_key(&mut secret, key(KeyCode::Enter)), SecretInput::Done);
        assert_eq!(secret, "pw0d");
    }

    #[test]
    fn hidden_entry_ignores_releases_and_cancels_on_ctrl_c() {
        let mut secret = String::new();
        let mut release = key(KeyCode::Char('x'));
        release.kind = KeyEventKind::Release;
        assert_eq!(apply_key(&mut secret, release), SecretInput::Pending);
        assert!(secret.is_empty());

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(apply_key(&mut secret, ctrl_c), SecretInput::Cancelled);
        assert_eq!(apply_key(&mut secret, key(KeyCode::Esc)), SecretInput::Cancelled);
    }

    #[test]
    fn prompt_gives_up_after_attempts() {
        let mut prompt = ScriptedPrompt::new(["a", "b", "c", "d", "e", "f"]);
        let err = password_or_prompt(&mut prompt, None, "bmc").expect_err("mismatch");
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[test_case("yes", true ; "yes proceeds")]
    #[test_case("  yes  ", true ; "surrounding whitespace ignored")]
    #[test_case("y", false ; "y is not enough")]
    #[test_case("YES", false ; "case sensitive")]
    #[test_case("", false ; "empty cancels")]
    fn only_yes_confirms(answer: &str, proceeds: bool) {
        let mut prompt = ScriptedPrompt::new([answer]);
        let result = enabled().require(&mut prompt, "delete subcloud1", false);
        assert_eq!(result.is_ok(), proceeds);
    }

    #[test]
    fn timeout_cancels() {
        let mut prompt = ScriptedPrompt::default().then_timeout();
        let err = enabled().require(&mut prompt, "delete subcloud1", false).expect_err("timeout");
        assert!(matches!(err, CliError::Confirmation(_)));
        assert!(err.to_string().contains("1 seconds"));
    }

    #[test]
    fn skip_and_disabled_never_ask() {
        let mut prompt = ScriptedPrompt::default();
        enabled().require(&mut prompt, "delete", true).expect("skipped");
        Confirmation::disabled().require(&mut prompt, "delete", false).expect("disabled");
        assert!(prompt.asked().is_empty());
    }
}
