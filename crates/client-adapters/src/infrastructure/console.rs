//! Terminal notices and confirmation

use std::io::{self, BufRead, Write};

use async_trait::async_trait;

use worldloom_ports::outbound::{ConfirmationPort, Notice, NoticeLevel, NotificationPort};

/// Prints notices to stderr and mirrors them into the trace log
#[derive(Clone, Default)]
pub struct ConsoleNotifier;

impl NotificationPort for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let tag = match notice.level {
            NoticeLevel::Success => {
                tracing::debug!(notice = %notice.message, "Success notice");
                "ok"
            }
            NoticeLevel::Info => {
                tracing::debug!(notice = %notice.message, "Info notice");
                "info"
            }
            NoticeLevel::Error => {
                tracing::debug!(notice = %notice.message, "Error notice");
                "error"
            }
        };
        eprintln!("[{}] {}", tag, notice.message);
    }
}

/// Asks on stderr and reads a y/N answer from stdin
#[derive(Clone, Default)]
pub struct StdinConfirmation;

#[async_trait]
impl ConfirmationPort for StdinConfirmation {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            eprint!("{} [y/N] ", prompt);
            let _ = io::stderr().flush();

            let mut line = String::new();
            match io::stdin().lock().read_line(&mut line) {
                Ok(_) => is_yes(&line),
                Err(e) => {
                    tracing::warn!("Failed to read confirmation: {}", e);
                    false
                }
            }
        })
        .await;

        answer.unwrap_or(false)
    }
}

/// Accepts every prompt (`--yes`)
#[derive(Clone, Default)]
pub struct AutoConfirm;

#[async_trait]
impl ConfirmationPort for AutoConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!(prompt, "Auto-confirmed");
        true
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }

    #[tokio::test]
    async fn auto_confirm_accepts() {
        assert!(AutoConfirm.confirm("Delete?").await);
    }
}
