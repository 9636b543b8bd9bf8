//! Operator commands read from the console: `set <phone>`, `all`, `exit`.

use relay_core::DIRECT_SERVER;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::console;
use crate::selector::TargetSelector;

pub const USAGE: &str = "Unknown command. Use 'set <phone>', 'all', or 'exit'.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    /// `set <phone>`; the argument is raw, possibly empty.
    SetTarget(String),
    MonitorAll,
    Exit,
    Unknown(String),
}

/// What the command loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Exit,
}

/// Why the command loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEnd {
    ExitRequested,
    /// Input reached EOF or failed; the relay keeps running without commands.
    Closed,
}

pub fn parse_command(line: &str) -> OperatorCommand {
    let input = line.trim();
    match input {
        "exit" => OperatorCommand::Exit,
        "all" => OperatorCommand::MonitorAll,
        "set" => OperatorCommand::SetTarget(String::new()),
        _ => match input.split_once(char::is_whitespace) {
            Some(("set", phone)) => OperatorCommand::SetTarget(phone.trim().to_string()),
            _ => OperatorCommand::Unknown(input.to_string()),
        },
    }
}

/// Applies a command to the selector and prints the operator feedback.
pub async fn apply_command(command: OperatorCommand, selector: &TargetSelector) -> CommandOutcome {
    match command {
        OperatorCommand::Exit => {
            info!("Exit requested by operator");
            return CommandOutcome::Exit;
        }
        OperatorCommand::MonitorAll => {
            selector.set_all().await;
            println!("Now monitoring ALL messages.");
        }
        OperatorCommand::SetTarget(phone) if phone.is_empty() => {
            println!("Error: Please provide a phone number.");
        }
        OperatorCommand::SetTarget(phone) => match selector.set_specific(&phone).await {
            Ok(partner) => {
                println!(
                    "Target updated! Now monitoring: {}@{}",
                    partner, DIRECT_SERVER
                );
            }
            Err(e) => println!("Error: {}", e),
        },
        OperatorCommand::Unknown(_) => println!("{}", USAGE),
    }
    CommandOutcome::Continue
}

/// Reads commands line by line until `exit` or end of input.
pub async fn run_command_loop<R>(reader: R, selector: TargetSelector) -> InputEnd
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        console::prompt();
        match lines.next_line().await {
            Ok(Some(line)) => {
                if apply_command(parse_command(&line), &selector).await == CommandOutcome::Exit {
                    return InputEnd::ExitRequested;
                }
            }
            Ok(None) => {
                info!("Command input closed");
                return InputEnd::Closed;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read command input");
                return InputEnd::Closed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::TargetMode;
    use relay_core::CanonicalId;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("exit"), OperatorCommand::Exit);
        assert_eq!(parse_command("  all \n"), OperatorCommand::MonitorAll);
        assert_eq!(
            parse_command("set 919800000001"),
            OperatorCommand::SetTarget("919800000001".to_string())
        );
        assert_eq!(
            parse_command("set\t919800000001"),
            OperatorCommand::SetTarget("919800000001".to_string())
        );
        assert_eq!(
            parse_command("settle 1"),
            OperatorCommand::Unknown("settle 1".to_string())
        );
        assert_eq!(
            parse_command("show"),
            OperatorCommand::Unknown("show".to_string())
        );
        assert_eq!(parse_command(""), OperatorCommand::Unknown(String::new()));
    }

    #[test]
    fn test_bare_set_asks_for_phone() {
        assert_eq!(parse_command("set"), OperatorCommand::SetTarget(String::new()));
        assert_eq!(
            parse_command("  set    \n"),
            OperatorCommand::SetTarget(String::new())
        );
    }

    #[tokio::test]
    async fn test_apply_set_and_all() {
        let selector = TargetSelector::new();

        let outcome = apply_command(parse_command("set +91 9800000001"), &selector).await;
        assert_eq!(outcome, CommandOutcome::Continue);
        assert_eq!(
            selector.current().await,
            TargetMode::Specific(CanonicalId::from("919800000001"))
        );

        apply_command(parse_command("all"), &selector).await;
        assert_eq!(selector.current().await, TargetMode::All);
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_commands_change_nothing() {
        let selector = TargetSelector::new();
        selector.set_specific("919800000001").await.unwrap();

        apply_command(parse_command("monitor 1"), &selector).await;
        apply_command(parse_command("set"), &selector).await;
        apply_command(parse_command("set abc"), &selector).await;

        assert_eq!(
            selector.current().await,
            TargetMode::Specific(CanonicalId::from("919800000001"))
        );
    }

    #[tokio::test]
    async fn test_command_loop_stops_on_exit() {
        let selector = TargetSelector::new();
        let input: &[u8] = b"set 919800000001\nexit\nall\n";

        let end = run_command_loop(input, selector.clone()).await;

        assert_eq!(end, InputEnd::ExitRequested);
        assert_eq!(
            selector.current().await,
            TargetMode::Specific(CanonicalId::from("919800000001"))
        );
    }

    #[tokio::test]
    async fn test_command_loop_reports_closed_input() {
        let input: &[u8] = b"all\n";
        assert_eq!(
            run_command_loop(input, TargetSelector::new()).await,
            InputEnd::Closed
        );
    }
}
