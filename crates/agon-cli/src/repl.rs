//! Line-oriented command parsing and event rendering.
//!
//! Statement ids use the canonical `seq,gen` form everywhere, so a user can
//! copy an id straight from the printed graph into a command.

use std::str::FromStr;

use agon_client::session::{SessionCommand, SessionEvent};
use agon_client::view::{GraphView, Pin};
use agon_core::ids::StatementId;
use agon_core::statement::StatementState;

/// One parsed input line.
#[derive(Debug, PartialEq)]
pub enum Input {
    /// A session command to forward.
    Command(SessionCommand),
    /// Print the command reference.
    Help,
    /// Nothing to do.
    Empty,
}

/// Parse one line of user input.
pub fn parse_line(line: &str) -> Result<Input, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Input::Empty);
    }
    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (trimmed, ""),
    };

    let command = match verb {
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" => SessionCommand::Quit,
        "resync" => SessionCommand::Resync,
        "reconnect" => SessionCommand::Reconnect {
            force: matches!(rest, "--force" | "force"),
        },
        "add" => {
            if rest.is_empty() {
                return Err("usage: add <statement>".into());
            }
            SessionCommand::Add {
                statement: rest.into(),
            }
        }
        "delete" => SessionCommand::Delete {
            id: parse_id(rest)?,
        },
        "edit" => {
            let (id, statement) = rest
                .split_once(char::is_whitespace)
                .ok_or("usage: edit <id> <statement>")?;
            SessionCommand::Edit {
                id: parse_id(id)?,
                statement: statement.trim().into(),
            }
        }
        "link" => {
            let (premise, conclusion) = parse_two_ids(rest, "usage: link <premise> <conclusion>")?;
            SessionCommand::Link {
                premise,
                conclusion,
            }
        }
        "unlink" => {
            let (premise, conclusion) =
                parse_two_ids(rest, "usage: unlink <premise> <conclusion>")?;
            SessionCommand::Unlink {
                premise,
                conclusion,
            }
        }
        "prove" => SessionCommand::ProveDirect {
            id: parse_id(rest)?,
        },
        "argue" => SessionCommand::ProveImplication {
            id: parse_id(rest)?,
        },
        "pin" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(id), Some(x), Some(y), None) => SessionCommand::Pin {
                    id: parse_id(id)?,
                    pin: Pin::planar(parse_coord(x)?, parse_coord(y)?),
                },
                _ => return Err("usage: pin <id> <x> <y>".into()),
            }
        }
        "unpin" => SessionCommand::Unpin {
            id: parse_id(rest)?,
        },
        _ => return Err(format!("unknown command `{verb}`, type `help`")),
    };
    Ok(Input::Command(command))
}

fn parse_id(text: &str) -> Result<StatementId, String> {
    StatementId::from_str(text.trim()).map_err(|e| e.to_string())
}

fn parse_two_ids(rest: &str, usage: &str) -> Result<(StatementId, StatementId), String> {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(first), Some(second), None) => Ok((parse_id(first)?, parse_id(second)?)),
        _ => Err(usage.to_string()),
    }
}

fn parse_coord(text: &str) -> Result<f64, String> {
    text.parse()
        .map_err(|_| format!("invalid coordinate `{text}`"))
}

/// Print the command reference.
pub fn print_help() {
    println!("commands:");
    println!("  add <statement>              propose a new statement");
    println!("  edit <id> <statement>        replace a statement's text");
    println!("  delete <id>                  delete a statement and its links");
    println!("  link <premise> <conclusion>  claim the conclusion follows from the premise");
    println!("  unlink <premise> <conclusion>  retract a claimed implication");
    println!("  prove <id>                   ask the judge to accept a standalone fact");
    println!("  argue <id>                   ask the judge to evaluate against premises");
    println!("  pin <id> <x> <y>             hold a node at fixed layout coordinates");
    println!("  unpin <id>                   release a pinned node");
    println!("  resync                       request a fresh snapshot");
    println!("  reconnect [--force]          redial and resync");
    println!("  quit                         close the session");
    println!("ids are printed as seq,gen — e.g. `prove 1,0`");
}

/// Render one session event to stdout.
pub fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Connected => println!("* connected"),
        SessionEvent::Disconnected(info) => {
            if info.reason.is_empty() {
                println!("* disconnected (code {})", info.code);
            } else {
                println!("* disconnected (code {}: {})", info.code, info.reason);
            }
        }
        SessionEvent::TransportFailed(reason) => println!("! transport: {reason}"),
        SessionEvent::GraphUpdated(view) => print_graph(view),
        SessionEvent::NodeAssigned(id) => println!("* new statement id {id}"),
        SessionEvent::JudgeComment {
            id,
            comment,
            success,
        } => {
            let verdict = if *success { "accepted" } else { "rejected" };
            println!("judge on {id} ({verdict}): {comment}");
        }
        SessionEvent::Cooldown { seconds } => {
            println!("* judge cooling down, next prove in {seconds}s");
        }
        SessionEvent::Rejected(rejection) => println!("! rejected: {rejection}"),
        SessionEvent::Won => println!("*** the root statement stands proven ***"),
    }
}

fn print_graph(view: &GraphView) {
    println!("graph: {} statements", view.nodes().len());
    for node in view.nodes() {
        let root = if node.id == view.root() { " (root)" } else { "" };
        println!(
            "  [{}] {} {}{}",
            node.key(),
            state_marker(node.state),
            node.statement,
            root
        );
    }
    if !view.edges().is_empty() {
        println!("  implications (premise -> conclusion):");
        for edge in view.edges() {
            println!("    {} -> {}", edge.target, edge.source);
        }
    }
}

fn state_marker(state: StatementState) -> &'static str {
    match state {
        StatementState::None => "?",
        StatementState::DirectlyProven => "F",
        StatementState::ImpliedProven => "I",
        StatementState::ImpliedUnproven => "x",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_do_nothing() {
        assert_eq!(parse_line("").unwrap(), Input::Empty);
        assert_eq!(parse_line("   \t ").unwrap(), Input::Empty);
    }

    #[test]
    fn help_and_quit() {
        assert_eq!(parse_line("help").unwrap(), Input::Help);
        assert_eq!(parse_line("?").unwrap(), Input::Help);
        assert_eq!(
            parse_line("quit").unwrap(),
            Input::Command(SessionCommand::Quit)
        );
        assert_eq!(
            parse_line("exit").unwrap(),
            Input::Command(SessionCommand::Quit)
        );
    }

    #[test]
    fn add_keeps_the_whole_statement() {
        assert_eq!(
            parse_line("add ships vanish hull-first").unwrap(),
            Input::Command(SessionCommand::Add {
                statement: "ships vanish hull-first".into()
            })
        );
    }

    #[test]
    fn add_requires_text() {
        assert!(parse_line("add").is_err());
        assert!(parse_line("add   ").is_err());
    }

    #[test]
    fn edit_splits_id_from_text() {
        assert_eq!(
            parse_line("edit 1,0 a sharper claim").unwrap(),
            Input::Command(SessionCommand::Edit {
                id: StatementId::new(1, 0),
                statement: "a sharper claim".into()
            })
        );
    }

    #[test]
    fn link_takes_premise_then_conclusion() {
        assert_eq!(
            parse_line("link 1,0 0,0").unwrap(),
            Input::Command(SessionCommand::Link {
                premise: StatementId::new(1, 0),
                conclusion: StatementId::ROOT,
            })
        );
        assert!(parse_line("link 1,0").is_err());
        assert!(parse_line("link 1,0 0,0 2,0").is_err());
    }

    #[test]
    fn prove_and_argue_map_to_the_two_prove_kinds() {
        assert_eq!(
            parse_line("prove 2,1").unwrap(),
            Input::Command(SessionCommand::ProveDirect {
                id: StatementId::new(2, 1)
            })
        );
        assert_eq!(
            parse_line("argue 0,0").unwrap(),
            Input::Command(SessionCommand::ProveImplication {
                id: StatementId::ROOT
            })
        );
    }

    #[test]
    fn pin_parses_coordinates() {
        assert_eq!(
            parse_line("pin 1,0 12.5 -3").unwrap(),
            Input::Command(SessionCommand::Pin {
                id: StatementId::new(1, 0),
                pin: Pin::planar(12.5, -3.0),
            })
        );
        assert!(parse_line("pin 1,0 twelve 3").is_err());
        assert!(parse_line("pin 1,0 1").is_err());
    }

    #[test]
    fn reconnect_force_flag() {
        assert_eq!(
            parse_line("reconnect").unwrap(),
            Input::Command(SessionCommand::Reconnect { force: false })
        );
        assert_eq!(
            parse_line("reconnect --force").unwrap(),
            Input::Command(SessionCommand::Reconnect { force: true })
        );
    }

    #[test]
    fn bad_ids_and_unknown_verbs_are_reported() {
        assert!(parse_line("delete banana").is_err());
        assert!(parse_line("frobnicate 1,0").is_err());
    }
}
