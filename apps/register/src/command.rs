//! # Operator Commands
//!
//! One command per stdin line. Each maps onto a single `Register` call.
//!
//! ```text
//! add <ref> [qty]      dec <ref>         rm <ref>        clear
//! reward               phone <digits>    pay cash|upi    catalog
//! checkout             nudge top|bottom|shift|scale <delta>
//! reset-layout         confirm           cancel          reprint
//! done                 drain             status          points
//! quit
//! ```

use std::str::FromStr;

use ridepass_core::{PaymentMode, TicketLayout};
use ridepass_sync::{DrainOutcome, LayoutNudge, Register, SubmissionOutcome};
use tracing::{info, warn};

use crate::error::{OperatorError, ParseError};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add { product_ref: String, qty: i64 },
    Dec { product_ref: String },
    Remove { product_ref: String },
    Clear,
    Reward,
    Phone(String),
    Pay(PaymentMode),
    Catalog,
    Checkout,
    Nudge(LayoutNudge),
    ResetLayout,
    Confirm,
    Cancel,
    Reprint,
    Done,
    Drain,
    Status,
    Points,
    Quit,
}

fn number<T: FromStr>(raw: &str) -> Result<T, ParseError> {
    raw.parse()
        .map_err(|_| ParseError::NotANumber(raw.to_string()))
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(ParseError::Usage("<command> [args]"));
        };
        let args: Vec<&str> = words.collect();

        let cmd = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("add", [r]) => Command::Add {
                product_ref: r.to_string(),
                qty: 1,
            },
            ("add", [r, q]) => Command::Add {
                product_ref: r.to_string(),
                qty: number(q)?,
            },
            ("add", _) => return Err(ParseError::Usage("add <ref> [qty]")),
            ("dec", [r]) => Command::Dec {
                product_ref: r.to_string(),
            },
            ("dec", _) => return Err(ParseError::Usage("dec <ref>")),
            ("rm", [r]) => Command::Remove {
                product_ref: r.to_string(),
            },
            ("rm", _) => return Err(ParseError::Usage("rm <ref>")),
            ("clear", []) => Command::Clear,
            ("reward", []) => Command::Reward,
            // `phone` alone clears the number
            ("phone", []) => Command::Phone(String::new()),
            ("phone", [p]) => Command::Phone(p.to_string()),
            ("pay", [m]) => Command::Pay(PaymentMode::parse(m).ok_or(ParseError::Usage("pay cash|upi"))?),
            ("pay", _) => return Err(ParseError::Usage("pay cash|upi")),
            ("catalog", []) => Command::Catalog,
            ("checkout", []) => Command::Checkout,
            ("nudge", [axis, delta]) => {
                let d: f64 = number(delta)?;
                Command::Nudge(match *axis {
                    "top" => LayoutNudge::Top(d),
                    "bottom" => LayoutNudge::Bottom(d),
                    "shift" => LayoutNudge::Shift(d),
                    "scale" => LayoutNudge::Scale(d),
                    _ => return Err(ParseError::Usage("nudge top|bottom|shift|scale <delta>")),
                })
            }
            ("nudge", _) => return Err(ParseError::Usage("nudge top|bottom|shift|scale <delta>")),
            ("reset-layout", []) => Command::ResetLayout,
            ("confirm", []) => Command::Confirm,
            ("cancel", []) => Command::Cancel,
            ("reprint", []) => Command::Reprint,
            ("done", []) => Command::Done,
            ("drain", []) => Command::Drain,
            ("status", []) => Command::Status,
            ("points", []) => Command::Points,
            ("quit" | "exit", []) => Command::Quit,
            _ => return Err(ParseError::UnknownCommand(line.trim().to_string())),
        };
        Ok(cmd)
    }
}

// =============================================================================
// Execution
// =============================================================================

/// Runs `cmd` and returns the text shown to the operator.
pub async fn execute(
    register: &mut Register,
    cmd: Command,
    paper_width_chars: usize,
) -> Result<String, OperatorError> {
    let reply = match cmd {
        Command::Add { product_ref, qty } => {
            register.add_item(&product_ref, qty)?;
            cart_summary(register)
        }
        Command::Dec { product_ref } => {
            register.change_quantity(&product_ref, -1)?;
            cart_summary(register)
        }
        Command::Remove { product_ref } => {
            register.remove_item(&product_ref)?;
            cart_summary(register)
        }
        Command::Clear => {
            register.clear_cart()?;
            cart_summary(register)
        }
        Command::Reward => {
            if register.add_reward()? {
                cart_summary(register)
            } else {
                "Reward already in cart".to_string()
            }
        }
        Command::Phone(phone) => {
            register.set_phone(&phone)?;
            match register.phone() {
                Some(p) => format!("Phone {p}"),
                None => "Phone cleared".to_string(),
            }
        }
        Command::Pay(mode) => {
            register.set_payment_mode(mode)?;
            format!("Payment {mode}")
        }
        Command::Catalog => register
            .catalog()
            .items()
            .iter()
            .map(|item| format!("{:>6}  {:<24} {}", item.product.id, item.product.name, item.product.price))
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Checkout => {
            let preview = register.checkout()?;
            render(&preview, paper_width_chars)
        }
        Command::Nudge(nudge) => {
            let settings = register.nudge(nudge).await?;
            match register.preview() {
                Some(preview) => render(&preview, paper_width_chars),
                None => format!("{settings:?}"),
            }
        }
        Command::ResetLayout => format!("{:?}", register.reset_layout().await?),
        Command::Confirm => {
            let submission = register.confirm().await?;
            spawn_outcome_log(submission.bundle.transaction_id().to_string(), submission.task);
            format!(
                "Printed {} ({} tickets, total {})",
                submission.bundle.transaction_id(),
                submission.layout.pages.len(),
                submission.bundle.total()
            )
        }
        Command::Cancel => {
            register.cancel()?;
            cart_summary(register)
        }
        Command::Reprint => {
            let submission = register.reprint().await?;
            spawn_outcome_log(submission.bundle.transaction_id().to_string(), submission.task);
            format!("Reprinted as {}", submission.bundle.transaction_id())
        }
        Command::Done => {
            register.done()?;
            "Ready".to_string()
        }
        Command::Drain => match register.sync().drain().await {
            DrainOutcome::Drained { count, remaining } => {
                format!("Drained {count} tickets, {remaining} pending")
            }
            DrainOutcome::Failed { error, pending } => {
                format!("Drain failed: {error} ({pending} pending)")
            }
            DrainOutcome::Skipped(reason) => format!("Drain skipped: {reason:?}"),
        },
        Command::Status => {
            let status = register.sync().status();
            format!(
                "state={} online={} pending={} draining={}{}",
                register.state(),
                status.online,
                status.pending_count,
                status.draining,
                status
                    .last_error
                    .map(|e| format!(" last_error={e}"))
                    .unwrap_or_default()
            )
        }
        Command::Points => match register.lookup_points().await {
            Some(points) => format!("{points} points"),
            None => "Points unavailable".to_string(),
        },
        Command::Quit => String::new(),
    };
    Ok(reply)
}

fn cart_summary(register: &Register) -> String {
    let cart = register.cart();
    if cart.is_empty() {
        return "Cart empty".to_string();
    }
    let mut lines: Vec<String> = cart
        .lines()
        .iter()
        .map(|l| format!("{:>3} x {:<24} {}", l.quantity, l.display_name, l.line_total()))
        .collect();
    lines.push(format!("Total {}", cart.total()));
    lines.join("\n")
}

fn render(layout: &TicketLayout, paper_width_chars: usize) -> String {
    layout.to_text(paper_width_chars)
}

/// Logs the background submission result without holding up the prompt.
fn spawn_outcome_log(transaction_id: String, task: tokio::task::JoinHandle<SubmissionOutcome>) {
    tokio::spawn(async move {
        match task.await {
            Ok(outcome) => info!(%transaction_id, ?outcome, "Submission finished"),
            Err(e) => warn!(%transaction_id, error = %e, "Submission task failed"),
        }
    });
}
