use crate::config::{AdminCommand, AdminSecret};
use crate::domain::message::{Message, MessageFilter, MessageStats, Page};
use crate::error::AppError;
use crate::services::auth_service::AdminAuthenticator;
use crate::services::contact_service::ContactService;
use std::io::{self, BufRead, Write};
use time::OffsetDateTime;
use time::macros::format_description;

const BODY_PREVIEW_CHARS: usize = 50;
const REPLY_PREVIEW_CHARS: usize = 30;

/// Checks the operator's admin password before any admin command runs.
///
/// Uses `password` when given; otherwise writes a prompt to `prompt` and reads one line from `input`.
///
/// # Errors
/// Returns an error if admin access is disabled, reading the password fails, or it does not match.
pub fn authorize(
    auth: &AdminAuthenticator,
    password: Option<&AdminSecret>,
    input: &mut impl BufRead,
    prompt: &mut impl Write,
) -> anyhow::Result<()> {
    if !auth.is_enabled() {
        anyhow::bail!("CONTACT_ADMIN_PASSWORD is not set; admin commands are disabled");
    }

    let presented = if let Some(secret) = password {
        secret.expose().to_string()
    } else {
        write!(prompt, "Admin password: ")?;
        prompt.flush()?;
        let mut line = String::new();
        input.read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_string()
    };

    if !auth.verify(&presented) {
        tracing::warn!("Admin CLI authentication failed");
        anyhow::bail!("Invalid admin password");
    }
    Ok(())
}

/// Runs one admin command against the store and writes the result to `out`.
///
/// # Errors
/// Returns an error if the store operation fails, the key is unknown, or
/// writing to `out` fails.
pub async fn run_admin(service: &ContactService, command: AdminCommand, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        AdminCommand::List { public, private, replied, pending } => {
            let filter = MessageFilter {
                is_public: flag_pair(public, private),
                replied: flag_pair(replied, pending),
            };
            let messages = service.list_messages(filter, Page::default()).await?;
            write_table(out, &messages)?;
        }
        AdminCommand::View { key } => {
            let message = service.get_message(&key).await.map_err(describe)?;
            write_detail(out, &message)?;
        }
        AdminCommand::Reply { key, text } => {
            let reply = service.reply(&key, &text).await.map_err(describe)?;
            writeln!(out, "Reply stored for {key} at {}", format_timestamp(reply.replied_at))?;
        }
        AdminCommand::Stats => {
            let stats = service.stats().await?;
            write_stats(out, stats)?;
        }
    }
    Ok(())
}

const fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}

fn describe(error: AppError) -> anyhow::Error {
    match error {
        AppError::Validation(errors) => {
            let details: Vec<String> = errors
                .into_iter()
                .flat_map(|(field, messages)| messages.into_iter().map(move |m| format!("{field}: {m}")))
                .collect();
            anyhow::anyhow!("Invalid input: {}", details.join("; "))
        }
        other => other.into(),
    }
}

fn write_table(out: &mut impl Write, messages: &[Message]) -> io::Result<()> {
    if messages.is_empty() {
        return writeln!(out, "No messages found.");
    }

    writeln!(out, "{:<16}  {:<11}  {:<7}  {:<8}  {:<50}  {}", "KEY", "SENT", "VIS", "STATUS", "MESSAGE", "REPLY")?;
    for message in messages {
        let reply = message.reply.as_ref().map_or_else(|| "-".to_string(), |r| preview(&r.body, REPLY_PREVIEW_CHARS));
        writeln!(
            out,
            "{:<16}  {:<11}  {:<7}  {:<8}  {:<50}  {}",
            message.key,
            format_short(message.created_at),
            if message.is_public { "public" } else { "private" },
            if message.is_replied() { "replied" } else { "pending" },
            preview(&message.body, BODY_PREVIEW_CHARS),
            reply,
        )?;
    }
    writeln!(out, "{} message(s)", messages.len())
}

fn write_detail(out: &mut impl Write, message: &Message) -> io::Result<()> {
    writeln!(out, "Key:     {}", message.key)?;
    writeln!(out, "Sent:    {}", format_timestamp(message.created_at))?;
    writeln!(out, "Public:  {}", if message.is_public { "yes" } else { "no" })?;
    writeln!(out, "Status:  {}", if message.is_replied() { "Replied" } else { "Pending" })?;
    writeln!(out)?;
    writeln!(out, "{}", message.body)?;
    if let Some(reply) = &message.reply {
        writeln!(out)?;
        writeln!(out, "Reply ({}):", format_timestamp(reply.replied_at))?;
        writeln!(out, "{}", reply.body)?;
    }
    Ok(())
}

fn write_stats(out: &mut impl Write, stats: MessageStats) -> io::Result<()> {
    writeln!(out, "Total messages:  {}", stats.total)?;
    writeln!(out, "Replied:         {}", stats.replied)?;
    writeln!(out, "Pending:         {}", stats.pending())?;
    writeln!(out, "Public:          {}", stats.public)?;
    writeln!(out, "Private:         {}", stats.private())
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

fn format_short(ts: OffsetDateTime) -> String {
    ts.format(format_description!("[month]/[day] [hour]:[minute]")).unwrap_or_else(|_| ts.to_string())
}

fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| ts.to_string())
}
