#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::needless_pass_by_value,
    clippy::redundant_closure_for_method_calls,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use switchboard::controller::{ConfigController, FieldLocks, SessionState};
use switchboard::document::{get_path, parse_path};
use switchboard::forms::split_list;
use switchboard::transport::HttpTransport;
use switchboard::util::{mask_secret_fields, secret_display};
use switchboard::ConfigCommands;

/// `Switchboard` - edit, validate, and apply gateway channel configuration.
#[derive(Parser, Debug)]
#[command(name = "switchboard")]
#[command(version)]
#[command(about = "Configuration companion for the messaging gateway.", long_about = None)]
struct Cli {
    /// Gateway control-plane base URL
    #[arg(
        long,
        global = true,
        env = "SWITCHBOARD_URL",
        default_value = "http://127.0.0.1:42617"
    )]
    url: String,

    /// Bearer token for the gateway control plane
    #[arg(long, global = true, env = "SWITCHBOARD_TOKEN")]
    token: Option<String>,

    /// Session key reported to the gateway on apply and update
    #[arg(long, global = true, env = "SWITCHBOARD_SESSION_KEY")]
    session_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect and edit the gateway configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Fetch the configuration schema and rendering hints
    Schema,
    /// Trigger the gateway self-update
    Update {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging - respects RUST_LOG env var, defaults to INFO
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let session_key = cli
        .session_key
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let transport = Arc::new(HttpTransport::new(cli.url, cli.token)?);
    // Lock hints read this process's environment; they match the gateway's
    // only when both share a host.
    let controller =
        ConfigController::new(transport, session_key).with_locks(FieldLocks::from_env());

    match cli.command {
        Commands::Config { command } => run_config(&controller, command).await,
        Commands::Schema => run_schema(&controller).await,
        Commands::Update { yes } => run_update(&controller, yes).await,
    }
}

async fn run_config(controller: &ConfigController, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show { json } => {
            let session = load_session(controller).await?;
            if json {
                let output = json!({
                    "valid": session.valid,
                    "issues": session.issues,
                    "mode": session.edit.mode(),
                    "dirty": session.edit.dirty(),
                    "raw": mask_secret_fields(&session.raw),
                    "forms": session.forms,
                });
                let text = serde_json::to_string_pretty(&output)?;
                println!("{}", mask_secret_fields(&text));
            } else {
                print_summary(&session, controller.locks());
            }
            Ok(())
        }
        ConfigCommands::Raw { reveal } => {
            let session = load_session(controller).await?;
            if reveal {
                println!("{}", session.raw);
            } else {
                println!("{}", mask_secret_fields(&session.raw));
            }
            Ok(())
        }
        ConfigCommands::Get { path } => {
            let session = load_session(controller).await?;
            let segments = parse_path(&path)?;
            let document = session.local_form.unwrap_or(Value::Null);
            match get_path(&document, &segments) {
                Some(Value::String(s)) => println!("{s}"),
                Some(value) => println!("{}", serde_json::to_string_pretty(value)?),
                None => bail!("no value at {path}"),
            }
            Ok(())
        }
        ConfigCommands::Set {
            path,
            value,
            list,
            apply,
        } => {
            load_session(controller).await?;
            let segments = parse_path(&path)?;
            controller.set_value(&segments, parse_value(&value, list))?;
            submit(controller, apply).await
        }
        ConfigCommands::Unset { path, apply } => {
            load_session(controller).await?;
            let segments = parse_path(&path)?;
            if !controller.remove_value(&segments)? {
                println!("Nothing stored at {path}; submitting the document unchanged.");
            }
            submit(controller, apply).await
        }
        ConfigCommands::Apply { yes } => {
            let session = load_session(controller).await?;
            if session.valid == Some(false) {
                println!(
                    "Warning: the gateway reports the current config INVALID ({} issue(s)).",
                    session.issues.len()
                );
            }
            if !yes && !confirm("Apply configuration and restart affected channels?")? {
                println!("Aborted.");
                return Ok(());
            }
            submit(controller, true).await
        }
    }
}

async fn run_schema(controller: &ConfigController) -> Result<()> {
    controller.load_schema().await;
    let session = controller.session();
    if let Some(err) = &session.last_error {
        bail!("fetching schema failed: {err}");
    }
    match &session.schema.version {
        Some(version) => println!("Schema version: {version}"),
        None => println!("Schema version: (unversioned)"),
    }
    match &session.schema.schema {
        Some(schema) => println!("{}", serde_json::to_string_pretty(schema)?),
        None => println!("No schema payload."),
    }
    Ok(())
}

async fn run_update(controller: &ConfigController, yes: bool) -> Result<()> {
    if !yes
        && !confirm("Trigger the gateway self-update? The gateway restarts if it succeeds.")?
    {
        println!("Aborted.");
        return Ok(());
    }
    controller.run_update().await;
    if let Some(err) = &controller.session().last_error {
        bail!("update failed: {err}");
    }
    println!("Update accepted.");
    Ok(())
}

/// Load the gateway snapshot into the session, turning a recorded load
/// failure into a hard error for one-shot commands.
async fn load_session(controller: &ConfigController) -> Result<SessionState> {
    controller.load().await;
    let session = controller.session();
    if let Some(err) = &session.last_error {
        bail!("loading configuration failed: {err}");
    }
    Ok(session)
}

/// Save or apply the session, then report the outcome. A failed submission
/// leaves the session dirty; a submission whose follow-up refresh failed is
/// still a success.
async fn submit(controller: &ConfigController, apply: bool) -> Result<()> {
    let verb = if apply { "apply" } else { "save" };
    if apply {
        controller.apply().await;
    } else {
        controller.save().await;
    }
    let session = controller.session();
    if let Some(err) = &session.last_error {
        if session.edit.dirty() {
            bail!("{verb} failed: {err}");
        }
        warn!("configuration stored, but the follow-up refresh failed: {err}");
    }
    match session.valid {
        Some(false) => println!(
            "Stored, but the gateway reports the config INVALID ({} issue(s)).",
            session.issues.len()
        ),
        _ => println!("{}", if apply { "Applied." } else { "Saved." }),
    }
    Ok(())
}

fn parse_value(input: &str, list: bool) -> Value {
    if list {
        return Value::Array(split_list(input).into_iter().map(Value::String).collect());
    }
    // Bare strings are accepted verbatim; everything JSON-shaped is stored typed.
    serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()))
}

fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

fn print_summary(session: &SessionState, locks: FieldLocks) {
    match session.valid {
        Some(true) => println!("Config valid."),
        Some(false) => println!("Config INVALID, {} issue(s):", session.issues.len()),
        None => println!("Config validity unknown."),
    }
    for issue in &session.issues {
        println!("  - {issue}");
    }
    println!(
        "Mode: {}{}",
        session.edit.mode(),
        if session.edit.dirty() {
            " (unsaved edits)"
        } else {
            ""
        }
    );

    let telegram = &session.forms.telegram;
    println!();
    println!("Telegram");
    if let Some(status) = &session.statuses.telegram {
        println!("  status: {status}");
    }
    println!(
        "  token: {}",
        secret_display(&telegram.token, locks.telegram_token)
    );
    println!(
        "  group default: {}, mention required: {}",
        if telegram.groups_wildcard_enabled {
            "configured"
        } else {
            "absent"
        },
        telegram.require_mention
    );
    println!("  allowFrom: {}", field(&telegram.allow_from));
    if !telegram.webhook_url.is_empty() {
        println!("  webhook: {}", telegram.webhook_url);
    }
    if !telegram.proxy.is_empty() {
        println!("  proxy: {}", telegram.proxy);
    }

    let discord = &session.forms.discord;
    println!();
    println!("Discord");
    if let Some(status) = &session.statuses.discord {
        println!("  status: {status}");
    }
    println!("  enabled: {}", discord.enabled);
    println!(
        "  token: {}",
        secret_display(&discord.token, locks.discord_token)
    );
    println!(
        "  dm: enabled {}, allowFrom {}",
        discord.dm_enabled,
        field(&discord.allow_from)
    );
    println!("  replyTo: {}", discord.reply_to_mode);
    println!("  guilds: {}", discord.guilds.len());
    println!(
        "  slash command: {}",
        if discord.slash_enabled {
            field(&discord.slash_name)
        } else {
            "disabled"
        }
    );

    let slack = &session.forms.slack;
    println!();
    println!("Slack");
    if let Some(status) = &session.statuses.slack {
        println!("  status: {status}");
    }
    println!("  enabled: {}", slack.enabled);
    println!(
        "  botToken: {}",
        secret_display(&slack.bot_token, locks.slack_bot_token)
    );
    println!(
        "  appToken: {}",
        secret_display(&slack.app_token, locks.slack_app_token)
    );
    println!("  reactionNotifications: {}", slack.reaction_notifications);
    println!("  channels: {}", slack.channels.len());

    let signal = &session.forms.signal;
    println!();
    println!("Signal");
    if let Some(status) = &session.statuses.signal {
        println!("  status: {status}");
    }
    println!("  enabled: {}", signal.enabled);
    println!("  account: {}", field(&signal.account));
    if signal.http_url.is_empty() {
        println!(
            "  endpoint: {}:{}",
            field(&signal.http_host),
            field(&signal.http_port)
        );
    } else {
        println!("  endpoint: {}", signal.http_url);
    }
    println!(
        "  autoStart: {}, receiveMode: {}",
        signal.auto_start,
        field(&signal.receive_mode)
    );

    let imessage = &session.forms.imessage;
    println!();
    println!("iMessage");
    if let Some(status) = &session.statuses.imessage {
        println!("  status: {status}");
    }
    println!("  enabled: {}", imessage.enabled);
    println!("  service: {}", imessage.service);
    println!("  cliPath: {}", field(&imessage.cli_path));
    println!("  allowFrom: {}", field(&imessage.allow_from));
}

fn field(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}
