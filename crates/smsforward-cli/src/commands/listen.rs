use crate::commands::Context;
use crate::error::{invalid_input, not_found};
use crate::notify::{notifier_for, FAILURE_TITLE};
use anyhow::Result;
use clap::Args;
use smsforward_config::TransportConfig;
use smsforward_core::{
    ForwardEngine, ForwardFailure, InboundMessage, ListenerControl, OutgoingMessage, SmsTransport,
    TransportError,
};
#[cfg(feature = "http-gateway")]
use smsforward_transport::HttpTransport;
use smsforward_transport::{
    CommandTransport, InboundReader, ListenerSwitch, OutboxTransport, Relay, RelayStats,
};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Args)]
pub struct ListenArgs {
    /// Read inbound messages from a file instead of stdin
    #[arg(long)]
    pub input: Option<PathBuf>,
}

enum ConfiguredTransport {
    Outbox(OutboxTransport<io::Stdout>),
    Command(CommandTransport),
    #[cfg(feature = "http-gateway")]
    Http(HttpTransport),
}

impl ConfiguredTransport {
    fn from_config(config: &TransportConfig) -> Result<Self> {
        match config {
            TransportConfig::Stdout => Ok(Self::Outbox(OutboxTransport::stdout())),
            TransportConfig::Command {
                argv,
                timeout_seconds,
            } => Ok(Self::Command(CommandTransport::new(
                argv,
                Duration::from_secs(*timeout_seconds),
            )?)),
            #[cfg(feature = "http-gateway")]
            TransportConfig::Http {
                url,
                timeout_seconds,
            } => Ok(Self::Http(HttpTransport::new(
                url,
                Duration::from_secs(*timeout_seconds),
            )?)),
            #[cfg(not(feature = "http-gateway"))]
            TransportConfig::Http { .. } => Err(invalid_input(
                "http transport requires the http-gateway feature",
            )),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Outbox(_) => "stdout",
            Self::Command(_) => "command",
            #[cfg(feature = "http-gateway")]
            Self::Http(_) => "http",
        }
    }
}

impl SmsTransport for ConfiguredTransport {
    fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        match self {
            Self::Outbox(transport) => transport.send(message),
            Self::Command(transport) => transport.send(message),
            #[cfg(feature = "http-gateway")]
            Self::Http(transport) => transport.send(message),
        }
    }
}

pub fn listen(ctx: &Context<'_>, args: ListenArgs) -> Result<()> {
    let rules = ctx.store.rules();
    let armed = rules.load()?.is_some_and(|rule| rule.activated);
    if !armed {
        return Err(not_found(
            "no armed forwarding rule; run `smsforward activate` first",
        ));
    }

    let transport = ConfiguredTransport::from_config(&ctx.config.transport)?;
    let notifier = notifier_for(&ctx.config.notifications)?;
    debug!(transport = transport.name(), "relay starting");

    let engine = ForwardEngine::new(&rules, &transport, ctx.region)
        .with_own_number(ctx.own_number.clone());
    let switch = ListenerSwitch::new();
    switch.start_listening();
    let mut relay = Relay::new(&engine, &switch);

    let on_failure = |message: &InboundMessage, failure: &ForwardFailure| {
        let Some(notifier) = notifier.as_ref() else {
            return;
        };
        let body = format!("{}: {failure}", message.sender);
        if let Err(err) = notifier.send(FAILURE_TITLE, &body) {
            warn!(error = %err, "notification failed");
        }
    };

    let stats = match args.input {
        Some(path) => {
            let file = File::open(&path).map_err(|err| {
                invalid_input(format!("cannot open input {}: {err}", path.display()))
            })?;
            relay.run(InboundReader::new(BufReader::new(file)), on_failure)
        }
        None => relay.run(InboundReader::new(io::stdin().lock()), on_failure),
    };
    switch.stop_listening();

    report_stats(ctx.json, &stats)?;
    if stats.interrupted {
        anyhow::bail!("inbound feed failed before end of input");
    }
    Ok(())
}

// Summaries go to stderr; stdout may be the outbox.
fn report_stats(json: bool, stats: &RelayStats) -> Result<()> {
    if json {
        eprintln!("{}", serde_json::to_string(stats)?);
    } else {
        eprintln!(
            "received {}, forwarded {}, discarded {}, failed {}, skipped {}",
            stats.received, stats.forwarded, stats.discarded, stats.failed, stats.skipped
        );
    }
    Ok(())
}
