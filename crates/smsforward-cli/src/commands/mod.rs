use anyhow::Result;
use serde::Serialize;
use smsforward_config::AppConfig;
use smsforward_core::{ListenerControl, Region, UnifiedNumber};
use smsforward_store::Store;
use std::io::{self, Write};
use tracing::info;

pub mod check;
pub mod completions;
pub mod listen;
pub mod normalize;
pub mod rule;

pub struct Context<'a> {
    pub store: &'a Store,
    pub json: bool,
    pub config: &'a AppConfig,
    pub region: Region,
    /// `own_number` from the config, resolved in `region`.
    pub own_number: Option<UnifiedNumber>,
}

/// Listener hook for one-shot commands. Relaying happens in a separate
/// `smsforward listen` process, so arming only prints a reminder.
pub struct HintListener {
    quiet: bool,
}

impl HintListener {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ListenerControl for HintListener {
    fn start_listening(&self) {
        info!("listener enabled");
        if !self.quiet {
            eprintln!("hint: run `smsforward listen` to relay incoming messages");
        }
    }

    fn stop_listening(&self) {
        info!("listener disabled");
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// One compact JSON document per line, for streaming output.
pub fn print_json_line<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
