use crate::commands::{print_json, print_json_line, Context, HintListener};
use crate::util::{format_timestamp_datetime, now_utc};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use smsforward_core::{ForwardRule, RedirectController, RedirectState, Source};
use std::time::Duration;

#[derive(Debug, Args)]
pub struct SourceArgs {
    pub value: String,
    /// Treat the value as a regular expression over the raw sender
    #[arg(long)]
    pub pattern: bool,
}

#[derive(Debug, Args)]
pub struct DestinationArgs {
    pub number: String,
}

#[derive(Debug, Args)]
pub struct ActivateArgs {
    /// Source to arm with, replacing the stored one
    #[arg(long)]
    pub source: Option<String>,
    #[arg(long, requires = "source")]
    pub pattern: bool,
    /// Destination to arm with, replacing the stored one
    #[arg(long)]
    pub destination: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeactivateArgs {}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Keep running and print the rule every time it changes
    #[arg(long)]
    pub watch: bool,
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,
}

#[derive(Debug, Serialize)]
struct StatusDto<'a> {
    state: RedirectState,
    rule: Option<&'a ForwardRule>,
}

#[derive(Debug, Serialize)]
struct FieldDto<'a> {
    field: &'static str,
    kind: &'static str,
    value: &'a str,
    state: RedirectState,
}

pub fn set_source(ctx: &Context<'_>, args: SourceArgs) -> Result<()> {
    let rules = ctx.store.rules();
    let listener = HintListener::new(ctx.json);
    let mut controller = RedirectController::new(&rules, &listener, ctx.region);
    controller.set_advanced_mode(args.pattern);
    let visual = controller.set_source(now_utc(), &args.value)?;
    let state = controller.current_state()?;

    if ctx.json {
        print_json(&FieldDto {
            field: "source",
            kind: if args.pattern { "pattern" } else { "literal" },
            value: &visual,
            state,
        })?;
    } else {
        println!("source set to {visual}");
    }
    Ok(())
}

pub fn set_destination(ctx: &Context<'_>, args: DestinationArgs) -> Result<()> {
    let rules = ctx.store.rules();
    let listener = HintListener::new(ctx.json);
    let mut controller = RedirectController::new(&rules, &listener, ctx.region);
    let visual = controller.set_destination(now_utc(), &args.number)?;
    let state = controller.current_state()?;

    if ctx.json {
        print_json(&FieldDto {
            field: "destination",
            kind: "literal",
            value: &visual,
            state,
        })?;
    } else {
        println!("destination set to {visual}");
    }
    Ok(())
}

pub fn activate(ctx: &Context<'_>, args: ActivateArgs) -> Result<()> {
    let rules = ctx.store.rules();
    let listener = HintListener::new(ctx.json);
    let mut controller = RedirectController::new(&rules, &listener, ctx.region);
    let now = now_utc();

    controller.set_advanced_mode(args.pattern);
    let rule =
        controller.activate_with(now, args.source.as_deref(), args.destination.as_deref())?;

    if ctx.json {
        print_json(&StatusDto {
            state: RedirectState::of(Some(&rule)),
            rule: Some(&rule),
        })?;
    } else {
        println!(
            "forwarding armed: {} -> {}",
            source_label(rule.source.as_ref()),
            destination_label(&rule)
        );
    }
    Ok(())
}

pub fn deactivate(ctx: &Context<'_>, _args: DeactivateArgs) -> Result<()> {
    let rules = ctx.store.rules();
    let listener = HintListener::new(ctx.json);
    let mut controller = RedirectController::new(&rules, &listener, ctx.region);
    let removed = controller.deactivate()?;

    if ctx.json {
        print_json(&serde_json::json!({
            "removed": removed,
            "state": controller.current_state()?,
        }))?;
    } else if removed {
        println!("forwarding disabled");
    } else {
        println!("forwarding already disabled");
    }
    Ok(())
}

pub fn status(ctx: &Context<'_>, args: StatusArgs) -> Result<()> {
    if !args.watch {
        let rule = ctx.store.rules().load()?;
        if ctx.json {
            print_json(&StatusDto {
                state: RedirectState::of(rule.as_ref()),
                rule: rule.as_ref(),
            })?;
        } else {
            print_status(rule.as_ref());
        }
        return Ok(());
    }

    for rule in ctx
        .store
        .watch_rule(Duration::from_millis(args.interval_ms))
    {
        let rule = rule?;
        if ctx.json {
            print_json_line(&StatusDto {
                state: RedirectState::of(rule.as_ref()),
                rule: rule.as_ref(),
            })?;
        } else {
            print_status(rule.as_ref());
            println!();
        }
    }
    Ok(())
}

fn print_status(rule: Option<&ForwardRule>) {
    println!("state: {}", RedirectState::of(rule));
    let Some(rule) = rule else {
        return;
    };
    match rule.source.as_ref() {
        Some(Source::Pattern(pattern)) => println!("source: {pattern} (pattern)"),
        source => println!("source: {}", source_label(source)),
    }
    println!("destination: {}", destination_label(rule));
    println!("updated: {}", format_timestamp_datetime(rule.updated_at));
}

fn source_label(source: Option<&Source>) -> String {
    match source {
        Some(Source::Literal(number)) => format!("{} ({})", number.visual, number.unified),
        Some(Source::Pattern(pattern)) => pattern.to_string(),
        None => "(not set)".to_string(),
    }
}

fn destination_label(rule: &ForwardRule) -> String {
    match rule.destination.as_ref() {
        Some(number) => format!("{} ({})", number.visual, number.unified),
        None => "(not set)".to_string(),
    }
}
