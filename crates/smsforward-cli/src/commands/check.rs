use crate::commands::{print_json, Context};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use smsforward_core::{decide, Decision, DiscardReason, InboundMessage};

#[derive(Debug, Args)]
pub struct CheckArgs {
    pub sender: String,
    #[arg(long, default_value = "")]
    pub body: String,
}

#[derive(Debug, Serialize)]
struct CheckDto<'a> {
    sender: &'a str,
    forward: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<DiscardReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

pub fn check(ctx: &Context<'_>, args: CheckArgs) -> Result<()> {
    let rule = ctx.store.rules().load()?;
    let message = InboundMessage::new(args.sender.as_str(), args.body.as_str());
    let decision = decide(
        &message,
        rule.as_ref(),
        &ctx.region,
        ctx.own_number.as_ref(),
    );

    if ctx.json {
        let dto = match &decision {
            Decision::Forward(outgoing) => CheckDto {
                sender: &args.sender,
                forward: true,
                reason: None,
                to: Some(outgoing.to.as_str()),
                body: Some(&outgoing.body),
            },
            Decision::Discard(reason) => CheckDto {
                sender: &args.sender,
                forward: false,
                reason: Some(*reason),
                to: None,
                body: None,
            },
        };
        print_json(&dto)?;
        return Ok(());
    }

    match decision {
        Decision::Forward(outgoing) => {
            println!("forward to {}", outgoing.to);
            println!("{}", outgoing.body);
        }
        Decision::Discard(reason) => println!("discard: {reason}"),
    }
    Ok(())
}
