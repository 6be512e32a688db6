use crate::commands::print_json;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use smsforward_core::{normalize as normalize_number, Region};

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    pub number: String,
}

#[derive(Debug, Serialize)]
struct NormalizedDto<'a> {
    input: &'a str,
    region: &'a str,
    unified: String,
    visual: String,
}

pub fn normalize(json: bool, region: &Region, args: NormalizeArgs) -> Result<()> {
    let number = normalize_number(&args.number, region)?;

    if json {
        print_json(&NormalizedDto {
            input: &args.number,
            region: region.code(),
            unified: number.unified.as_str().to_string(),
            visual: number.visual.as_str().to_string(),
        })?;
    } else {
        println!("unified: {}", number.unified);
        println!("visual: {}", number.visual);
    }
    Ok(())
}
