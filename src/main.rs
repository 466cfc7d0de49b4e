/*
 * Copyright (c) 2017, Alan Chen
 * See LICENCE file for BSD-2 terms
 */

use std::io;
use std::process;

use log::{error, info, warn};

mod actions;
mod conflict;
mod error;
mod format;
mod metadata;
mod names;
mod options;
mod scan;

use actions::{exec_transfers, print_plan, progress_bar, TransferMode};
use conflict::{Policy, TerminalPrompt};
use metadata::ExifDecoder;
use options::Options;

fn init_logging(verbose: bool)
{
    let level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(opts: &Options) -> error::Result<()>
{
    let mut prompt = TerminalPrompt::stdio();
    let mut policy = if opts.interactive {
        Policy::Ask(&mut prompt)
    } else {
        Policy::Rename
    };

    let (plan, summary) = scan::plan_transfers(opts, &ExifDecoder, &mut policy)?;
    info!("{} files seen, {} to transfer ({} renamed), {} duplicates, {} unreadable, {} skipped",
        summary.files, plan.len(), summary.renamed, summary.duplicates,
        summary.unreadable, summary.skipped);

    if plan.is_empty() {
        info!("nothing to transfer");
        return Ok(());
    }

    if opts.dry_run {
        if let Err(e) = print_plan(&plan, &mut io::stdout().lock()) {
            warn!("cannot print plan: {}", e);
        }
        return Ok(());
    }

    let mode = if opts.move_files { TransferMode::Move } else { TransferMode::Copy };
    let bar = progress_bar(plan.total_size());
    let written = exec_transfers(&plan, mode, &bar)?;
    info!("transferred {} files, {} bytes", plan.len(), written);

    Ok(())
}

fn main() {
    let opts = options::args_to_opts();
    init_logging(opts.verbose);

    if let Err(e) = run(&opts) {
        error!("{}", e);
        process::exit(e.exit_code());
    }
}
