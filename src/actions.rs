/*
 * Copyright (c) 2017, Alan Chen
 * See LICENCE file for BSD-2 terms
 */

//! carry out a transfer plan

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use crate::error::{Error, Result};
use crate::scan::{TransferItem, TransferPlan};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferMode {
    Copy,
    Move,
}

/// Stream `src` into a new `dst` and sync it to disk. Returns bytes written.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64>
{
    let mut input = File::open(src)?;
    let mut output = File::create(dst)?;
    let written = io::copy(&mut input, &mut output)?;
    output.sync_all()?;
    Ok(written)
}

/// Rename only, a cross filesystem move fails
pub fn move_file(item: &TransferItem) -> io::Result<u64>
{
    fs::rename(&item.source, &item.destination)?;
    Ok(item.size)
}

pub fn progress_bar(total: u64) -> ProgressBar
{
    let style = ProgressStyle::with_template(
        "{msg:30!} [{elapsed_precise}] [{wide_bar:.green}] {bytes}/{total_bytes} ({eta})")
        .map(|s| s.progress_chars("=>."))
        .unwrap_or_else(|_| ProgressStyle::default_bar());

    let bar = ProgressBar::new(total);
    bar.set_style(style);
    bar
}

/// Run every item in plan order, stop at the first failure. Returns total bytes.
pub fn exec_transfers(plan: &TransferPlan, mode: TransferMode, bar: &ProgressBar) -> Result<u64>
{
    let mut total = 0;

    for item in plan.items() {
        let name = item.source.file_name().unwrap_or_default().to_string_lossy();
        bar.set_message(format!("Transferring {}", name));

        let res = match mode {
            TransferMode::Copy => copy_file(&item.source, &item.destination),
            TransferMode::Move => move_file(item),
        };
        let written = res.map_err(|source| Error::Transfer {
            src: item.source.clone(),
            dst: item.destination.clone(),
            source,
        })?;

        debug!("{} -> {} ({} bytes)", item.source.display(), item.destination.display(), written);
        bar.inc(written);
        total += written;
    }

    bar.finish_with_message("Done");
    Ok(total)
}

/// dry run listing
pub fn print_plan<W: Write>(plan: &TransferPlan, out: &mut W) -> io::Result<()>
{
    for item in plan.items() {
        writeln!(out, "{} -> {}", item.source.display(), item.destination.display())?;
    }
    Ok(())
}
