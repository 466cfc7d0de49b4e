/*
 * Copyright (c) 2017, Alan Chen
 * See LICENCE file for BSD-2 terms
 */

//! what to do when a destination name is already taken

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{Error, Result};
use crate::scan::TransferPlan;

/// State of a destination path relative to the file about to land there
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Occupant {
    Vacant,
    /// same size, treated as already sorted
    Same,
    Different,
}

/// Answers to the interactive conflict question
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Choice {
    Abort,
    Skip,
    Overwrite,
    Rename,
}

impl Choice {
    pub fn from_answer(answer: &str) -> Option<Choice>
    {
        match answer.trim() {
            "a" => Some(Choice::Abort),
            "s" => Some(Choice::Skip),
            "o" => Some(Choice::Overwrite),
            "r" => Some(Choice::Rename),
            _ => None,
        }
    }
}

pub trait ConflictPrompt {
    fn ask(&mut self, dest: &Path) -> Result<Choice>;
}

/// Asks on `output`, reads single line answers from `input`
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self
    {
        TerminalPrompt::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self
    {
        TerminalPrompt { input, output }
    }
}

impl<R: BufRead, W: Write> ConflictPrompt for TerminalPrompt<R, W> {
    fn ask(&mut self, dest: &Path) -> Result<Choice>
    {
        loop {
            write!(self.output,
                "File {} already exists (a)bort, (s)kip, (o)verwrite or (r)ename? (a,s,o,r): ",
                dest.display())
                .and_then(|_| self.output.flush())
                .map_err(Error::Prompt)?;

            let mut line = String::new();
            let nread = self.input.read_line(&mut line).map_err(Error::Prompt)?;
            if nread == 0 {
                return Err(Error::Prompt(io::Error::new(
                    io::ErrorKind::UnexpectedEof, "input closed")));
            }
            if let Some(choice) = Choice::from_answer(&line) {
                return Ok(choice);
            }
        }
    }
}

/// How conflicts get settled for a run
pub enum Policy<'p> {
    Rename,
    Ask(&'p mut dyn ConflictPrompt),
}

/// Outcome of resolving one destination
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Vacant(PathBuf),
    Renamed(PathBuf),
    /// destination kept, its occupant gets replaced
    Overwrite(PathBuf),
    Duplicate(PathBuf),
    Skipped,
}

/// Classify `dest` for a source of `size` bytes. Earlier plan entries count
/// as occupants, then whatever is on disk.
pub fn occupant(dest: &Path, size: u64, plan: &TransferPlan) -> Result<Occupant>
{
    let existing = match plan.claimed_size(dest) {
        Some(sz) => sz,
        None => match fs::metadata(dest) {
            Ok(md) if md.is_file() => md.len(),
            Ok(_) => return Ok(Occupant::Different),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(Occupant::Vacant),
            Err(source) => {
                return Err(Error::Inspect { path: dest.to_path_buf(), source });
            }
        },
    };

    if existing == size {
        Ok(Occupant::Same)
    } else {
        Ok(Occupant::Different)
    }
}

/// Append `-1`, `-2`, ... to the file stem until `taken` says no.
/// Always starts over from 1.
pub fn next_free_path<F>(path: &Path, taken: F) -> PathBuf
    where F: Fn(&Path) -> bool
{
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path.file_stem().unwrap_or_default();
    let ext = path.extension();

    let mut n: u64 = 1;
    loop {
        let mut name = stem.to_os_string();
        name.push(format!("-{}", n));
        if let Some(ext) = ext {
            name.push(".");
            name.push(ext);
        }
        let candidate = dir.join(name);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// free on disk and not claimed by the plan
pub fn rename_path(path: &Path, plan: &TransferPlan) -> PathBuf
{
    next_free_path(path, |p| p.exists() || plan.is_claimed(p))
}

pub fn resolve(dest: PathBuf, size: u64, plan: &TransferPlan, policy: &mut Policy) -> Result<Resolution>
{
    let mut dest = dest;
    let mut renamed = false;

    loop {
        match occupant(&dest, size, plan)? {
            Occupant::Vacant if renamed => return Ok(Resolution::Renamed(dest)),
            Occupant::Vacant => return Ok(Resolution::Vacant(dest)),
            Occupant::Same => return Ok(Resolution::Duplicate(dest)),
            Occupant::Different => (),
        }

        let choice = match policy {
            Policy::Rename => {
                info!("File {} already exists", dest.display());
                Choice::Rename
            }
            Policy::Ask(prompt) => prompt.ask(&dest)?,
        };
        debug!("conflict at {}: {:?}", dest.display(), choice);

        match choice {
            Choice::Abort => return Err(Error::Aborted),
            Choice::Skip => return Ok(Resolution::Skipped),
            Choice::Overwrite => return Ok(Resolution::Overwrite(dest)),
            Choice::Rename => {
                dest = rename_path(&dest, plan);
                renamed = true;
            }
        }
    }
}


/// Prompt answering from a fixed list, for tests
#[cfg(test)]
pub struct ScriptedPrompt {
    pub answers: Vec<Choice>,
    pub asked: Vec<PathBuf>,
}

#[cfg(test)]
impl ScriptedPrompt {
    pub fn new(answers: Vec<Choice>) -> ScriptedPrompt
    {
        ScriptedPrompt { answers, asked: Vec::new() }
    }
}

#[cfg(test)]
impl ConflictPrompt for ScriptedPrompt {
    fn ask(&mut self, dest: &Path) -> Result<Choice>
    {
        self.asked.push(dest.to_path_buf());
        if self.answers.is_empty() {
            return Err(Error::Prompt(io::Error::new(io::ErrorKind::UnexpectedEof, "no answers left")));
        }
        Ok(self.answers.remove(0))
    }
}
