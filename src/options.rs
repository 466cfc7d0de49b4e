/*
 * Copyright (c) 2017, Alan Chen
 * See LICENCE file for BSD-2 terms
 */

 //! define and manage utility options

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ App, Arg };

use crate::format::{ DEFAULT_FORMAT, PLACEHOLDER_HELP };

/// store options selections parsed by args_to_opts()
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub src: PathBuf,
    pub dest: PathBuf,
    pub format: String,
    pub verbose: bool,
    pub interactive: bool,
    pub move_files: bool,
    pub dry_run: bool,
}


pub fn default() -> Options
{
    Options {
        src: PathBuf::new(),
        dest: PathBuf::new(),
        format: String::from(DEFAULT_FORMAT),
        verbose: false,
        interactive: false,
        move_files: false,
        dry_run: false,
    }
}


fn app() -> App<'static, 'static>
{
    App::new("rawsort")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sorts raw files into folders by camera make, model and date")
        .after_help(PLACEHOLDER_HELP)
        .arg(Arg::with_name("src")
            .short("s")
            .long("src")
            .value_name("SRC_DIR")
            .takes_value(true)
            .required(true)
            .help("Source folder")
            )
        .arg(Arg::with_name("dest")
            .short("d")
            .long("dest")
            .value_name("DEST_DIR")
            .takes_value(true)
            .required(true)
            .help("Destination folder")
            )
        .arg(Arg::with_name("format")
            .short("f")
            .long("format")
            .value_name("FORMAT")
            .takes_value(true)
            .default_value(DEFAULT_FORMAT)
            .help("Filename format, see below")
            )
        .arg(Arg::with_name("verbose")
            .short("v")
            .long("verbose")
            .help("Verbose output")
            )
        .arg(Arg::with_name("interactive")
            .short("i")
            .long("interactive")
            .help("Interactive mode, ask user on conflicts")
            )
        .arg(Arg::with_name("move")
            .short("m")
            .long("move")
            .help("Move rather than copy")
            )
        .arg(Arg::with_name("dry_run")
            .short("n")
            .long("dry-run")
            .help("Only print what would be transferred")
            )
}


/// parse an argument list, first item is the program name
pub fn parse_from<I, T>(args: I) -> Result<Options, clap::Error>
    where I: IntoIterator<Item = T>,
          T: Into<OsString> + Clone
{
    let amats = app().get_matches_from_safe(args)?;

    let mut opts = default();
    opts.src = amats.value_of_os("src").map(PathBuf::from).unwrap_or_default();
    opts.dest = amats.value_of_os("dest").map(PathBuf::from).unwrap_or_default();
    if let Some(fmt) = amats.value_of("format") {
        opts.format = String::from(fmt);
    }
    opts.verbose = amats.is_present("verbose");
    opts.interactive = amats.is_present("interactive");
    opts.move_files = amats.is_present("move");
    opts.dry_run = amats.is_present("dry_run");

    Ok(opts)
}


/// options from the process arguments, exits with usage on bad input
pub fn args_to_opts() -> Options
{
    match parse_from(std::env::args_os()) {
        Ok(opts) => opts,
        Err(e) => e.exit(),
    }
}
