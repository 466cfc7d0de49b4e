/*
 * Copyright (c) 2017, Alan Chen
 * See LICENCE file for BSD-2 terms
 */

//! walk the source tree and build the transfer plan

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use log::{debug, info, warn};

use crate::conflict::{resolve, Policy, Resolution};
use crate::error::{Error, Result};
use crate::format::format_filename;
use crate::metadata::{read_metadata, MetadataDecoder};
use crate::options::Options;

/// one file to copy or move
#[derive(Debug, Clone, PartialEq)]
pub struct TransferItem {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub size: u64,
}

/// Transfers in traversal order, destinations unique
#[derive(Debug, Default)]
pub struct TransferPlan {
    items: Vec<TransferItem>,
    claimed: HashMap<PathBuf, u64>,
}

impl TransferPlan {
    pub fn push(&mut self, item: TransferItem)
    {
        self.claimed.insert(item.destination.clone(), item.size);
        self.items.push(item);
    }

    /// source size of the item headed for `dest`, if any
    pub fn claimed_size(&self, dest: &Path) -> Option<u64>
    {
        self.claimed.get(dest).cloned()
    }

    pub fn is_claimed(&self, dest: &Path) -> bool
    {
        self.claimed.contains_key(dest)
    }

    /// drop the item headed for `dest`
    pub fn supersede(&mut self, dest: &Path) -> Option<TransferItem>
    {
        self.claimed.remove(dest)?;
        let idx = self.items.iter().position(|it| it.destination == dest)?;
        Some(self.items.remove(idx))
    }

    pub fn items(&self) -> &[TransferItem]
    {
        &self.items
    }

    pub fn len(&self) -> usize
    {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.items.is_empty()
    }

    pub fn total_size(&self) -> u64
    {
        self.items.iter().map(|it| it.size).sum()
    }
}

/// Counters for one traversal
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScanSummary {
    pub files: usize,
    pub unreadable: usize,
    pub duplicates: usize,
    pub renamed: usize,
    pub skipped: usize,
}

struct Scan<'a, 'p, D: ?Sized> {
    opts: &'a Options,
    decoder: &'a D,
    policy: &'a mut Policy<'p>,
    plan: TransferPlan,
    summary: ScanSummary,
}

/// Walk `opts.src` and decide where every readable file goes. Nothing is
/// transferred here; in move mode duplicate sources are deleted on the spot.
pub fn plan_transfers<D>(opts: &Options, decoder: &D, policy: &mut Policy)
    -> Result<(TransferPlan, ScanSummary)>
    where D: MetadataDecoder + ?Sized
{
    if !opts.dry_run {
        create_dir(&opts.dest)?;
    }

    let mut walk = WalkBuilder::new(&opts.src);
    walk.standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));
    if let Some(skip) = nested_dest(&opts.src, &opts.dest) {
        debug!("not descending into destination {}", skip.display());
        walk.filter_entry(move |ent| {
            let is_dir = ent.file_type().map_or(false, |ft| ft.is_dir());
            !is_dir || fs::canonicalize(ent.path()).map_or(true, |p| p != skip)
        });
    }

    let mut scan = Scan {
        opts,
        decoder,
        policy,
        plan: TransferPlan::default(),
        summary: ScanSummary::default(),
    };

    for res in walk.build() {
        let ent = res.map_err(|source| Error::Walk { path: opts.src.clone(), source })?;
        if !ent.file_type().map_or(false, |ft| ft.is_file()) {
            continue;
        }
        let size = ent.metadata()
            .map_err(|source| Error::Walk { path: ent.path().to_path_buf(), source })?
            .len();
        scan.visit(ent.path(), size)?;
    }

    Ok((scan.plan, scan.summary))
}

impl<'a, 'p, D: MetadataDecoder + ?Sized> Scan<'a, 'p, D> {
    fn visit(&mut self, path: &Path, size: u64) -> Result<()>
    {
        self.summary.files += 1;

        let rec = match read_metadata(self.decoder, path) {
            Ok(rec) => rec,
            Err(e) => {
                info!("skipping {}: {}", path.display(), e);
                self.summary.unreadable += 1;
                return Ok(());
            }
        };

        let name = format_filename(&self.opts.format, &rec);
        let relative = name.trim_start_matches('/');
        if relative.is_empty() {
            warn!("format {:?} gives an empty name for {}, skipping", self.opts.format, path.display());
            self.summary.skipped += 1;
            return Ok(());
        }

        let dest = self.opts.dest.join(relative);
        if !self.opts.dry_run {
            if let Some(parent) = dest.parent() {
                create_dir(parent)?;
            }
        }

        match resolve(dest, size, &self.plan, self.policy)? {
            Resolution::Vacant(dest) => self.queue(path, dest, size),
            Resolution::Renamed(dest) => {
                self.summary.renamed += 1;
                self.queue(path, dest, size);
            }
            Resolution::Overwrite(dest) => {
                if let Some(old) = self.plan.supersede(&dest) {
                    info!("{} replaces {} at {}", path.display(), old.source.display(), dest.display());
                }
                self.queue(path, dest, size);
            }
            Resolution::Duplicate(dest) => self.duplicate(path, &dest),
            Resolution::Skipped => {
                info!("skipped {}", path.display());
                self.summary.skipped += 1;
            }
        }
        Ok(())
    }

    fn queue(&mut self, path: &Path, dest: PathBuf, size: u64)
    {
        debug!("{} -> {}", path.display(), dest.display());
        self.plan.push(TransferItem { source: path.to_path_buf(), destination: dest, size });
    }

    fn duplicate(&mut self, path: &Path, dest: &Path)
    {
        self.summary.duplicates += 1;
        info!("Duplicate file found: {}", dest.display());

        if !self.opts.move_files || self.opts.dry_run || same_file(path, dest) {
            return;
        }
        if let Err(e) = fs::remove_file(path) {
            warn!("cannot remove duplicate source {}: {}", path.display(), e);
        }
    }
}

fn create_dir(dir: &Path) -> Result<()>
{
    fs::create_dir_all(dir).map_err(|source| Error::CreateDir { path: dir.to_path_buf(), source })
}

/// canonical destination when it sits inside the source tree
fn nested_dest(src: &Path, dest: &Path) -> Option<PathBuf>
{
    let src = fs::canonicalize(src).ok()?;
    let dest = fs::canonicalize(dest).ok()?;
    if dest.starts_with(&src) && dest != src {
        Some(dest)
    } else {
        None
    }
}

/// a file already sorted in place is its own "duplicate"
fn same_file(a: &Path, b: &Path) -> bool
{
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::conflict::{Choice, ScriptedPrompt};
    use crate::metadata::stub::{meta_text, KeyValueDecoder};
    use tempfile::TempDir;

    const NIKON_TIME: &str = "2023-06-15T10:30:00";

    fn opts_for(tmp: &TempDir) -> Options
    {
        let mut opts = crate::options::default();
        opts.src = tmp.path().join("in");
        opts.dest = tmp.path().join("out");
        fs::create_dir_all(&opts.src).unwrap();
        opts
    }

    fn put(opts: &Options, rel: &str, content: &str) -> PathBuf
    {
        let path = opts.src.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn nikon(pad: usize) -> String
    {
        meta_text("NIKON CORPORATION", "D750", NIKON_TIME, pad)
    }

    fn dest_of(opts: &Options, rel: &str) -> PathBuf
    {
        opts.dest.join(rel)
    }

    const NIKON_DEST: &str = "Nikon/D750/2023-06-15/2023-06-15_103000_Nikon_D750.NEF";
    const NIKON_DEST_1: &str = "Nikon/D750/2023-06-15/2023-06-15_103000_Nikon_D750-1.NEF";

    #[test]
    fn t_plan_lexical_order() {
        let tmp = TempDir::new().unwrap();
        let opts = opts_for(&tmp);
        put(&opts, "b/z.jpg", &meta_text("Canon", "R5", "2020-01-01T00:00:01", 0));
        put(&opts, "a/y.jpg", &meta_text("Canon", "R5", "2020-01-01T00:00:02", 0));
        put(&opts, "c.jpg", &meta_text("Canon", "R5", "2020-01-01T00:00:03", 0));

        let (plan, summary) = plan_transfers(&opts, &KeyValueDecoder, &mut Policy::Rename).unwrap();
        let srcs: Vec<PathBuf> = plan.items().iter().map(|it| it.source.clone()).collect();
        assert_eq!(srcs, vec![
            opts.src.join("a/y.jpg"),
            opts.src.join("b/z.jpg"),
            opts.src.join("c.jpg"),
        ]);
        assert_eq!(summary.files, 3);
        assert_eq!(plan.items()[0].destination,
            dest_of(&opts, "Canon/R5/2020-01-01/2020-01-01_000002_Canon_R5.JPG"));
        // parents made during traversal, nothing copied yet
        assert!(dest_of(&opts, "Canon/R5/2020-01-01").is_dir());
        assert!(!plan.items()[0].destination.exists());
    }

    #[test]
    fn t_unreadable_skipped() {
        let tmp = TempDir::new().unwrap();
        let opts = opts_for(&tmp);
        put(&opts, "a.txt", "no metadata here");
        put(&opts, "b.nef", &nikon(0));

        let (plan, summary) = plan_transfers(&opts, &KeyValueDecoder, &mut Policy::Rename).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.items()[0].destination, dest_of(&opts, NIKON_DEST));
        assert_eq!(summary.unreadable, 1);
        assert_eq!(summary.files, 2);
    }

    #[test]
    fn t_same_size_duplicate_in_run_move() {
        let tmp = TempDir::new().unwrap();
        let mut opts = opts_for(&tmp);
        opts.move_files = true;
        let first = put(&opts, "a.nef", &nikon(3));
        let second = put(&opts, "b.nef", &nikon(3));

        let (plan, summary) = plan_transfers(&opts, &KeyValueDecoder, &mut Policy::Rename).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.items()[0].source, first);
        assert_eq!(summary.duplicates, 1);
        assert!(first.exists());
        assert!(!second.exists(), "duplicate source removed in move mode");
    }

    #[test]
    fn t_duplicate_on_disk_copy_keeps_source() {
        let tmp = TempDir::new().unwrap();
        let opts = opts_for(&tmp);
        let src = put(&opts, "a.nef", &nikon(3));
        let dest = dest_of(&opts, NIKON_DEST);
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, nikon(3)).unwrap();

        let (plan, summary) = plan_transfers(&opts, &KeyValueDecoder, &mut Policy::Rename).unwrap();
        assert!(plan.is_empty());
        assert_eq!(summary.duplicates, 1);
        assert!(src.exists());
    }

    #[test]
    fn t_different_size_renamed() {
        let tmp = TempDir::new().unwrap();
        let opts = opts_for(&tmp);
        put(&opts, "a.nef", &nikon(1));
        put(&opts, "b.nef", &nikon(2));
        put(&opts, "c.nef", &nikon(3));

        let (plan, summary) = plan_transfers(&opts, &KeyValueDecoder, &mut Policy::Rename).unwrap();
        let dests: Vec<PathBuf> = plan.items().iter().map(|it| it.destination.clone()).collect();
        assert_eq!(dests, vec![
            dest_of(&opts, NIKON_DEST),
            dest_of(&opts, NIKON_DEST_1),
            dest_of(&opts, "Nikon/D750/2023-06-15/2023-06-15_103000_Nikon_D750-2.NEF"),
        ]);
        assert_eq!(summary.renamed, 2);
    }

    #[test]
    fn t_interactive_overwrite_supersedes() {
        let tmp = TempDir::new().unwrap();
        let mut opts = opts_for(&tmp);
        opts.interactive = true;
        put(&opts, "a.nef", &nikon(1));
        let second = put(&opts, "b.nef", &nikon(2));

        let mut prompt = ScriptedPrompt::new(vec![Choice::Overwrite]);
        let (plan, _) = plan_transfers(&opts, &KeyValueDecoder, &mut Policy::Ask(&mut prompt)).unwrap();
        assert_eq!(plan.items(), &[TransferItem {
            source: second.clone(),
            destination: dest_of(&opts, NIKON_DEST),
            size: fs::metadata(&second).unwrap().len(),
        }]);
    }

    #[test]
    fn t_interactive_skip_and_abort() {
        let tmp = TempDir::new().unwrap();
        let mut opts = opts_for(&tmp);
        opts.interactive = true;
        put(&opts, "a.nef", &nikon(1));
        put(&opts, "b.nef", &nikon(2));
        put(&opts, "c.nef", &nikon(3));

        let mut prompt = ScriptedPrompt::new(vec![Choice::Skip, Choice::Rename]);
        let (plan, summary) = plan_transfers(&opts, &KeyValueDecoder, &mut Policy::Ask(&mut prompt)).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.items()[1].destination, dest_of(&opts, NIKON_DEST_1));
        assert_eq!(summary.skipped, 1);

        let tmp = TempDir::new().unwrap();
        let opts = opts_for(&tmp);
        put(&opts, "a.nef", &nikon(1));
        put(&opts, "b.nef", &nikon(2));
        let mut prompt = ScriptedPrompt::new(vec![Choice::Abort]);
        match plan_transfers(&opts, &KeyValueDecoder, &mut Policy::Ask(&mut prompt)) {
            Err(Error::Aborted) => (),
            other => panic!("expected abort, got {:?}", other.map(|r| r.1)),
        }
    }

    #[test]
    fn t_dry_run_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut opts = opts_for(&tmp);
        opts.dry_run = true;
        opts.move_files = true;
        let a = put(&opts, "a.nef", &nikon(3));
        let b = put(&opts, "b.nef", &nikon(3));

        let (plan, summary) = plan_transfers(&opts, &KeyValueDecoder, &mut Policy::Rename).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(summary.duplicates, 1);
        assert!(a.exists() && b.exists());
        assert!(!opts.dest.exists());
    }

    #[test]
    fn t_dest_inside_src_not_walked() {
        let tmp = TempDir::new().unwrap();
        let mut opts = opts_for(&tmp);
        opts.dest = opts.src.join("sorted");
        put(&opts, "a.nef", &nikon(1));
        let old = opts.dest.join("old/x.nef");
        fs::create_dir_all(old.parent().unwrap()).unwrap();
        fs::write(&old, nikon(9)).unwrap();

        let (plan, summary) = plan_transfers(&opts, &KeyValueDecoder, &mut Policy::Rename).unwrap();
        assert_eq!(summary.files, 1);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn t_in_place_duplicate_never_deleted() {
        let tmp = TempDir::new().unwrap();
        let mut opts = opts_for(&tmp);
        opts.move_files = true;
        opts.dest = opts.src.clone();
        let sorted = put(&opts, NIKON_DEST, &nikon(2));

        let (plan, summary) = plan_transfers(&opts, &KeyValueDecoder, &mut Policy::Rename).unwrap();
        assert!(plan.is_empty());
        assert_eq!(summary.duplicates, 1);
        assert!(sorted.exists());
    }

    #[test]
    fn t_missing_source_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut opts = opts_for(&tmp);
        opts.src = tmp.path().join("nope");
        match plan_transfers(&opts, &KeyValueDecoder, &mut Policy::Rename) {
            Err(e @ Error::Walk { .. }) => assert_eq!(e.exit_code(), 1),
            other => panic!("expected walk error, got {:?}", other.map(|r| r.1)),
        }
    }

    #[test]
    fn t_plan_bookkeeping() {
        let mut plan = TransferPlan::default();
        plan.push(TransferItem { source: "a".into(), destination: "x".into(), size: 3 });
        plan.push(TransferItem { source: "b".into(), destination: "y".into(), size: 4 });
        assert_eq!(plan.total_size(), 7);
        assert_eq!(plan.claimed_size(Path::new("y")), Some(4));

        let old = plan.supersede(Path::new("x")).unwrap();
        assert_eq!(old.source, PathBuf::from("a"));
        assert!(!plan.is_claimed(Path::new("x")));
        assert_eq!(plan.len(), 1);
        assert!(plan.supersede(Path::new("x")).is_none());
    }
}
