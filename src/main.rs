use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use vlpset::binary::{self, FileFormat, VlpsetFooter, LEGACY_VERSION, VERSION};
use vlpset::hash::is_valid_prefix_len;
use vlpset::{
    lookup_fragments, Completion, DirStore, LoadOutcome, LookupCache, LookupResult, Prefix,
    PrefixStringMap,
};

mod cli;
use cli::display::*;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Inspect { file, json } => run_inspect(&file, json),
        Commands::Build {
            dir,
            table,
            input,
            length,
            hex,
        } => run_build(&dir, &table, input.as_deref(), length, hex),
        Commands::Lookup {
            dir,
            table,
            specs,
            json,
        } => run_lookup(&dir, &table, &specs, json),
        Commands::Migrate { dir, table } => run_migrate(&dir, &table),
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn open_cache(dir: &Path, table: &str) -> Result<LookupCache> {
    let store = DirStore::open(dir)
        .with_context(|| format!("cannot open table directory {}", dir.display()))?;
    Ok(LookupCache::new(table, Arc::new(store)))
}

// ═══════════════════════════════════════════════════════════════════════════
// INSPECT
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct InspectReport {
    file: String,
    size: usize,
    format: Option<&'static str>,
    version: Option<u8>,
    checksum: Option<String>,
    prefix_count: usize,
    buckets: Vec<BucketReport>,
    error: Option<String>,
}

#[derive(Serialize)]
struct BucketReport {
    prefix_len: usize,
    count: usize,
    bytes: usize,
    first: Option<String>,
    last: Option<String>,
}

fn inspect_report(path: &Path, bytes: &[u8]) -> InspectReport {
    let format = binary::detect_format(bytes);
    let mut report = InspectReport {
        file: path.display().to_string(),
        size: bytes.len(),
        format: format.map(FileFormat::extension),
        version: None,
        checksum: None,
        prefix_count: 0,
        buckets: Vec::new(),
        error: None,
    };

    if format == Some(FileFormat::Current) {
        if let Ok(footer) = VlpsetFooter::read(bytes) {
            report.checksum = Some(format!("{:#010x}", footer.crc32));
        }
    }

    match binary::decode_file(bytes) {
        Ok(loaded) => {
            report.version = Some(match loaded.format() {
                FileFormat::Current => VERSION,
                FileFormat::Legacy => LEGACY_VERSION,
            });
            let map = loaded.map();
            report.prefix_count = map.prefix_count();
            report.buckets = map
                .iter()
                .map(|(len, packed)| {
                    let prefix_hex = |entry: &[u8]| Prefix::new(entry).ok().map(|p| p.to_hex());
                    BucketReport {
                        prefix_len: len,
                        count: packed.len() / len,
                        bytes: packed.len(),
                        first: packed.chunks_exact(len).next().and_then(prefix_hex),
                        last: packed.chunks_exact(len).next_back().and_then(prefix_hex),
                    }
                })
                .collect();
        }
        Err(e) => report.error = Some(e.to_string()),
    }
    report
}

fn run_inspect(path: &Path, json: bool) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let report = inspect_report(path, &bytes);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_inspect(&report);
    }

    if let Some(error) = &report.error {
        bail!("{} is not a valid prefix set: {}", report.file, error);
    }
    Ok(())
}

fn print_inspect(report: &InspectReport) {
    section_top("FILE");
    row(&format!(" path      {}", report.file));
    row(&format!(" size      {}", format_size(report.size)));
    let format = match report.format {
        Some("vlpset") => format_label(FileFormat::Current),
        Some(_) => format_label(FileFormat::Legacy),
        None => status_label(false, "unknown"),
    };
    row(&format!(" format    {}", format));
    if let Some(version) = report.version {
        row(&format!(" version   {}", version));
    }
    if let Some(checksum) = &report.checksum {
        let status = match report.error {
            None => status_label(true, "ok"),
            Some(_) => status_label(false, "unverified"),
        };
        row(&format!(" crc32     {} {}", checksum, status));
    }
    if let Some(error) = &report.error {
        row(&format!(" error     {}", status_label(false, error)));
        section_bot();
        return;
    }

    section_mid("BUCKETS");
    row(&format!(
        " {} {} {}  {}",
        pad_left("len", 4),
        pad_left("count", 10),
        pad_left("bytes", 10),
        "first .. last"
    ));
    for bucket in &report.buckets {
        let range = format!(
            "{} .. {}",
            abbreviate_hex(bucket.first.as_deref().unwrap_or("-"), 17),
            abbreviate_hex(bucket.last.as_deref().unwrap_or("-"), 17)
        );
        row(&format!(
            " {} {} {}  {}",
            pad_left(&bucket.prefix_len.to_string(), 4),
            pad_left(&bucket.count.to_string(), 10),
            pad_left(&format_size(bucket.bytes), 10),
            themed(GRAY, &[], &range)
        ));
    }
    row(&format!(
        " {} {}",
        pad_right("total", 15),
        themed(CYAN, &[BOLD], &report.prefix_count.to_string())
    ));
    section_bot();
}

// ═══════════════════════════════════════════════════════════════════════════
// BUILD
// ═══════════════════════════════════════════════════════════════════════════

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("cannot read stdin")?;
            Ok(text)
        }
    }
}

/// Turn input lines into prefixes: hashed fragments, or hex when `hex` is set.
fn parse_prefixes(text: &str, length: usize, hex: bool) -> Result<PrefixStringMap> {
    if !hex && !is_valid_prefix_len(length) {
        bail!("prefix length {} is outside 4..=32", length);
    }

    let mut prefixes = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let prefix = if hex {
            Prefix::from_hex(line).with_context(|| format!("line {}", lineno + 1))?
        } else {
            Completion::from_plaintext(line).prefix(length)
        };
        prefixes.push(prefix);
    }

    Ok(PrefixStringMap::from_prefixes(prefixes)?)
}

fn run_build(
    dir: &Path,
    table: &str,
    input: Option<&Path>,
    length: usize,
    hex: bool,
) -> Result<()> {
    let text = read_input(input)?;
    let mut map = parse_prefixes(&text, length, hex)?;
    let buckets = map.bucket_count();

    let cache = open_cache(dir, table)?;
    cache.build(&mut map);
    cache.write_file()?;

    println!(
        "{} {} prefixes in {} buckets to {}",
        themed(GREEN, &[BOLD], "wrote"),
        cache.prefix_count(),
        buckets,
        dir.join(cache.file_name()).display()
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// LOOKUP
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct FragmentMatch {
    spec: String,
    fragment: String,
    completion: String,
    #[serde(flatten)]
    result: LookupResult,
}

fn run_lookup(dir: &Path, table: &str, specs: &[String], json: bool) -> Result<()> {
    let cache = open_cache(dir, table)?;
    if cache.load_file()? == LoadOutcome::Missing {
        log::warn!("table {} has no file in {}", table, dir.display());
    }

    let mut matches = Vec::new();
    for spec in specs {
        let fragments = lookup_fragments(spec);
        if fragments.is_empty() {
            log::warn!("{:?} has no host/path part, skipped", spec);
        }
        for fragment in fragments {
            let completion = Completion::from_plaintext(&fragment);
            let result = cache.has(&completion);
            if result.has {
                matches.push(FragmentMatch {
                    spec: spec.clone(),
                    fragment,
                    completion: completion.to_hex(),
                    result,
                });
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    for spec in specs {
        let hits: Vec<&FragmentMatch> = matches.iter().filter(|m| &m.spec == spec).collect();
        if hits.is_empty() {
            println!("{}  {}", themed(BLUE, &[], spec), match_label(&LookupResult::default()));
        }
        for hit in hits {
            println!(
                "{}  {}  {}",
                themed(BLUE, &[], spec),
                hit.fragment,
                match_label(&hit.result)
            );
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// MIGRATE
// ═══════════════════════════════════════════════════════════════════════════

fn run_migrate(dir: &Path, table: &str) -> Result<()> {
    let cache = open_cache(dir, table)?;
    let legacy = FileFormat::Legacy.file_name(table);
    match cache.load_file()? {
        LoadOutcome::Missing => bail!("no file for table {} in {}", table, dir.display()),
        LoadOutcome::Current if dir.join(&legacy).exists() => {
            // Left behind by an interrupted write; rewriting removes it.
            cache.write_file()?;
            println!(
                "{} stale {} ({} is current)",
                themed(GREEN, &[BOLD], "removed"),
                legacy,
                cache.file_name()
            );
        }
        LoadOutcome::Current => {
            println!("{} is already in the current format", cache.file_name());
        }
        LoadOutcome::Migrated => {
            cache.write_file()?;
            println!(
                "{} {} -> {} ({} prefixes)",
                themed(GREEN, &[BOLD], "migrated"),
                legacy,
                cache.file_name(),
                cache.prefix_count()
            );
        }
    }
    Ok(())
}
