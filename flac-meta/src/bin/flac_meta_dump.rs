use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use flac_meta::container::MetaflacContainerParser;
use flac_meta::interfaces::{NoopId3Mapper, NullCatalog, NullCueSheetParser};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pathnames of .flac files to dump the normalized tag map for.
    paths: Vec<PathBuf>,

    /// Anchor (cuesheet-track fragment) to resolve instead of the
    /// whole-file/playlist map, applied to every path given.
    #[arg(long)]
    anchor: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy();
    let app_log_layer = tracing_subscriber::fmt::layer().with_target(false).compact();
    tracing_subscriber::registry().with(filter).with(app_log_layer).init();

    let args = Args::parse();
    let container = MetaflacContainerParser::new();
    let cue_parser = NullCueSheetParser;
    let catalog = NullCatalog;
    let id3_mapper = NoopId3Mapper;

    for path in &args.paths {
        let tags = flac_meta::get_tag(
            path,
            args.anchor.as_deref(),
            &container,
            &cue_parser,
            &catalog,
            &id3_mapper,
        )
        .with_context(|| format!("reading tags from {path:?}"))?;

        println!("{path:?}:");
        for (key, value) in &tags {
            println!("  {key} = {}", value.display_string());
        }
    }

    Ok(())
}
