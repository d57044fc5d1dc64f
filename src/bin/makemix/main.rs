//! Command line MIX packaging tool.

use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use log::LevelFilter;

use mixkit::{
    crc::HashMethod,
    crypto::key_init,
    logging,
    mix::io::MixBuilder,
};

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("{0}")]
    IO(#[from] std::io::Error),
    #[error("{0}")]
    Mix(#[from] mixkit::mix::Error),
}

type Result<T> = std::result::Result<T, Error>;

#[derive(Parser)]
#[command(name = "makemix")]
#[command(version)]
#[command(about = "Package a directory or manifest of files into a MIX archive.", long_about = None)]
struct Args {
    /// Encrypt the file header, supported in Red Alert onward.
    #[arg(short, long)]
    encrypt: bool,
    /// Append a SHA1 hash of the file body, supported in Red Alert onward.
    #[arg(short = 's', long)]
    checksum: bool,
    /// Use CRC32 instead of the C&C hash, required for TS onward.
    #[arg(short = 'c', long)]
    crc32: bool,
    /// Don't print status messages.
    #[arg(short, long)]
    quiet: bool,
    /// Directory to look for files in.
    #[arg(short, long, default_value = "./")]
    input: PathBuf,
    /// Manifest file listing the files to add, one relative path per line.
    /// All files in the search directory are added otherwise.
    #[arg(short, long)]
    manifest: Option<PathBuf>,
    /// Path of the MIX file to create.
    mixfile: PathBuf,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(u8::from(err.use_stderr()));
        }
    };
    logging::init(if args.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    });
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let hash_method = if args.crc32 {
        HashMethod::Crc32
    } else {
        HashMethod::Cnc
    };
    let encryption = args.encrypt.then(key_init);
    let mut builder = MixBuilder::new(hash_method, args.checksum, encryption, false);

    if let Some(manifest) = &args.manifest {
        log::info!(
            "Creating MIX file {} from manifest {}.",
            args.mixfile.display(),
            manifest.display()
        );
        add_from_manifest(&mut builder, manifest, &args.input)?;
    } else {
        log::info!(
            "Creating MIX file {} from directory {}.",
            args.mixfile.display(),
            args.input.display()
        );
        builder.add_dir(&args.input)?;
    }

    let out = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&args.mixfile)?;
    let info = builder.write_mix(out)?;
    log::info!(
        "Header is {} bytes, body is {} bytes, MIX contains {} files.",
        info.header_size,
        info.body_size,
        info.file_count
    );
    Ok(())
}

/// Queue every file the manifest lists, relative to the search directory.
/// Unaddable files are warned about and skipped, like with a directory
/// scan.
fn add_from_manifest(builder: &mut MixBuilder, manifest: &Path, base: &Path) -> Result<()> {
    let reader = BufReader::new(File::open(manifest)?);
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if name.is_empty() {
            continue;
        }
        if let Err(err) = builder.add_file(base.join(name)) {
            log::warn!("Skipping {}: {}", name, err);
        }
    }
    Ok(())
}
