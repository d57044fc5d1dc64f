//! Command line MIX listing and extraction tool.

use std::{
    fs::File,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use log::LevelFilter;

use mixkit::{
    crc::HashMethod,
    crypto::key_init,
    logging,
    mix::{
        db::{
            io::{open_default_database, save_database},
            MixNameDatabase,
        },
        io::MixArchive,
        LMD_KEY_CNC, LMD_KEY_CRC32,
    },
};

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("{0}")]
    IO(#[from] std::io::Error),
    #[error("{0}")]
    Mix(#[from] mixkit::mix::Error),
    #[error("{0}")]
    DbIO(#[from] mixkit::mix::db::io::Error),
}

type Result<T> = std::result::Result<T, Error>;

#[derive(Parser)]
#[command(name = "unmakemix")]
#[command(version)]
#[command(about = "List or extract the contents of a MIX archive.", long_about = None)]
struct Args {
    /// Extract files from the mixfile.
    #[arg(short = 'x', long)]
    extract: bool,
    /// List the contents of the mixfile.
    #[arg(short, long)]
    list: bool,
    /// Force use of CRC32 instead of the C&C hash for a TS era mix.
    #[arg(short = 'c', long)]
    crc32: bool,
    /// Print current status while working.
    #[arg(short, long)]
    verbose: bool,
    /// Directory to output files to. Defaults to the working directory.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// A member to extract; can be given multiple times. All files found
    /// in the mix are extracted otherwise.
    #[arg(short = 'f', long = "file")]
    files: Vec<String>,
    /// Path to the MIX file to read.
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
    logging::init(if args.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
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

    let (mut namedb, db_path) = open_default_database()?;
    // Names asked for on the command line are worth remembering.
    for name in &args.files {
        namedb.add_entry(name, "", None);
    }

    let keys = key_init();
    let mut archive = MixArchive::open(File::open(&args.mixfile)?, Some(&keys.public))?;

    if args.list {
        list_mix(&mut archive, &mut namedb, hash_method);
    }
    if args.extract {
        extract_mix(&mut archive, &args, &mut namedb, hash_method)?;
    }

    if namedb.is_modified() {
        save_database(&mut namedb, &db_path)?;
    }
    Ok(())
}

fn list_mix(archive: &mut MixArchive<File>, db: &mut MixNameDatabase, method: HashMethod) {
    println!("{:<24}  {:<10}  {:<10}", "Filename", "Offset", "Size");
    println!(
        "{:<24}  {:<10}  {:<10}",
        "========================", "==========", "=========="
    );
    for entry in archive.index().to_vec() {
        let name = db.name_or_hash(entry.id, Some(method));
        println!("{:<24}  {:>10}  {:>10}", name, entry.offset, entry.size);
    }
}

fn extract_mix(
    archive: &mut MixArchive<File>,
    args: &Args,
    db: &mut MixNameDatabase,
    method: HashMethod,
) -> Result<()> {
    let out_dir = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)?;

    if args.files.is_empty() {
        let lmd_key = match method {
            HashMethod::Cnc => LMD_KEY_CNC,
            HashMethod::Crc32 => LMD_KEY_CRC32,
        };
        for entry in archive.index().to_vec() {
            if entry.id == lmd_key {
                log::info!("XCC local mix database extension detected, skipping entry.");
                continue;
            }
            let name = db.name_or_hash(entry.id, Some(method));
            if let Err(err) = extract_one(archive, entry.id, &out_dir.join(&name)) {
                log::warn!("Failed to extract {}: {}", name, err);
            }
        }
    } else {
        for name in &args.files {
            let id = method.hash(name);
            if archive.find(id).is_none() {
                log::warn!("Failed to find {} in the mix file.", name);
                continue;
            }
            if let Err(err) = extract_one(archive, id, &out_dir.join(name)) {
                log::warn!("Failed to extract {}: {}", name, err);
            }
        }
    }
    Ok(())
}

fn extract_one(archive: &mut MixArchive<File>, id: i32, path: &Path) -> Result<()> {
    log::info!("Extracting {}.", path.display());
    let mut writer = File::create(path)?;
    archive.extract(id, &mut writer)?;
    Ok(())
}
