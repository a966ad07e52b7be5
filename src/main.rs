//! filestream - inspect and move bytes through the file stream backends.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use filestream::{AccessHints, AccessMode, FileStream, FileStreamFactory};
use std::io::Write;
use std::path::PathBuf;

fn hint_args() -> [Arg; 2] {
    [
        Arg::new("unbuffered")
            .long("unbuffered")
            .help("Use raw descriptor I/O instead of the stream buffer")
            .action(ArgAction::SetTrue),
        Arg::new("mmap")
            .long("mmap")
            .help("Memory-map the file if possible")
            .action(ArgAction::SetTrue),
    ]
}

fn path_arg() -> Arg {
    Arg::new("path")
        .help("Path to the file")
        .required(true)
        .index(1)
}

fn hints_from(matches: &ArgMatches) -> Result<AccessHints> {
    let unbuffered = matches.get_flag("unbuffered");
    let memory_map = matches.get_flag("mmap");
    if !unbuffered && !memory_map {
        return default_hints();
    }
    Ok(AccessHints::NONE
        .with_unbuffered(unbuffered)
        .with_memory_map(memory_map))
}

#[cfg(feature = "config")]
fn default_hints() -> Result<AccessHints> {
    let config = filestream::config::CliConfig::load_default().context("Failed to load config")?;
    Ok(config.hints)
}

#[cfg(not(feature = "config"))]
fn default_hints() -> Result<AccessHints> {
    Ok(AccessHints::NONE)
}

fn path_from(matches: &ArgMatches) -> PathBuf {
    PathBuf::from(
        matches
            .get_one::<String>("path")
            .expect("path argument is required"),
    )
}

fn open_for_reading(matches: &ArgMatches) -> Result<FileStream> {
    let path = path_from(matches);
    let hints = hints_from(matches)?;
    FileStream::open(&path, AccessMode::Read, hints)
        .with_context(|| format!("Failed to open {}", path.display()))
}

fn cat(matches: &ArgMatches) -> Result<()> {
    let mut stream = open_for_reading(matches)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).context("Read failed")?;
        if n == 0 {
            break;
        }
        out.write_all(&chunk[..n])?;
    }
    out.flush()?;
    stream.close().context("Close failed")?;
    Ok(())
}

fn stat(matches: &ArgMatches) -> Result<()> {
    let stream = open_for_reading(matches)?;
    println!("path:     {}", stream.path().display());
    println!("size:     {}", stream.size());
    if let Some(strategy) = stream.strategy() {
        println!("strategy: {:?}", strategy);
    }
    stream.close().context("Close failed")?;
    Ok(())
}

fn write(matches: &ArgMatches) -> Result<()> {
    let path = path_from(matches);
    let text = matches
        .get_one::<String>("text")
        .expect("text argument is required");
    FileStreamFactory::native()
        .write_file(&path, text.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn remove(matches: &ArgMatches) -> Result<()> {
    let path = path_from(matches);
    filestream::delete(&path).with_context(|| format!("Failed to delete {}", path.display()))
}

fn main() -> Result<()> {
    // Initialize logging, controlled by RUST_LOG
    env_logger::init();

    let matches = Command::new("filestream")
        .version(filestream::VERSION)
        .about("Read, write and inspect files through filestream backends")
        .subcommand_required(true)
        .subcommand(
            Command::new("cat")
                .about("Copy a file to standard output")
                .arg(path_arg())
                .args(hint_args()),
        )
        .subcommand(
            Command::new("stat")
                .about("Show the size and access strategy of a file")
                .arg(path_arg())
                .args(hint_args()),
        )
        .subcommand(
            Command::new("write")
                .about("Replace a file's contents with the given text")
                .arg(path_arg())
                .arg(
                    Arg::new("text")
                        .help("Text to write")
                        .required(true)
                        .index(2),
                ),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a file")
                .arg(path_arg()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("cat", sub)) => cat(sub),
        Some(("stat", sub)) => stat(sub),
        Some(("write", sub)) => write(sub),
        Some(("rm", sub)) => remove(sub),
        _ => unreachable!("subcommand_required is set"),
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_version_constant() {
        assert!(!filestream::VERSION.is_empty());
    }
}
