//! `fatvfs`: an interactive shell over the FAT32-style VFS, plus a
//! non-interactive escape hatch for scripting.
//!
//! Grounded on `examples/ShHaWkK-The_Heap/fat32/src/main.rs`'s
//! `--file`/shell split and `original_source/fat32/src/terminal.cpp`'s
//! `input()` loop (print prompt, read a line, dispatch, repeat until
//! `exit`).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use fat32_core::FatConfig;
use fatvfs::{Outcome, Shell};
use vfs_core::Registry;

/// Interactive shell and scripting front-end for the FAT32-style VFS.
#[derive(Parser, Debug)]
#[command(name = "fatvfs", about = "FAT32-style virtual file system shell")]
struct Cli {
    /// Directory disk images are stored under.
    #[arg(long, default_value = "disks")]
    disks_dir: PathBuf,

    /// Run a single command line (`;`-separated for more than one) and
    /// exit instead of starting the interactive shell.
    #[arg(long)]
    non_interactive: Option<String>,

    /// Cluster size in bytes for any disk created during this session.
    #[arg(long, default_value_t = FatConfig::default().cluster_size)]
    cluster_size: u32,

    /// Total image size in bytes for any disk created during this session.
    #[arg(long, default_value_t = FatConfig::default().total_size)]
    total_size: u32,
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("fatvfs: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.disks_dir)
        .with_context(|| format!("creating disks directory {:?}", cli.disks_dir))?;

    let config = FatConfig {
        cluster_size: cli.cluster_size,
        total_size: cli.total_size,
    };
    let mut shell = Shell::new(Registry::new(cli.disks_dir, config));

    Ok(match cli.non_interactive {
        Some(script) => run_script(&mut shell, &script),
        None => run_repl(&mut shell),
    })
}

fn run_script(shell: &mut Shell, script: &str) -> ExitCode {
    for line in script.split(';') {
        match shell.execute(line) {
            Outcome::Continue(text) => {
                if !text.is_empty() {
                    println!("{text}");
                }
            }
            Outcome::Exit(code) => return exit_code(code),
        }
    }
    ExitCode::SUCCESS
}

fn run_repl(shell: &mut Shell) -> ExitCode {
    println!("enter /help for the command list\n--------------------");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}", shell.prompt());
        if io::stdout().flush().is_err() {
            return ExitCode::FAILURE;
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(_)) => return ExitCode::FAILURE,
            None => return ExitCode::SUCCESS,
        };

        match shell.execute(&line) {
            Outcome::Continue(text) => {
                if !text.is_empty() {
                    println!("{text}");
                }
            }
            Outcome::Exit(code) => return exit_code(code),
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
