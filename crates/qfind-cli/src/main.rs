//! qfind-cli: the thin CLI wrapper above the engine (spec §6). Builds an
//! in-memory index from a directory scan and serves a single query in the
//! same process; no daemon, no persistence.

use clap::Parser;
use qfind_core::Config;
use qfind_engine::{Index, QueryCtx};
use qfind_walker::Walker;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "qfind")]
#[command(about = "on-host file name search", long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Reserved for a future on-disk index; ignored in this version.
    #[arg(short = 'd', long = "db", value_name = "DBPATH")]
    db_path: Option<String>,

    /// Case-insensitive match.
    #[arg(short = 'i')]
    case_insensitive: bool,

    /// Treat PATTERN as a regular expression.
    #[arg(short = 'r')]
    regex: bool,

    /// Force a fresh index rebuild. No-op in this version: every invocation
    /// scans from scratch since there is no persisted index to reuse.
    #[arg(short = 'u')]
    rebuild: bool,

    /// Show this help message and exit.
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    /// Show version information and exit.
    #[arg(short = 'v', long = "version", action = clap::ArgAction::SetTrue)]
    version: bool,

    /// Query terms, joined with spaces into a single pattern.
    pattern: Vec<String>,
}

fn main() -> ExitCode {
    qfind_core::logging::init();

    let cli = Cli::parse();

    if cli.help {
        print_help();
        return ExitCode::SUCCESS;
    }
    if cli.version {
        println!("{}", qfind_core::build_info::BUILD_INFO.version_line("qfind"));
        return ExitCode::SUCCESS;
    }

    let _ = cli.db_path; // reserved, spec §6
    let _ = cli.rebuild; // no persisted index to skip rebuilding in this version

    if cli.pattern.is_empty() {
        eprintln!("qfind: no pattern given");
        print_help();
        return ExitCode::FAILURE;
    }
    let pattern = cli.pattern.join(" ");

    match run(&pattern, cli.case_insensitive, cli.regex) {
        Ok(found) => {
            if found {
                ExitCode::SUCCESS
            } else {
                println!("No matching files found.");
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("qfind: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(pattern: &str, case_insensitive: bool, regex: bool) -> qfind_core::Result<bool> {
    let config = load_config()?;
    let index = Index::new(config.engine);

    let walker = Walker::new(config);
    let entries = walker.scan();
    index.build(entries)?;

    let ctx = QueryCtx {
        query_string: pattern.to_string(),
        case_sensitive: !case_insensitive,
        regex_enabled: regex,
        uid: current_uid(),
        gid: current_gid(),
        max_results: index.config().results_per_thread,
    };

    let results = qfind_engine::search(&index, &ctx)?;
    for result in &results {
        println!("{}", result.path);
    }
    Ok(!results.is_empty())
}

fn current_uid() -> u32 {
    unsafe { libc::getuid() }
}

fn current_gid() -> u32 {
    unsafe { libc::getgid() }
}

fn load_config() -> qfind_core::Result<Config> {
    let config_path = qfind_core::paths::config_path();
    if config_path.exists() {
        Config::load(&config_path)
    } else {
        Ok(Config::default())
    }
}

fn print_help() {
    println!("qfind [-d DBPATH] [-i] [-r] [-u] [-h] [-v] PATTERN...");
    println!();
    println!("  -i  case-insensitive match");
    println!("  -r  treat PATTERN as a regular expression");
    println!("  -u  force a rebuild of the index before searching");
    println!("  -d  DBPATH  reserved for a future on-disk index");
    println!("  -h  show this help message");
    println!("  -v  show version information");
}
