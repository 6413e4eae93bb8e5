//! mctest CLI
//!
//! Builds the compiler under test and runs the conformance suite.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mctest::{init_tracing, RunnerConfig, TestRunner, FATAL_EXIT_CODE};

/// Printed when no build descriptor is given.
const MISSING_DESCRIPTOR_PROMPT: &str = "Please enter the location of the makefile";

#[derive(Debug, Parser)]
#[command(
    name = "mctest",
    version,
    about = "Build the mccomp compiler and run its conformance suite"
)]
struct Args {
    /// Makefile that builds the compiler under test.
    makefile: Option<PathBuf>,

    /// Directory holding driver.cpp and tests/ (default: current directory).
    #[arg(long, value_name = "DIR")]
    suite: Option<PathBuf>,

    /// Name of the compiler executable the build produces.
    #[arg(long, value_name = "NAME")]
    compiler_name: Option<String>,

    /// Build tool run next to the makefile.
    #[arg(long, value_name = "PROGRAM")]
    make: Option<String>,

    /// Native compiler used to link generated code with driver.cpp.
    #[arg(long, value_name = "PROGRAM")]
    cc: Option<String>,

    /// Per-step timeout in seconds; 0 disables it.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Log pipeline steps to stderr (RUST_LOG overrides).
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> RunnerConfig {
        let mut config = RunnerConfig::default();
        if let Some(suite) = &self.suite {
            config.suite_root.clone_from(suite);
        }
        if let Some(name) = &self.compiler_name {
            config.compiler_name.clone_from(name);
        }
        if let Some(make) = &self.make {
            config.build_tool.clone_from(make);
        }
        if let Some(cc) = &self.cc {
            config.native_compiler.clone_from(cc);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout_secs(secs);
        }
        config
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let Some(makefile) = args.makefile.as_deref() else {
        println!("{MISSING_DESCRIPTOR_PROMPT}");
        return ExitCode::SUCCESS;
    };

    let runner = TestRunner::with_config(args.config());
    let mut stdout = io::stdout().lock();

    match runner.run(makefile, &mut stdout) {
        Ok(summary) => ExitCode::from(summary.exit_code()),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(FATAL_EXIT_CODE)
        }
    }
}
