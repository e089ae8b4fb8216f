//! Basic example: spawn a shell and run a few commands.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example run_commands -- --profile posix --command "uname -a" --command "ls"
//! ```
//!
//! Set `RUST_LOG=debug` to see the session's state changes and commands,
//! or `RUST_LOG=trace` for every read.

use std::env;
use std::time::Duration;

use shellpipe::{PollStrategy, ReadMode, SessionBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Starting '{}' shell...", args.profile);

    let mut session = SessionBuilder::new()
        .profile(&args.profile)
        .poll_strategy(PollStrategy::Readiness(Duration::from_millis(50)))
        .read_timeout(Duration::from_secs(args.timeout))
        .build()?;

    if let Some(pid) = session.pid() {
        println!("Shell running as pid {}", pid);
    }

    // The shell prints a prompt as soon as it starts.
    session.read_until_prompt(|_| {}, ReadMode::Buffered)?;

    let commands = if args.commands.is_empty() {
        vec!["echo hello".to_string(), "pwd".to_string()]
    } else {
        args.commands
    };

    for command in &commands {
        let response = session.send_command(command)?;
        println!("$ {}", command);
        print!("{}", response.result);
        println!("({:?})\n", response.elapsed);
    }

    let stderr = session.drain_stderr()?;
    if !stderr.is_empty() {
        eprintln!("stderr: {}", stderr);
    }

    println!("Done!");
    Ok(())
}

struct Args {
    profile: String,
    timeout: u64,
    commands: Vec<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut profile = "posix".to_string();
        let mut timeout = 10u64;
        let mut commands = Vec::new();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--profile" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        profile = args[i].clone();
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(10);
                    }
                }
                "--command" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        commands.push(args[i].clone());
                    }
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            profile,
            timeout,
            commands,
        }
    }
}
