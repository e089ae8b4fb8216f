//! Streaming output example: watch a slow command's output as it arrives.
//!
//! Streaming mode hands the callback everything received so far each time
//! new output shows up, so only the new tail is printed here.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example streaming -- --command "for i in 1 2 3; do echo $i; sleep 1; done"
//! ```

use std::env;
use std::io::{self, Write};
use std::time::Duration;

use shellpipe::{PollStrategy, ReadMode, SessionBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let command = env::args()
        .skip_while(|arg| arg != "--command" && arg != "-c")
        .nth(1)
        .unwrap_or_else(|| "for i in 1 2 3; do echo line $i; sleep 1; done".to_string());

    let mut session = SessionBuilder::new()
        .poll_strategy(PollStrategy::Sleep(Duration::from_millis(10)))
        .build()?;
    session.read_until_prompt(|_| {}, ReadMode::Buffered)?;

    println!("Streaming: {}", command);
    println!("{}", "-".repeat(50));

    let mut printed = 0usize;
    session.execute(
        &command,
        Some(&mut |so_far: &str| {
            print!("{}", so_far.get(printed..).unwrap_or(""));
            let _ = io::stdout().flush();
            printed = so_far.len();
        }),
        ReadMode::Streaming,
    )?;

    println!("{}", "-".repeat(50));
    println!("Streamed {} bytes", printed);

    Ok(())
}
