use std::env;
use std::error::Error;
use std::io::{self, Write};
use std::time::Duration;

use crossword_protocol::{decode_client_event, decode_server_event};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Where to connect: env override or default.
    let addr = env::var("CROSSWORD_CLIENT_ADDR").unwrap_or_else(|_| "127.0.0.1:5001".to_string());

    println!("Connecting to {}...", addr);
    let stream = TcpStream::connect(&addr).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    println!("Connected.");
    println!("Type one JSON event per line, e.g.:");
    println!(r#"  {{"event":"authenticate","data":{{"username":"alice"}}}}"#);
    println!(r#"  {{"event":"create_game","data":{{"puzzle_id":7}}}}"#);
    println!(r#"  {{"event":"join_game","data":{{"game_id":"<id>","username":"alice"}}}}"#);
    println!("Type 'quit' or 'exit' to leave.\n");

    let stdin = io::stdin();

    loop {
        // Prompt
        print!(">> ");
        io::stdout().flush()?;

        let mut line = String::new();
        let n = stdin.read_line(&mut line)?;
        if n == 0 {
            // EOF
            println!("\nEOF on stdin, exiting client.");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            println!("Exiting client.");
            break;
        }

        // Catch typos locally before they reach the server.
        if let Err(e) = decode_client_event(trimmed) {
            eprintln!("Not a valid client event: {}", e);
            continue;
        }

        write_half.write_all(trimmed.as_bytes()).await?;
        write_half.write_all(b"\n").await?;

        // Print everything that arrives shortly after; timer ticks keep
        // coming, so anything later shows up after the next command.
        loop {
            match timeout(Duration::from_millis(150), lines.next_line()).await {
                Ok(Ok(Some(frame))) => match decode_server_event(&frame) {
                    Ok(event) => println!("<< {:?}", event),
                    Err(e) => println!("<< {} (undecodable: {})", frame, e),
                },
                Ok(Ok(None)) => {
                    println!("Server closed the connection.");
                    return Ok(());
                }
                Ok(Err(e)) => {
                    eprintln!("Read error: {:?}", e);
                    return Ok(());
                }
                Err(_) => break,
            }
        }
    }

    Ok(())
}
