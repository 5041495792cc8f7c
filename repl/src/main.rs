/*
 * main.rs
 * Copyright (C) 2026 Edgeflush contributors
 *
 * This file is part of Edgeflush, a client for edge cache invalidation.
 *
 * Edgeflush is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Edgeflush is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Edgeflush.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Interactive shell over the batch pipeline. Reads `<action> <url>` lines from
//! stdin, prints one JSON result per completed exchange. Credentials come from
//! the environment: EDGE_TOKEN for the API token, EDGE_AUTH for basic auth.

use std::env;
use std::io::{self, Write};
use std::sync::Arc;

use edgeflush_core::{create_stream, Action, EdgeClient, Job, TracingLogger};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

fn env_client() -> EdgeClient {
    let token = env::var("EDGE_TOKEN").ok();
    let auth = env::var("EDGE_AUTH").ok();
    let mut client = EdgeClient::new(token, auth);
    client.set_logger(Arc::new(TracingLogger));
    client
}

fn prompt() {
    print!("edgeflush> ");
    let _ = io::stdout().flush();
}

/// One line of shell input, parsed.
#[derive(Debug, PartialEq)]
enum Command {
    Issue(Action, String),
    Quit,
    Blank,
}

/// Parse a shell line. `soft` is shorthand for the soft purge action; the
/// published action names are accepted too.
fn parse_line(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Blank);
    }
    if line == "quit" || line == "exit" {
        return Ok(Command::Quit);
    }
    let Some((verb, url)) = line.split_once(' ') else {
        return Err("usage: <action> <url>".to_string());
    };
    let action = match verb {
        "soft" => Action::SoftPurge,
        _ => verb
            .parse::<Action>()
            .map_err(|error| format!("{}: {}", error, verb))?,
    };
    let url = url.trim();
    if url.is_empty() {
        return Err("usage: <action> <url>".to_string());
    }
    Ok(Command::Issue(action, url.to_string()))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (jobs, mut results) = create_stream(env_client());

    let printer = tokio::spawn(async move {
        while let Some(item) = results.recv().await {
            match item {
                Ok(result) => match serde_json::to_string_pretty(&result) {
                    Ok(json) => println!("{}", json),
                    Err(error) => eprintln!("unprintable result: {}", error),
                },
                Err(error) => {
                    eprintln!("pipeline error: {}", error);
                    break;
                }
            }
            prompt();
        }
    });

    println!("commands: purge <url>, soft <url>, quit");
    prompt();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match parse_line(&line) {
            Ok(Command::Blank) => prompt(),
            Ok(Command::Quit) => break,
            Ok(Command::Issue(action, url)) => {
                if jobs.send(Job::new(action, url)).is_err() {
                    eprintln!("pipeline stopped");
                    break;
                }
            }
            Err(message) => {
                eprintln!("{}", message);
                prompt();
            }
        }
    }

    drop(jobs);
    let _ = printer.await;
}
