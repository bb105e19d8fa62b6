//! Filebox interactive client.
//!
//! Thin menu over the one-shot transport in `filebox::client`. Server-side
//! errors come back as structured replies and are printed, never raised;
//! a missing reply means the server could not be reached at all.

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::Parser;
use std::io::{self, Write};
use std::path::Path;

use filebox::cli::ClientOpts;
use filebox::client::Client;
use filebox::router::{Reply, Status};

/// Local directory downloads are saved into.
const DOWNLOAD_DIR: &str = "files";

fn main() -> Result<()> {
    let opts = ClientOpts::parse();
    let client = Client::new(&opts.host, opts.port);

    std::fs::create_dir_all(DOWNLOAD_DIR).context("failed to create download directory")?;

    ctrlc::set_handler(|| {
        println!("\nInterrupted.");
        std::process::exit(0);
    })
    .context("failed to install signal handler")?;

    println!("===== Filebox Client =====");
    println!("Server: {}", client.addr());

    loop {
        println!();
        println!("Menu:");
        println!("  1. List files on the server");
        println!("  2. Download a file");
        println!("  3. Upload a file");
        println!("  4. Delete a file");
        println!("  5. Quit");

        let Some(choice) = prompt("\nYour choice (1-5): ")? else {
            break;
        };
        match choice.as_str() {
            "1" => list_files(&client),
            "2" => download_file(&client)?,
            "3" => upload_file(&client)?,
            "4" => delete_file(&client)?,
            "5" => {
                println!("Bye.");
                break;
            }
            _ => println!("Invalid choice, pick 1-5."),
        }
    }
    Ok(())
}

/// Read one trimmed line from stdin; `None` on end of input.
fn prompt(message: &str) -> Result<Option<String>> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn server_message(reply: &Reply) -> &str {
    reply.data.as_str().unwrap_or("unknown error")
}

fn list_files(client: &Client) {
    println!("\nFetching file list from the server...");
    let Some(reply) = client.list() else {
        println!("Could not reach the server.");
        return;
    };
    if reply.status != Status::Ok {
        println!("Listing failed: {}", server_message(&reply));
        return;
    }
    let names: Vec<&str> = reply
        .data
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();
    println!("\n=== Files on the server ===");
    if names.is_empty() {
        println!("(no files)");
    } else {
        for (i, name) in names.iter().enumerate() {
            println!("{}. {}", i + 1, name);
        }
    }
    println!("===========================");
}

fn download_file(client: &Client) -> Result<()> {
    let Some(name) = prompt("\nName of the file to download: ")? else {
        return Ok(());
    };
    if name.is_empty() {
        println!("The filename must not be empty.");
        return Ok(());
    }

    println!("Downloading {name}...");
    let Some(reply) = client.get(&name) else {
        println!("Could not reach the server.");
        return Ok(());
    };
    if reply.status != Status::Ok {
        println!("Download failed: {}", server_message(&reply));
        return Ok(());
    }

    let encoded = reply.data_file.unwrap_or_default();
    let content = match BASE64.decode(encoded) {
        Ok(c) => c,
        Err(e) => {
            println!("Could not decode the file payload: {e}");
            return Ok(());
        }
    };
    let dest = Path::new(DOWNLOAD_DIR).join(&name);
    match std::fs::write(&dest, content) {
        Ok(()) => println!("Saved '{}' to {}", name, dest.display()),
        Err(e) => println!("Could not save the file: {e}"),
    }
    Ok(())
}

fn upload_file(client: &Client) -> Result<()> {
    let Some(path) = prompt("\nPath of the file to upload: ")? else {
        return Ok(());
    };
    if path.is_empty() {
        println!("The path must not be empty.");
        return Ok(());
    }

    let content = match std::fs::read(&path) {
        Ok(c) => c,
        Err(e) => {
            println!("Could not read {path}: {e}");
            return Ok(());
        }
    };
    let name = match Path::new(&path).file_name() {
        Some(n) => n.to_string_lossy().into_owned(),
        None => bail!("path has no filename: {path}"),
    };

    println!("Uploading {name} ({} bytes)...", content.len());
    match client.upload(&name, &content) {
        None => println!("Could not reach the server."),
        Some(reply) if reply.status == Status::Ok => {
            println!("Uploaded '{name}' to the server.");
        }
        Some(reply) => println!("Upload failed: {}", server_message(&reply)),
    }
    Ok(())
}

fn delete_file(client: &Client) -> Result<()> {
    let Some(name) = prompt("\nName of the file to delete: ")? else {
        return Ok(());
    };
    if name.is_empty() {
        println!("The filename must not be empty.");
        return Ok(());
    }
    let Some(confirm) = prompt(&format!("Really delete '{name}'? (y/n): "))? else {
        return Ok(());
    };
    if confirm.to_lowercase() != "y" {
        println!("Deletion cancelled.");
        return Ok(());
    }

    println!("Deleting {name}...");
    match client.delete(&name) {
        None => println!("Could not reach the server."),
        Some(reply) if reply.status == Status::Ok => {
            println!("Deleted '{name}' from the server.");
        }
        Some(reply) => println!("Deletion failed: {}", server_message(&reply)),
    }
    Ok(())
}
