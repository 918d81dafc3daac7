use std::path::PathBuf;
use std::process;

use beryl_drv::{process_file, Config};

fn main() {
    let mut config = Config::default();
    let mut files: Vec<PathBuf> = Vec::new();

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--tokens" => config.tokens_only = true,
            "--help" | "-h" => {
                eprintln!("usage: berylc [--tokens] FILE...");
                return;
            },
            _ => files.push(PathBuf::from(arg)),
        }
    }

    if files.is_empty() {
        eprintln!("usage: berylc [--tokens] FILE...");
        process::exit(2);
    }

    for file in &files {
        match process_file(file, &config) {
            Ok(output) => print!("{}", output),
            Err(error) => {
                eprintln!("{}", error);
                process::exit(1);
            },
        }
    }
}
