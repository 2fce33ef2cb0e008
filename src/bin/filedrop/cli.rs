use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "filedrop", about = "Share files through a filedrop server")]
pub struct Cli {
    /// Configuration file (defaults to ./filedrop.toml if present)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// File store URL, e.g. http://localhost:8080/file
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Granted permissions as a comma-separated list (read,write,delete)
    #[arg(long, value_name = "LIST", global = true)]
    pub permissions: Option<String>,

    /// HTTP proxy for every request
    #[arg(long, value_name = "URL", global = true)]
    pub proxy: Option<String>,

    /// Turn verbose logging on
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// list stored files
    Ls,
    /// upload local files
    Put {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// download a file
    Get {
        name: String,
        /// Write to this path instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// delete a file
    Rm {
        name: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}
