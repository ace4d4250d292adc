use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "sakubiki-cmd")]
#[command(about = "Command-line utility for sakubiki full-text indexes")]
#[command(version)]
struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Index directory
    #[arg(long, default_value = "sakubiki.mdb", global = true)]
    db: PathBuf,

    /// JSON file with the index configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add, print and list documents
    #[command(subcommand)]
    Doc(DocCommand),

    /// Look up words and their occurrences
    #[command(subcommand)]
    Word(WordCommand),

    /// Show the tokens the configured tokenizer produces for a text
    Tokenize {
        /// Text to tokenize
        text: String,
    },

    /// Display summary information about the index
    Stats,
}

#[derive(Subcommand)]
enum DocCommand {
    /// Ingest a file as the document NAME
    Add {
        /// Document name
        name: String,

        /// File to ingest
        file: PathBuf,
    },

    /// Ingest files; each document is named by its path as given
    AddFiles {
        /// File(s) to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Write the content of a document to stdout
    Print {
        /// Document name
        name: String,
    },

    /// List all documents with their identifiers
    List,

    /// Show the name and size of a document
    Info {
        /// Document identifier
        id: u32,
    },
}

#[derive(Subcommand)]
enum WordCommand {
    /// List every occurrence of a word as document identifier and offset
    Indices {
        word: String,
    },

    /// Count the occurrences of a word
    Count {
        word: String,
    },

    /// List all indexed words
    List,

    /// Show occurrences of a word in context
    Examples {
        word: String,

        /// Bytes of context on each side
        #[arg(long, default_value_t = 30)]
        radius: usize,

        /// Maximum number of examples
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_tracing(cli.verbose);

    let db = cli.db.as_path();
    let config = cli.config.as_deref();
    tracing::debug!("index directory {}", db.display());
    match cli.command {
        Commands::Doc(DocCommand::Add { name, file }) => {
            commands::doc::add(db, config, &name, &file)
        }
        Commands::Doc(DocCommand::AddFiles { files }) => {
            commands::doc::add_files(db, config, &files)
        }
        Commands::Doc(DocCommand::Print { name }) => commands::doc::print(db, config, &name),
        Commands::Doc(DocCommand::List) => commands::doc::list(db, config),
        Commands::Doc(DocCommand::Info { id }) => commands::doc::info(db, config, id),
        Commands::Word(WordCommand::Indices { word }) => commands::word::indices(db, config, &word),
        Commands::Word(WordCommand::Count { word }) => commands::word::count(db, config, &word),
        Commands::Word(WordCommand::List) => commands::word::list(db, config),
        Commands::Word(WordCommand::Examples {
            word,
            radius,
            limit,
        }) => commands::word::examples(db, config, &word, radius, limit),
        Commands::Tokenize { text } => commands::tokenize::run(config, &text),
        Commands::Stats => commands::stats::run(db, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_add_takes_name_and_file() {
        let cli = Cli::try_parse_from(["sakubiki-cmd", "doc", "add", "notes", "/tmp/notes.txt"])
            .unwrap();
        match cli.command {
            Commands::Doc(DocCommand::Add { name, file }) => {
                assert_eq!(name, "notes");
                assert_eq!(file, PathBuf::from("/tmp/notes.txt"));
            }
            _ => panic!("expected doc add"),
        }
        assert!(Cli::try_parse_from(["sakubiki-cmd", "doc", "add", "/tmp/notes.txt"]).is_err());

        let cli = Cli::try_parse_from(["sakubiki-cmd", "doc", "add-files", "a.txt", "b.txt"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Doc(DocCommand::AddFiles { files }) if files.len() == 2
        ));
    }
}
