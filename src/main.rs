use case_analyst::Result;
use case_analyst::commands::{
    ask_question, delete_document, ingest_document, list_documents, show_status,
};
use case_analyst::config::{run_interactive_config, show_config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "case-analyst")]
#[command(about = "Ask grounded questions about long documents using local retrieval")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding service and answer generation
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Extract, chunk and index a document
    Ingest {
        /// Path to a .txt, .md, .text or .pdf file
        path: PathBuf,
        /// Name to catalog the document under (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Ask a question about an ingested document
    Ask {
        /// Document name or index key
        document: String,
        /// The question to answer from the document
        question: String,
        /// Print the retrieved chunks the answer was drawn from
        #[arg(long)]
        sources: bool,
    },
    /// List ingested documents
    List,
    /// Delete a document's index and catalog entry
    Delete {
        /// Document name or index key
        document: String,
    },
    /// Show configuration and service status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ingest { path, name } => {
            ingest_document(&path, name).await?;
        }
        Commands::Ask {
            document,
            question,
            sources,
        } => {
            ask_question(&document, &question, sources).await?;
        }
        Commands::List => {
            list_documents().await?;
        }
        Commands::Delete { document } => {
            delete_document(&document).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["case-analyst", "list"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(parsed.command, Commands::List));
        }
    }

    #[test]
    fn ingest_command_with_path() {
        let cli = Cli::try_parse_from(["case-analyst", "ingest", "reports/q3.txt"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ingest { path, name } = parsed.command {
                assert_eq!(path, PathBuf::from("reports/q3.txt"));
                assert_eq!(name, None);
            } else {
                panic!("expected ingest command");
            }
        }
    }

    #[test]
    fn ingest_command_with_name() {
        let cli = Cli::try_parse_from([
            "case-analyst",
            "ingest",
            "reports/q3.txt",
            "--name",
            "Q3 Report",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ingest { name, .. } = parsed.command {
                assert_eq!(name, Some("Q3 Report".to_string()));
            } else {
                panic!("expected ingest command");
            }
        }
    }

    #[test]
    fn ask_command_with_sources() {
        let cli = Cli::try_parse_from([
            "case-analyst",
            "ask",
            "q3.txt",
            "What drove revenue growth?",
            "--sources",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask {
                document,
                question,
                sources,
            } = parsed.command
            {
                assert_eq!(document, "q3.txt");
                assert_eq!(question, "What drove revenue growth?");
                assert!(sources);
            } else {
                panic!("expected ask command");
            }
        }
    }

    #[test]
    fn ask_requires_question() {
        let cli = Cli::try_parse_from(["case-analyst", "ask", "q3.txt"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn delete_command() {
        let cli = Cli::try_parse_from(["case-analyst", "delete", "q3_index"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(
                parsed.command,
                Commands::Delete { document } if document == "q3_index"
            ));
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["case-analyst", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["case-analyst", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["case-analyst", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
