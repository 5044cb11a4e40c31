use react_repo_search::{
    config::Config,
    github_api_utils::github_api_helper::GithubGraphqlClient,
    search_utils::{
        session::{SearchSession, SessionEvent},
        url_sync::{write_state, History, HistoryMode},
    },
};

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use url::Url;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

/// Searches github repositories tagged `react`.
#[derive(Parser, Debug)]
#[command(name = "react_repo_search", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive search: type to search, :n / :p to page, :q to quit
    Browse {
        /// Location to restore the search from (defaults to the configured base url)
        #[arg(long)]
        location: Option<Url>,
    },
    /// Prints the first page of one search
    Search {
        /// Search text, words are joined with spaces
        text: Vec<String>,
    },
}

/// One stdin line is either a navigation command or the new search text.
fn parse_line(line: &str) -> SessionEvent {
    match line.trim() {
        ":n" | ":next" => SessionEvent::Next,
        ":p" | ":prev" | ":back" => SessionEvent::Previous,
        ":q" | ":quit" => SessionEvent::Quit,
        _ => SessionEvent::Input(line.to_owned()),
    }
}

async fn forward_stdin(tx: mpsc::Sender<SessionEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(parse_line(&line)).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                let _ = tx.send(SessionEvent::Quit).await;
                break;
            }
            Err(err) => {
                error!("Couldn't read stdin: {err}");
                break;
            }
        }
    }
}

async fn browse(client: Arc<GithubGraphqlClient>, config: &Config, location: Url) {
    let mut session = SearchSession::mount(client, config, location);
    println!("{}", session.view());
    println!("Type to search, :n next page, :p previous page, :q quit");

    let (tx, rx) = mpsc::channel(32);
    let stdin_task = tokio::spawn(forward_stdin(tx));

    let mut last_location = session.location().to_string();
    session
        .run(rx, |session| {
            println!("\n{}", session.view());
            let location = session.location().to_string();
            if location != last_location {
                println!("{location}");
                last_location = location;
            }
        })
        .await;
    stdin_task.abort();
}

async fn search_once(client: Arc<GithubGraphqlClient>, config: &Config, text: &str) {
    let mut history = History::new(config.base_url.clone());
    write_state(&mut history, text, None, HistoryMode::Replace);
    let mut session = SearchSession::mount(client, config, history.current().clone());
    session.next_outcome().await;
    println!("{}", session.view());
    println!("{}", session.location());
}

#[tokio::main]
async fn main() {
    // load env variables
    dotenv().ok();
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => Arc::new(config),
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = config.require_api_key() {
        error!("{err}, set it in the .env");
        std::process::exit(1);
    }
    let client = Arc::new(GithubGraphqlClient::new(
        reqwest::Client::new(),
        config.clone(),
    ));

    match cli.command {
        Command::Browse { location } => {
            let location = location.unwrap_or_else(|| config.base_url.clone());
            browse(client, &config, location).await
        }
        Command::Search { text } => search_once(client, &config, &text.join(" ")).await,
    }
}
