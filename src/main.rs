use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rmdex::cache::{PageCursor, SqliteStorage};
use rmdex::config::Config;
use rmdex::rm::types::{Character, Episode};
use rmdex::rm::{CharacterRepository, LocationRepository, RickMortyClient};

#[derive(Parser, Debug)]
#[command(name = "rmdex")]
#[command(about = "An offline-first terminal client for the Rick and Morty API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/rmdex/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List cached characters, fetching the first page if the cache is empty
  List,
  /// Fetch the next page of characters into the cache
  More,
  /// Show a character with its episodes
  Show { id: i64 },
  /// List the episodes a character appears in
  Episodes { id: i64 },
  /// Show a location and its residents
  Location { id: i64 },
  /// Print the pagination cursor
  Cursor,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _log_guard = rmdex::logging::init(&config.log)?;

  let remote = Arc::new(RickMortyClient::new(&config.api)?);
  let store = Arc::new(SqliteStorage::open(&config.cache_path()?)?);
  let characters = CharacterRepository::new(Arc::clone(&remote), store);

  match args.command {
    Command::List => {
      let mut feed = characters.get_characters()?;
      let mut snapshot = feed.current()?;
      if snapshot.is_empty() {
        // First run: wait for the background page fetch to land. A failed
        // fetch is logged by the repository and never changes the feed.
        let wait = Duration::from_secs(config.api.timeout_secs + 1);
        match tokio::time::timeout(wait, feed.changed()).await {
          Ok(Some(next)) => snapshot = next?,
          _ => eprintln!("No characters cached yet; try `rmdex more`."),
        }
      }
      for character in &snapshot {
        print_character_line(character);
      }
    }
    Command::More => {
      characters.load_more().await?;
      print_cursor(characters.cursor()?);
    }
    Command::Show { id } => {
      let details = characters.get_character_detailed(id).await?;
      let c = &details.character;
      println!("#{} {}", c.id, c.name);
      println!("  status:   {}", c.status.as_str());
      println!("  species:  {}", c.species);
      if !c.kind.is_empty() {
        println!("  type:     {}", c.kind);
      }
      println!("  gender:   {}", c.gender.as_str());
      println!("  origin:   {}", c.origin.name);
      println!("  location: {}", c.location.name);
      println!("  avatar:   {}", c.avatar_url);
      println!("  episodes:");
      print_episodes(&details.episodes);
    }
    Command::Episodes { id } => {
      print_episodes(&characters.get_episodes_where(id).await?);
    }
    Command::Location { id } => {
      let location = LocationRepository::new(remote).get_location(id).await?;
      println!("#{} {} ({}, {})", location.id, location.name, location.kind, location.dimension);
      for resident in &location.residents {
        print_character_line(resident);
      }
    }
    Command::Cursor => print_cursor(characters.cursor()?),
  }

  Ok(())
}

fn print_character_line(c: &Character) {
  println!("{:>4}  {:<32} {:<8} {}", c.id, c.name, c.status.as_str(), c.species);
}

fn print_episodes(episodes: &[Episode]) {
  for e in episodes {
    println!("    {}  {} ({})", e.code, e.name, e.air_date);
  }
}

fn print_cursor(cursor: PageCursor) {
  match cursor {
    PageCursor::Next(page) => println!("next page: {}", page),
    PageCursor::Exhausted => println!("all pages loaded"),
  }
}
