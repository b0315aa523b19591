//! Command line surface: argument types, dispatch, and output formatting.

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::Config;
use crate::model::{Address, Club, Raid, Race, Team, User};
use crate::monitor::AvailabilityMonitor;
use crate::repo::{
  AddressRepository, ClubRepository, RaidRepository, RaceRepository, TeamRepository,
  UserRepository,
};
use crate::session::SessionStore;
use crate::sync::{DataSource, SqliteStore, SyncLayer};

#[derive(Parser, Debug)]
#[command(name = "raidsync")]
#[command(about = "Offline-first command line client for raid event data")]
#[command(version)]
pub struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/raidsync/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Manage raids
  #[command(subcommand)]
  Raids(RaidCommand),
  /// Manage races
  #[command(subcommand)]
  Races(RaceCommand),
  /// Manage addresses
  #[command(subcommand)]
  Addresses(AddressCommand),
  /// Manage clubs
  #[command(subcommand)]
  Clubs(ClubCommand),
  /// Manage users
  #[command(subcommand)]
  Users(UserCommand),
  /// Manage teams
  #[command(subcommand)]
  Teams(TeamCommand),
  /// Store a session token for authenticated calls
  Login {
    #[arg(long)]
    token: String,
  },
  /// Forget the stored session token
  Logout,
  /// Probe backend availability
  Status,
}

#[derive(Subcommand, Debug)]
enum RaidCommand {
  /// List raids
  List,
  /// Show one raid
  Get { id: i64 },
  /// Create a raid
  Create {
    #[arg(long)]
    name: String,
    #[arg(long)]
    start_date: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    end_date: Option<String>,
    #[arg(long)]
    address_id: Option<i64>,
    #[arg(long)]
    manager_id: Option<i64>,
  },
  /// Update a raid (fetches it, applies the given fields, replaces it)
  Update {
    id: i64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    start_date: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    end_date: Option<String>,
    #[arg(long)]
    address_id: Option<i64>,
    #[arg(long)]
    manager_id: Option<i64>,
  },
  /// Delete a raid
  Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum RaceCommand {
  /// List races, optionally narrowed to one raid
  List {
    #[arg(long)]
    raid: Option<i64>,
  },
  /// Show one race
  Get { id: i64 },
  /// Create a race
  Create {
    #[arg(long)]
    raid_id: i64,
    #[arg(long)]
    name: String,
    #[arg(long)]
    distance_km: Option<f64>,
    #[arg(long)]
    difficulty: Option<String>,
  },
  /// Update fields of a race
  Update {
    id: i64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    distance_km: Option<f64>,
    #[arg(long)]
    difficulty: Option<String>,
  },
  /// Delete a race
  Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum AddressCommand {
  /// List addresses
  List,
  /// Show one address
  Get { id: i64 },
  /// Create an address
  Create {
    #[arg(long)]
    street: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    postal_code: String,
    #[arg(long)]
    country: Option<String>,
  },
}

#[derive(Subcommand, Debug)]
enum ClubCommand {
  /// List clubs
  List,
  /// Show one club
  Get { id: i64 },
  /// Create a club
  Create {
    #[arg(long)]
    name: String,
    #[arg(long)]
    responsible_id: i64,
    #[arg(long)]
    address_id: i64,
  },
  /// Update fields of a club
  Update {
    id: i64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    responsible_id: Option<i64>,
    #[arg(long)]
    address_id: Option<i64>,
  },
  /// Delete a club
  Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
  /// List users
  List,
  /// Show one user
  Get { id: i64 },
  /// Update profile fields of a user
  Update {
    id: i64,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
  },
}

#[derive(Subcommand, Debug)]
enum TeamCommand {
  /// List teams
  List,
  /// Show one team
  Get { id: i64 },
  /// Create a team
  Create {
    #[arg(long)]
    name: String,
    #[arg(long)]
    manager_id: i64,
    #[arg(long)]
    club_id: Option<i64>,
  },
  /// Update fields of a team
  Update {
    id: i64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    manager_id: Option<i64>,
    #[arg(long)]
    club_id: Option<i64>,
  },
  /// Delete a team
  Delete { id: i64 },
}

/// Shared wiring for the entity commands.
struct Context {
  client: ApiClient,
  sync: SyncLayer<SqliteStore>,
  monitor: Arc<AvailabilityMonitor>,
}

impl Context {
  fn build(config: &Config, session: SessionStore) -> Result<Self> {
    let client = ApiClient::new(config, session)?;

    let store = match &config.cache.path {
      Some(path) => SqliteStore::open_at(path)?,
      None => SqliteStore::open()?,
    };
    let sync = SyncLayer::new(Arc::new(store));
    let monitor = Arc::new(AvailabilityMonitor::new(client.http(), client.base_url()));

    Ok(Self {
      client,
      sync,
      monitor,
    })
  }

  fn raids(&self) -> RaidRepository<SqliteStore> {
    RaidRepository::new(
      self.client.clone(),
      self.sync.clone(),
      Arc::clone(&self.monitor),
    )
  }

  fn races(&self) -> RaceRepository<SqliteStore> {
    RaceRepository::new(self.client.clone(), self.sync.clone())
  }

  fn addresses(&self) -> AddressRepository<SqliteStore> {
    AddressRepository::new(self.client.clone(), self.sync.clone())
  }

  fn clubs(&self) -> ClubRepository<SqliteStore> {
    ClubRepository::new(self.client.clone(), self.sync.clone())
  }

  fn users(&self) -> UserRepository<SqliteStore> {
    UserRepository::new(self.client.clone(), self.sync.clone())
  }

  fn teams(&self) -> TeamRepository<SqliteStore> {
    TeamRepository::new(self.client.clone(), self.sync.clone())
  }
}

/// Parse-and-dispatch entry point.
pub async fn run(args: Args) -> Result<()> {
  let config = Config::load(args.config.as_deref())?;
  let session = SessionStore::open()?;

  match args.command {
    Command::Login { token } => {
      session.save(&token)?;
      println!("Session token stored.");
      Ok(())
    }
    Command::Logout => {
      session.clear()?;
      println!("Session token forgotten.");
      Ok(())
    }
    Command::Status => {
      let client = ApiClient::new(&config, session)?;
      let monitor = AvailabilityMonitor::new(client.http(), client.base_url());
      let verdict = if monitor.check_availability().await {
        "available"
      } else {
        "unavailable"
      };
      println!("backend {}: {}", client.base_url(), verdict);
      Ok(())
    }
    Command::Raids(command) => run_raids(command, &Context::build(&config, session)?).await,
    Command::Races(command) => run_races(command, &Context::build(&config, session)?).await,
    Command::Addresses(command) => {
      run_addresses(command, &Context::build(&config, session)?).await
    }
    Command::Clubs(command) => run_clubs(command, &Context::build(&config, session)?).await,
    Command::Users(command) => run_users(command, &Context::build(&config, session)?).await,
    Command::Teams(command) => run_teams(command, &Context::build(&config, session)?).await,
  }
}

// ============================================================================
// Per-entity dispatch
// ============================================================================

async fn run_raids(command: RaidCommand, ctx: &Context) -> Result<()> {
  let repo = ctx.raids();

  match command {
    RaidCommand::List => {
      let listing = repo.list().await;
      fallback_note(listing.source);
      if listing.data.is_empty() {
        println!("no raids");
      }
      for raid in &listing.data {
        println!("{:>6}  {:<10}  {}", fmt_id(raid.id), raid.start_date, raid.name);
      }
    }
    RaidCommand::Get { id } => match repo.get(id).await? {
      Some(found) => {
        print_raid(&found.data);
        fallback_note(found.source);
      }
      None => println!("raid {} not found", id),
    },
    RaidCommand::Create {
      name,
      start_date,
      description,
      end_date,
      address_id,
      manager_id,
    } => {
      let created = repo
        .create(Raid {
          id: None,
          name,
          description,
          start_date,
          end_date,
          address_id,
          manager_id,
        })
        .await?;
      print_raid(&created.data);
      pending_note(created.source);
    }
    RaidCommand::Update {
      id,
      name,
      start_date,
      description,
      end_date,
      address_id,
      manager_id,
    } => {
      // Raids are replaced whole: fetch the current record, apply the
      // given fields, put the result back.
      let mut raid = match repo.get(id).await? {
        Some(found) => found.data,
        None => return Err(eyre!("Raid {} not found", id)),
      };

      if let Some(name) = name {
        raid.name = name;
      }
      if let Some(start_date) = start_date {
        raid.start_date = start_date;
      }
      if let Some(description) = description {
        raid.description = Some(description);
      }
      if let Some(end_date) = end_date {
        raid.end_date = Some(end_date);
      }
      if let Some(address_id) = address_id {
        raid.address_id = Some(address_id);
      }
      if let Some(manager_id) = manager_id {
        raid.manager_id = Some(manager_id);
      }

      let updated = repo.update(id, raid).await?;
      print_raid(&updated);
    }
    RaidCommand::Delete { id } => {
      repo.delete(id).await?;
      println!("raid {} deleted", id);
    }
  }

  Ok(())
}

async fn run_races(command: RaceCommand, ctx: &Context) -> Result<()> {
  let repo = ctx.races();

  match command {
    RaceCommand::List { raid } => {
      let listing = match raid {
        Some(raid_id) => repo.list_for_raid(raid_id).await,
        None => repo.list().await,
      };
      fallback_note(listing.source);
      if listing.data.is_empty() {
        println!("no races");
      }
      for race in &listing.data {
        let distance = race
          .distance_km
          .map_or_else(String::new, |km| format!("{} km", km));
        println!(
          "{:>6}  raid {:>4}  {:<24}  {}",
          fmt_id(race.id),
          race.raid_id,
          race.name,
          distance
        );
      }
    }
    RaceCommand::Get { id } => match repo.get(id).await? {
      Some(found) => {
        print_race(&found.data);
        fallback_note(found.source);
      }
      None => println!("race {} not found", id),
    },
    RaceCommand::Create {
      raid_id,
      name,
      distance_km,
      difficulty,
    } => {
      let created = repo
        .create(Race {
          id: None,
          raid_id,
          name,
          distance_km,
          difficulty,
        })
        .await?;
      print_race(&created.data);
      pending_note(created.source);
    }
    RaceCommand::Update {
      id,
      name,
      distance_km,
      difficulty,
    } => {
      let mut fields = Map::new();
      if let Some(name) = name {
        fields.insert("name".to_string(), Value::String(name));
      }
      if let Some(distance_km) = distance_km {
        fields.insert("distance_km".to_string(), Value::from(distance_km));
      }
      if let Some(difficulty) = difficulty {
        fields.insert("difficulty".to_string(), Value::String(difficulty));
      }

      let updated = repo.update_fields(id, require_fields(fields)?).await?;
      print_race(&updated);
    }
    RaceCommand::Delete { id } => {
      repo.delete(id).await?;
      println!("race {} deleted", id);
    }
  }

  Ok(())
}

async fn run_addresses(command: AddressCommand, ctx: &Context) -> Result<()> {
  let repo = ctx.addresses();

  match command {
    AddressCommand::List => {
      let listing = repo.list().await;
      fallback_note(listing.source);
      if listing.data.is_empty() {
        println!("no addresses");
      }
      for address in &listing.data {
        println!(
          "{:>6}  {}, {} {}",
          fmt_id(address.id),
          address.street,
          address.postal_code,
          address.city
        );
      }
    }
    AddressCommand::Get { id } => match repo.get(id).await? {
      Some(found) => {
        print_address(&found.data);
        fallback_note(found.source);
      }
      None => println!("address {} not found", id),
    },
    AddressCommand::Create {
      street,
      city,
      postal_code,
      country,
    } => {
      let created = repo
        .create(Address {
          id: None,
          street,
          city,
          postal_code,
          country,
        })
        .await?;
      print_address(&created.data);
      pending_note(created.source);
    }
  }

  Ok(())
}

async fn run_clubs(command: ClubCommand, ctx: &Context) -> Result<()> {
  let repo = ctx.clubs();

  match command {
    ClubCommand::List => {
      let listing = repo.list().await;
      fallback_note(listing.source);
      if listing.data.is_empty() {
        println!("no clubs");
      }
      for club in &listing.data {
        println!("{:>6}  {}", fmt_id(club.id), club.name);
      }
    }
    ClubCommand::Get { id } => match repo.get(id).await? {
      Some(found) => {
        print_club(&found.data);
        fallback_note(found.source);
      }
      None => println!("club {} not found", id),
    },
    ClubCommand::Create {
      name,
      responsible_id,
      address_id,
    } => {
      let created = repo
        .create(Club {
          id: None,
          name,
          responsible_id,
          address_id,
        })
        .await?;
      print_club(&created.data);
      pending_note(created.source);
    }
    ClubCommand::Update {
      id,
      name,
      responsible_id,
      address_id,
    } => {
      let mut fields = Map::new();
      if let Some(name) = name {
        fields.insert("name".to_string(), Value::String(name));
      }
      if let Some(responsible_id) = responsible_id {
        fields.insert("responsible_id".to_string(), Value::from(responsible_id));
      }
      if let Some(address_id) = address_id {
        fields.insert("address_id".to_string(), Value::from(address_id));
      }

      let updated = repo.update_fields(id, require_fields(fields)?).await?;
      print_club(&updated);
    }
    ClubCommand::Delete { id } => {
      repo.delete(id).await?;
      println!("club {} deleted", id);
    }
  }

  Ok(())
}

async fn run_users(command: UserCommand, ctx: &Context) -> Result<()> {
  let repo = ctx.users();

  match command {
    UserCommand::List => {
      let listing = repo.list().await;
      fallback_note(listing.source);
      if listing.data.is_empty() {
        println!("no users");
      }
      for user in &listing.data {
        println!(
          "{:>6}  {:<28}  {} {}",
          fmt_id(user.id),
          user.email,
          user.first_name,
          user.last_name
        );
      }
    }
    UserCommand::Get { id } => match repo.get(id).await? {
      Some(found) => {
        print_user(&found.data);
        fallback_note(found.source);
      }
      None => println!("user {} not found", id),
    },
    UserCommand::Update {
      id,
      email,
      first_name,
      last_name,
    } => {
      let mut fields = Map::new();
      if let Some(email) = email {
        fields.insert("email".to_string(), Value::String(email));
      }
      if let Some(first_name) = first_name {
        fields.insert("first_name".to_string(), Value::String(first_name));
      }
      if let Some(last_name) = last_name {
        fields.insert("last_name".to_string(), Value::String(last_name));
      }

      let updated = repo.update_fields(id, require_fields(fields)?).await?;
      print_user(&updated);
    }
  }

  Ok(())
}

async fn run_teams(command: TeamCommand, ctx: &Context) -> Result<()> {
  let repo = ctx.teams();

  match command {
    TeamCommand::List => {
      let listing = repo.list().await;
      fallback_note(listing.source);
      if listing.data.is_empty() {
        println!("no teams");
      }
      for team in &listing.data {
        println!("{:>6}  {}", fmt_id(team.id), team.name);
      }
    }
    TeamCommand::Get { id } => match repo.get(id).await? {
      Some(found) => {
        print_team(&found.data);
        fallback_note(found.source);
      }
      None => println!("team {} not found", id),
    },
    TeamCommand::Create {
      name,
      manager_id,
      club_id,
    } => {
      let created = repo
        .create(Team {
          id: None,
          name,
          manager_id,
          club_id,
        })
        .await?;
      print_team(&created.data);
      pending_note(created.source);
    }
    TeamCommand::Update {
      id,
      name,
      manager_id,
      club_id,
    } => {
      let mut fields = Map::new();
      if let Some(name) = name {
        fields.insert("name".to_string(), Value::String(name));
      }
      if let Some(manager_id) = manager_id {
        fields.insert("manager_id".to_string(), Value::from(manager_id));
      }
      if let Some(club_id) = club_id {
        fields.insert("club_id".to_string(), Value::from(club_id));
      }

      let updated = repo.update_fields(id, require_fields(fields)?).await?;
      print_team(&updated);
    }
    TeamCommand::Delete { id } => {
      repo.delete(id).await?;
      println!("team {} deleted", id);
    }
  }

  Ok(())
}

// ============================================================================
// Output helpers
// ============================================================================

fn fmt_id(id: Option<i64>) -> String {
  id.map_or_else(|| "-".to_string(), |id| id.to_string())
}

/// One-line notice when data did not come from the backend.
fn fallback_note(source: DataSource) {
  if source == DataSource::LocalFallback {
    println!("(backend unreachable, showing local records)");
  }
}

/// One-line notice when a write has not reached the backend yet.
fn pending_note(source: DataSource) {
  if source == DataSource::LocalOnly {
    println!("(backend unreachable, saved locally and awaiting sync)");
  }
}

fn require_fields(fields: Map<String, Value>) -> Result<Map<String, Value>> {
  if fields.is_empty() {
    return Err(eyre!("Nothing to update: pass at least one field option"));
  }
  Ok(fields)
}

fn print_raid(raid: &Raid) {
  println!("raid {}", fmt_id(raid.id));
  println!("  name:       {}", raid.name);
  if let Some(description) = &raid.description {
    println!("  about:      {}", description);
  }
  println!("  starts:     {}", raid.start_date);
  if let Some(end_date) = &raid.end_date {
    println!("  ends:       {}", end_date);
  }
  if let Some(address_id) = raid.address_id {
    println!("  address:    #{}", address_id);
  }
  if let Some(manager_id) = raid.manager_id {
    println!("  manager:    #{}", manager_id);
  }
}

fn print_race(race: &Race) {
  println!("race {}", fmt_id(race.id));
  println!("  raid:       #{}", race.raid_id);
  println!("  name:       {}", race.name);
  if let Some(distance_km) = race.distance_km {
    println!("  distance:   {} km", distance_km);
  }
  if let Some(difficulty) = &race.difficulty {
    println!("  difficulty: {}", difficulty);
  }
}

fn print_address(address: &Address) {
  println!("address {}", fmt_id(address.id));
  println!("  street:     {}", address.street);
  println!("  city:       {} {}", address.postal_code, address.city);
  if let Some(country) = &address.country {
    println!("  country:    {}", country);
  }
}

fn print_club(club: &Club) {
  println!("club {}", fmt_id(club.id));
  println!("  name:        {}", club.name);
  println!("  responsible: #{}", club.responsible_id);
  println!("  address:     #{}", club.address_id);
}

fn print_user(user: &User) {
  println!("user {}", fmt_id(user.id));
  println!("  email:      {}", user.email);
  println!("  name:       {} {}", user.first_name, user.last_name);
}

fn print_team(team: &Team) {
  println!("team {}", fmt_id(team.id));
  println!("  name:       {}", team.name);
  println!("  manager:    #{}", team.manager_id);
  if let Some(club_id) = team.club_id {
    println!("  club:       #{}", club_id);
  }
}
