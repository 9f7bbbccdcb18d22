//! Geonote CLI - Geo-tagged notes from the command line
//!
//! Sign in once, then create, list and edit notes stored in the managed
//! backend from any terminal.

mod session_file;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use geonote_core::auth::{AuthError, FirebaseAuthClient};
use geonote_core::config::{backend_config_from_env, BackendConfig};
use geonote_core::models::{Note, NoteDraft, NoteId};
use geonote_core::screens::{EditorError, NoteEditor, NoteListScreen};
use geonote_core::session::{AuthPhase, SessionController};
use geonote_core::store::{FirestoreNoteStore, NoteStore};
use serde::Serialize;
use thiserror::Error;

use session_file::FileSessionStore;

#[derive(Parser)]
#[command(name = "geonote")]
#[command(about = "Geo-tagged notes from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional path to the session file
    #[arg(long, global = true, value_name = "PATH")]
    session_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the signed-in session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// List notes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single note
    Show {
        /// Note ID
        id: String,
    },
    /// Create a new note
    Add {
        /// Note title
        #[arg(long)]
        title: String,
        /// Note content
        #[arg(long)]
        content: String,
        /// Latitude, as typed
        #[arg(long, default_value = "0")]
        lat: String,
        /// Longitude, as typed
        #[arg(long, default_value = "0")]
        lon: String,
        /// Attached image URI
        #[arg(long, value_name = "URI")]
        image: Option<String>,
        /// Note date (RFC 3339; defaults to now)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },
    /// Edit fields of an existing note
    Edit {
        /// Note ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        lat: Option<String>,
        #[arg(long)]
        lon: Option<String>,
        #[arg(long, value_name = "URI")]
        image: Option<String>,
        /// Note date (RFC 3339)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },
    /// Delete a note
    Delete {
        /// Note ID
        id: String,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Sign in with email/password and store the session
    Login {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password (prompted or read from stdin when omitted)
        #[arg(long, value_name = "PASSWORD")]
        password: Option<String>,
    },
    /// Create an account and sign in
    Signup {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password (prompted or read from stdin when omitted)
        #[arg(long, value_name = "PASSWORD")]
        password: Option<String>,
    },
    /// Show who is signed in
    Status,
    /// Sign out and clear the stored session
    Logout,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] geonote_core::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No password provided")]
    EmptyPassword,
    #[error("Backend is not configured. Set GEONOTE_API_KEY and GEONOTE_PROJECT_ID.")]
    NotConfigured,
    #[error("Not signed in. Run `geonote auth login` first.")]
    NotSignedIn,
    #[error("Note not found: {0}")]
    NoteNotFound(String),
    #[error("Invalid date '{0}'; expected RFC 3339, e.g. 2024-05-01T09:30:00Z")]
    InvalidDate(String),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("geonote=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let session_path = cli
        .session_path
        .unwrap_or_else(FileSessionStore::default_path);

    match cli.command {
        Commands::Auth { command } => run_auth(command, session_path).await?,
        Commands::List { json } => run_list(json, session_path).await?,
        Commands::Show { id } => run_show(&id, session_path).await?,
        Commands::Add {
            title,
            content,
            lat,
            lon,
            image,
            date,
        } => {
            let mut draft = NoteDraft::blank();
            apply_overrides(
                &mut draft,
                DraftOverrides {
                    title: Some(title),
                    content: Some(content),
                    latitude: Some(lat),
                    longitude: Some(lon),
                    image,
                    date: parse_optional_date(date.as_deref())?,
                },
            );
            run_save(draft, session_path).await?;
        }
        Commands::Edit {
            id,
            title,
            content,
            lat,
            lon,
            image,
            date,
        } => {
            let overrides = DraftOverrides {
                title,
                content,
                latitude: lat,
                longitude: lon,
                image,
                date: parse_optional_date(date.as_deref())?,
            };
            run_edit(&id, overrides, session_path).await?;
        }
        Commands::Delete { id } => run_delete(&id, session_path).await?,
    }

    Ok(())
}

async fn run_auth(command: AuthCommands, session_path: PathBuf) -> Result<(), CliError> {
    let controller = session_controller(session_path)?;

    match command {
        AuthCommands::Login { email, password } => {
            let password = resolve_password(password)?;
            let session = controller.sign_in(&email, &password).await?;
            println!("Signed in as {}", session.user.display_label());
        }
        AuthCommands::Signup { email, password } => {
            let password = resolve_password(password)?;
            let session = controller.sign_up(&email, &password).await?;
            println!("Account created; signed in as {}", session.user.display_label());
        }
        AuthCommands::Status => match controller.initialize().await {
            AuthPhase::Authenticated(user) => println!("Signed in as {}", user.display_label()),
            _ => println!("Not signed in"),
        },
        AuthCommands::Logout => {
            controller.sign_out()?;
            println!("Signed out");
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct NoteListItem {
    id: String,
    title: String,
    content: String,
    latitude: f64,
    longitude: f64,
    image_url: String,
    date: String,
    created_at: i64,
    updated_at: i64,
}

async fn run_list(as_json: bool, session_path: PathBuf) -> Result<(), CliError> {
    let store = open_note_store(session_path).await?;
    let mut screen = NoteListScreen::new(Arc::new(store));
    screen.refresh().await?;

    if as_json {
        let json_items = screen
            .notes()
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_note_lines(screen.notes()) {
            println!("{line}");
        }
    }

    Ok(())
}

fn note_to_list_item(note: &Note) -> NoteListItem {
    NoteListItem {
        id: note.id.to_string(),
        title: note.fields.title.clone(),
        content: note.fields.content.clone(),
        latitude: note.fields.coordinates.latitude,
        longitude: note.fields.coordinates.longitude,
        image_url: note.fields.image_url.clone(),
        date: note.fields.date.to_rfc3339_opts(SecondsFormat::Secs, true),
        created_at: note.created_at,
        updated_at: note.updated_at,
    }
}

async fn run_show(id: &str, session_path: PathBuf) -> Result<(), CliError> {
    let store = open_note_store(session_path).await?;
    let note = store
        .get(&NoteId::new(id))
        .await?
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;

    println!("{}", serde_json::to_string_pretty(&note)?);
    Ok(())
}

async fn run_save(draft: NoteDraft, session_path: PathBuf) -> Result<(), CliError> {
    let store = open_note_store(session_path).await?;
    let mut editor = NoteEditor::with_draft(Arc::new(store), draft);
    let id = editor.save().await?;
    println!("{id}");
    Ok(())
}

async fn run_edit(
    id: &str,
    overrides: DraftOverrides,
    session_path: PathBuf,
) -> Result<(), CliError> {
    let store = Arc::new(open_note_store(session_path).await?);
    let note = store
        .get(&NoteId::new(id))
        .await?
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;

    let mut draft = NoteDraft::from_note(&note);
    apply_overrides(&mut draft, overrides);

    let mut editor = NoteEditor::with_draft(store, draft);
    let id = editor.save().await?;
    println!("{id}");
    Ok(())
}

async fn run_delete(id: &str, session_path: PathBuf) -> Result<(), CliError> {
    let store = open_note_store(session_path).await?;
    store.delete(&NoteId::new(id)).await?;
    println!("{id}");
    Ok(())
}

/// Per-field draft overrides from command-line flags.
#[derive(Default)]
struct DraftOverrides {
    title: Option<String>,
    content: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    image: Option<String>,
    date: Option<DateTime<Utc>>,
}

fn apply_overrides(draft: &mut NoteDraft, overrides: DraftOverrides) {
    if let Some(title) = overrides.title {
        draft.title = title;
    }
    if let Some(content) = overrides.content {
        draft.content = content;
    }
    if let Some(latitude) = overrides.latitude {
        draft.latitude_text = latitude;
    }
    if let Some(longitude) = overrides.longitude {
        draft.longitude_text = longitude;
    }
    if let Some(image) = overrides.image {
        draft.image_url = image;
    }
    if let Some(date) = overrides.date {
        draft.date = date;
    }
}

/// Take the password from the flag, a pipe, or an interactive prompt.
fn resolve_password(flag: Option<String>) -> Result<String, CliError> {
    if let Some(password) = flag {
        return Ok(password);
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
        io::stderr().flush()?;
    }

    let mut buffer = String::new();
    stdin.lock().read_line(&mut buffer)?;
    let password = buffer.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(CliError::EmptyPassword);
    }
    Ok(password)
}

fn parse_optional_date(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, CliError> {
    raw.map(|value| {
        DateTime::parse_from_rfc3339(value.trim())
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|_| CliError::InvalidDate(value.to_string()))
    })
    .transpose()
}

fn format_note_lines(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            let title = clip_text(&note.fields.title, 32);
            let position = format!(
                "{:.4},{:.4}",
                note.fields.coordinates.latitude, note.fields.coordinates.longitude
            );
            let date = note
                .fields
                .date
                .to_rfc3339_opts(SecondsFormat::Secs, true);
            format!("{:<24}  {title:<32}  {position:<20}  {date}", note.id)
        })
        .collect()
}

fn clip_text(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

fn resolve_config() -> Result<BackendConfig, CliError> {
    backend_config_from_env()?.ok_or(CliError::NotConfigured)
}

fn session_controller(
    session_path: PathBuf,
) -> Result<SessionController<FileSessionStore>, CliError> {
    let config = resolve_config()?;
    let auth = FirebaseAuthClient::new(&config, FileSessionStore::new(session_path))?;
    Ok(SessionController::new(auth))
}

async fn open_note_store(session_path: PathBuf) -> Result<FirestoreNoteStore, CliError> {
    let config = resolve_config()?;
    tracing::debug!("Using session file at {}", session_path.display());
    let auth = FirebaseAuthClient::new(&config, FileSessionStore::new(session_path))?;
    let Some(session) = auth.restore_session().await? else {
        return Err(CliError::NotSignedIn);
    };
    Ok(FirestoreNoteStore::new(&config, session.id_token))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use geonote_core::models::{Coordinates, NoteFields};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn clip_text_collapses_whitespace_and_truncates() {
        assert_eq!(clip_text("short  title", 32), "short title");
        assert_eq!(
            clip_text("a very long note title that keeps going", 20),
            "a very long note ..."
        );
    }

    #[test]
    fn parse_optional_date_accepts_rfc3339() {
        let parsed = parse_optional_date(Some("2024-05-01T09:30:00Z")).unwrap();
        assert_eq!(
            parsed,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap())
        );
        assert_eq!(parse_optional_date(None).unwrap(), None);
    }

    #[test]
    fn parse_optional_date_rejects_other_formats() {
        assert!(matches!(
            parse_optional_date(Some("yesterday")),
            Err(CliError::InvalidDate(_))
        ));
    }

    #[test]
    fn apply_overrides_touches_only_given_fields() {
        let mut draft = NoteDraft::blank();
        draft.title = "Old".to_string();
        draft.latitude_text = "1".to_string();

        apply_overrides(
            &mut draft,
            DraftOverrides {
                content: Some("New content".to_string()),
                longitude: Some("35.2".to_string()),
                ..DraftOverrides::default()
            },
        );

        assert_eq!(draft.title, "Old");
        assert_eq!(draft.content, "New content");
        assert_eq!(draft.latitude_text, "1");
        assert_eq!(draft.longitude_text, "35.2");
    }

    #[test]
    fn note_to_list_item_flattens_position_and_renders_date() {
        let note = Note {
            id: NoteId::new("n-7"),
            fields: NoteFields {
                title: "Trailhead".to_string(),
                content: "Park by the gate".to_string(),
                coordinates: Coordinates::new(31.768, 35.2137),
                date: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
                ..NoteFields::default()
            },
            created_at: 100,
            updated_at: 200,
        };

        let item = note_to_list_item(&note);
        assert_eq!(item.id, "n-7");
        assert_eq!(item.latitude, 31.768);
        assert_eq!(item.longitude, 35.2137);
        assert_eq!(item.date, "2024-05-01T09:30:00Z");

        let rendered = serde_json::to_value(&item).unwrap();
        assert_eq!(rendered["created_at"], 100);
        assert_eq!(rendered["image_url"], "");
    }

    #[test]
    fn note_lines_include_position_and_date() {
        let note = Note {
            id: NoteId::new("n-1"),
            fields: NoteFields {
                title: "Trailhead".to_string(),
                content: "Park by the gate".to_string(),
                coordinates: Coordinates::new(31.768, 35.2137),
                date: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
                ..NoteFields::default()
            },
            created_at: 1,
            updated_at: 1,
        };

        let lines = format_note_lines(&[note]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("n-1"));
        assert!(lines[0].contains("31.7680,35.2137"));
        assert!(lines[0].contains("2024-05-01T09:30:00Z"));
    }
}
