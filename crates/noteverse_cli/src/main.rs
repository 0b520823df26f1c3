//! `noteverse` command line entry point.
//!
//! # Responsibility
//! - Resolve config, start logging, open the store.
//! - Translate subcommands into core service calls and print JSON.
//! - Map core errors to process exit codes.

mod error;

use clap::{Args, Parser, Subcommand};
use error::{CliError, CliResult};
use log::info;
use noteverse_core::db::open_db;
use noteverse_core::{
    init_logging_from_config, CoreConfig, FileRefDraft, LikeState, LikeToggle, ListNotesRequest,
    NoteDraft, NoteId, NoteService, PopulatedNote, SqliteNoteRepository, SqliteUserRepository,
    UserId, UserService,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "noteverse",
    version,
    about = "Share study notes with per-note visibility and likes"
)]
struct Cli {
    /// SQLite database file. Overrides NOTEVERSE_DB_PATH.
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// trace|debug|info|warn|error. Overrides NOTEVERSE_LOG_LEVEL.
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Absolute log directory. Overrides NOTEVERSE_LOG_DIR.
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Act as this registered user. Omit to act anonymously.
    #[arg(long = "as", global = true, value_name = "USERNAME")]
    actor: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(subcommand, about = "Register and look up users")]
    User(UserCommand),

    #[command(subcommand, about = "Create, read and manage notes")]
    Note(NoteCommand),
}

#[derive(Subcommand)]
enum UserCommand {
    #[command(about = "Register a new user")]
    Add { username: String, email: String },

    #[command(about = "Show a registered user")]
    Show { username: String },
}

#[derive(Subcommand)]
enum NoteCommand {
    #[command(about = "Create a note authored by --as")]
    Create(NoteFields),

    #[command(about = "Show one note with author and likers")]
    Get { id: NoteId },

    #[command(about = "List visible notes, newest first")]
    List(ListArgs),

    #[command(about = "List notes liked by --as")]
    Liked,

    #[command(about = "Replace a note's fields")]
    Update {
        id: NoteId,

        #[command(flatten)]
        fields: NoteFields,

        /// Remove all attachments.
        #[arg(long, conflicts_with = "files")]
        clear_files: bool,
    },

    #[command(about = "Delete a note")]
    Delete { id: NoteId },

    #[command(about = "Like or unlike a note")]
    Like { id: NoteId },

    #[command(about = "Flip a note between public and private")]
    Privacy { id: NoteId },
}

#[derive(Args)]
struct NoteFields {
    #[arg(long)]
    title: String,

    #[arg(long)]
    content: String,

    /// cs|it|ee|ece|ete|me|prod|textile|ce|chem
    #[arg(long)]
    branch: String,

    /// 1|2|3|4
    #[arg(long)]
    year: String,

    #[arg(long)]
    subject: String,

    /// Visibility; new notes default to public.
    #[arg(long, value_name = "BOOL")]
    public: Option<bool>,

    /// Attachment as `name|url|type|size`. Repeatable.
    #[arg(long = "file", value_name = "NAME|URL|TYPE|SIZE", value_parser = parse_file)]
    files: Vec<FileRefDraft>,
}

impl NoteFields {
    fn into_draft(self, clear_files: bool) -> NoteDraft {
        let files = if clear_files || !self.files.is_empty() {
            Some(self.files)
        } else {
            None
        };
        NoteDraft {
            title: Some(self.title),
            content: Some(self.content),
            is_public: self.public,
            branch: Some(self.branch),
            year: Some(self.year),
            subject: Some(self.subject),
            files,
        }
    }
}

#[derive(Args)]
struct ListArgs {
    /// Only notes by this username.
    #[arg(long, value_name = "USERNAME")]
    author: Option<String>,

    /// Branch code, or `all`.
    #[arg(long)]
    branch: Option<String>,

    /// Year 1-4, or `all`.
    #[arg(long)]
    year: Option<String>,

    #[arg(long)]
    subject: Option<String>,

    /// Matches title, content or subject.
    #[arg(long)]
    search: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!(
                "event=cli_exit module=cli status=error exit_code={}",
                err.exit_code()
            );
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = resolve_config(&cli);
    init_logging_from_config(&config).map_err(CliError::Logging)?;

    let conn = open_db(&config.db_path)?;
    let users = UserService::new(SqliteUserRepository::try_new(&conn)?);
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn)?);
    let actor = resolve_actor(&users, cli.actor.as_deref())?;

    match cli.command {
        Command::User(UserCommand::Add { username, email }) => {
            print_json(&users.register_user(&username, &email)?)
        }
        Command::User(UserCommand::Show { username }) => {
            let user = users
                .find_by_username(&username)?
                .ok_or(CliError::UnknownUser(username))?;
            print_json(&user)
        }
        Command::Note(command) => run_note(command, &users, &notes, actor),
    }
}

fn run_note(
    command: NoteCommand,
    users: &UserService<SqliteUserRepository<'_>>,
    notes: &NoteService<SqliteNoteRepository<'_>>,
    actor: Option<UserId>,
) -> CliResult<()> {
    match command {
        NoteCommand::Create(fields) => {
            let note = notes.create_note(actor, &fields.into_draft(false))?;
            print_json(&users.populate(note)?)
        }
        NoteCommand::Get { id } => {
            let note = notes.get_note(actor, id)?;
            print_json(&users.populate(note)?)
        }
        NoteCommand::List(args) => {
            let author = match args.author {
                Some(username) => Some(
                    users
                        .find_by_username(&username)?
                        .ok_or(CliError::UnknownUser(username))?
                        .id,
                ),
                None => None,
            };
            let request = ListNotesRequest {
                author,
                branch: args.branch,
                year: args.year,
                subject: args.subject,
                search: args.search,
            };
            print_json(&notes.list_notes(actor, &request)?)
        }
        NoteCommand::Liked => print_json(&notes.list_liked_notes(actor)?),
        NoteCommand::Update {
            id,
            fields,
            clear_files,
        } => {
            let note = notes.update_note(actor, id, &fields.into_draft(clear_files))?;
            print_json(&users.populate(note)?)
        }
        NoteCommand::Delete { id } => {
            notes.delete_note(actor, id)?;
            print_json(&json!({ "deleted": id }))
        }
        NoteCommand::Like { id } => {
            let toggle = notes.toggle_like(actor, id)?;
            print_json(&populate_like(users, toggle)?)
        }
        NoteCommand::Privacy { id } => {
            let note = notes.toggle_privacy(actor, id)?;
            print_json(&users.populate(note)?)
        }
    }
}

/// Like result with author and likers resolved.
#[derive(Serialize)]
struct PopulatedLike {
    #[serde(flatten)]
    note: PopulatedNote,
    state: LikeState,
}

fn populate_like(
    users: &UserService<SqliteUserRepository<'_>>,
    toggle: LikeToggle,
) -> CliResult<PopulatedLike> {
    Ok(PopulatedLike {
        note: users.populate(toggle.note)?,
        state: toggle.state,
    })
}

fn resolve_config(cli: &Cli) -> CoreConfig {
    let mut config = CoreConfig::from_env();
    if let Some(db) = cli.db.clone() {
        config.db_path = db;
    }
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }
    if let Some(dir) = cli.log_dir.clone() {
        config.log_dir = Some(dir);
    }
    config
}

fn resolve_actor(
    users: &UserService<SqliteUserRepository<'_>>,
    username: Option<&str>,
) -> CliResult<Option<UserId>> {
    let Some(username) = username else {
        return Ok(None);
    };
    let user = users
        .find_by_username(username)?
        .ok_or_else(|| CliError::UnknownActor(username.to_string()))?;
    info!("event=cli_actor module=cli status=ok user_id={}", user.id);
    Ok(Some(user.id))
}

fn print_json(value: &impl Serialize) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_file(value: &str) -> Result<FileRefDraft, String> {
    let parts: Vec<&str> = value.splitn(4, '|').collect();
    let [name, url, file_type, size] = parts.as_slice() else {
        return Err(format!("expected `name|url|type|size`, got `{value}`"));
    };
    let size = size
        .trim()
        .parse::<u64>()
        .map_err(|err| format!("invalid size `{size}`: {err}"))?;
    let text = |part: &str| Some(part.trim().to_string());
    Ok(FileRefDraft {
        name: text(*name),
        url: text(*url),
        file_type: text(*file_type),
        size: Some(size),
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_file, populate_like, Cli, NoteFields};
    use clap::{CommandFactory, Parser};
    use noteverse_core::db::open_db_in_memory;
    use noteverse_core::{
        NoteDraft, NoteService, SqliteNoteRepository, SqliteUserRepository, UserService,
    };

    #[test]
    fn like_output_carries_author_likers_and_state() {
        let conn = open_db_in_memory().unwrap();
        let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
        let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
        let ada = users.register_user("ada", "ada@example.com").unwrap();
        let grace = users.register_user("grace", "grace@example.com").unwrap();
        let note = notes
            .create_note(Some(ada.id), &NoteDraft::new("Engines", "gears", "me", "1", "Machines"))
            .unwrap();

        let toggle = notes.toggle_like(Some(grace.id), note.id).unwrap();
        let output = serde_json::to_value(populate_like(&users, toggle).unwrap()).unwrap();

        assert_eq!(output["state"], "liked");
        assert_eq!(output["author"]["username"], "ada");
        assert_eq!(output["liked_by"][0]["username"], "grace");
        assert_eq!(output["note"]["title"], "Engines");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn file_argument_parses_four_parts() {
        let file = parse_file("slides.pdf|https://files.example/s.pdf|application/pdf|2048")
            .unwrap();
        assert_eq!(file.name.as_deref(), Some("slides.pdf"));
        assert_eq!(file.file_type.as_deref(), Some("application/pdf"));
        assert_eq!(file.size, Some(2048));

        assert!(parse_file("slides.pdf|url").is_err());
        assert!(parse_file("a|b|c|-1").is_err());
    }

    #[test]
    fn update_without_files_keeps_attachments() {
        let fields = NoteFields {
            title: "t".to_string(),
            content: "c".to_string(),
            branch: "cs".to_string(),
            year: "1".to_string(),
            subject: "s".to_string(),
            public: None,
            files: Vec::new(),
        };
        assert_eq!(fields.into_draft(false).files, None);
    }

    #[test]
    fn global_actor_flag_parses_after_subcommand() {
        let cli = Cli::try_parse_from(["noteverse", "note", "liked", "--as", "ada"]).unwrap();
        assert_eq!(cli.actor.as_deref(), Some("ada"));
    }
}
