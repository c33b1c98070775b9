use clap::{Parser, Subcommand};
use firebase_rtdb_users::users::panel::{PanelConfig, Trigger};
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Write the whole user record (Username and Email).
    WriteUser,
    /// Overwrite the record's Username.
    UpdateUsername,
    /// Overwrite the record's Email.
    UpdateEmail,
    /// Delete the user record.
    DeleteUser,
    /// Log the record's Username.
    GetUsername,
    /// Log the record's Email.
    GetEmail,
    /// Read trigger names from stdin, one per line, until EOF or `quit`.
    Interactive,
}

impl Command {
    pub fn trigger(self) -> Option<Trigger> {
        match self {
            Command::WriteUser => Some(Trigger::WriteUser),
            Command::UpdateUsername => Some(Trigger::UpdateUsername),
            Command::UpdateEmail => Some(Trigger::UpdateEmail),
            Command::DeleteUser => Some(Trigger::DeleteUser),
            Command::GetUsername => Some(Trigger::GetUsername),
            Command::GetEmail => Some(Trigger::GetEmail),
            Command::Interactive => None,
        }
    }
}

const LONG_ABOUT: &str = "\
Write, update, delete and read a user record in Firebase Realtime Database.

Environment (a .env file is loaded first):
  FIREBASE_DATABASE_URL           Database URL
  GOOGLE_APPLICATION_CREDENTIALS  Service account JSON
  FIREBASE_DATABASE_SECRET        Database secret or ID token
  FIREBASE_DATABASE_NAMESPACE     Emulator namespace
  RTDB_ITEMS_NAME, RTDB_USER_ID, RTDB_USERNAME, RTDB_EMAIL
  RUST_LOG                        Log filter (default info)
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Write, update, delete and read a user record in Firebase Realtime Database",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        long,
        env = "FIREBASE_DATABASE_URL",
        value_name = "URL",
        required_unless_present = "offline",
        help = "Database URL, e.g. https://my-db.firebaseio.com"
    )]
    pub database_url: Option<String>,

    #[arg(
        long,
        env = "GOOGLE_APPLICATION_CREDENTIALS",
        value_name = "PATH",
        help = "Service account key used for OAuth2 bearer auth"
    )]
    pub credentials: Option<PathBuf>,

    #[arg(
        long,
        env = "FIREBASE_DATABASE_SECRET",
        hide_env_values = true,
        help = "Database secret or ID token sent as the auth query parameter"
    )]
    pub secret: Option<String>,

    #[arg(long, env = "FIREBASE_DATABASE_NAMESPACE", value_name = "NS")]
    pub namespace: Option<String>,

    #[arg(
        long,
        env = "RTDB_ITEMS_NAME",
        default_value = "users",
        help = "Collection the record lives under"
    )]
    pub items_name: String,

    #[arg(long, env = "RTDB_USER_ID", help = "Record id")]
    pub user_id: String,

    #[arg(long, env = "RTDB_USERNAME", default_value = "")]
    pub username: String,

    #[arg(long, env = "RTDB_EMAIL", default_value = "")]
    pub email: String,

    #[arg(
        long,
        default_value_t = false,
        help = "Use an in-memory database instead of a remote one",
        long_help = "Use an in-memory database instead of a remote one.\n\n\
                     The data lives only as long as the process, so a write and a \
                     later read only see each other within one `interactive` session."
    )]
    pub offline: bool,

    #[arg(
        long,
        env = "RTDB_LOG_FILE",
        value_name = "PATH",
        help = "Also append logs to this file"
    )]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn panel_config(&self) -> PanelConfig {
        PanelConfig {
            items_name: self.items_name.clone(),
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
