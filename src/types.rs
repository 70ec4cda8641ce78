//! Shared types for the jotter application: the Result alias and the CLI
//! command tree.
use clap::Subcommand;

use crate::{Importance, JotError};

/// A specialized Result type for jotter operations.
pub type Result<T> = std::result::Result<T, JotError>;

/// Available subcommands for the jotter application
#[derive(Subcommand)]
pub enum Commands {
    /// Note operations (add, list, show, edit, delete)
    #[clap(subcommand)]
    Note(NoteCommand),

    /// Todo operations (add, list, edit, delete)
    #[clap(subcommand)]
    Todo(TodoCommand),

    /// Delete every stored note and todo
    Reset {
        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Write the current configuration (with command-line overrides) to the config file
        #[clap(short, long)]
        save: bool,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
pub enum NoteCommand {
    /// Create a new note
    Add {
        /// Title of the note
        #[clap(short = 'T', long, default_value = "")]
        title: String,

        /// Body text of the note
        #[clap(short, long, default_value = "")]
        text: String,
    },

    /// List notes, newest first
    List {
        /// Only show notes whose title or text contains this
        #[clap(short, long)]
        search: Option<String>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Print a note as it would be shared
    Show {
        /// ID of the note to show
        id: String,
    },

    /// Replace a note's title and/or text
    Edit {
        /// ID of the note to edit
        id: String,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New text for the note
        #[clap(short, long)]
        text: Option<String>,
    },

    /// Delete one or more notes by ID
    Delete {
        /// IDs of the notes to delete
        #[clap(required = true)]
        ids: Vec<String>,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum TodoCommand {
    /// Create a new todo
    Add {
        /// What needs doing
        text: String,

        /// Mark the todo as important
        #[clap(short, long)]
        important: bool,

        /// Scheduled date (YYYY-MM-DD)
        #[clap(short, long)]
        date: Option<String>,

        /// Scheduled time (HH:MM)
        #[clap(short = 't', long)]
        time: Option<String>,
    },

    /// List todos split into important and normal
    List {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Replace a todo's fields; unspecified fields keep their value
    Edit {
        /// ID of the todo to edit
        id: String,

        /// New text
        #[clap(long)]
        text: Option<String>,

        /// New importance
        #[clap(short, long, value_enum)]
        importance: Option<Importance>,

        /// New scheduled date (YYYY-MM-DD)
        #[clap(short, long)]
        date: Option<String>,

        /// New scheduled time (HH:MM)
        #[clap(short = 't', long)]
        time: Option<String>,
    },

    /// Delete one or more todos by ID
    Delete {
        /// IDs of the todos to delete
        #[clap(required = true)]
        ids: Vec<String>,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },
}
