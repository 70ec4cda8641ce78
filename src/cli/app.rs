//! CLI module for the jotter application
//!
//! This module renders the stores on a terminal and turns subcommands into
//! store calls. It never touches the backend directly.
use std::{
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use log::info;

use crate::{
    parse_date, parse_time, Commands, Config, Importance, JotError, Note, NoteBody, NoteCommand, Result,
    Todo, TodoBody, TodoCommand, Workspace,
};

/// CLI Application handler - processes CLI commands against a Workspace
pub struct App {
    /// The note and todo stores
    workspace: Arc<Workspace>,

    /// Effective configuration, including command-line overrides
    config: Config,

    /// Config file given with `--config`, if any
    config_path: Option<PathBuf>,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application on top of the given workspace
    pub fn new(
        workspace: Arc<Workspace>,
        config: Config,
        config_path: Option<PathBuf>,
        verbose: bool,
    ) -> Self {
        Self {
            workspace,
            config,
            config_path,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Note(cmd) => self.handle_note(cmd)?,
            Commands::Todo(cmd) => self.handle_todo(cmd)?,
            Commands::Reset { force } => self.handle_reset(force).await?,
            Commands::Config { show, save, reset } => self.handle_config(show, save, reset)?,
        }

        Ok(())
    }

    fn handle_note(&self, command: NoteCommand) -> Result<()> {
        let notes = self.workspace.notes();

        match command {
            NoteCommand::Add { title, text } => match notes.add(NoteBody::new(title, text)) {
                Some(id) => println!("Note created with ID: {}", id),
                None => println!("Note not saved: title and text are empty."),
            },

            NoteCommand::List { search, json } => {
                let listed = match search {
                    Some(query) => notes.search(&query),
                    None => notes.list().to_vec(),
                };
                if json {
                    println!("{}", serde_json::to_string_pretty(&listed)?);
                } else {
                    self.display_notes(&listed);
                }
            }

            NoteCommand::Show { id } => {
                let note = notes.get(&id).ok_or(JotError::RecordNotFound { id })?;
                println!("{}", note.payload().share_text());
            }

            NoteCommand::Edit { id, title, text } => {
                let current = notes
                    .get(&id)
                    .ok_or_else(|| JotError::RecordNotFound { id: id.clone() })?
                    .into_payload();

                // Editing re-stamps the note with the current time
                let edited = NoteBody::new(
                    title.unwrap_or(current.title),
                    text.unwrap_or(current.text),
                );

                if notes.update(&id, edited) {
                    println!("Note {} updated", id);
                } else {
                    println!("Note {} not changed: title and text would be empty.", id);
                }
            }

            NoteCommand::Delete { ids, force } => {
                if !force && !confirm(&format!("Delete {} note(s)?", ids.len()))? {
                    println!("Cancelled.");
                    return Ok(());
                }
                let removed = if ids.len() == 1 {
                    usize::from(notes.remove(&ids[0]))
                } else {
                    notes.remove_many(ids.as_slice())
                };
                println!("Deleted {} note(s)", removed);
            }
        }

        Ok(())
    }

    fn handle_todo(&self, command: TodoCommand) -> Result<()> {
        let todos = self.workspace.todos();

        match command {
            TodoCommand::Add {
                text,
                important,
                date,
                time,
            } => {
                let importance = if important {
                    Importance::Important
                } else {
                    Importance::Relaxed
                };
                let body = TodoBody::new(text, importance)
                    .scheduled(parse_optional(date, parse_date)?, parse_optional(time, parse_time)?);

                match todos.add(body) {
                    Some(id) => println!("Todo created with ID: {}", id),
                    None => println!("Todo not saved: text is empty."),
                }
            }

            TodoCommand::List { json } => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&*todos.list())?);
                } else {
                    let partition = todos.partition();
                    self.display_todos("Important", &partition.important);
                    self.display_todos("Normal", &partition.normal);
                }
            }

            TodoCommand::Edit {
                id,
                text,
                importance,
                date,
                time,
            } => {
                let current = todos
                    .get(&id)
                    .ok_or_else(|| JotError::RecordNotFound { id: id.clone() })?
                    .into_payload();

                let edited = TodoBody {
                    text: text.unwrap_or(current.text),
                    importance: importance.unwrap_or(current.importance),
                    scheduled_date: parse_optional(date, parse_date)?.or(current.scheduled_date),
                    scheduled_time: parse_optional(time, parse_time)?.or(current.scheduled_time),
                };

                if todos.update(&id, edited) {
                    println!("Todo {} updated", id);
                } else {
                    println!("Todo {} not changed: text would be empty.", id);
                }
            }

            TodoCommand::Delete { ids, force } => {
                if !force && !confirm(&format!("Delete {} todo(s)?", ids.len()))? {
                    println!("Cancelled.");
                    return Ok(());
                }
                let removed = if ids.len() == 1 {
                    usize::from(todos.remove(&ids[0]))
                } else {
                    todos.remove_many(ids.as_slice())
                };
                println!("Deleted {} todo(s)", removed);
            }
        }

        Ok(())
    }

    async fn handle_reset(&self, force: bool) -> Result<()> {
        if !force && !confirm("This permanently deletes every note and todo. Continue?")? {
            println!("Cancelled.");
            return Ok(());
        }

        match self.workspace.reset_all().await {
            Ok(()) => {
                println!("Storage has been reset successfully.");
                Ok(())
            }
            Err(e) => {
                println!("Failed to reset storage: {}", e);
                Err(e)
            }
        }
    }

    fn handle_config(&self, show: bool, save: bool, reset: bool) -> Result<()> {
        if reset {
            let path = config_target(self.config_path.as_deref())?;
            Config::default().save(&path)?;
            info!("Configuration reset at {}", path.display());
            println!("Configuration reset to defaults in {}", path.display());
        } else if save {
            let path = config_target(self.config_path.as_deref())?;
            self.config.save(&path)?;
            info!("Configuration saved to {}", path.display());
            println!("Configuration saved to {}", path.display());
        }

        if show || !(save || reset) {
            println!("{}", serde_json::to_string_pretty(&self.config)?);
        }
        Ok(())
    }

    /// Display notes in text format
    fn display_notes(&self, notes: &[Note]) {
        if notes.is_empty() {
            println!("No notes found.");
            return;
        }

        let width = separator_width();
        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(width));
            }

            let body = note.payload();
            println!("ID: {} | {}", note.id(), body.stamp);
            if !body.title.is_empty() {
                println!("{}", console::style(&body.title).bold());
            }
            if !body.text.is_empty() {
                println!("{}", preview(&body.text, if self.verbose { usize::MAX } else { 100 }));
            }
        }

        info!("Listed {} notes", notes.len());
    }

    /// Display one todo partition under a heading
    fn display_todos(&self, heading: &str, todos: &[Todo]) {
        println!("{} ({})", console::style(heading).bold().underlined(), todos.len());

        for todo in todos {
            let body = todo.payload();
            let mut line = format!("  [{}] {}", todo.id(), body.text);

            if let Some(date) = body.scheduled_date {
                line.push_str(&format!("  {}", date.format("%a, %b %-d, %Y")));
            }
            if let Some(time) = body.scheduled_time {
                line.push_str(&format!(" {}", time.format("%-I:%M %p")));
            }

            if body.importance == Importance::Important {
                println!("{}", console::style(line).red());
            } else {
                println!("{}", line);
            }
        }
        println!();
    }
}

fn parse_optional<T>(raw: Option<String>, parse: fn(&str) -> Result<T>) -> Result<Option<T>> {
    raw.as_deref().map(parse).transpose()
}

/// The file `config --save`/`--reset` writes to.
fn config_target(explicit: Option<&Path>) -> Result<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(Config::default_path)
        .ok_or_else(|| JotError::ConfigError {
            message: "No config location available; pass --config".to_string(),
        })
}

fn separator_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
        .min(50)
}

/// First line of `text`, cut to `max_chars`
fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.chars().count() <= max_chars {
        return first_line.to_string();
    }
    let cut: String = first_line.chars().take(max_chars).collect();
    format!("{}...", cut)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    stdout().flush()?;

    let mut answer = String::new();
    stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
