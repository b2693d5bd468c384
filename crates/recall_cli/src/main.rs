//! `recall` command-line entry point.
//!
//! # Responsibility
//! - Open the note database and route subcommands to `recall_core`.
//! - Print results as JSON on stdout; errors go to stderr with exit code 1.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{AddArgs, Cli, Commands, EditArgs, MindMapArgs};
use recall_core::db::open_db;
use recall_core::repo::note_store::normalize_tag;
use recall_core::{
    analyze_tag_clusters, build_positioned_mind_map, default_log_level, init_logging,
    notes_for_tag, BackgroundPoller, MindMapOptions, NewNote, Note, NoteQuery, NoteStore,
    PollerConfig, RepoError, ReviewService, SqliteNoteStore,
};
use serde_json::json;
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let store = Arc::new(SqliteNoteStore::try_new(conn)?);

    match cli.command {
        Commands::Add(args) => add_note(&store, args),
        Commands::Edit(args) => edit_note(&store, args),
        Commands::Delete { id } => {
            store.delete_note(id)?;
            print_json(&json!({ "deleted": id }))
        }
        Commands::Due => {
            let service = ReviewService::new(store);
            print_json(&service.due_notes_now()?)
        }
        Commands::Review { id } => {
            let service = ReviewService::new(store);
            print_json(&service.mark_reviewed(id)?)
        }
        Commands::Reset { id } => {
            let service = ReviewService::new(store);
            print_json(&service.reset_review(id)?)
        }
        Commands::Archive { id, restore } => print_json(&store.set_archived(id, !restore)?),
        Commands::Tags { tag } => {
            let notes = store.find_notes(&NoteQuery::active())?;
            match tag {
                Some(tag) => print_json(&notes_with_tag(&notes, &tag)),
                None => print_json(&analyze_tag_clusters(&notes)),
            }
        }
        Commands::MindMap(args) => mind_map(&store, args),
        Commands::Watch { interval_secs } => watch(store, interval_secs),
    }
}

fn add_note(store: &SqliteNoteStore, args: AddArgs) -> Result<()> {
    let input = NewNote::new(args.title, args.content).with_tags(args.tag);
    print_json(&store.create_note(&input)?)
}

fn edit_note(store: &SqliteNoteStore, args: EditArgs) -> Result<()> {
    let current = store.get_note(args.id)?.ok_or(RepoError::NotFound(args.id))?;
    print_json(&store.update_note(args.id, &merge_edit(&current, args))?)
}

/// Applies the given flags on top of `current`; absent flags keep the old
/// value.
fn merge_edit(current: &Note, args: EditArgs) -> NewNote {
    let tags = if args.clear_tags {
        Vec::new()
    } else if args.tag.is_empty() {
        current.tags.clone()
    } else {
        args.tag
    };
    NewNote::new(
        args.title.unwrap_or_else(|| current.title.clone()),
        args.content.unwrap_or_else(|| current.content.clone()),
    )
    .with_tags(tags)
}

/// Looks `tag` up the way the store saves it: trimmed, case kept.
fn notes_with_tag<'a>(notes: &'a [Note], tag: &str) -> Vec<&'a Note> {
    match normalize_tag(tag) {
        Some(tag) => notes_for_tag(notes, &tag),
        None => Vec::new(),
    }
}

fn mind_map(store: &SqliteNoteStore, args: MindMapArgs) -> Result<()> {
    let notes = store.find_notes(&NoteQuery::active())?;
    let options = MindMapOptions {
        min_tag_size: args.min_tag_size,
        width: args.width,
        height: args.height,
    };
    print_json(&build_positioned_mind_map(&notes, &options))
}

fn watch(store: Arc<SqliteNoteStore>, interval_secs: u64) -> Result<()> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .context("failed to install Ctrl-C handler")?;

    let handle = BackgroundPoller::start(store, PollerConfig::from_secs(interval_secs), |report| {
        println!(
            "{}",
            json!({ "dueCount": report.due_count, "scannedAt": report.scanned_at })
        );
    })
    .context("failed to start due poller")?;

    eprintln!("watching due notes every {interval_secs}s, press Ctrl-C to stop");
    // A recv error means the handler was dropped, which only happens at exit.
    let _ = stop_rx.recv();
    handle.stop();
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{merge_edit, notes_with_tag};
    use crate::cli::EditArgs;
    use recall_core::db::open_db_in_memory;
    use recall_core::{NewNote, Note, NoteQuery, NoteStore, SqliteNoteStore};

    fn store() -> SqliteNoteStore {
        SqliteNoteStore::try_new(open_db_in_memory().unwrap()).unwrap()
    }

    fn add(store: &SqliteNoteStore, title: &str, tags: &[&str]) -> Note {
        store
            .create_note(&NewNote::new(title, "body").with_tags(tags.iter().copied()))
            .unwrap()
    }

    #[test]
    fn tag_lookup_trims_like_the_store_and_keeps_case() {
        let store = store();
        add(&store, "a", &["Rust"]);
        add(&store, "b", &["rust"]);
        let notes = store.find_notes(&NoteQuery::active()).unwrap();

        let found = notes_with_tag(&notes, "  Rust ");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "a");
        assert_eq!(notes_with_tag(&notes, "rust")[0].title, "b");
        assert!(notes_with_tag(&notes, "   ").is_empty());
    }

    #[test]
    fn edit_keeps_unspecified_fields() {
        let note = add(&store(), "title", &["x", "y"]);

        let only_title = merge_edit(
            &note,
            EditArgs {
                title: Some("renamed".to_string()),
                ..EditArgs::default()
            },
        );
        assert_eq!(only_title.title, "renamed");
        assert_eq!(only_title.content, "body");
        assert_eq!(only_title.tags, vec!["x".to_string(), "y".to_string()]);

        let retagged = merge_edit(
            &note,
            EditArgs {
                tag: vec!["z".to_string()],
                ..EditArgs::default()
            },
        );
        assert_eq!(retagged.tags, vec!["z".to_string()]);

        let cleared = merge_edit(
            &note,
            EditArgs {
                clear_tags: true,
                ..EditArgs::default()
            },
        );
        assert!(cleared.tags.is_empty());
    }
}
