//! Command-line entry point: inspect, import and share drawings kept in the
//! local file store.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use gridsketch_core::{
    DrawingId, DrawingStore, Editor, FileStorage, ShareStringifier, ShortcutRegistry, Stringifier,
    layer_to_text,
};
use kurbo::Size;
use std::path::PathBuf;

/// Viewport assumed when placing imported text.
const IMPORT_VIEWPORT: Size = Size::new(1280.0, 800.0);

#[derive(Parser, Debug)]
#[command(name = "gridsketch")]
#[command(version, about = "Text diagrams on a character grid")]
struct Cli {
    /// Directory holding saved drawings (defaults to the user data directory)
    #[arg(long, value_name = "DIR", global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List saved drawings
    List,
    /// Print a drawing as text
    Show {
        /// Local drawing name (the default drawing when omitted)
        #[arg(long, conflicts_with = "share")]
        name: Option<String>,
        /// Share payload or `/share/...` route
        #[arg(long)]
        share: Option<String>,
    },
    /// Paste a text file into a drawing as one undoable edit
    Import {
        file: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the share route for a drawing
    Share {
        #[arg(long)]
        name: Option<String>,
    },
    /// Save a shared drawing as a local one
    Save {
        /// Share payload or `/share/...` route
        share: String,
        #[arg(long)]
        name: String,
    },
    /// Rename a local drawing
    Rename { from: String, to: String },
    /// Delete a drawing and its history
    Delete {
        #[arg(long)]
        name: Option<String>,
    },
    /// List keyboard shortcuts
    Shortcuts,
}

fn local_id(name: Option<String>) -> DrawingId {
    DrawingId::local(name.unwrap_or_default())
}

/// Accept either a bare payload or a full route.
fn share_id(share: &str) -> anyhow::Result<DrawingId> {
    let id = if share.starts_with('/') || share.starts_with('#') {
        DrawingId::from_route(share).with_context(|| format!("Unknown route {:?}", share))?
    } else {
        DrawingId::share(share)
    };
    let DrawingId::Share(payload) = &id else {
        bail!("{:?} is not a share route", share);
    };
    ShareStringifier
        .decode(payload)
        .context("Invalid share payload")?;
    Ok(id)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let storage = match cli.store {
        Some(path) => FileStorage::new(path),
        None => FileStorage::default_location(),
    }
    .context("Failed to open drawing store")?;
    log::debug!("Using store at {}", storage.base_path().display());
    let mut store = DrawingStore::new(storage);

    match cli.command {
        Command::List => {
            println!("(default)");
            for name in store.local_drawings() {
                println!("{}", name);
            }
        }
        Command::Show { name, share } => {
            let id = match share {
                Some(share) => share_id(&share)?,
                None => local_id(name),
            };
            let text = layer_to_text(store.canvas(&id).committed(), None);
            println!("{}", text);
        }
        Command::Import { file, name } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut editor = Editor::new(store, IMPORT_VIEWPORT);
            editor.open(local_id(name));
            if !editor.paste(&text) {
                bail!("{} has no drawable characters", file.display());
            }
            editor.flush().context("Failed to save drawing")?;
            log::info!("Imported {} into {}", file.display(), editor.drawing());
        }
        Command::Share { name } => {
            let id = local_id(name);
            println!("{}", store.share_link(&id).to_route());
        }
        Command::Save { share, name } => {
            let id = share_id(&share)?;
            let saved = store
                .save_shared(&id, &name)
                .context("Failed to save drawing")?;
            println!("{}", saved.to_route());
        }
        Command::Rename { from, to } => {
            if !store
                .rename_drawing(&from, &to)
                .context("Failed to rename drawing")?
            {
                bail!("Cannot rename {:?} to {:?}", from, to);
            }
        }
        Command::Delete { name } => {
            let id = local_id(name);
            store
                .delete_drawing(&id)
                .context("Failed to delete drawing")?;
        }
        Command::Shortcuts => {
            println!("{}", ShortcutRegistry::describe());
        }
    }

    Ok(())
}
