mod app;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEventKind,
};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use app::App;
use getrid::keepfile;
use getrid::pacman::{PACMAN_LOCK, PackageIndex, PackageManager, Pacman};
use getrid::removal;
use getrid::session::Session;
use getrid::types::Action;
use ui::{details_width, ui};

/// Interactively pick top-level pacman packages to remove.
#[derive(Parser, Debug)]
#[command(name = "getrid", version, about)]
struct Cli {
    /// Keep list location [default: $XDG_CONFIG_HOME/getrid or ~/.getrid]
    #[arg(long, value_name = "PATH")]
    keep_file: Option<PathBuf>,

    /// Start with kept packages visible
    #[arg(long)]
    show_kept: bool,

    /// Log file [default: <cache dir>/getrid/getrid.log]; filter with GETRID_LOG
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print what would be removed instead of calling pacman
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.log_file.clone());

    let keep_path = cli
        .keep_file
        .clone()
        .or_else(keepfile::default_path)
        .ok_or_else(|| eyre!("no home directory; pass --keep-file"))?;
    let keep = keepfile::load(&keep_path);

    let pacman = Pacman::new();
    println!("Reading installed packages...");
    let packages = pacman.list_removable_packages()?;
    if packages.is_empty() {
        println!("No removable packages found.");
        return Ok(());
    }

    let session = Session::new(packages, &keep, !cli.show_kept)?;
    let mut app = App::new(session, Box::new(Pacman::new()))?;

    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    io::stdout().execute(EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let result = run(&mut terminal, &mut app);

    io::stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result?;

    finish(&app.session, &keep_path, &pacman, cli.dry_run)
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while !app.session.is_exiting() {
        app.set_detail_width(details_width(terminal.size()?.width));
        terminal.draw(|f| ui(f, app))?;

        if !event::poll(std::time::Duration::from_millis(250))? {
            continue;
        }

        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                let action = match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        Action::Quit
                    }
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Action::Quit,
                    KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('d') => {
                        Action::ToggleRemove
                    }
                    KeyCode::Char('t') => Action::ToggleKeepForNow,
                    KeyCode::Char('e') => Action::ToggleKeepForever,
                    KeyCode::Char('s') => Action::ToggleVisibility,
                    KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
                    KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
                    KeyCode::PageUp => Action::MoveBy(-10),
                    KeyCode::PageDown => Action::MoveBy(10),
                    KeyCode::Home | KeyCode::Char('g') => Action::MoveBy(isize::MIN / 2),
                    KeyCode::End | KeyCode::Char('G') => Action::MoveBy(isize::MAX / 2),
                    KeyCode::Right | KeyCode::Char('l') => Action::Select,
                    KeyCode::Char('J') => {
                        app.scroll_details(1);
                        continue;
                    }
                    KeyCode::Char('K') => {
                        app.scroll_details(-1);
                        continue;
                    }
                    _ => continue,
                };
                app.handle(action)?;
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => app.handle(Action::MoveUp)?,
                MouseEventKind::ScrollDown => app.handle(Action::MoveDown)?,
                MouseEventKind::Down(MouseButton::Left) => {
                    // A click marks the row, like Enter on it
                    if let Some(row) = app.row_at(mouse.column, mouse.row) {
                        app.handle(Action::SelectRow(row))?;
                        app.handle(Action::ToggleRemove)?;
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
    Ok(())
}

/// After the TUI is gone: persist the keep list, then confirm and remove.
fn finish(session: &Session, keep_path: &Path, manager: &dyn PackageManager, dry_run: bool) -> Result<()> {
    if let Err(e) = keepfile::save(keep_path, &session.keep_list()) {
        error!(error = %e, "failed to save keep list");
        eprintln!("Error: {e:#}");
    }

    let outcome = removal::finish(
        session,
        manager,
        Path::new(PACMAN_LOCK),
        dry_run,
        &mut io::stdin().lock(),
        &mut io::stdout(),
    )?;
    info!(?outcome, "done");
    Ok(())
}

/// Logs go to a file since the terminal belongs to the TUI.
fn init_logging(path: Option<PathBuf>) {
    let filter = EnvFilter::try_from_env("GETRID_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let path = path.or_else(|| dirs::cache_dir().map(|dir| dir.join("getrid").join("getrid.log")));
    let file = path.and_then(|path| {
        if let Some(parent) = path.parent() {
            drop(std::fs::create_dir_all(parent));
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match file {
        Some(file) => {
            drop(
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .try_init(),
            );
        }
        None => {
            drop(
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(io::sink)
                    .try_init(),
            );
        }
    }
}
