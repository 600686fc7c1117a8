mod tui;

use std::fs;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, Clear, ClearType},
    ExecutableCommand,
};
use serde::{Deserialize, Serialize};

use rusty_solitaire::{AutoMove, Game, GameKind, Settings, Stats};

use crate::tui::View;

const SAVE_FILE: &str = "rusty_solitaire_game.json";
const PROFILE_FILE: &str = "rusty_solitaire_profile.json";
/// Redraw interval; one transfer lands per frame.
const FRAME: Duration = Duration::from_millis(60);

/// Preferences and statistics kept between runs.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct Profile {
    settings: Settings,
    stats: Stats,
}

struct Paths {
    game: PathBuf,
    profile: PathBuf,
}

impl Paths {
    /// Files live in `RUSTY_SOLITAIRE_DIR`, or the working directory.
    fn from_env() -> Paths {
        let dir = std::env::var_os("RUSTY_SOLITAIRE_DIR")
            .map(PathBuf::from)
            .unwrap_or_default();
        Paths {
            game: dir.join(SAVE_FILE),
            profile: dir.join(PROFILE_FILE),
        }
    }
}

fn load(paths: &Paths) -> Game {
    let profile: Profile = fs::read_to_string(&paths.profile)
        .ok()
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default();
    let game = match fs::read_to_string(&paths.game) {
        Ok(json) => Game::from_save(&json, profile.settings),
        Err(_) => Game::new(profile.settings),
    };
    game.with_stats(profile.stats)
}

fn store(paths: &Paths, game: &mut Game) -> anyhow::Result<()> {
    let profile = Profile {
        settings: game.settings().clone(),
        stats: game.stats().clone(),
    };
    fs::write(&paths.profile, serde_json::to_string_pretty(&profile)?)
        .with_context(|| format!("failed to write {}", paths.profile.display()))?;

    if game.is_won() {
        // a finished game has nothing left to resume
        let _ = fs::remove_file(&paths.game);
        return Ok(());
    }
    fs::write(&paths.game, game.save()?)
        .with_context(|| format!("failed to write {}", paths.game.display()))
}

fn next_auto_move(auto_move: AutoMove) -> AutoMove {
    match auto_move {
        AutoMove::Always => AutoMove::FlingOnly,
        AutoMove::FlingOnly => AutoMove::Never,
        AutoMove::Never => AutoMove::Always,
    }
}

/// Lifts one card more or fewer from the pile the held cards came from.
fn regrip(game: &mut Game, more: bool) {
    let Some((from, held)) = game.held().map(|(from, cards)| (from, cards.len())) else {
        return;
    };
    let wanted = if more { held + 1 } else { held.saturating_sub(1) };
    game.release();
    if !game.lift_count(from, wanted) {
        game.lift_count(from, held);
    }
}

fn press(game: &mut Game, view: &mut View) {
    let target = view.cursor();
    if game.held().is_some() {
        if !game.drop_on(target) && game.held().is_some() {
            view.say("Can't go there");
        }
    } else if !game.tap(target) {
        game.lift(target);
    }
}

/// Returns false once the player asks to quit.
fn handle_key(game: &mut Game, view: &mut View, key: KeyEvent) -> bool {
    match key {
        KeyEvent { code: KeyCode::Char('q'), .. } => return false,
        KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL, .. } => return false,
        KeyEvent { code: KeyCode::Char('n'), modifiers: KeyModifiers::CONTROL, .. } => {
            game.new_game(game.kind());
        }
        KeyEvent { code: KeyCode::Left, .. } => view.move_cursor_left(game),
        KeyEvent { code: KeyCode::Right, .. } => view.move_cursor_right(game),
        KeyEvent { code: KeyCode::Up, .. } => regrip(game, true),
        KeyEvent { code: KeyCode::Down, .. } => regrip(game, false),
        KeyEvent { code: KeyCode::Char(' ') | KeyCode::Enter, .. } => press(game, view),
        KeyEvent { code: KeyCode::Esc, .. } => game.release(),
        KeyEvent { code: KeyCode::Char('d'), .. } => {
            game.deal();
        }
        KeyEvent { code: KeyCode::Char('f'), .. } => {
            if game.held().is_none() {
                game.lift_count(view.cursor(), 1);
            }
            game.fling();
        }
        KeyEvent { code: KeyCode::Char('z'), .. } => {
            if !game.undo() {
                view.say("Nothing to undo");
            }
        }
        KeyEvent { code: KeyCode::Char('r'), .. } => game.restart(),
        KeyEvent { code: KeyCode::Char('p'), .. } => {
            if game.is_paused() {
                game.resume();
            } else {
                game.pause();
            }
        }
        KeyEvent { code: KeyCode::Char('a'), .. } => {
            let mut settings = game.settings().clone();
            settings.auto_move = next_auto_move(settings.auto_move);
            game.refresh_settings(settings);
        }
        KeyEvent { code: KeyCode::Char('h'), .. } => view.toggle_high_contrast(),
        KeyEvent { code: KeyCode::Char(c @ '1'..='4'), .. } => {
            let index = c as usize - '1' as usize;
            game.new_game(GameKind::ALL[index]);
        }
        _ => {}
    }
    true
}

fn run(out: &mut io::Stdout) -> anyhow::Result<()> {
    let paths = Paths::from_env();
    let mut game = load(&paths);
    let mut view = View::new();
    view.print(out, &game)?;

    let mut last_tick = Instant::now();
    loop {
        let mut dirty = false;
        if event::poll(FRAME)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if !handle_key(&mut game, &mut view, key) {
                        break;
                    }
                    view.clamp(&game);
                    dirty = true;
                }
            }
        } else if game.transfer_complete() {
            dirty = true;
        }

        let now = Instant::now();
        let shown = game.elapsed_ms() / 1000;
        game.tick(now.duration_since(last_tick).as_millis() as u64);
        last_tick = now;
        dirty |= game.elapsed_ms() / 1000 != shown;

        for notice in game.take_notices() {
            view.note(notice);
            dirty = true;
        }
        if dirty {
            view.print(out, &game)?;
        }
    }

    store(&paths, &mut game)
}

fn cleanup(out: &mut io::Stdout) {
    let _ = out.execute(cursor::Show);
    let _ = terminal::disable_raw_mode();
    let _ = out.execute(Clear(ClearType::All));
    println!();
}

fn main() -> anyhow::Result<()> {
    let (width, _) = terminal::size()?;
    if width < tui::MIN_TERMINAL_WIDTH {
        anyhow::bail!("terminal must be at least {} columns wide", tui::MIN_TERMINAL_WIDTH);
    }

    terminal::enable_raw_mode()?;
    let mut out = stdout();
    out.execute(cursor::Hide)?;
    out.execute(Clear(ClearType::All))?;

    let result = run(&mut out);
    cleanup(&mut out);
    result
}
