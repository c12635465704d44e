mod display;

use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal,
    ExecutableCommand, QueueableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use space_shooter::compute::{init_state, tick, GameState, GameStatus};
use space_shooter::config::SimConfig;
use space_shooter::events::GameEvent;
use space_shooter::input::InputSnapshot;
use space_shooter::persist::{JsonFileStore, Persistence};
use space_shooter::weapons::WeaponKind;

const FRAME: Duration = Duration::from_millis(16); // ≈60 FPS, one sim tick per frame

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames. Covers terminals that don't emit key-release events:
/// the OS key-repeat rate is ≥ 15 Hz, so a window of 8 frames (≈133 ms) is
/// always refreshed before expiry.
const HOLD_WINDOW: u64 = 8;

/// Ticks between autosaves (30 s of play).
const AUTOSAVE_EVERY: u64 = 1800;

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|key| is_held(key_frame, key, frame))
}

// ── Files in $HOME ────────────────────────────────────────────────────────────

fn home_file(name: &str) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(name)
}

/// Logs go to a file: the terminal belongs to the game while in raw mode.
fn init_logging() -> anyhow::Result<PathBuf> {
    let path = home_file(".space_shooter.log");
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(path)
}

fn load_config() -> anyhow::Result<SimConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let config = SimConfig::load(&path)
                .with_context(|| format!("failed to load config from {path}"))?;
            info!(%path, "loaded config");
            Ok(config)
        }
        None => Ok(SimConfig::default()),
    }
}

/// Writes a snapshot unless the run has already ended.
fn save_progress(store: &mut JsonFileStore, state: &GameState) {
    if state.status.is_over() {
        return;
    }
    if let Err(err) = store.save(&state.snapshot()) {
        warn!(%err, path = %store.path().display(), "failed to save progress");
    }
}

/// Fresh encounter with any saved progress layered on top.
fn new_game(config: &SimConfig, store: &mut JsonFileStore) -> GameState {
    let mut state = init_state(config.clone());
    match store.load() {
        Ok(Some(snapshot)) => {
            state.restore(&snapshot);
            info!(score = state.progression.score, level = state.progression.level, "restored save");
        }
        Ok(None) => {}
        Err(err) => warn!(%err, "ignoring unreadable save file"),
    }
    state
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start,
    Quit,
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    has_save: bool,
) -> std::io::Result<MenuResult> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = "★  SPACE  SHOOTER  ★";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(6),
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    if has_save {
        let saved = "Saved progress will be restored";
        out.queue(cursor::MoveTo(
            cx.saturating_sub(saved.chars().count() as u16 / 2),
            cy.saturating_sub(5),
        ))?;
        out.queue(style::SetForegroundColor(Color::Yellow))?;
        out.queue(Print(saved))?;
    }

    out.queue(cursor::MoveTo(cx.saturating_sub(14), cy.saturating_sub(3)))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print("[ENTER] Start    [Q] Quit"))?;

    // Pickup legend
    out.queue(cursor::MoveTo(cx.saturating_sub(14), cy))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print("Pickups (catch falling items):"))?;

    let pickup_info: &[(&str, Color, &str)] = &[
        ("♥", Color::Magenta, " Repair: restores 50 health"),
        ("W", Color::Cyan, " Ammo: half a magazine for a special weapon"),
        ("$", Color::Yellow, " Bonus: 100 points"),
    ];
    for (i, (sym, color, desc)) in pickup_info.iter().enumerate() {
        let row = cy + 1 + i as u16;
        out.queue(cursor::MoveTo(cx.saturating_sub(14), row))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(sym))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(*desc))?;
    }

    out.queue(cursor::MoveTo(cx.saturating_sub(14), cy + 5))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print("WASD / ARROWS : Move   SPACE : Shoot   1-4 : Weapon   X : Bomb"))?;

    out.queue(style::ResetColor)?;
    out.flush()?;

    // Block until the user makes a choice
    loop {
        let Ok(event) = rx.recv() else {
            // Input thread is gone; nothing can start a game any more.
            return Ok(MenuResult::Quit);
        };
        if let Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) = event {
            match code {
                KeyCode::Enter | KeyCode::Char(' ') => return Ok(MenuResult::Start),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit);
                }
                _ => {}
            }
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

fn weapon_for_key(code: &KeyCode) -> Option<WeaponKind> {
    match code {
        KeyCode::Char('1') => Some(WeaponKind::Normal),
        KeyCode::Char('2') => Some(WeaponKind::Rocket),
        KeyCode::Char('3') => Some(WeaponKind::Laser),
        KeyCode::Char('4') => Some(WeaponKind::Spread),
        _ => None,
    }
}

/// Handles a key press while the upgrade menu is open.
fn choose_upgrade(state: &mut GameState, code: &KeyCode) {
    let choice = match code {
        KeyCode::Char(c @ '1'..='9') => {
            let index = *c as usize - '1' as usize;
            match state.offered().get(index) {
                Some(kind) => Some(*kind),
                None => return,
            }
        }
        KeyCode::Enter => None,
        _ => return,
    };
    if let Err(err) = state.select_upgrade(choice) {
        warn!(%err, "upgrade selection rejected");
    }
}

/// Returns `true` → quit program, `false` → back to menu.
///
/// Input model: a `key_frame` map records the frame number of the last
/// press/repeat event for every key. Each frame, keys still "fresh" (within
/// `HOLD_WINDOW` frames) become the held part of the tick's input snapshot,
/// so Space + a direction can be held together. One-shot keys (bomb, weapon
/// select, upgrade choice) act on the press itself.
fn game_loop<W: Write>(
    out: &mut W,
    state: &mut GameState,
    rng: &mut StdRng,
    store: &mut JsonFileStore,
    rx: &mpsc::Receiver<Event>,
) -> anyhow::Result<bool> {
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;

    loop {
        let frame_start = Instant::now();
        frame += 1;

        let mut input = InputSnapshot::idle();

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(Event::Key(KeyEvent { code, kind, modifiers, .. })) = rx.try_recv() {
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code.clone(), frame);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            save_progress(store, state);
                            return Ok(true);
                        }
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            save_progress(store, state);
                            return Ok(true);
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') if state.status.is_over() => {
                            return Ok(false);
                        }
                        _ => {}
                    }
                    match state.status {
                        GameStatus::Upgrading => choose_upgrade(state, &code),
                        GameStatus::Playing => {
                            if matches!(code, KeyCode::Char('x') | KeyCode::Char('X')) {
                                input.bomb = true;
                            }
                            if let Some(weapon) = weapon_for_key(&code) {
                                input.switch_weapon = Some(weapon);
                            }
                        }
                        _ => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code.clone(), frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        // ── Held keys become this tick's movement and trigger ─────────────────
        input.left = any_held(&key_frame, &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')], frame);
        input.right = any_held(&key_frame, &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')], frame);
        input.up = any_held(&key_frame, &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')], frame);
        input.down = any_held(&key_frame, &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')], frame);
        input.fire = is_held(&key_frame, &KeyCode::Char(' '), frame);

        let before = state.status;
        tick(state, &input, rng);

        for event in state.drain_events() {
            match event {
                GameEvent::Victory | GameEvent::Defeat | GameEvent::BossIncoming => {
                    info!(?event, tick = state.sim_tick, "game event");
                }
                _ => tracing::trace!(?event, "game event"),
            }
        }

        // Autosave on a fixed cadence and whenever play is suspended.
        let suspended = before == GameStatus::Playing && state.status == GameStatus::Upgrading;
        if suspended || (state.sim_tick > 0 && state.sim_tick % AUTOSAVE_EVERY == 0 && before == GameStatus::Playing) {
            save_progress(store, state);
        }

        display::render(out, state)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let log_path = init_logging()?;
    let config = load_config()?;
    info!(log = %log_path.display(), seed = ?config.seed, "starting");

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Ghostty / kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        loop {
            match event::read() {
                Ok(ev) => {
                    if tx.send(ev).is_err() {
                        break; // receiver dropped → program exiting
                    }
                }
                Err(_) => break,
            }
        }
    });

    let result = run(&mut out, &rx, &config);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(err) = &result {
        tracing::error!(error = %err, "exiting with error");
    }
    result
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: &SimConfig,
) -> anyhow::Result<()> {
    let mut store = JsonFileStore::new(home_file(".space_shooter_save.json"));
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    loop {
        let has_save = store.path().exists();
        match show_menu(out, rx, has_save)? {
            MenuResult::Quit => break,
            MenuResult::Start => {
                let mut state = new_game(config, &mut store);
                let quit = game_loop(out, &mut state, &mut rng, &mut store, rx)?;
                info!(
                    score = state.progression.score,
                    level = state.progression.level,
                    status = ?state.status,
                    "run finished"
                );
                if quit {
                    break;
                }
            }
        }
    }
    Ok(())
}
