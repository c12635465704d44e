/// Rendering layer: all terminal I/O lives here.
///
/// Each function receives a mutable writer and an immutable view of the
/// game state. No game logic is performed; field coordinates are scaled
/// onto the terminal grid and translated into terminal commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use space_shooter::boss::BossState;
use space_shooter::compute::{GameState, GameStatus};
use space_shooter::enemy::{Enemy, EnemyVariant};
use space_shooter::entities::{Marker, MarkerKind, Pickup, PickupKind};
use space_shooter::projectile::{Projectile, ProjectileKind};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_HEALTH: Color = Color::Red;
const C_HUD_SHIELD: Color = Color::Cyan;
const C_HUD_WEAPON: Color = Color::White;
const C_PLAYER: Color = Color::White;
const C_PLAYER_SHIELDED: Color = Color::Cyan;
const C_BOSS: Color = Color::Red;
const C_SHOT_PLAYER: Color = Color::Cyan;
const C_SHOT_ENEMY: Color = Color::Magenta;
const C_SHOT_BOSS: Color = Color::Red;
const C_HINT: Color = Color::DarkGrey;

/// Maps field coordinates onto the play area inside the border.
///
/// Row 0 is the HUD, row 1 and `rows - 2` are the border, and the last row
/// holds the controls hint.
#[derive(Clone, Copy, Debug)]
struct Viewport {
    cols: u16,
    rows: u16,
    sx: f32,
    sy: f32,
}

impl Viewport {
    fn new(state: &GameState, cols: u16, rows: u16) -> Self {
        let inner_w = cols.saturating_sub(2).max(1) as f32;
        let inner_h = rows.saturating_sub(4).max(1) as f32;
        Self {
            cols,
            rows,
            sx: inner_w / state.config.field.width,
            sy: inner_h / state.config.field.height,
        }
    }

    /// Terminal cell for a field point, or `None` when it falls outside the
    /// play area.
    fn cell(&self, x: f32, y: f32) -> Option<(u16, u16)> {
        let col = 1.0 + (x * self.sx).floor();
        let row = 2.0 + (y * self.sy).floor();
        let inside = col >= 1.0
            && col < self.cols.saturating_sub(1) as f32
            && row >= 2.0
            && row < self.rows.saturating_sub(2) as f32;
        inside.then(|| (col as u16, row as u16))
    }

    fn span(&self, width: f32) -> usize {
        ((width * self.sx).round() as usize).max(1)
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, state: &GameState) -> std::io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let view = Viewport::new(state, cols, rows);

    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, &view)?;
    draw_hud(out, state, &view)?;
    draw_boss_bar(out, state, &view)?;

    for marker in &state.markers {
        draw_marker(out, marker, &view, state.clock)?;
    }
    for pickup in &state.pickups {
        draw_pickup(out, pickup, &view)?;
    }
    for enemy in &state.enemies {
        draw_enemy(out, enemy, &view)?;
    }
    for projectile in &state.projectiles {
        draw_projectile(out, projectile, &view)?;
    }

    draw_player(out, state, &view)?;
    draw_controls_hint(out, state, &view)?;

    match state.status {
        GameStatus::Upgrading => draw_upgrade_menu(out, state, &view)?,
        GameStatus::Reviving => draw_banner(out, &view, &[("REVIVED", Color::Green)])?,
        GameStatus::Victory => draw_game_over(out, state, &view, true)?,
        GameStatus::Defeat => draw_game_over(out, state, &view, false)?,
        GameStatus::Playing => {}
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    let w = view.cols as usize;
    let h = view.rows;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(view.cols.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, state: &GameState, view: &Viewport) -> std::io::Result<()> {
    // Score and level: left
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(format!(
        "Score:{:>6}  Lv:{:>2}",
        state.progression.score, state.progression.level
    )))?;

    // Weapon and ammo: centre
    let weapon = state.arsenal.current();
    let params = state.arsenal.current_params();
    let weapon_str = match (params.ammo, params.max_ammo) {
        (Some(ammo), Some(max)) => format!("[ {} {}/{} ]", weapon.name(), ammo, max),
        _ => format!("[ {} ]", weapon.name()),
    };
    let wx = (view.cols / 2).saturating_sub(weapon_str.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(wx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_WEAPON))?;
    out.queue(Print(&weapon_str))?;

    // Health, shield and stock: right
    let health = &state.player.health;
    let filled = (health.current as usize * 10).div_ceil(health.max.max(1) as usize);
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled.min(10)));
    let health_str = format!("HP {} {:>3}", bar, health.current);
    let shield_str = if state.player.shield.active {
        format!(" SH{:>3}", state.player.shield.value)
    } else {
        String::new()
    };
    let stock_str = format!(" B:{} R:{}", state.upgrades.bombs, state.upgrades.revives);

    let width = health_str.chars().count() + shield_str.chars().count() + stock_str.chars().count();
    let rx = view.cols.saturating_sub(width as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_HEALTH))?;
    out.queue(Print(&health_str))?;
    if !shield_str.is_empty() {
        out.queue(style::SetForegroundColor(C_HUD_SHIELD))?;
        out.queue(Print(&shield_str))?;
    }
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(&stock_str))?;

    Ok(())
}

/// Boss health drawn over the top border while the boss is on the field.
fn draw_boss_bar<W: Write>(out: &mut W, state: &GameState, view: &Viewport) -> std::io::Result<()> {
    let Some(enemy) = state.boss() else {
        return Ok(());
    };
    let Some(boss) = enemy.boss() else {
        return Ok(());
    };

    let phase = match boss.state {
        BossState::Entering => "INCOMING",
        BossState::Phase1 => "PHASE 1",
        BossState::Phase2 => "PHASE 2",
        BossState::Phase3 => "PHASE 3",
        BossState::Charging => "CHARGING",
        BossState::Defeated => "DESTROYED",
    };
    let slots = (view.cols as usize / 3).max(10);
    let filled = enemy.health.current as usize * slots / enemy.health.max.max(1) as usize;
    let line = format!(" BOSS {}{} {} ", "█".repeat(filled), "░".repeat(slots - filled), phase);

    let x = (view.cols / 2).saturating_sub(line.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(x, 1))?;
    out.queue(style::SetForegroundColor(C_BOSS))?;
    out.queue(Print(line))?;
    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn draw_player<W: Write>(out: &mut W, state: &GameState, view: &Viewport) -> std::io::Result<()> {
    let player = &state.player;
    // Blink while invulnerable.
    if player.is_invulnerable() && state.clock % 8 < 4 {
        return Ok(());
    }
    let color = if player.shield.active { C_PLAYER_SHIELDED } else { C_PLAYER };
    out.queue(style::SetForegroundColor(color))?;

    //   ▲       ← tip
    //  /█\      ← fuselage + wings
    let (cx, _) = player.center();
    if let Some((col, row)) = view.cell(cx, player.body.y) {
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(Print("▲"))?;
        if row + 1 < view.rows.saturating_sub(2) {
            out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row + 1))?;
            out.queue(Print("/█\\"))?;
        }
    }
    Ok(())
}

fn draw_enemy<W: Write>(out: &mut W, enemy: &Enemy, view: &Viewport) -> std::io::Result<()> {
    if enemy.is_boss() {
        return draw_final_boss(out, enemy, view);
    }
    let (glyph, color) = match enemy.variant {
        EnemyVariant::Basic => ("«▼»", Color::Green),
        EnemyVariant::Fast => ("<v>", Color::Yellow),
        EnemyVariant::Heavy => ("[#]", Color::DarkYellow),
        EnemyVariant::Sniper => ("-o-", Color::Red),
        EnemyVariant::Splitter => ("{@}", Color::Magenta),
        EnemyVariant::Shard => ("*", Color::Magenta),
        EnemyVariant::LegacyBoss => ("«█»", Color::Red),
        EnemyVariant::FinalBoss => ("", C_BOSS),
    };
    let (cx, cy) = enemy.body.center();
    let Some((col, row)) = view.cell(cx, cy) else {
        return Ok(());
    };
    let half = glyph.chars().count() as u16 / 2;
    out.queue(cursor::MoveTo(col.saturating_sub(half).max(1), row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(glyph))?;
    Ok(())
}

fn draw_final_boss<W: Write>(out: &mut W, enemy: &Enemy, view: &Viewport) -> std::io::Result<()> {
    let body = &enemy.body;
    let span = view.span(body.width).max(5);
    let charging = enemy.boss().is_some_and(|boss| boss.state == BossState::Charging);
    let core = if charging { "◎" } else { "▼" };
    let half = span / 2;
    let rows = [
        format!("╔{}╗", "═".repeat(span.saturating_sub(2))),
        format!("╠{}{}{}╣", "▓".repeat(half.saturating_sub(1)), core, "▓".repeat(span.saturating_sub(half + 2))),
        format!("╚{}╝", "╦".repeat(span.saturating_sub(2))),
    ];

    out.queue(style::SetForegroundColor(C_BOSS))?;
    let (cx, _) = body.center();
    for (i, line) in rows.iter().enumerate() {
        let y = body.y + body.height * i as f32 / rows.len() as f32;
        if let Some((col, row)) = view.cell(cx, y) {
            out.queue(cursor::MoveTo(col.saturating_sub(half as u16).max(1), row))?;
            out.queue(Print(line))?;
        }
    }
    Ok(())
}

fn draw_projectile<W: Write>(
    out: &mut W,
    projectile: &Projectile,
    view: &Viewport,
) -> std::io::Result<()> {
    let (glyph, color) = match projectile.kind {
        ProjectileKind::Bullet => ("║", C_SHOT_PLAYER),
        ProjectileKind::Rocket => ("!", Color::Yellow),
        ProjectileKind::Laser => ("┃", Color::White),
        ProjectileKind::Pellet => ("·", C_SHOT_PLAYER),
        ProjectileKind::EnemyShot => ("↓", C_SHOT_ENEMY),
        ProjectileKind::SniperShot => ("↓", Color::Red),
        ProjectileKind::Boss(_) => ("•", C_SHOT_BOSS),
        ProjectileKind::BossBeam { center: true } => ("█", C_SHOT_BOSS),
        ProjectileKind::BossBeam { center: false } => ("▒", C_SHOT_BOSS),
    };
    let (cx, cy) = projectile.body.center();
    if let Some((col, row)) = view.cell(cx, cy) {
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(color))?;
        out.queue(Print(glyph))?;
    }
    Ok(())
}

/// Symbols:
///   ♥  (magenta): restores health
///   W  (cyan)   : ammo for a random special weapon
///   $  (yellow) : score bonus
fn draw_pickup<W: Write>(out: &mut W, pickup: &Pickup, view: &Viewport) -> std::io::Result<()> {
    let (glyph, color) = match pickup.kind {
        PickupKind::Health => ("♥", Color::Magenta),
        PickupKind::Weapon => ("W", Color::Cyan),
        PickupKind::Score => ("$", Color::Yellow),
    };
    let (cx, cy) = pickup.body.center();
    if let Some((col, row)) = view.cell(cx, cy) {
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(color))?;
        out.queue(Print(glyph))?;
    }
    Ok(())
}

fn draw_marker<W: Write>(
    out: &mut W,
    marker: &Marker,
    view: &Viewport,
    clock: u64,
) -> std::io::Result<()> {
    let faded = marker.remaining() < 0.4;
    let (glyph, color) = match marker.kind {
        MarkerKind::Explosion => (if faded { "·" } else { "✶" }, Color::DarkYellow),
        MarkerKind::RocketBlast => (if faded { "∘" } else { "※" }, Color::Yellow),
        MarkerKind::Revive => ("+", Color::Green),
        MarkerKind::ChargeWarning => {
            if clock % 10 < 5 {
                return Ok(());
            }
            ("◎", Color::Red)
        }
        MarkerKind::BombWave => {
            // A ring expanding from the player, drawn as a horizontal sweep.
            let Some((_, row)) = view.cell(marker.x, marker.y) else {
                return Ok(());
            };
            let reach = ((1.0 - marker.remaining()) * view.rows as f32) as u16;
            let width = view.cols.saturating_sub(2) as usize;
            out.queue(style::SetForegroundColor(Color::White))?;
            for r in [row.saturating_sub(reach), row + reach] {
                if r >= 2 && r < view.rows.saturating_sub(2) {
                    out.queue(cursor::MoveTo(1, r))?;
                    out.queue(Print("~".repeat(width)))?;
                }
            }
            return Ok(());
        }
    };
    if let Some((col, row)) = view.cell(marker.x, marker.y) {
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(color))?;
        out.queue(Print(glyph))?;
    }
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, state: &GameState, view: &Viewport) -> std::io::Result<()> {
    let hint = match state.status {
        GameStatus::Upgrading => "1 / 2 : Choose upgrade   ENTER : Continue   Q : Quit",
        GameStatus::Victory | GameStatus::Defeat => "R : Play again   Q : Quit",
        _ => "WASD / ARROWS : Move   SPACE : Shoot   1-4 : Weapon   X : Bomb   Q : Quit",
    };
    out.queue(cursor::MoveTo(1, view.rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(hint))?;
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

/// Centered lines, one colour each.
fn draw_banner<W: Write>(out: &mut W, view: &Viewport, lines: &[(&str, Color)]) -> std::io::Result<()> {
    let cx = view.cols / 2;
    let start_row = (view.rows / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (msg, color)) in lines.iter().enumerate() {
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, start_row + i as u16))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*msg))?;
    }
    Ok(())
}

fn draw_upgrade_menu<W: Write>(out: &mut W, state: &GameState, view: &Viewport) -> std::io::Result<()> {
    let title = format!("LEVEL {}: CHOOSE AN UPGRADE", state.progression.level);
    let mut lines: Vec<(String, Color)> = vec![(title, Color::Yellow), (String::new(), Color::Reset)];
    if state.offered().is_empty() {
        lines.push(("Everything is maxed out. ENTER to continue".to_string(), Color::DarkGrey));
    }
    for (i, kind) in state.offered().iter().enumerate() {
        let level = state.upgrades.level(*kind);
        lines.push((
            format!("[{}] {:<10} {}  (have {})", i + 1, kind.name(), kind.description(), level),
            Color::White,
        ));
    }

    let borrowed: Vec<(&str, Color)> = lines.iter().map(|(text, color)| (text.as_str(), *color)).collect();
    draw_banner(out, view, &borrowed)
}

fn draw_game_over<W: Write>(
    out: &mut W,
    state: &GameState,
    view: &Viewport,
    victory: bool,
) -> std::io::Result<()> {
    let (box_lines, color): ([&str; 3], Color) = if victory {
        (["╔════════════════════╗", "║      VICTORY!      ║", "╚════════════════════╝"], Color::Green)
    } else {
        (["╔════════════════════╗", "║    GAME  OVER      ║", "╚════════════════════╝"], Color::Red)
    };
    let score_line = format!("Final Score: {:>6}", state.progression.score);
    let level_line = format!("Reached level {}", state.progression.level);

    draw_banner(
        out,
        view,
        &[
            (box_lines[0], color),
            (box_lines[1], color),
            (box_lines[2], color),
            (score_line.as_str(), Color::Yellow),
            (level_line.as_str(), Color::DarkGrey),
            ("R - Play Again  Q - Quit", Color::White),
        ],
    )
}
