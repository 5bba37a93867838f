//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┬──────────────┐
//! │                                              │  CHORD       │
//! │          hand skeleton                       │   [ Am ]     │
//! │          (frame coordinates, 640×480)        │              │
//! │                                              │  T - I + …   │
//! │                                              │  detector    │
//! ├──────────────────────────────────────────────┴──────────────┤
//! │  status bar / key legend                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use chord_gesture::keypoint::HAND_BONES;
use chord_gesture::{ChordLabel, Finger, FingerStates, Hand, PipelineSnapshot, SessionState};

use crate::sim::{SimInput, SimKey, SIM_FRAME_H, SIM_FRAME_W};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const VIEW_W:        usize = SIM_FRAME_W as usize;
const VIEW_H:        usize = SIM_FRAME_H as usize;
const PANEL_W:       usize = 220;
const STATUS_H:      usize = 40;
pub const WIN_W:     usize = VIEW_W + PANEL_W;
pub const WIN_H:     usize = VIEW_H + STATUS_H;
const STATUS_Y:      usize = VIEW_H;
const BG_COLOR:      u32   = 0xFF1A1A2E;
const PANEL_BG:      u32   = 0xFF16213E;
const TEXT_BG:       u32   = 0xFF0F3460;
const BONE_COLOR:    u32   = 0xFF7FD8FF;
const JOINT_COLOR:   u32   = 0xFFFFFFFF;
const DIM_COLOR:     u32   = 0xFF444466;
const CHORD_COLOR:   u32   = 0xFFFFD700;  // gold
const EXTENDED_BG:   u32   = 0xFF2E8B57;
const CURLED_BG:     u32   = 0xFF5A2A2A;

/// Font scale for the held chord.
const CHORD_SCALE: usize = 12;

// ════════════════════════════════════════════════════════════════════════════
// WindowKey — keys the window handles itself
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowKey {
    Quit,
    /// `]` / `[`: step through the named instruments.
    Instrument(isize),
    /// Space: silence the sounding chord.
    Mute,
}

fn window_key(key: Key) -> Option<WindowKey> {
    match key {
        Key::Q | Key::Escape => Some(WindowKey::Quit),
        Key::RightBracket    => Some(WindowKey::Instrument(1)),
        Key::LeftBracket     => Some(WindowKey::Instrument(-1)),
        Key::Space           => Some(WindowKey::Mute),
        _ => None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:  Window,
    buf:     Vec<u32>,
    sim_tx:  Option<Sender<SimInput>>,
    min_confidence: f32,
}

impl Visualizer {
    /// Open the window.  `sim_tx` receives key presses when the hand is
    /// simulated; pass `None` for replay.
    pub fn new(sim_tx: Option<Sender<SimInput>>, min_confidence: f32) -> Result<Self, String> {
        let mut window = Window::new(
            "Air Chords",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            min_confidence,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard inputs.  Pose keys go to the simulator as `SimInput`s;
    /// the rest come back to the caller.  A closed window reads as
    /// [`WindowKey::Quit`].
    pub fn poll_input(&mut self) -> Vec<WindowKey> {
        if !self.window.is_open() { return vec![WindowKey::Quit]; }

        let actions: Vec<WindowKey> = self.window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(window_key)
            .collect();
        if actions.contains(&WindowKey::Quit) {
            self.send(SimKey::Quit);
            return vec![WindowKey::Quit];
        }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        const DIGITS: [(Key, u8); 7] = [
            (Key::Key0, 0), (Key::Key1, 1), (Key::Key2, 2), (Key::Key3, 3),
            (Key::Key4, 4), (Key::Key5, 5), (Key::Key6, 6),
        ];
        let mut pressed = Vec::new();
        for (key, d) in DIGITS {
            if one_shot(key) {
                pressed.extend(SimKey::from_digit(d));
            }
        }
        if one_shot(Key::H) {
            pressed.push(SimKey::Hide);
        }
        for key in pressed {
            self.send(key);
        }

        actions
    }

    fn send(&self, key: SimKey) {
        if let Some(tx) = &self.sim_tx {
            let _ = tx.send(SimInput::KeyDown(key));
        }
    }

    /// Render one frame.
    pub fn render(&mut self, snap: &PipelineSnapshot, session: SessionState, status: &str) {
        self.buf.fill(BG_COLOR);

        // ── Hand ──────────────────────────────────────────────────────────
        if let Some(hand) = &snap.hand {
            self.draw_hand(hand);
        } else if session == SessionState::Ready {
            self.draw_label("no hand", VIEW_W / 2 - 14, VIEW_H / 2, DIM_COLOR);
        }

        // ── Side panel ────────────────────────────────────────────────────
        self.fill_rect(VIEW_W, 0, PANEL_W, VIEW_H, PANEL_BG);
        self.draw_label("CHORD", VIEW_W + 10, 10, CHORD_COLOR);
        self.draw_chord(snap.held, snap.last_match);
        if let Some(fingers) = &snap.fingers {
            self.draw_badges(fingers);
        }
        let detector = match session {
            SessionState::Uninitialized => "detector: off",
            SessionState::Loading       => "detector: loading",
            SessionState::Ready         => "detector: ready",
        };
        self.draw_label(detector, VIEW_W + 10, VIEW_H - 40, 0xFFAADDFF);
        let counts = format!("ticks {}  chords {}", snap.ticks, snap.emitted);
        self.draw_label(&counts, VIEW_W + 10, VIEW_H - 26, 0xFF888888);

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, STATUS_H, TEXT_BG);
        self.draw_label(status, 10, STATUS_Y + 10, 0xFFEEEEEE);

        // ── Key legend ────────────────────────────────────────────────────
        self.draw_label(
            "1=A 2=Am 3=C 4=D 5=G 6=F 0=open H=hide [ ]=instrument space=mute Q=quit",
            10, WIN_H - 12, 0xFF888888,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Hand skeleton ─────────────────────────────────────────────────────

    fn draw_hand(&mut self, hand: &Hand) {
        let kp = hand.keypoints();
        for &(a, b) in HAND_BONES.iter() {
            let (ka, kb) = (&kp[a], &kp[b]);
            let valid = ka.is_valid(self.min_confidence) && kb.is_valid(self.min_confidence);
            let color = if valid { BONE_COLOR } else { DIM_COLOR };
            self.draw_line(ka.position(), kb.position(), color);
        }
        for k in kp.iter() {
            let color = if k.is_valid(self.min_confidence) { JOINT_COLOR } else { DIM_COLOR };
            if let Some((x, y)) = to_view(k.position()) {
                self.fill_rect(x.saturating_sub(2), y.saturating_sub(2), 5, 5, color);
            }
        }
    }

    // ── Side panel pieces ─────────────────────────────────────────────────

    fn draw_chord(&mut self, held: Option<ChordLabel>, last_match: Option<ChordLabel>) {
        let Some(label) = held else {
            self.draw_label("-", VIEW_W + 90, 60, DIM_COLOR);
            return;
        };
        // dim when the current pose no longer matches the held chord
        let color = if last_match == Some(label) { CHORD_COLOR } else { blend(CHORD_COLOR, PANEL_BG, 0.5) };
        let symbol = label.symbol();
        let w = symbol.len() * 4 * CHORD_SCALE;
        let x = VIEW_W + PANEL_W.saturating_sub(w) / 2;
        self.draw_label_scaled(symbol, x, 40, CHORD_SCALE, color);
        self.draw_label(label.as_str(), VIEW_W + 10, 40 + 6 * CHORD_SCALE + 8, 0xFFEEEEEE);
    }

    fn draw_badges(&mut self, fingers: &FingerStates) {
        let y = 180;
        for (i, finger) in Finger::ALL.iter().enumerate() {
            let x = VIEW_W + 10 + i * 40;
            let extended = fingers.get(*finger);
            self.fill_rect(x, y, 34, 34, if extended { EXTENDED_BG } else { CURLED_BG });
            self.draw_border(x, y, 34, 34, 0xFF000000);
            let initial = &finger.name()[..1];
            self.draw_label_scaled(initial, x + 11, y + 6, 3, 0xFFFFFFFF);
            self.draw_label(if extended { "+" } else { "-" }, x + 15, y + 25, 0xFFFFFFFF);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x+w).min(WIN_W) {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..(y+h).min(WIN_H) {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    /// Two-pixel-wide line, clipped to the camera view.
    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), color: u32) {
        for (x, y) in line_points(from, to) {
            if x < VIEW_W && y < VIEW_H {
                self.set_pixel(x, y, color);
                self.set_pixel(x + 1, y, color);
            }
        }
    }

    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        self.draw_label_scaled(text, x, y, 1, color);
    }

    /// 3×5 bitmap font, each font pixel drawn as a `scale`×`scale` block.
    fn draw_label_scaled(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

/// Frame coordinates → view pixel, if inside the view.
fn to_view((x, y): (f32, f32)) -> Option<(usize, usize)> {
    if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
        return None;
    }
    let (px, py) = (x.round() as usize, y.round() as usize);
    (px < VIEW_W && py < VIEW_H).then_some((px, py))
}

/// Pixels along a segment (simple DDA).  Non-finite endpoints give nothing.
fn line_points(from: (f32, f32), to: (f32, f32)) -> Vec<(usize, usize)> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    if !(dx.is_finite() && dy.is_finite()) {
        return Vec::new();
    }
    let steps = dx.abs().max(dy.abs()).ceil().min(4096.0) as usize;
    (0..=steps)
        .filter_map(|i| {
            let t = if steps == 0 { 0.0 } else { i as f32 / steps as f32 };
            to_view((from.0 + dx * t, from.1 + dy * t))
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'a' => [0b000, 0b111, 0b001, 0b111, 0b111],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'm' => [0b000, 0b110, 0b111, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b111, 0b001, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '[' => [0b110, 0b100, 0b100, 0b100, 0b110],
        ']' => [0b011, 0b001, 0b001, 0b001, 0b011],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_clipping() {
        assert_eq!(to_view((10.2, 20.7)), Some((10, 21)));
        assert_eq!(to_view((-1.0, 5.0)), None);
        assert_eq!(to_view((VIEW_W as f32, 5.0)), None);
        assert_eq!(to_view((f32::NAN, 5.0)), None);
    }

    #[test]
    fn line_covers_both_ends() {
        let pts = line_points((0.0, 0.0), (10.0, 5.0));
        assert_eq!(pts.first(), Some(&(0, 0)));
        assert_eq!(pts.last(), Some(&(10, 5)));
        assert_eq!(pts.len(), 11);
    }

    #[test]
    fn degenerate_and_offscreen_lines() {
        assert_eq!(line_points((3.0, 3.0), (3.0, 3.0)), vec![(3, 3)]);
        assert!(line_points((-50.0, -50.0), (-10.0, -10.0)).is_empty());
        assert!(line_points((0.0, 0.0), (f32::INFINITY, 0.0)).is_empty());
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF102030, 0xFFFFFFFF, 0.0), 0xFF102030);
        assert_eq!(blend(0xFF102030, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
    }

    #[test]
    fn window_keys() {
        assert_eq!(window_key(Key::Escape), Some(WindowKey::Quit));
        assert_eq!(window_key(Key::Q), Some(WindowKey::Quit));
        assert_eq!(window_key(Key::RightBracket), Some(WindowKey::Instrument(1)));
        assert_eq!(window_key(Key::LeftBracket), Some(WindowKey::Instrument(-1)));
        assert_eq!(window_key(Key::Space), Some(WindowKey::Mute));
        assert_eq!(window_key(Key::Key1), None);
        assert_eq!(window_key(Key::H), None);
    }

    #[test]
    fn chord_symbols_have_glyphs() {
        let fallback = char_glyph('\u{1}');
        for label in ChordLabel::ALL {
            for c in label.symbol().chars().chain(label.as_str().chars()) {
                assert_ne!(char_glyph(c), fallback, "{c}");
            }
        }
    }
}
