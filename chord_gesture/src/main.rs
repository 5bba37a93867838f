//! gesture_probe — classify recorded detector output, one JSON line per frame.
//!
//! ```text
//! gesture_probe session.jsonl
//! some_detector | gesture_probe --changes-only
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use chord_gesture::{
    resolve_chord, ChordLabel, FingerStates, GestureMemory, Hand, RawDetection, Thresholds,
    Transition, CHORD_TABLE,
};

#[derive(Parser, Debug)]
#[command(name = "gesture_probe", about = "Classify hand keypoints into chords")]
struct Args {
    /// JSON-lines file of detector output; stdin when omitted.
    input: Option<PathBuf>,

    /// Print only frames that emit a chord event.
    #[arg(long)]
    changes_only: bool,

    /// Print the pose → chord table and exit.
    #[arg(long)]
    table: bool,

    /// Minimum keypoint confidence.
    #[arg(long, default_value_t = chord_gesture::keypoint::MIN_KEYPOINT_CONFIDENCE)]
    min_confidence: f32,

    /// Interior angle (rad) above which a finger counts as extended.
    #[arg(long, default_value_t = chord_gesture::finger::FINGER_EXTENDED_RAD)]
    finger_rad: f32,

    /// Thumb deviation from horizontal (rad) above which it counts as extended.
    #[arg(long, default_value_t = chord_gesture::finger::THUMB_EXTENDED_RAD)]
    thumb_rad: f32,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.table {
        print_table();
        return Ok(());
    }

    let thresholds = Thresholds {
        min_keypoint_confidence: args.min_confidence,
        finger_extended_rad:     args.finger_rad,
        thumb_extended_rad:      args.thumb_rad,
    };

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut probe = Probe::new(thresholds);

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.context("reading input")?;
        let frame = lineno + 1;

        match probe.read(&line) {
            Reading::Blank => {}
            Reading::Bad(reason) => eprintln!("  {frame:>5}  ⚠  {reason}"),
            Reading::NoHand => {
                if !args.changes_only {
                    println!("  {frame:>5}  (no hand)");
                }
            }
            Reading::Hand { fingers, chord, transition } => {
                if args.changes_only && transition.emitted().is_none() {
                    continue;
                }
                let label = chord.map_or("—", |c| c.as_str());
                let mark = match transition {
                    Transition::Emit(_)   => "♪",
                    Transition::Held(_)   => "·",
                    Transition::Unmatched => " ",
                };
                println!("  {frame:>5}  {fingers}  {mark} {label}");
            }
        }
    }

    println!();
    println!("  {} frames, {} chord events", probe.frames, probe.events);
    Ok(())
}

/// What one input line amounted to.
#[derive(Debug, PartialEq)]
enum Reading {
    Blank,
    Bad(String),
    NoHand,
    Hand {
        fingers:    FingerStates,
        chord:      Option<ChordLabel>,
        transition: Transition,
    },
}

/// Classifies lines in order, debouncing across them.  Only lines that
/// decode as detector output count as frames.
struct Probe {
    thresholds: Thresholds,
    memory:     GestureMemory,
    frames:     usize,
    events:     usize,
}

impl Probe {
    fn new(thresholds: Thresholds) -> Self {
        Probe { thresholds, memory: GestureMemory::default(), frames: 0, events: 0 }
    }

    fn read(&mut self, line: &str) -> Reading {
        if line.trim().is_empty() {
            return Reading::Blank;
        }
        let detection = match RawDetection::from_json(line) {
            Ok(d) => d,
            Err(e) => return Reading::Bad(format!("bad line: {e}")),
        };
        self.frames += 1;

        let Some(raw) = detection.hands.first() else {
            return Reading::NoHand;
        };
        let hand = match Hand::from_raw(raw) {
            Ok(h) => h,
            Err(e) => return Reading::Bad(e.to_string()),
        };

        let fingers = FingerStates::from_hand(&hand, &self.thresholds);
        let chord = resolve_chord(&fingers);
        let transition = self.memory.observe(chord);
        if transition.emitted().is_some() {
            self.events += 1;
        }
        Reading::Hand { fingers, chord, transition }
    }
}

fn print_table() {
    println!();
    println!("  T I M R P   chord");
    println!("  ─────────   ───────");
    for (pose, label) in CHORD_TABLE.iter() {
        let flags: String = pose.as_array()
            .iter()
            .map(|&e| if e { "+ " } else { "- " })
            .collect();
        println!("  {flags}  {label}");
    }
    println!();
}
