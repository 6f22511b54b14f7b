//! Brute-force hunt for a compact bitwise formula reproducing the A-law
//! decoding table.
//!
//! The target maps a byte `i` to the LPCM sample of the A-law code
//! `(i - 128) ^ 0x55`. The atom set is bitwise machinery a decoder could
//! plausibly be built from: the input byte, power-of-two constants, NOT,
//! BITCOUNT, AND, OR, XOR and shifts.
//!
//! Run with: `cargo run --release --bin alaw -- --depth 3 --save alaw.json`
//!
//! The search state is saved after every status report, so an interrupted
//! run resumes from the last report.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use color_eyre::eyre::WrapErr;
use log::info;

use symsynth::atom::{AtomLibrary, BinaryAtom, NullaryAtom, UnaryAtom};
use symsynth::search::{SearchTask, Settings};
use symsynth::target::TableTarget;

/// A-law code (after the `^ 0x55` toggle) to 16-bit LPCM sample.
#[rustfmt::skip]
const ALAW_TO_LPCM: [i16; 256] = [
    -5504,  -5248,  -6016,  -5760,  -4480,  -4224,  -4992,  -4736,
    -7552,  -7296,  -8064,  -7808,  -6528,  -6272,  -7040,  -6784,
    -2752,  -2624,  -3008,  -2880,  -2240,  -2112,  -2496,  -2368,
    -3776,  -3648,  -4032,  -3904,  -3264,  -3136,  -3520,  -3392,
    -22016, -20992, -24064, -23040, -17920, -16896, -19968, -18944,
    -30208, -29184, -32256, -31232, -26112, -25088, -28160, -27136,
    -11008, -10496, -12032, -11520, -8960,  -8448,  -9984,  -9472,
    -15104, -14592, -16128, -15616, -13056, -12544, -14080, -13568,
    -344,   -328,   -376,   -360,   -280,   -264,   -312,   -296,
    -472,   -456,   -504,   -488,   -408,   -392,   -440,   -424,
    -88,    -72,    -120,   -104,   -24,    -8,     -56,    -40,
    -216,   -200,   -248,   -232,   -152,   -136,   -184,   -168,
    -1376,  -1312,  -1504,  -1440,  -1120,  -1056,  -1248,  -1184,
    -1888,  -1824,  -2016,  -1952,  -1632,  -1568,  -1760,  -1696,
    -688,   -656,   -752,   -720,   -560,   -528,   -624,   -592,
    -944,   -912,   -1008,  -976,   -816,   -784,   -880,   -848,
    5504,   5248,   6016,   5760,   4480,   4224,   4992,   4736,
    7552,   7296,   8064,   7808,   6528,   6272,   7040,   6784,
    2752,   2624,   3008,   2880,   2240,   2112,   2496,   2368,
    3776,   3648,   4032,   3904,   3264,   3136,   3520,   3392,
    22016,  20992,  24064,  23040,  17920,  16896,  19968,  18944,
    30208,  29184,  32256,  31232,  26112,  25088,  28160,  27136,
    11008,  10496,  12032,  11520,  8960,   8448,   9984,   9472,
    15104,  14592,  16128,  15616,  13056,  12544,  14080,  13568,
    344,    328,    376,    360,    280,    264,    312,    296,
    472,    456,    504,    488,    408,    392,    440,    424,
    88,     72,     120,    104,    24,     8,      56,     40,
    216,    200,    248,    232,    152,    136,    184,    168,
    1376,   1312,   1504,   1440,   1120,   1056,   1248,   1184,
    1888,   1824,   2016,   1952,   1632,   1568,   1760,   1696,
    688,    656,    752,    720,    560,    528,    624,    592,
    944,    912,    1008,   976,    816,    784,    880,    848,
];

const WIDTH: usize = 256;

#[derive(Parser)]
#[command(name = "alaw")]
#[command(about = "Search for a bitwise formula reproducing the A-law decoding table")]
struct Args {
    /// Maximum depth of enumerated expression trees
    #[arg(short, long, default_value = "3")]
    depth: usize,

    /// How many best candidates to keep
    #[arg(short, long, default_value = "32")]
    best: usize,

    /// Load/save the search state from/to this file
    #[arg(short, long)]
    save: Option<PathBuf>,

    /// Seconds between status reports (each report also saves the state)
    #[arg(short, long, default_value = "10")]
    interval: u64,

    /// Stop after this many seconds; 0 runs until the space is exhausted
    #[arg(short, long, default_value = "0")]
    limit: u64,
}

fn shift_amount(raw: i16) -> u32 {
    // Shift counts are masked to the value width, so any operand is a legal
    // (if useless) amount.
    u32::from(raw as u16) & 15
}

fn build_atoms() -> AtomLibrary<i16> {
    let mut atoms = AtomLibrary::new(WIDTH);

    atoms.add_nullary(NullaryAtom::table("X", (0..WIDTH).map(|i| i as i16).collect()));
    for bit in 0..16u32 {
        let value = (1i32 << bit) as i16;
        atoms.add_nullary(NullaryAtom::constant(value.to_string(), value, WIDTH));
    }

    atoms.add_unary(UnaryAtom::new("NOT", true, false, |xs: &[i16]| {
        xs.iter().map(|x| !x).collect()
    }));
    atoms.add_unary(UnaryAtom::new("BITCOUNT", false, false, |xs: &[i16]| {
        xs.iter().map(|x| (*x as u16).count_ones() as i16).collect()
    }));

    atoms.add_binary(BinaryAtom::new("AND", true, true, |a: &[i16], b: &[i16]| {
        a.iter().zip(b).map(|(x, y)| x & y).collect()
    }));
    atoms.add_binary(BinaryAtom::new("OR", true, true, |a: &[i16], b: &[i16]| {
        a.iter().zip(b).map(|(x, y)| x | y).collect()
    }));
    // XOR of equal operands collapses to zero, so it prunes like the
    // idempotent atoms do.
    atoms.add_binary(BinaryAtom::new("XOR", true, true, |a: &[i16], b: &[i16]| {
        a.iter().zip(b).map(|(x, y)| x ^ y).collect()
    }));
    atoms.add_binary(BinaryAtom::new("SHR", false, false, |a: &[i16], b: &[i16]| {
        a.iter().zip(b).map(|(x, y)| x >> shift_amount(*y)).collect()
    }));
    atoms.add_binary(BinaryAtom::new("SHL", false, false, |a: &[i16], b: &[i16]| {
        a.iter()
            .zip(b)
            .map(|(x, y)| x.wrapping_shl(shift_amount(*y)))
            .collect()
    }));

    atoms
}

fn alaw_target() -> TableTarget<i16> {
    TableTarget::from_fn(WIDTH, |i| {
        let code = (i as u8).wrapping_sub(128) ^ 0x55;
        ALAW_TO_LPCM[code as usize]
    })
}

fn save_state(task: &SearchTask<i16>, path: &PathBuf) -> color_eyre::Result<()> {
    let json = task.to_json()?;
    std::fs::write(path, json).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let args = Args::parse();

    let settings = Settings {
        max_depth: args.depth,
        max_best: args.best,
        save_path: args.save.clone(),
        ..Settings::default()
    };
    let atoms = Arc::new(build_atoms());
    info!(
        "searching depth <= {} over {}+{}+{} atoms, keeping the {} best",
        args.depth,
        atoms.nullary_len(),
        atoms.unary_len(),
        atoms.binary_len(),
        args.best
    );
    let mut task = SearchTask::new(settings, atoms, Arc::new(alaw_target()));

    if let Some(path) = &args.save {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                task.from_json(&text)
                    .wrap_err_with(|| format!("failed to load state from {}", path.display()))?;
                info!("resumed search from {}", path.display());
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("no saved state at {}, starting fresh", path.display());
            }
            Err(err) => {
                return Err(err)
                    .wrap_err_with(|| format!("failed to read {}", path.display()));
            }
        }
    }

    task.run();
    let started = Instant::now();
    loop {
        std::thread::sleep(Duration::from_secs(args.interval.max(1)));
        println!("{}", task.status());
        if let Some(path) = &args.save {
            save_state(&task, path)?;
        }
        if task.done() {
            info!("search completed: the whole space was enumerated");
            break;
        }
        if args.limit > 0 && started.elapsed() >= Duration::from_secs(args.limit) {
            info!("time limit reached");
            break;
        }
    }
    task.stop();

    if let Some(path) = &args.save {
        save_state(&task, path)?;
        info!("final state saved to {}", path.display());
    }
    println!("{}", task.status());

    Ok(())
}
