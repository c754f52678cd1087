//! Binary trace of a played game.
//!
//! Layout (little-endian):
//! - header: magic `A2G1`, version, endianness, board size (u8), steps (u32),
//!   start unix seconds (u64), elapsed seconds (f32), score (u64),
//!   highest tile (u32), engine label length (u16)
//! - engine label bytes
//! - `steps + 1` boards, `size * size` u32 cells each, row-major
//! - `steps` move codes, one byte each
//! - CRC32C of everything above

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::engine::{Board, EngineError, Move};
use crate::game::GameSummary;

const MAGIC: &[u8; 4] = b"A2G1";
const VERSION: u8 = 1;
const ENDIAN_LE: u8 = 0;
// magic + version + endian + size + steps + start + elapsed + score + highest tile + engine_len
const HEADER_LEN: usize = 4 + 1 + 1 + 1 + 4 + 8 + 4 + 8 + 4 + 2;
const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub size: u8,
    pub steps: u32,
    pub start_unix_s: u64,
    pub elapsed_s: f32,
    pub score: u64,
    pub highest_tile: u32,
    pub engine_str: Option<String>,
}

impl Meta {
    /// Metadata describing a finished game. Boards wider than 255 cells do not fit the header.
    pub fn from_summary(summary: &GameSummary, engine_str: Option<String>) -> Result<Self, TraceError> {
        let size = summary.states.first().map_or(0, |b| b.size());
        let size = u8::try_from(size).map_err(|_| TraceError::BoardTooLarge(size))?;
        Ok(Meta {
            size,
            steps: summary.steps,
            start_unix_s: summary.start_unix_s,
            elapsed_s: summary.elapsed_s as f32,
            score: summary.score,
            highest_tile: summary.highest_tile,
            engine_str,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub meta: Meta,
    pub states: Vec<Board>, // length = steps + 1
    pub moves: Vec<Move>,   // length = steps
}

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("unsupported endianness")]
    Endianness,
    #[error("file too short or malformed")]
    Malformed,
    #[error("checksum mismatch")]
    Checksum,
    #[error("invalid move code {0}")]
    BadMove(u8),
    #[error("invalid board: {0}")]
    Board(#[from] EngineError),
    #[error("board size {0} does not fit in a trace header")]
    BoardTooLarge(usize),
}

#[inline]
fn read_u16_le(bytes: &[u8]) -> Option<u16> {
    Some(u16::from_le_bytes(bytes.get(..2)?.try_into().ok()?))
}

#[inline]
fn read_u32_le(bytes: &[u8]) -> Option<u32> {
    Some(u32::from_le_bytes(bytes.get(..4)?.try_into().ok()?))
}

#[inline]
fn read_u64_le(bytes: &[u8]) -> Option<u64> {
    Some(u64::from_le_bytes(bytes.get(..8)?.try_into().ok()?))
}

#[inline]
fn read_f32_le(bytes: &[u8]) -> Option<f32> {
    read_u32_le(bytes).map(f32::from_bits)
}

/// Serialize a run. Fails with `Malformed` if the lengths or board sizes disagree with `meta`.
pub fn encode_run(meta: &Meta, states: &[Board], moves: &[Move]) -> Result<Vec<u8>, TraceError> {
    let size = meta.size as usize;
    if size == 0
        || states.len() != meta.steps as usize + 1
        || moves.len() != meta.steps as usize
        || states.iter().any(|b| b.size() != size)
    {
        return Err(TraceError::Malformed);
    }

    let engine_bytes = meta.engine_str.as_ref().map(|s| s.as_bytes()).unwrap_or(&[]);
    let engine_len: u16 = engine_bytes.len().try_into().map_err(|_| TraceError::Malformed)?;

    let states_len = states.len() * size * size * 4;
    let mut buf = Vec::with_capacity(HEADER_LEN + engine_bytes.len() + states_len + moves.len() + CHECKSUM_LEN);

    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.push(ENDIAN_LE);
    buf.push(meta.size);
    buf.extend_from_slice(&meta.steps.to_le_bytes());
    buf.extend_from_slice(&meta.start_unix_s.to_le_bytes());
    buf.extend_from_slice(&meta.elapsed_s.to_bits().to_le_bytes());
    buf.extend_from_slice(&meta.score.to_le_bytes());
    buf.extend_from_slice(&meta.highest_tile.to_le_bytes());
    buf.extend_from_slice(&engine_len.to_le_bytes());
    buf.extend_from_slice(engine_bytes);

    for board in states {
        for &v in board.cells() {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }
    buf.extend(moves.iter().map(|m| m.code()));

    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    Ok(buf)
}

pub fn write_run_to_path<P: AsRef<Path>>(path: P, meta: &Meta, states: &[Board], moves: &[Move]) -> Result<(), TraceError> {
    let data = encode_run(meta, states, moves)?;
    let mut f = fs::File::create(path)?;
    f.write_all(&data)?;
    Ok(())
}

/// Write a finished game to `path`.
pub fn write_summary_to_path<P: AsRef<Path>>(path: P, summary: &GameSummary, engine_str: Option<String>) -> Result<(), TraceError> {
    let meta = Meta::from_summary(summary, engine_str)?;
    write_run_to_path(path, &meta, &summary.states, &summary.moves)
}

pub fn parse_run_bytes(bytes: &[u8]) -> Result<Run, TraceError> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(TraceError::Malformed);
    }

    // Validate checksum first to avoid reading garbage fields
    let (content, trailer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let file_crc = read_u32_le(trailer).ok_or(TraceError::Malformed)?;
    if file_crc != crc32c::crc32c(content) {
        return Err(TraceError::Checksum);
    }

    if &content[..4] != MAGIC || content[4] != VERSION {
        return Err(TraceError::MagicOrVersion);
    }
    if content[5] != ENDIAN_LE {
        return Err(TraceError::Endianness);
    }

    let size = content[6];
    let mut off = 7;
    let steps = read_u32_le(&content[off..]).ok_or(TraceError::Malformed)?; off += 4;
    let start_unix_s = read_u64_le(&content[off..]).ok_or(TraceError::Malformed)?; off += 8;
    let elapsed_s = read_f32_le(&content[off..]).ok_or(TraceError::Malformed)?; off += 4;
    let score = read_u64_le(&content[off..]).ok_or(TraceError::Malformed)?; off += 8;
    let highest_tile = read_u32_le(&content[off..]).ok_or(TraceError::Malformed)?; off += 4;
    let engine_len = read_u16_le(&content[off..]).ok_or(TraceError::Malformed)? as usize; off += 2;

    let engine_bytes = content.get(off..off + engine_len).ok_or(TraceError::Malformed)?;
    off += engine_len;
    let engine_str = if engine_len > 0 {
        std::str::from_utf8(engine_bytes).ok().map(str::to_string)
    } else {
        None
    };

    let cells_per_board = (size as usize) * (size as usize);
    let states_count = steps as usize + 1;
    let states_len = states_count
        .checked_mul(cells_per_board * 4)
        .ok_or(TraceError::Malformed)?;
    let moves_len = steps as usize;
    if size == 0 || content.len() != off + states_len + moves_len {
        return Err(TraceError::Malformed);
    }

    let mut states = Vec::with_capacity(states_count);
    for chunk in content[off..off + states_len].chunks_exact(cells_per_board * 4) {
        let cells = chunk
            .chunks_exact(4)
            .map(|c| read_u32_le(c).ok_or(TraceError::Malformed))
            .collect::<Result<Vec<u32>, _>>()?;
        states.push(Board::from_cells(size as usize, cells)?);
    }
    off += states_len;

    let moves = content[off..off + moves_len]
        .iter()
        .map(|&code| Move::from_code(code).ok_or(TraceError::BadMove(code)))
        .collect::<Result<Vec<Move>, _>>()?;

    let meta = Meta { size, steps, start_unix_s, elapsed_s, score, highest_tile, engine_str };
    Ok(Run { meta, states, moves })
}

pub fn parse_run_file<P: AsRef<Path>>(path: P) -> Result<Run, TraceError> {
    let data = fs::read(path)?;
    parse_run_bytes(&data)
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
