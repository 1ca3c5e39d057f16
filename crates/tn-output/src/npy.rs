//! NumPy `.npy` encoding of the distance matrix.
//!
//! Layout written (format version 1.0):
//!
//! ```text
//! \x93NUMPY 0x01 0x00 <u16 LE header_len> {'descr': '<f8', 'fortran_order': False, 'shape': (N, N), } ␠…␠\n
//! <N·N little-endian f64, row-major>
//! ```
//!
//! The header is space-padded so the data starts on a 64-byte boundary.
//! Unreachable cells are IEEE `+inf`, which `numpy.load` reads back as
//! `inf`.  The reader accepts versions 1.0 and 2.0 with a `<f8`, C-order,
//! square shape, i.e. anything `numpy.save` produces for such a matrix.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::info;

use tn_graph::DistanceMatrix;

use crate::{OutputError, OutputResult};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGN: usize = 64;

// ── Writing ───────────────────────────────────────────────────────────────────

/// Write `matrix` to `path`, replacing any existing file.
pub fn write_matrix_npy(path: &Path, matrix: &DistanceMatrix) -> OutputResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let mut w = BufWriter::new(File::create(path)?);
    write_npy(&mut w, matrix)?;
    w.flush()?;
    info!("wrote {}×{} matrix to {}", matrix.dim(), matrix.dim(), path.display());
    Ok(())
}

/// Encode `matrix` into any `Write` sink.
pub fn write_npy<W: Write>(w: &mut W, matrix: &DistanceMatrix) -> OutputResult<()> {
    let n = matrix.dim();
    let mut header = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': ({n}, {n}), }}");
    // magic + version + u16 length + header + '\n'
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    let padding = (ALIGN - unpadded % ALIGN) % ALIGN;
    header.extend(std::iter::repeat_n(' ', padding));
    header.push('\n');

    let header_len = u16::try_from(header.len())
        .map_err(|_| OutputError::Npy(format!("header of {} bytes is too long", header.len())))?;

    w.write_all(MAGIC)?;
    w.write_all(&[1, 0])?;
    w.write_all(&header_len.to_le_bytes())?;
    w.write_all(header.as_bytes())?;
    for v in matrix.as_slice() {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// Read a matrix written by [`write_matrix_npy`] (or `numpy.save`).
pub fn read_matrix_npy(path: &Path) -> OutputResult<DistanceMatrix> {
    read_npy(BufReader::new(File::open(path)?))
}

/// Decode a matrix from any `Read` source.
pub fn read_npy<R: Read>(mut r: R) -> OutputResult<DistanceMatrix> {
    let mut preamble = [0u8; 8];
    r.read_exact(&mut preamble)?;
    if &preamble[..6] != MAGIC {
        return Err(OutputError::Npy("missing \\x93NUMPY magic".into()));
    }

    let header_len = match preamble[6] {
        1 => {
            let mut len = [0u8; 2];
            r.read_exact(&mut len)?;
            u16::from_le_bytes(len) as usize
        }
        2 | 3 => {
            let mut len = [0u8; 4];
            r.read_exact(&mut len)?;
            u32::from_le_bytes(len) as usize
        }
        v => return Err(OutputError::Npy(format!("unsupported format version {v}"))),
    };

    let mut header = vec![0u8; header_len];
    r.read_exact(&mut header)?;
    let header = String::from_utf8(header).map_err(|_| OutputError::Npy("header is not UTF-8".into()))?;
    let dim = parse_header(&header)?;

    let cells = dim
        .checked_mul(dim)
        .ok_or_else(|| OutputError::Npy(format!("shape ({dim}, {dim}) overflows")))?;
    let mut bytes = vec![0u8; cells * 8];
    r.read_exact(&mut bytes)?;
    let data: Vec<f64> = bytes
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect();

    DistanceMatrix::from_row_major(dim, data)
        .ok_or_else(|| OutputError::Npy("data length does not match shape".into()))
}

/// Check the header dict and return the (square) dimension.
fn parse_header(header: &str) -> OutputResult<usize> {
    let descr = dict_value(header, "descr")?;
    if descr.trim_matches(|c| c == '\'' || c == '"') != "<f8" {
        return Err(OutputError::Npy(format!("dtype {descr} is not '<f8'")));
    }
    if dict_value(header, "fortran_order")? != "False" {
        return Err(OutputError::Npy("Fortran-order arrays are not supported".into()));
    }

    let shape = dict_value(header, "shape")?;
    let dims: Vec<usize> = shape
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|_| OutputError::Npy(format!("unreadable shape {shape}")))?;

    match dims.as_slice() {
        [rows, cols] if rows == cols => Ok(*rows),
        _ => Err(OutputError::Npy(format!("shape {shape} is not a square matrix"))),
    }
}

/// Raw text of the value stored under `key` in a Python dict literal.
fn dict_value<'a>(header: &'a str, key: &str) -> OutputResult<&'a str> {
    let missing = || OutputError::Npy(format!("header has no '{key}' entry"));
    let start = header
        .find(&format!("'{key}'"))
        .or_else(|| header.find(&format!("\"{key}\"")))
        .ok_or_else(missing)?;
    let rest = &header[start + key.len() + 2..];
    let rest = rest.trim_start().strip_prefix(':').ok_or_else(missing)?.trim_start();

    let end = if rest.starts_with('(') {
        rest.find(')').map(|i| i + 1)
    } else {
        rest.find([',', '}'])
    }
    .ok_or_else(missing)?;
    Ok(rest[..end].trim())
}
