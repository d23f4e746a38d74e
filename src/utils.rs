//! Utility functions for working with files.

use crate::error::Error;

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::{env, process};

use flate2::read::MultiGzDecoder;

//-----------------------------------------------------------------------------

/// Returns the full file name for a specific test file.
pub fn get_test_data(filename: &'static str) -> PathBuf {
    let mut buf = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    buf.push("test-data");
    buf.push(filename);
    buf
}

static TEMP_FILE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Returns a name for a temporary file that is unique within the process.
///
/// The file is placed in the system temporary directory and the caller is
/// responsible for removing it.
pub fn temp_file_name(name_part: &str) -> PathBuf {
    let count = TEMP_FILE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let mut buf = env::temp_dir();
    buf.push(format!("{}_{}_{}", name_part, process::id(), count));
    buf
}

//-----------------------------------------------------------------------------

// Utilities for working with files.

const SIZE_UNITS: [(f64, &str); 6] = [
    (1.0, "B"),
    (1024.0, "KiB"),
    (1024.0 * 1024.0, "MiB"),
    (1024.0 * 1024.0 * 1024.0, "GiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0, "TiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0, "PiB"),
];

/// Returns a human-readable representation of the given number of bytes.
pub fn human_readable_size(bytes: usize) -> String {
    let mut unit = 0;
    let value = bytes as f64;
    while unit + 1 < SIZE_UNITS.len() && value >= SIZE_UNITS[unit + 1].0 {
        unit += 1;
    }
    format!("{:.3} {}", value / SIZE_UNITS[unit].0, SIZE_UNITS[unit].1)
}

/// Returns a human-readable size of the file.
pub fn file_size<P: AsRef<Path>>(filename: P) -> Option<String> {
    let metadata = fs::metadata(filename).ok()?;
    Some(human_readable_size(metadata.len() as usize))
}

/// Returns `true` if the file exists.
pub fn file_exists<P: AsRef<Path>>(filename: P) -> bool {
    fs::metadata(filename).is_ok()
}

/// Returns `true` if the file appears to be gzip-compressed.
pub fn is_gzipped<P: AsRef<Path>>(filename: P) -> bool {
    let file = File::open(filename).ok();
    if file.is_none() {
        return false;
    }
    let mut reader = BufReader::new(file.unwrap());
    let mut magic = [0; 2];
    let len = reader.read(&mut magic).ok();
    len == Some(2) && magic == [0x1F, 0x8B]
}

/// Returns a buffered reader for the file, which may be gzip-compressed.
pub fn open_file<P: AsRef<Path>>(filename: P) -> Result<Box<dyn BufRead>, Error> {
    let file = File::open(&filename)?;
    let inner = BufReader::new(file);
    if is_gzipped(&filename) {
        let inner = MultiGzDecoder::new(inner);
        Ok(Box::new(BufReader::new(inner)))
    } else {
        Ok(Box::new(inner))
    }
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
