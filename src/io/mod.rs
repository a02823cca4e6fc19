use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

pub mod frame;
pub mod manifest;
pub mod table;

pub use frame::load_frame;
pub use manifest::load_manifest;
pub use table::load_table;

pub fn is_gzipped(path: &Path) -> bool {
    path.file_name()
        .map(|v| v.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false)
}

/// Open a file for buffered reading, transparently decompressing it if its name ends in `.gz`
pub fn open_reader(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if is_gzipped(path) {
        Box::new(
            File::open(path)
                .map(MultiGzDecoder::new)
                .map(BufReader::new)?,
        )
    } else {
        Box::new(File::open(path).map(BufReader::new)?)
    };

    Ok(reader)
}

/// Read a whole, possibly gzipped, file into memory
pub fn read_all(path: &Path) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    open_reader(path)?.read_to_end(&mut data)?;

    Ok(data)
}
