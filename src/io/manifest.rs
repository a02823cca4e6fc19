//! Sequence manifests: text files listing the frame files of a video, in order.
//!
//! Frame paths are separated by any whitespace, so both one path per line and multiple paths per
//! line are accepted. Paths are used as-is, relative paths resolve against the working directory.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use crate::errors::VqalignError;
use crate::io::open_reader;

pub fn parse_manifest<R: BufRead>(reader: R) -> io::Result<Vec<PathBuf>> {
    let mut frames = Vec::new();

    for line in reader.lines() {
        frames.extend(line?.split_whitespace().map(PathBuf::from));
    }

    Ok(frames)
}

pub fn load_manifest(path: &Path) -> Result<Vec<PathBuf>, VqalignError> {
    open_reader(path)
        .and_then(parse_manifest)
        .map_err(|source| VqalignError::SequenceLoad {
            path: path.to_path_buf(),
            source,
        })
}
