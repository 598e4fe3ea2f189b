//! Seed directory writer: persists admitted seeds to disk using the
//! `id:<6-digit>,src:<parent-id>,op:<mutation-op>,pos:<position>`
//! filename scheme (spec.md section 6), grounded on
//! `index_builder::core::build_index`'s pattern of writing one output
//! file per logical record with a retry loop around transient I/O.

use crate::error::SchedulerError;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

const MAX_RETRIES: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(10);

pub struct SeedFileName<'a> {
    pub id: u32,
    pub src: u32,
    pub op: &'a str,
    pub pos: u32,
}

impl<'a> SeedFileName<'a> {
    pub fn render(&self) -> String {
        format!("id:{:06},src:{:06},op:{},pos:{:06}", self.id, self.src, self.op, self.pos)
    }
}

/// Writes `bytes` under `dir` using the seed naming scheme, retrying
/// transient I/O errors up to [`MAX_RETRIES`] times with a fixed
/// backoff. A seed that still can't be written is skipped with a
/// warning rather than aborting the run (spec.md section 7).
pub fn write_seed(dir: &Path, name: &SeedFileName, bytes: &[u8]) -> Result<PathBuf, SchedulerError> {
    let path = dir.join(name.render());
    let mut attempt = 0;
    loop {
        match fs::write(&path, bytes) {
            Ok(()) => return Ok(path),
            Err(source) if attempt < MAX_RETRIES => {
                attempt += 1;
                log::warn!("seed write to {:?} failed (attempt {attempt}/{MAX_RETRIES}): {source}", path);
                thread::sleep(RETRY_BACKOFF);
            }
            Err(source) => {
                log::warn!("giving up writing seed {:?} after {MAX_RETRIES} retries: {source}", path);
                return Err(SchedulerError::Io {
                    source,
                    retries: attempt,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_follows_the_documented_scheme() {
        let name = SeedFileName {
            id: 12,
            src: 3,
            op: "havoc",
            pos: 7,
        };
        assert_eq!(name.render(), "id:000012,src:000003,op:havoc,pos:000007");
    }

    #[test]
    fn write_seed_creates_a_file_with_the_given_bytes() {
        let dir = std::env::temp_dir().join(format!("dafl_seed_dir_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let name = SeedFileName {
            id: 1,
            src: 0,
            op: "init",
            pos: 0,
        };
        let path = write_seed(&dir, &name, b"hello").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");
        fs::remove_dir_all(&dir).unwrap();
    }
}
