pub mod output;
pub mod walker;

pub use walker::FileWalker;

use crate::errors::SplitmapError;
use std::path::Path;
use std::time::Duration;

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 50;

fn is_transient_kind(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
    )
}

/// Run an I/O closure with bounded retries and exponential backoff for
/// transient failures. Anything non-transient fails immediately.
pub fn retry_transient<T>(
    path: &Path,
    mut op: impl FnMut() -> std::io::Result<T>,
) -> Result<T, SplitmapError> {
    let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if is_transient_kind(err.kind()) && attempt + 1 < RETRY_ATTEMPTS => {
                log::debug!(
                    "transient I/O failure at {} (attempt {}): {}",
                    path.display(),
                    attempt + 1,
                    err
                );
                std::thread::sleep(delay);
                delay *= 2;
                attempt += 1;
            }
            Err(err) => return Err(SplitmapError::io(path, err)),
        }
    }
}

pub fn read_to_string_retry(path: &Path) -> Result<String, SplitmapError> {
    retry_transient(path, || std::fs::read_to_string(path))
}

pub fn read_retry(path: &Path) -> Result<Vec<u8>, SplitmapError> {
    retry_transient(path, || std::fs::read(path))
}

pub fn write_retry(path: &Path, contents: &[u8]) -> Result<(), SplitmapError> {
    if let Some(parent) = path.parent() {
        retry_transient(parent, || std::fs::create_dir_all(parent))?;
    }
    retry_transient(path, || std::fs::write(path, contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn transient_errors_are_retried() {
        let failures = Cell::new(2);
        let result = retry_transient(Path::new("/tmp/x"), || {
            if failures.get() > 0 {
                failures.set(failures.get() - 1);
                Err(std::io::Error::new(
                    std::io::ErrorKind::Interrupted,
                    "interrupted",
                ))
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn permanent_errors_fail_immediately() {
        let calls = Cell::new(0);
        let result: Result<(), _> = retry_transient(Path::new("/tmp/x"), || {
            calls.set(calls.get() + 1);
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retries_are_bounded() {
        let calls = Cell::new(0);
        let result: Result<(), _> = retry_transient(Path::new("/tmp/x"), || {
            calls.set(calls.get() + 1);
            Err(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "blocked",
            ))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), RETRY_ATTEMPTS);
    }
}
