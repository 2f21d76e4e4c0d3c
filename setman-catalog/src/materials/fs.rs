//! Filesystem helpers for materials
//!
//! All failures are reported with the file-error codes of the catalog
//! taxonomy rather than raw `io::Error`s.

use base64::{engine::general_purpose, Engine as _};
use setman_common::{Code, Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use walkdir::WalkDir;

/// Sniff the first bytes of a file for a known image signature
pub fn is_image(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Err(Error::with_message(
            Code::FileDoesntExist,
            format!("{} does not exist", path.display()),
        ));
    }
    if !path.is_file() {
        return Err(Error::with_message(
            Code::FileNotValid,
            format!("{} is not a regular file", path.display()),
        ));
    }

    let mut file = File::open(path).map_err(|e| {
        Error::with_message(Code::FileOpenFailed, format!("{}: {}", path.display(), e))
    })?;

    let mut header = [0u8; 32];
    let bytes_read = file.read(&mut header).map_err(|e| {
        Error::with_message(Code::FileReadFailed, format!("{}: {}", path.display(), e))
    })?;

    if bytes_read < 4 {
        return Ok(false);
    }

    Ok(infer::is_image(&header[..bytes_read]))
}

/// Lower-cased extension without the dot
pub fn file_extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
}

pub fn file_size_of(path: &Path) -> Result<u64> {
    if !path.exists() {
        return Err(Error::new(Code::FileDoesntExist));
    }
    let metadata = std::fs::metadata(path).map_err(|e| {
        Error::with_message(Code::FileSizeCountFailed, format!("{}: {}", path.display(), e))
    })?;
    Ok(metadata.len())
}

/// Size of a file, or the summed size of every file below a directory
pub fn disk_size_of(path: &Path) -> Result<u64> {
    if !path.exists() {
        return Err(Error::new(Code::FileDoesntExist));
    }
    if path.is_file() {
        return file_size_of(path);
    }

    let mut total = 0u64;
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry.map_err(|e| {
            Error::with_message(Code::FileSizeCountFailed, e.to_string())
        })?;
        if entry.file_type().is_file() {
            let metadata = entry.metadata().map_err(|e| {
                Error::with_message(Code::FileSizeCountFailed, e.to_string())
            })?;
            total += metadata.len();
        }
    }
    Ok(total)
}

pub fn file_to_bytes(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(Error::with_message(
            Code::FileDoesntExist,
            format!("{} is not a readable file", path.display()),
        ));
    }
    std::fs::read(path).map_err(|e| {
        Error::with_message(Code::FileReadFailed, format!("{}: {}", path.display(), e))
    })
}

pub fn bytes_to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

pub fn file_to_base64(path: &Path) -> Result<String> {
    Ok(bytes_to_base64(&file_to_bytes(path)?))
}

/// Check a path exists, can be opened, and (optionally) is not read-only
pub fn check_if_valid(path: &Path, write_permission_required: bool) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|_| {
        Error::with_message(
            Code::FileDoesntExist,
            format!("{} does not exist", path.display()),
        )
    })?;

    if metadata.is_file() {
        File::open(path).map_err(|e| {
            Error::with_message(Code::FileOpenFailed, format!("{}: {}", path.display(), e))
        })?;
    } else if metadata.is_dir() {
        std::fs::read_dir(path).map_err(|e| {
            Error::with_message(Code::FolderOpenFailed, format!("{}: {}", path.display(), e))
        })?;
    } else {
        return Err(Error::new(Code::FileNotValid));
    }

    if write_permission_required && metadata.permissions().readonly() {
        return Err(Error::with_message(
            Code::FileNotValid,
            format!("{} is read-only", path.display()),
        ));
    }

    Ok(())
}
