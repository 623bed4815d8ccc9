//! Entity locator
//!
//! Finds the entity a resolved location refers to: index files for directory
//! requests, extension fallbacks for extension-less misses.

use crate::config::SendOptions;
use crate::error::{SendError, StoreError};
use crate::http::ResolvedLocation;
use crate::logger;
use crate::store::{EntityMetadata, ResourceStore};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// A regular file ready to be served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub path: PathBuf,
    pub meta: EntityMetadata,
}

/// What the location turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    File(Entity),
    /// A directory reached without index resolution
    Directory(PathBuf),
}

/// Locate the entity for a resolved request location
///
/// `index_request` is true when the raw identifier ended with `/`; index
/// resolution then replaces the plain lookup.
pub async fn locate<S: ResourceStore + ?Sized>(
    store: &S,
    location: &ResolvedLocation,
    index_request: bool,
    options: &SendOptions,
) -> Result<Located, SendError> {
    if index_request && !options.index.is_empty() {
        return find_index(store, &location.path, &options.index)
            .await
            .map(Located::File);
    }

    match store.stat(&location.path).await {
        Ok(meta) if meta.is_dir => Ok(Located::Directory(location.path.clone())),
        // A regular file addressed like a directory
        Ok(_) if location.trailing_separator => Err(SendError::NotFound),
        Ok(meta) => Ok(Located::File(Entity {
            path: location.path.clone(),
            meta,
        })),
        Err(err) => {
            logger::log_stat_miss(&location.path);
            let try_extensions = matches!(err, StoreError::NotFound)
                && !location.trailing_separator
                && location.path.extension().is_none();
            if try_extensions {
                if let Some(entity) =
                    find_with_extension(store, &location.path, &options.extensions).await
                {
                    return Ok(Located::File(entity));
                }
            }
            Err(err.into())
        }
    }
}

/// First `<path>.<ext>` candidate that exists and is not a directory
async fn find_with_extension<S: ResourceStore + ?Sized>(
    store: &S,
    path: &Path,
    extensions: &[String],
) -> Option<Entity> {
    for ext in extensions {
        let candidate = with_suffix(path, ext);
        match store.stat(&candidate).await {
            Ok(meta) if !meta.is_dir => {
                return Some(Entity {
                    path: candidate,
                    meta,
                });
            }
            Ok(_) => {}
            Err(_) => logger::log_stat_miss(&candidate),
        }
    }
    None
}

/// First configured index file inside `dir` that is a regular file
async fn find_index<S: ResourceStore + ?Sized>(
    store: &S,
    dir: &Path,
    index: &[String],
) -> Result<Entity, SendError> {
    let mut last_error = None;
    for name in index {
        let candidate = dir.join(name);
        match store.stat(&candidate).await {
            Ok(meta) if !meta.is_dir => {
                return Ok(Entity {
                    path: candidate,
                    meta,
                })
            }
            Ok(_) => {}
            Err(err) => {
                logger::log_stat_miss(&candidate);
                last_error = Some(err);
            }
        }
    }
    Err(last_error.map_or(SendError::NotFound, SendError::from))
}

fn with_suffix(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
