use chrono::NaiveDateTime;
use collector_core::{CoreError, ErrorExt, PostRecord, StorageError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Lower-cases the query and replaces every non-alphanumeric character with
/// an underscore.
pub fn sanitize_query(query: &str) -> String {
    query
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

pub fn output_filename(query: &str, subreddit: &str, timestamp: &NaiveDateTime) -> String {
    format!(
        "{}_{}_{}.json",
        sanitize_query(query),
        subreddit,
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

/// Writes `posts` as a 2-space indented JSON array. Non-ASCII text is
/// written as-is.
pub fn save_to_json(posts: &[PostRecord], path: &Path) -> Result<(), CoreError> {
    info!("Saving {} posts to {}...", posts.len(), path.display());

    write_posts(posts, path).map_err(|e| {
        e.log_error();
        CoreError::Storage(e)
    })?;

    info!("Successfully saved data.");
    Ok(())
}

fn write_posts(posts: &[PostRecord], path: &Path) -> Result<(), StorageError> {
    let io_error = |source: std::io::Error| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, posts).map_err(|source| {
        if source.is_io() {
            io_error(source.into())
        } else {
            StorageError::Serialization {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    writer.flush().map_err(io_error)
}
