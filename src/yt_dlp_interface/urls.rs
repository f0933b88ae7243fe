use std::path::Path;

use crate::error::JobError;

/// Positional URLs first, then every non-blank line of `file` in order.
///
/// URLs are opaque here: no validation, no dedup. An empty result is not an error at this level.
pub fn collect_urls(cli_urls: &[String], file: Option<&Path>) -> Result<Vec<String>, JobError> {
    let mut urls = cli_urls.to_vec();
    if let Some(path) = file {
        if !path.is_file() {
            return Err(JobError::InputFileMissing(path.to_path_buf()));
        }
        let loaded = load_urls_from_file(path)?;
        log::debug!("Loaded {} URL(s) from {:?}", loaded.len(), path);
        urls.extend(loaded);
    }
    Ok(urls)
}

fn load_urls_from_file(path: &Path) -> Result<Vec<String>, JobError> {
    let contents = std::fs::read_to_string(path).map_err(|source| JobError::InputFileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
