use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_DB_URL: &str = "sqlite://recall.sqlite3";

#[derive(Debug, Error)]
pub enum DbUrlError {
    #[error("invalid database url: {raw}")]
    Invalid { raw: String },
    #[error("cannot create database file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn is_memory(url: &str) -> bool {
    url == "sqlite::memory:" || url.contains("mode=memory")
}

/// Turn a path or relative `sqlite:` url into `sqlite://<absolute path>`.
pub fn normalize(raw: &str) -> Result<String, DbUrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DbUrlError::Invalid { raw: raw.into() });
    }
    if is_memory(trimmed) {
        return Ok(trimmed.to_string());
    }

    let without_scheme = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let (path_str, query) = match without_scheme.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_scheme, None),
    };
    if path_str.is_empty() {
        return Err(DbUrlError::Invalid { raw: raw.into() });
    }

    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    Ok(match query {
        Some(query) => format!("sqlite://{}?{query}", absolute.display()),
        None => format!("sqlite://{}", absolute.display()),
    })
}

/// Create the database file and its parent directories if missing.
pub fn prepare_file(db_url: &str) -> Result<(), DbUrlError> {
    if is_memory(db_url) {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| DbUrlError::Invalid {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(DbUrlError::Invalid {
            raw: db_url.to_string(),
        });
    }

    let path = Path::new(path);
    let create_err = |source| DbUrlError::Create {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(create_err)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(create_err)?;
        log::info!("created database file {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_become_absolute() {
        let url = normalize("data/recall.sqlite3").unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(
            url,
            format!("sqlite://{}", cwd.join("data/recall.sqlite3").display())
        );
        assert_eq!(normalize(DEFAULT_DB_URL).unwrap(), normalize("recall.sqlite3").unwrap());
    }

    #[test]
    fn absolute_and_memory_urls_are_kept() {
        assert_eq!(
            normalize("sqlite:///tmp/r.sqlite3?mode=rwc").unwrap(),
            "sqlite:///tmp/r.sqlite3?mode=rwc"
        );
        assert_eq!(normalize("sqlite::memory:").unwrap(), "sqlite::memory:");
        assert!(matches!(normalize("  "), Err(DbUrlError::Invalid { .. })));
        assert!(matches!(normalize("sqlite:"), Err(DbUrlError::Invalid { .. })));
    }

    #[test]
    fn prepare_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested/deeper/recall.sqlite3");
        let url = format!("sqlite://{}", file.display());

        prepare_file(&url).unwrap();
        assert!(file.exists());
        // Second call leaves the existing file alone.
        prepare_file(&url).unwrap();

        assert!(matches!(
            prepare_file("postgres://nope"),
            Err(DbUrlError::Invalid { .. })
        ));
    }
}
