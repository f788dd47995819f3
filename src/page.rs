//! The served `index.html`: generated once, then only its modification time
//! changes. The embedded script polls that timestamp and reloads the page
//! when a rebuild touches it.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::config::PageConfig;

/// File name of the generated page inside the public directory.
pub const PAGE_FILE: &str = "index.html";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{title}}</title>
    <script>
        // Live reload: wasm-dev touches this file after every successful build.
        // The baseline is the first Last-Modified the server reports, so it has
        // the same whole-second resolution as every later value.
        let lastModified = null;
        async function checkForRebuild() {
            try {
                const response = await fetch('index.html', { method: 'HEAD', cache: 'no-store' });
                const modified = Date.parse(response.headers.get('Last-Modified'));
                if (Number.isNaN(modified)) {
                    return;
                }
                if (lastModified === null) {
                    lastModified = modified;
                } else if (modified > lastModified) {
                    lastModified = modified;
                    window.location.reload();
                }
            } catch (_) {
                // Server restarting; try again on the next tick.
            }
        }
        checkForRebuild();
        setInterval(checkForRebuild, 1000);
    </script>
</head>
<body>
    <script type="module">import init from "{{module}}"; init();</script>
</body>
</html>
"#;

pub fn page_path(public_dir: &Path) -> PathBuf {
    public_dir.join(PAGE_FILE)
}

pub fn render(page: &PageConfig) -> String {
    TEMPLATE
        .replace("{{title}}", &page.title)
        .replace("{{module}}", &page.module)
}

/// Write the page if it does not exist yet. An existing page is never
/// rewritten. Returns `true` if the file was created.
pub fn ensure_page(public_dir: &Path, page: &PageConfig) -> std::io::Result<bool> {
    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(page_path(public_dir))
    {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(err),
    };
    file.write_all(render(page).as_bytes())?;
    Ok(true)
}

/// Advance the modification time of `path` to signal a reload.
///
/// `Last-Modified` only has whole-second resolution, so the new time is at
/// least one second past the previous one even when two builds land in the
/// same second. Returns `false` without error if the file does not exist.
pub fn touch(path: &Path) -> std::io::Result<bool> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    let previous = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_mtime(path, next_mtime(previous, FileTime::now()))?;
    Ok(true)
}

fn next_mtime(previous: FileTime, now: FileTime) -> FileTime {
    let floor = FileTime::from_unix_time(previous.unix_seconds() + 1, 0);
    now.max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mtime(path: &Path) -> FileTime {
        FileTime::from_last_modification_time(&fs::metadata(path).unwrap())
    }

    #[test]
    fn creates_page_with_title_and_module() {
        let dir = tempfile::tempdir().unwrap();
        let page = PageConfig {
            title: "Pond".to_string(),
            module: "./pkg/pond.js".to_string(),
        };

        assert!(ensure_page(dir.path(), &page).unwrap());

        let html = fs::read_to_string(page_path(dir.path())).unwrap();
        assert!(html.contains("<title>Pond</title>"));
        assert!(html.contains(r#"import init from "./pkg/pond.js"; init();"#));
        assert!(html.contains("Last-Modified"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn reload_baseline_comes_from_the_server() {
        let html = render(&PageConfig::default());
        // A page-load clock baseline would miss a touch in the same second the
        // page loaded, since Last-Modified is truncated to whole seconds.
        assert!(!html.contains("Date.now()"));
        assert!(html.contains("let lastModified = null;"));
        assert!(html.contains("if (lastModified === null) {"));
        assert!(html.contains("setInterval(checkForRebuild, 1000);"));
    }

    #[test]
    fn existing_page_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(page_path(dir.path()), "<p>hand written</p>").unwrap();

        assert!(!ensure_page(dir.path(), &PageConfig::default()).unwrap());
        assert_eq!(
            fs::read_to_string(page_path(dir.path())).unwrap(),
            "<p>hand written</p>"
        );
    }

    #[test]
    fn touch_strictly_advances_whole_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let path = page_path(dir.path());
        fs::write(&path, "x").unwrap();

        let before = mtime(&path);
        assert!(touch(&path).unwrap());
        let first = mtime(&path);
        assert!(touch(&path).unwrap());
        let second = mtime(&path);

        assert!(first.unix_seconds() > before.unix_seconds());
        assert!(second.unix_seconds() > first.unix_seconds());
        assert_eq!(fs::read_to_string(&path).unwrap(), "x");
    }

    #[test]
    fn touch_missing_file_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = page_path(dir.path());
        assert!(!touch(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn next_mtime_prefers_now_when_later() {
        let previous = FileTime::from_unix_time(1_000, 500);
        let now = FileTime::from_unix_time(2_000, 0);
        assert_eq!(next_mtime(previous, now), now);
        assert_eq!(
            next_mtime(previous, FileTime::from_unix_time(1_000, 900)),
            FileTime::from_unix_time(1_001, 0)
        );
    }
}
