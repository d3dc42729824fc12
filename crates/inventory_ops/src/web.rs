use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAsset {
    pub key: String,
    pub path: PathBuf,
    pub content_type: &'static str,
}

pub const INDEX_PAGE: &str = "index.html";

pub fn content_type_for(key: &str) -> &'static str {
    if key.ends_with(".html") {
        "text/html; charset=utf-8"
    } else if key.ends_with(".css") {
        "text/css; charset=utf-8"
    } else if key.ends_with(".js") {
        "application/javascript; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}

/// Lists every file under `root`, keyed by its `/`-separated relative path
/// and sorted by key.
pub fn collect_web_assets(root: &Path) -> Result<Vec<WebAsset>, String> {
    if !root.is_dir() {
        return Err(format!("web directory not found: {}", root.display()));
    }
    // index.html is the presigned entry point.
    if !root.join(INDEX_PAGE).is_file() {
        return Err(format!("{INDEX_PAGE} missing from {}", root.display()));
    }

    let mut files = Vec::new();
    collect_files(root, &mut files)?;

    let mut assets = files
        .into_iter()
        .map(|path| {
            let relative = path.strip_prefix(root).map_err(|error| {
                format!("failed to relativise {}: {error}", path.display())
            })?;
            let key = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            Ok(WebAsset {
                content_type: content_type_for(&key),
                key,
                path,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    assets.sort_by(|left, right| left.key.cmp(&right.key));
    Ok(assets)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), String> {
    let entries = fs::read_dir(dir)
        .map_err(|error| format!("failed to read {}: {error}", dir.display()))?;

    for entry in entries {
        let path = entry
            .map_err(|error| format!("failed to read entry in {}: {error}", dir.display()))?
            .path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_content_type_by_extension() {
        assert_eq!(content_type_for("index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("css/site.css"), "text/css; charset=utf-8");
        assert_eq!(content_type_for("app.js"), "application/javascript; charset=utf-8");
        assert_eq!(content_type_for("logo.png"), "application/octet-stream");
    }

    #[test]
    fn collects_nested_files_with_slash_keys() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("index.html"), "<html></html>").expect("write index");
        fs::create_dir_all(dir.path().join("assets")).expect("create assets");
        fs::write(dir.path().join("assets").join("app.js"), "console.log(1)").expect("write js");

        let assets = collect_web_assets(dir.path()).expect("assets should collect");
        let keys: Vec<&str> = assets.iter().map(|asset| asset.key.as_str()).collect();

        assert_eq!(keys, vec!["assets/app.js", "index.html"]);
        assert_eq!(assets[0].content_type, "application/javascript; charset=utf-8");
    }

    #[test]
    fn directory_without_index_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("app.js"), "load()").expect("write js");

        let error = collect_web_assets(dir.path()).expect_err("missing index");
        assert!(error.starts_with("index.html missing from"));
    }

    #[test]
    fn shipped_page_does_not_load_sibling_files() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../web");
        let page = fs::read_to_string(root.join(INDEX_PAGE)).expect("read shipped index.html");

        // Sibling objects in the web bucket are private and unsigned.
        assert!(!page.contains("src=\""));
        assert!(!page.contains("rel=\"stylesheet\""));
        assert!(page.contains("location.hash"));
        assert_eq!(
            collect_web_assets(&root)
                .expect("shipped web dir")
                .iter()
                .map(|asset| asset.key.as_str())
                .collect::<Vec<_>>(),
            vec![INDEX_PAGE]
        );
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = collect_web_assets(&dir.path().join("web")).expect_err("missing dir");
        assert!(error.starts_with("web directory not found"));
    }
}
