//! Project discovery and batch conversion.
//!
//! Scans a mini-app directory for page units: each `*.wxml` file with its
//! sibling script (`.js`, then `.ts`) and `.json` config, plus the root
//! `app.js`/`app.json` pair. Units are converted in parallel; a failing unit
//! is reported and does not stop the others.

use log::warn;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, TransformError};
use crate::finalize::{transform_page, PageInput};
use crate::options::TransformOptions;

const MARKUP_EXT: &str = "wxml";
const SCRIPT_EXTS: [&str; 2] = ["js", "ts"];
const CONFIG_EXT: &str = "json";
const APP_STEM: &str = "app";
const SKIPPED_DIRS: [&str; 3] = ["node_modules", "miniprogram_npm", ".git"];

// ═══════════════════════════════════════════════════════════════════════════════
// DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSource {
    /// Path relative to the project root, without extension
    /// (`pages/index/index`).
    pub name: String,
    pub markup: Option<PathBuf>,
    pub script: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl PageSource {
    fn from_stem(root: &Path, stem: &Path, markup: Option<PathBuf>) -> Self {
        let script = SCRIPT_EXTS
            .iter()
            .map(|ext| stem.with_extension(ext))
            .find(|path| path.is_file());
        let config = Some(stem.with_extension(CONFIG_EXT)).filter(|path| path.is_file());
        let name = stem
            .strip_prefix(root)
            .unwrap_or(stem)
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Self {
            name,
            markup,
            script,
            config,
        }
    }

    /// Reads the unit's files.
    pub fn load(&self) -> Result<PageInput> {
        Ok(PageInput {
            path: self
                .markup
                .clone()
                .or_else(|| self.script.clone())
                .unwrap_or_else(|| PathBuf::from(&self.name)),
            wxml: read_optional(self.markup.as_deref())?,
            script: read_optional(self.script.as_deref())?,
            json: read_optional(self.config.as_deref())?,
        })
    }
}

fn read_optional(path: Option<&Path>) -> Result<Option<String>> {
    path.map(|path| {
        fs::read_to_string(path).map_err(|source| TransformError::Io {
            path: path.to_path_buf(),
            source,
        })
    })
    .transpose()
}

fn is_skipped(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// Every page unit under `root`, sorted by name. The app unit, when
/// present, comes first.
pub fn discover_pages(root: &Path) -> Result<Vec<PageSource>> {
    let metadata = fs::metadata(root).map_err(|source| TransformError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(TransformError::Io {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    let mut pages = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| !is_skipped(entry))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == MARKUP_EXT) {
            pages.push(PageSource::from_stem(
                root,
                &path.with_extension(""),
                Some(path.to_path_buf()),
            ));
        }
    }
    pages.sort_by(|a, b| a.name.cmp(&b.name));

    let app = PageSource::from_stem(root, &root.join(APP_STEM), None);
    if app.script.is_some() && !pages.iter().any(|page| page.name == APP_STEM) {
        pages.insert(0, app);
    }

    Ok(pages)
}

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH CONVERSION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFailure {
    pub code: String,
    pub message: String,
    /// 1-based line and column inside the script, when known.
    pub location: Option<(u32, u32)>,
    /// 1-based line inside the markup, for template errors.
    pub markup_line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReport {
    pub name: String,
    pub output: Option<String>,
    pub used_components: Vec<String>,
    pub error: Option<PageFailure>,
}

impl PageReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn convert(page: &PageSource, opts: &TransformOptions) -> PageReport {
    let input = match page.load() {
        Ok(input) => input,
        Err(e) => return failed(page, &e, None),
    };
    match transform_page(&input, opts) {
        Ok(output) => PageReport {
            name: page.name.clone(),
            output: Some(output.code),
            used_components: output.used_components,
            error: None,
        },
        Err(e) => failed(page, &e, input.script.as_deref()),
    }
}

fn failed(page: &PageSource, error: &TransformError, script: Option<&str>) -> PageReport {
    warn!("[{}] {}: {}", error.code(), page.name, error);
    PageReport {
        name: page.name.clone(),
        output: None,
        used_components: Vec::new(),
        error: Some(PageFailure {
            code: error.code().to_string(),
            message: error.to_string(),
            location: script.and_then(|source| error.location(source)),
            markup_line: error.markup_line(),
        }),
    }
}

/// Converts every unit under `root`. Reports follow discovery order.
pub fn transform_project(root: &Path, opts: &TransformOptions) -> Result<Vec<PageReport>> {
    let pages = discover_pages(root)?;
    Ok(pages.par_iter().map(|page| convert(page, opts)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "app.js", "App({ onLaunch() {} })");
        write(root, "app.json", r#"{ "pages": ["pages/index/index"] }"#);
        write(root, "pages/index/index.wxml", "<view>{{title}}</view>");
        write(root, "pages/index/index.js", "Page({ data: { title: 'hi' } })");
        write(root, "pages/index/index.json", r#"{ "navigationBarTitleText": "Home" }"#);
        write(root, "pages/about/about.wxml", "<text>about</text>");
        write(root, "node_modules/lib/x.wxml", "<view/>");
        dir
    }

    #[test]
    fn test_discover_pairs_siblings() {
        let dir = project();
        let pages = discover_pages(dir.path()).unwrap();
        let names: Vec<_> = pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["app", "pages/about/about", "pages/index/index"]);

        assert!(pages[0].markup.is_none());
        assert!(pages[0].script.is_some());
        assert!(pages[1].script.is_none());
        assert!(pages[1].config.is_none());
        assert!(pages[2].script.is_some());
        assert!(pages[2].config.is_some());
    }

    #[test]
    fn test_typescript_script_is_found() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pages/a/a.wxml", "<view/>");
        write(dir.path(), "pages/a/a.ts", "Page({})");
        let pages = discover_pages(dir.path()).unwrap();
        assert_eq!(
            pages[0].script.as_deref(),
            Some(dir.path().join("pages/a/a.ts").as_path())
        );
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = discover_pages(&dir.path().join("missing")).unwrap_err();
        assert_eq!(err.code(), "TZ-ERR-IO");
    }

    #[test]
    fn test_transform_project_reports_each_unit() {
        let dir = project();
        write(dir.path(), "pages/broken/broken.wxml", "<view/>");
        write(dir.path(), "pages/broken/broken.js", "Page({\n  ...base\n})");
        write(dir.path(), "pages/list/list.wxml", "<view>\n  <text wx:for=\"rows\">x</text>\n</view>");

        let reports = transform_project(dir.path(), &TransformOptions::default()).unwrap();
        assert_eq!(reports.len(), 5);

        let app = &reports[0];
        assert!(app.is_ok());
        assert!(app.output.as_deref().unwrap().contains("class App extends Taro.Component"));

        let broken = reports.iter().find(|r| r.name == "pages/broken/broken").unwrap();
        let failure = broken.error.as_ref().unwrap();
        assert_eq!(failure.code, "TZ-ERR-SPREAD");
        assert_eq!(failure.location, Some((2, 3)));

        let list = reports.iter().find(|r| r.name == "pages/list/list").unwrap();
        let failure = list.error.as_ref().unwrap();
        assert_eq!(failure.code, "TZ-ERR-DIRECTIVE");
        assert_eq!(failure.markup_line, Some(2));
        assert_eq!(failure.location, None);

        let index = reports.iter().find(|r| r.name == "pages/index/index").unwrap();
        assert_eq!(index.used_components, vec!["Block", "View"]);
        let code = index.output.as_deref().unwrap();
        assert!(code.contains("const { title } = this.state;"));
        assert!(code.contains("navigationBarTitleText: \"Home\""));
    }
}
