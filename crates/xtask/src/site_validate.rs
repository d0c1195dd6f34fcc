use std::{
    fs, io,
    path::{Path, PathBuf},
};

use clap::Parser;
use regex::Regex;
use thiserror::Error;
use vendor_analytics::{Schema, SchemaLoadError, SlugPattern};

const PREFIX: &str = "analytics-validate";
const PROFILE_PAGE: &str = "profile";
const DEFAULT_SLUG_PATTERN: &str = "^[a-z0-9-]+$";

#[derive(Debug, Parser)]
pub struct Args {
    /// Site root containing `directory/<slug>/index.html` pages.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Baked schema snapshot (default: <root>/config/analytics.json).
    #[arg(long)]
    pub baked: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum FatalError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid baked schema: {0}")]
    Schema(#[from] SchemaLoadError),
    #[error("invalid default slug pattern: {0}")]
    SlugPattern(#[from] fancy_regex::Error),
    #[error("invalid markup matcher: {0}")]
    Pattern(#[from] regex::Error),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> FatalError + '_ {
    move |source| FatalError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Violation {
    path: PathBuf,
    message: String,
}

impl Violation {
    fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    fn to_human_line(&self) -> String {
        format!(" - {}: {}", self.path.display(), self.message)
    }
}

struct Matchers {
    outbound_link: Regex,
    vendor_slug_attr: Regex,
    type_attr: Regex,
}

impl Matchers {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            outbound_link: Regex::new(r"<a[^>]*data-track-outbound[^>]*>")?,
            vendor_slug_attr: attr_regex("data-vendor-slug")?,
            type_attr: attr_regex("data-type")?,
        })
    }
}

fn attr_regex(attr: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r#"{}="([^"]+)""#, regex::escape(attr)))
}

fn extract_attr<'a>(re: &Regex, html: &'a str) -> Option<&'a str> {
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn run(args: Args) -> i32 {
    match run_inner(args) {
        Ok(violations) if violations.is_empty() => {
            println!("{PREFIX}: OK");
            0
        }
        Ok(violations) => {
            eprintln!("{PREFIX}: FAILED");
            for violation in &violations {
                eprintln!("{}", violation.to_human_line());
            }
            1
        }
        Err(err) => {
            eprintln!("{PREFIX}: FAILED ({err})");
            1
        }
    }
}

fn run_inner(args: Args) -> Result<Vec<Violation>, FatalError> {
    let root = args.root;
    let baked_path = args
        .baked
        .unwrap_or_else(|| root.join("config").join("analytics.json"));
    let raw = fs::read(&baked_path).map_err(io_error(&baked_path))?;
    let schema = Schema::from_json_slice(&raw)?;
    let slug_pattern = match schema.slug_pattern() {
        Some(pattern) => pattern.clone(),
        None => SlugPattern::new(DEFAULT_SLUG_PATTERN)?,
    };
    let matchers = Matchers::new()?;

    let mut violations = Vec::new();
    for page in list_vendor_pages(&root.join("directory"))? {
        let html = fs::read_to_string(&page).map_err(io_error(&page))?;
        violations.extend(check_vendor_page(
            &page,
            &html,
            &schema,
            &slug_pattern,
            &matchers,
        ));
    }
    for file in walk_html(&root)? {
        let html = fs::read_to_string(&file).map_err(io_error(&file))?;
        violations.extend(check_outbound_links(&file, &html, &schema, &matchers));
    }
    Ok(violations)
}

fn list_vendor_pages(vendor_dir: &Path) -> Result<Vec<PathBuf>, FatalError> {
    let mut pages = Vec::new();
    for entry in fs::read_dir(vendor_dir).map_err(io_error(vendor_dir))? {
        let entry = entry.map_err(io_error(vendor_dir))?;
        if !entry.file_type().map_err(io_error(vendor_dir))?.is_dir() {
            continue;
        }
        let index = entry.path().join("index.html");
        if index.is_file() {
            pages.push(index);
        }
    }
    pages.sort();
    Ok(pages)
}

fn walk_html(dir: &Path) -> Result<Vec<PathBuf>, FatalError> {
    let mut out = Vec::new();
    let mut entries = fs::read_dir(dir)
        .map_err(io_error(dir))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error(dir))?;
    entries.sort_by_key(|entry| entry.file_name());
    for entry in entries {
        if entry.file_name().to_string_lossy().starts_with(".git") {
            continue;
        }
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_error(&path))?;
        if file_type.is_dir() {
            out.extend(walk_html(&path)?);
        } else if file_type.is_file() && path.extension().is_some_and(|ext| ext == "html") {
            out.push(path);
        }
    }
    Ok(out)
}

fn check_vendor_page(
    path: &Path,
    html: &str,
    schema: &Schema,
    slug_pattern: &SlugPattern,
    matchers: &Matchers,
) -> Vec<Violation> {
    // Pages without a vendor slug are not profile pages.
    let Some(slug) = extract_attr(&matchers.vendor_slug_attr, html) else {
        return Vec::new();
    };
    let mut violations = Vec::new();
    if !slug_pattern.is_full_match(slug) {
        violations.push(Violation::new(
            path,
            format!("vendor slug '{slug}' fails regex"),
        ));
    }
    if !schema.allowed_pages().contains(PROFILE_PAGE) {
        violations.push(Violation::new(
            path,
            format!("page '{PROFILE_PAGE}' not in allowedPages"),
        ));
    }
    violations
}

fn check_outbound_links(
    path: &Path,
    html: &str,
    schema: &Schema,
    matchers: &Matchers,
) -> Vec<Violation> {
    matchers
        .outbound_link
        .find_iter(html)
        .filter_map(|tag| match extract_attr(&matchers.type_attr, tag.as_str()) {
            None => Some(Violation::new(path, "outbound link missing data-type")),
            Some(link_type) if !schema.allowed_click_types().contains(link_type) => {
                Some(Violation::new(
                    path,
                    format!("outbound link type '{link_type}' not in allowedClickTypes"),
                ))
            }
            Some(_) => None,
        })
        .collect()
}
