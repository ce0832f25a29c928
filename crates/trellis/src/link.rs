//! Hyperlinks from diagram nodes to API documentation pages.
//!
//! Types of the model link below the `apidocroot` URL. Other types link
//! below the first documentation root whose pattern matches their name:
//! roots are added by `link` and `linkoffline` (one pattern per package of
//! a javadoc `package-list`) and by `apidocmap` (a file of
//! `pattern=url` lines). Without any, the Java SE documentation is used.
//!
//! Package and context diagrams are written inside the package directory
//! tree, so their model types link relative to the diagram's package.

use std::{fs, io, path::Path};

use log::debug;

use trellis_parser::error::{Diagnostic, ErrorCode};

use crate::options::NamePattern;

/// Root used for types outside the model when no other root was given.
pub const DEFAULT_EXTERNAL_API_DOC: &str = "https://docs.oracle.com/javase/9/docs/api/";

/// Names of the package list files javadoc writes, newest last.
const PACKAGE_LISTS: [&str; 2] = ["package-list", "element-list"];

/// Documentation roots known to one diagram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocLinks {
    api_doc_root: Option<String>,
    api_doc_map: Vec<(NamePattern, String)>,
    context_package: Option<String>,
}

/// Trims `root` and makes it end with `/`. An empty root stays empty.
fn fix_root(root: &str) -> String {
    let fixed = root.trim().replace('\\', "/");
    if fixed.is_empty() || fixed.ends_with('/') {
        fixed
    } else {
        format!("{fixed}/")
    }
}

fn unreadable(what: &str, location: &str, err: &io::Error) -> Diagnostic {
    Diagnostic::warning(format!("cannot read {what} `{location}`"))
        .with_code(ErrorCode::E304)
        .with_help(err.to_string())
}

/// Reads the javadoc package list found in the directory `location`.
fn read_package_list(location: &str) -> Result<String, Diagnostic> {
    let dir = location.strip_prefix("file:").unwrap_or(location);
    let mut last_err = None;
    for file in PACKAGE_LISTS {
        match fs::read_to_string(Path::new(dir).join(file)) {
            Ok(text) => return Ok(text),
            Err(err) => last_err = Some(err),
        }
    }
    let err = last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotFound));
    Err(unreadable("package list in", location, &err))
}

/// Splits a `pattern=url` line of an API doc map file. Backslashes are
/// escaped as in Java property files.
fn map_entry(line: &str) -> Option<(String, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    Some((key.trim().replace("\\\\", "\\"), value.trim()))
}

impl DocLinks {
    pub fn api_doc_root(&self) -> Option<&str> {
        self.api_doc_root.as_deref()
    }

    /// The `apidocroot` option.
    pub(crate) fn set_api_doc_root(&mut self, root: Option<&str>) {
        self.api_doc_root = root.map(fix_root);
    }

    /// The `link` option: `location` is the documentation root, and holds
    /// the package list.
    pub(crate) fn add_link(&mut self, location: &str) -> Result<(), Diagnostic> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Err(Diagnostic::warning(format!(
                "skipping `link {location}`: remote package lists are not fetched"
            ))
            .with_code(ErrorCode::E304)
            .with_help("download the package list and use `linkoffline <url> <directory>`"));
        }
        self.add_link_offline(location, location)
    }

    /// The `linkoffline` option: pages of the packages listed in the
    /// directory `package_list` are found below `doc_url`.
    pub(crate) fn add_link_offline(
        &mut self,
        doc_url: &str,
        package_list: &str,
    ) -> Result<(), Diagnostic> {
        let text = read_package_list(package_list)?;
        let doc_url = fix_root(doc_url);
        let before = self.api_doc_map.len();
        for package in text.lines().map(str::trim) {
            if package.is_empty() || package.starts_with("module:") {
                continue;
            }
            let source = format!("{}\\.[^.]*", regex::escape(package));
            if let Ok(pattern) = NamePattern::new(&source) {
                self.api_doc_map.push((pattern, doc_url.clone()));
            }
        }
        debug!(
            doc_url = doc_url.as_str(),
            packages = self.api_doc_map.len() - before;
            "Package list read"
        );
        Ok(())
    }

    /// The `apidocmap` option: reads `pattern=url` lines from `path`.
    pub(crate) fn load_map(&mut self, path: &str) -> Result<(), Diagnostic> {
        let text = fs::read_to_string(path).map_err(|err| unreadable("API doc map", path, &err))?;
        for (key, url) in text.lines().filter_map(map_entry) {
            match NamePattern::new(&key) {
                Ok(pattern) => self.api_doc_map.push((pattern, fix_root(url))),
                Err(err) => Diagnostic::warning(format!("skipping invalid pattern `{key}`"))
                    .with_code(ErrorCode::E300)
                    .with_help(err.to_string())
                    .log_skip(path),
            }
        }
        Ok(())
    }

    pub(crate) fn clear_map(&mut self) {
        self.api_doc_map.clear();
    }

    /// Makes links to model types relative to the directory of `package`.
    pub(crate) fn set_context_package(&mut self, package: &str) {
        self.context_package = Some(package.to_string());
    }

    /// Root of the documentation of a type outside the model.
    pub fn external_root(&self, name: &str) -> Option<&str> {
        if self.api_doc_map.is_empty() {
            return Some(DEFAULT_EXTERNAL_API_DOC);
        }
        self.api_doc_map
            .iter()
            .find(|(pattern, _)| pattern.is_match(name))
            .map(|(_, root)| root.as_str())
    }

    /// URL of the documentation page of a type. `in_model` tells whether
    /// the model declares the type itself.
    pub fn url(
        &self,
        name: &str,
        package: &str,
        simple_name: &str,
        in_model: bool,
    ) -> Option<String> {
        if in_model {
            if let Some(context) = &self.context_package {
                return Some(format!(
                    "{}{simple_name}.html",
                    relative_path(context, package)
                ));
            }
        }
        let root = match in_model {
            true => self.api_doc_root()?,
            false => self.external_root(name)?,
        };
        let mut url = root.to_string();
        if !package.is_empty() {
            url.push_str(&package.replace('.', "/"));
            url.push('/');
        }
        url.push_str(simple_name);
        url.push_str(".html");
        Some(url)
    }
}

/// Path from the directory of package `from` to the directory of package
/// `to`, ending with `/`.
pub fn relative_path(from: &str, to: &str) -> String {
    let from: Vec<_> = from.split('.').filter(|part| !part.is_empty()).collect();
    let to: Vec<_> = to.split('.').filter(|part| !part.is_empty()).collect();
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let mut path = String::new();
    if common == from.len() {
        path.push_str("./");
    } else {
        for _ in common..from.len() {
            path.push_str("../");
        }
    }
    for part in &to[common..] {
        path.push_str(part);
        path.push('/');
    }
    path
}
