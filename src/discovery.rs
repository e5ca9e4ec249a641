//! Optional module discovery in an unpacked Qt source tree
//!
//! Qt source releases list their modules in one of two places:
//!
//! - `.gitmodules` (5.6 and later): one `[submodule "qtNAME"]` section per
//!   module; sections carrying `qt = false` are not Qt modules.
//! - `qt.pro` (older trees): one `addModule(qtNAME, deps...)` call per module.
//!
//! Sources are tried in order and the first manifest present wins. Names are
//! reported without the `qt` prefix and only if `qtNAME/` exists on disk.

use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::Path;

/// A manifest format that can list the modules of a tree.
pub trait ModuleSource {
    /// Manifest file name relative to the tree root
    fn manifest(&self) -> &'static str;

    /// Module names declared by the manifest text, before the on-disk filter.
    fn parse(&self, text: &str) -> BTreeSet<String>;

    /// Modules declared by this source, or `None` if its manifest is absent.
    fn read(&self, tree: &Path) -> io::Result<Option<BTreeSet<String>>> {
        let path = tree.join(self.manifest());
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(Some(self.parse(&text)))
    }
}

/// `.gitmodules` in git-config syntax.
#[derive(Debug, Default, Clone, Copy)]
pub struct Gitmodules;

const SECTION_PREFIX: &str = "submodule \"qt";

impl ModuleSource for Gitmodules {
    fn manifest(&self) -> &'static str {
        ".gitmodules"
    }

    fn parse(&self, text: &str) -> BTreeSet<String> {
        let mut modules = BTreeSet::new();
        let mut current: Option<String> = None;
        let mut excluded = false;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                if let Some(name) = current.take()
                    && !excluded
                {
                    modules.insert(name);
                }
                excluded = false;
                current = section
                    .trim()
                    .strip_prefix(SECTION_PREFIX)
                    .and_then(|rest| rest.strip_suffix('"'))
                    .filter(|name| !name.is_empty())
                    .map(str::to_string);
                continue;
            }

            if let Some((key, value)) = line.split_once('=')
                && key.trim() == "qt"
                && value.trim() == "false"
            {
                excluded = true;
            }
        }

        if let Some(name) = current
            && !excluded
        {
            modules.insert(name);
        }

        modules
    }
}

/// `qt.pro` with `addModule()` registrations.
#[derive(Debug, Default, Clone, Copy)]
pub struct QtPro;

impl ModuleSource for QtPro {
    fn manifest(&self) -> &'static str {
        "qt.pro"
    }

    fn parse(&self, text: &str) -> BTreeSet<String> {
        text.lines()
            .filter_map(|line| line.trim().strip_prefix("addModule("))
            .filter_map(|args| args.split([',', ')']).next())
            .filter_map(|first| first.trim().strip_prefix("qt"))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Which manifest a discovery came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Gitmodules,
    QtPro,
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestKind::Gitmodules => write!(f, ".gitmodules"),
            ManifestKind::QtPro => write!(f, "qt.pro"),
        }
    }
}

/// Result of scanning a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// A manifest was found; `modules` may still be empty.
    Found {
        manifest: ManifestKind,
        modules: BTreeSet<String>,
    },
    /// Neither manifest exists in the tree.
    NoManifest,
}

impl Discovery {
    /// Discovered modules; empty when no manifest was found.
    pub fn modules(&self) -> BTreeSet<String> {
        match self {
            Discovery::Found { modules, .. } => modules.clone(),
            Discovery::NoManifest => BTreeSet::new(),
        }
    }
}

/// Discover the modules of an unpacked tree using the default source order.
pub fn discover(tree: &Path) -> io::Result<Discovery> {
    let sources: [(ManifestKind, &dyn ModuleSource); 2] = [
        (ManifestKind::Gitmodules, &Gitmodules),
        (ManifestKind::QtPro, &QtPro),
    ];
    discover_with(tree, &sources)
}

/// Discover modules trying `sources` in order.
pub fn discover_with(
    tree: &Path,
    sources: &[(ManifestKind, &dyn ModuleSource)],
) -> io::Result<Discovery> {
    for (kind, source) in sources {
        if let Some(declared) = source.read(tree)? {
            let modules = declared
                .into_iter()
                .filter(|name| tree.join(format!("qt{}", name)).is_dir())
                .collect();
            return Ok(Discovery::Found {
                manifest: *kind,
                modules,
            });
        }
    }
    Ok(Discovery::NoManifest)
}
