//! Icon source resolution
//!
//! Resolves icon keys to raw SVG bytes by searching, in order:
//! 1. Project icons: `{source_dir}/{key}.{ext}`
//! 2. Default icons: `{fallback_dir}/{key}.{ext}`, or the set compiled
//!    into the binary when no fallback directory is configured
//!
//! The first readable hit wins; roots are never merged.

use crate::config::ResolveConfig;
use crate::error::{IconpackError, IconpackResult};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Where an icon was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// Project-local icon directory
    Project,

    /// Configured default icon directory
    Fallback,

    /// Icons compiled into iconpack
    Builtin,
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Fallback => write!(f, "fallback"),
            Self::Builtin => write!(f, "builtin"),
        }
    }
}

/// Default icon set, keyed without extension
const BUILTIN_ICONS: &[(&str, &[u8])] = &[
    ("brand/mark", include_bytes!("../svgs/brand/mark.svg")),
    ("ui/check", include_bytes!("../svgs/ui/check.svg")),
    ("ui/close", include_bytes!("../svgs/ui/close.svg")),
    ("ui/menu", include_bytes!("../svgs/ui/menu.svg")),
];

/// Display prefix for built-in icon paths
const BUILTIN_PREFIX: &str = "<builtin>";

/// Keys of the icons compiled into iconpack
pub fn builtin_keys() -> impl Iterator<Item = &'static str> {
    BUILTIN_ICONS.iter().map(|(key, _)| *key)
}

/// A directory checked when resolving keys
#[derive(Debug, Clone)]
pub struct SearchRoot {
    pub dir: PathBuf,
    pub kind: RootKind,
}

/// Raw bytes for a key and where they came from
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub bytes: Vec<u8>,
    pub path: PathBuf,
    pub root: RootKind,
}

/// Ordered search over icon roots
#[derive(Debug, Clone)]
pub struct Resolver {
    roots: Vec<SearchRoot>,
    extension: String,
    builtin: bool,
}

impl Resolver {
    /// Build a resolver from explicit roots (checked in the given order)
    pub fn new(roots: Vec<SearchRoot>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            roots,
            extension: extension.trim_start_matches('.').to_string(),
            builtin: false,
        }
    }

    /// Also search the built-in icon set, after every directory root
    pub fn with_builtin(mut self) -> Self {
        self.builtin = true;
        self
    }

    /// Build the standard project-then-fallback resolver
    pub fn from_config(config: &ResolveConfig) -> Self {
        let mut roots = Vec::with_capacity(2);
        if let Some(ref dir) = config.source_dir {
            roots.push(SearchRoot {
                dir: dir.clone(),
                kind: RootKind::Project,
            });
        }
        match config.fallback_dir {
            Some(ref dir) => {
                roots.push(SearchRoot {
                    dir: dir.clone(),
                    kind: RootKind::Fallback,
                });
                Self::new(roots, config.extension.clone())
            }
            None => Self::new(roots, config.extension.clone()).with_builtin(),
        }
    }

    /// Search roots in priority order
    pub fn roots(&self) -> &[SearchRoot] {
        &self.roots
    }

    /// Read the bytes for `key` from the first root that has it
    pub async fn resolve(&self, key: &str) -> IconpackResult<ResolvedSource> {
        validate_key(key)?;

        let file_name = format!("{}.{}", key, self.extension);
        let mut searched = Vec::with_capacity(self.roots.len());

        for root in &self.roots {
            let path = root.dir.join(&file_name);
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    debug!("Resolved {} from {} root: {}", key, root.kind, path.display());
                    return Ok(ResolvedSource {
                        bytes,
                        path,
                        root: root.kind,
                    });
                }
                Err(e) => {
                    debug!("{} not readable at {}: {}", key, path.display(), e);
                    searched.push(path.display().to_string());
                }
            }
        }

        if self.builtin {
            let path = PathBuf::from(BUILTIN_PREFIX).join(&file_name);
            // Built-in icons are all SVG
            let icon = (self.extension == "svg")
                .then(|| BUILTIN_ICONS.iter().find(|(k, _)| *k == key))
                .flatten();
            if let Some((_, bytes)) = icon {
                debug!("Resolved {} from builtin icons", key);
                return Ok(ResolvedSource {
                    bytes: bytes.to_vec(),
                    path,
                    root: RootKind::Builtin,
                });
            }
            searched.push(path.display().to_string());
        }

        Err(IconpackError::NotFound {
            key: key.to_string(),
            searched: searched.join(", "),
        })
    }
}

/// Reject keys that could escape a search root
///
/// Keys are relative paths such as `category/name`; absolute paths, `..`
/// segments, backslashes and NUL bytes are refused.
pub fn validate_key(key: &str) -> IconpackResult<()> {
    let invalid = |reason: &str| {
        Err(IconpackError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        })
    };

    if key.trim().is_empty() {
        return invalid("key cannot be empty");
    }
    if key.contains('\0') || key.contains('\\') {
        return invalid("key must not contain NUL or backslash characters");
    }
    let path = Path::new(key);
    if path.is_absolute() || key.starts_with('/') {
        return invalid("key must be relative");
    }
    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return invalid("key must not contain '.' or '..' segments");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_icon(root: &Path, key: &str, body: &str) {
        let path = root.join(format!("{}.svg", key));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn resolver(project: &TempDir, fallback: &TempDir) -> Resolver {
        Resolver::from_config(&ResolveConfig {
            source_dir: Some(project.path().to_path_buf()),
            fallback_dir: Some(fallback.path().to_path_buf()),
            extension: "svg".to_string(),
        })
    }

    #[tokio::test]
    async fn resolves_from_project_root() {
        let project = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();
        write_icon(project.path(), "ui/close", "<svg>project</svg>");

        let found = resolver(&project, &fallback).resolve("ui/close").await.unwrap();
        assert_eq!(found.bytes, b"<svg>project</svg>");
        assert_eq!(found.root, RootKind::Project);
    }

    #[tokio::test]
    async fn project_root_shadows_fallback() {
        let project = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();
        write_icon(project.path(), "star", "<svg>mine</svg>");
        write_icon(fallback.path(), "star", "<svg>bundled</svg>");

        let found = resolver(&project, &fallback).resolve("star").await.unwrap();
        assert_eq!(found.bytes, b"<svg>mine</svg>");
    }

    #[tokio::test]
    async fn falls_back_when_project_lacks_key() {
        let project = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();
        write_icon(fallback.path(), "ui/menu", "<svg>bundled</svg>");

        let found = resolver(&project, &fallback).resolve("ui/menu").await.unwrap();
        assert_eq!(found.bytes, b"<svg>bundled</svg>");
        assert_eq!(found.root, RootKind::Fallback);
    }

    #[tokio::test]
    async fn not_found_lists_every_root() {
        let project = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();

        let err = resolver(&project, &fallback)
            .resolve("missing")
            .await
            .unwrap_err();
        match err {
            IconpackError::NotFound { key, searched } => {
                assert_eq!(key, "missing");
                assert!(searched.contains(&project.path().display().to_string()));
                assert!(searched.contains(&fallback.path().display().to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn roots_follow_config_order() {
        let project = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();
        let kinds: Vec<RootKind> = resolver(&project, &fallback)
            .roots()
            .iter()
            .map(|r| r.kind)
            .collect();
        assert_eq!(kinds, vec![RootKind::Project, RootKind::Fallback]);
    }

    #[tokio::test]
    async fn builtin_icons_used_without_fallback_dir() {
        let project = TempDir::new().unwrap();
        let resolver = Resolver::from_config(&ResolveConfig {
            source_dir: Some(project.path().to_path_buf()),
            ..ResolveConfig::default()
        });
        assert_eq!(resolver.roots().len(), 1);

        for key in builtin_keys() {
            let found = resolver.resolve(key).await.unwrap();
            assert_eq!(found.root, RootKind::Builtin);
            assert!(String::from_utf8(found.bytes).unwrap().contains("<svg"));
        }

        let err = resolver.resolve("ui/nope").await.unwrap_err();
        assert!(err.to_string().contains("<builtin>"));
    }

    #[tokio::test]
    async fn project_icon_shadows_builtin() {
        let project = TempDir::new().unwrap();
        write_icon(project.path(), "ui/close", "<svg>mine</svg>");
        let resolver = Resolver::from_config(&ResolveConfig {
            source_dir: Some(project.path().to_path_buf()),
            ..ResolveConfig::default()
        });

        let found = resolver.resolve("ui/close").await.unwrap();
        assert_eq!(found.bytes, b"<svg>mine</svg>");
        assert_eq!(found.root, RootKind::Project);
    }

    #[tokio::test]
    async fn configured_fallback_replaces_builtin() {
        let project = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();

        let err = resolver(&project, &fallback)
            .resolve("ui/close")
            .await
            .unwrap_err();
        assert!(matches!(err, IconpackError::NotFound { .. }));
    }

    #[test]
    fn extension_dot_is_optional() {
        let r = Resolver::new(vec![], ".svg");
        assert_eq!(r.extension, "svg");
    }

    #[test]
    fn validate_key_rejects_traversal() {
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a/../../b").is_err());
        assert!(validate_key("/abs").is_err());
        assert!(validate_key("a\\b").is_err());
        assert!(validate_key("./a").is_err());
        assert!(validate_key("").is_err());
    }

    #[test]
    fn validate_key_accepts_nested() {
        assert!(validate_key("ui/close").is_ok());
        assert!(validate_key("brand/logo-2x").is_ok());
        assert!(validate_key("name.with.dots").is_ok());
    }

    #[tokio::test]
    async fn invalid_key_is_not_searched() {
        let project = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();
        let err = resolver(&project, &fallback)
            .resolve("../escape")
            .await
            .unwrap_err();
        assert!(matches!(err, IconpackError::InvalidKey { .. }));
    }
}
