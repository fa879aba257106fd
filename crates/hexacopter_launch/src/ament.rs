//! Package share-directory resolution
//!
//! Mirrors `get_package_share_directory`: a package is installed under an
//! ament prefix when `<prefix>/share/ament_index/resource_index/packages/<name>`
//! exists, and its share directory is `<prefix>/share/<name>`.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Environment variable listing ament install prefixes
pub const AMENT_PREFIX_PATH: &str = "AMENT_PREFIX_PATH";

const PACKAGE_MARKERS: &str = "share/ament_index/resource_index/packages";

/// Resolves a package name to its installed share directory
pub trait PackageResolver {
    fn share_directory(&self, package: &str) -> Result<PathBuf, ResolveError>;
}

/// Resolver backed by the ament resource index
#[derive(Debug, Clone)]
pub struct AmentIndex {
    prefixes: Vec<PathBuf>,
}

impl AmentIndex {
    /// Build from `AMENT_PREFIX_PATH`
    pub fn from_env() -> Result<Self, ResolveError> {
        let value = std::env::var_os(AMENT_PREFIX_PATH).ok_or(ResolveError::MissingPrefixPath)?;
        let prefixes: Vec<PathBuf> = std::env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if prefixes.is_empty() {
            return Err(ResolveError::MissingPrefixPath);
        }
        Ok(Self::new(prefixes))
    }

    /// Build from an explicit, ordered list of prefixes
    pub fn new(prefixes: Vec<PathBuf>) -> Self {
        Self { prefixes }
    }

    pub fn prefixes(&self) -> &[PathBuf] {
        &self.prefixes
    }

    /// First prefix that has the package registered
    pub fn package_prefix(&self, package: &str) -> Option<&Path> {
        self.prefixes
            .iter()
            .find(|prefix| prefix.join(PACKAGE_MARKERS).join(package).is_file())
            .map(PathBuf::as_path)
    }
}

impl PackageResolver for AmentIndex {
    fn share_directory(&self, package: &str) -> Result<PathBuf, ResolveError> {
        match self.package_prefix(package) {
            Some(prefix) => {
                log::debug!("Found package '{}' under {}", package, prefix.display());
                Ok(prefix.join("share").join(package))
            }
            None => Err(ResolveError::PackageNotFound {
                package: package.to_string(),
                searched: self.prefixes.clone(),
            }),
        }
    }
}

/// Resolver with explicitly mapped share directories
///
/// Packages without an explicit entry resolve to `<root>/<package>` when a
/// root is set.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    packages: IndexMap<String, PathBuf>,
    root: Option<PathBuf>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a package to a share directory
    pub fn with_package(mut self, package: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.packages.insert(package.into(), dir.into());
        self
    }

    /// Resolve unmapped packages under this directory
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }
}

impl PackageResolver for StaticResolver {
    fn share_directory(&self, package: &str) -> Result<PathBuf, ResolveError> {
        if let Some(dir) = self.packages.get(package) {
            return Ok(dir.clone());
        }
        match &self.root {
            Some(root) => Ok(root.join(package)),
            None => Err(ResolveError::PackageNotFound {
                package: package.to_string(),
                searched: Vec::new(),
            }),
        }
    }
}

/// Resolvers can be tried in order, first hit wins
impl<A: PackageResolver, B: PackageResolver> PackageResolver for (A, B) {
    fn share_directory(&self, package: &str) -> Result<PathBuf, ResolveError> {
        match self.0.share_directory(package) {
            Ok(dir) => Ok(dir),
            Err(ResolveError::PackageNotFound { .. }) => self.1.share_directory(package),
            Err(e) => Err(e),
        }
    }
}

/// Errors that can occur when resolving package share directories
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("AMENT_PREFIX_PATH is not set; source a ROS 2 workspace setup file first")]
    MissingPrefixPath,

    #[error("Package '{package}' not found{}", searched_suffix(.searched))]
    PackageNotFound {
        package: String,
        searched: Vec<PathBuf>,
    },
}

fn searched_suffix(searched: &[PathBuf]) -> String {
    if searched.is_empty() {
        return String::new();
    }
    let dirs: Vec<String> = searched.iter().map(|p| p.display().to_string()).collect();
    format!(" (searched: {})", dirs.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn register(prefix: &Path, package: &str) {
        let markers = prefix.join(PACKAGE_MARKERS);
        fs::create_dir_all(&markers).unwrap();
        fs::write(markers.join(package), "").unwrap();
        fs::create_dir_all(prefix.join("share").join(package)).unwrap();
    }

    #[test]
    fn test_ament_index_resolves_registered_package() {
        let dir = tempfile::tempdir().unwrap();
        register(dir.path(), "my_hexacopter");

        let index = AmentIndex::new(vec![dir.path().to_path_buf()]);
        let share = index.share_directory("my_hexacopter").unwrap();
        assert_eq!(share, dir.path().join("share").join("my_hexacopter"));
    }

    #[test]
    fn test_ament_index_first_prefix_wins() {
        let overlay = tempfile::tempdir().unwrap();
        let underlay = tempfile::tempdir().unwrap();
        register(overlay.path(), "gazebo_ros");
        register(underlay.path(), "gazebo_ros");
        register(underlay.path(), "tf2_ros");

        let index = AmentIndex::new(vec![
            overlay.path().to_path_buf(),
            underlay.path().to_path_buf(),
        ]);
        assert_eq!(
            index.share_directory("gazebo_ros").unwrap(),
            overlay.path().join("share/gazebo_ros")
        );
        assert_eq!(
            index.share_directory("tf2_ros").unwrap(),
            underlay.path().join("share/tf2_ros")
        );
    }

    #[test]
    fn test_ament_index_unknown_package() {
        let dir = tempfile::tempdir().unwrap();
        let index = AmentIndex::new(vec![dir.path().to_path_buf()]);

        let err = index.share_directory("my_hexacopter").unwrap_err();
        assert!(matches!(err, ResolveError::PackageNotFound { ref package, .. } if package == "my_hexacopter"));
        assert!(err.to_string().contains("searched"));
    }

    #[test]
    fn test_static_resolver() {
        let resolver = StaticResolver::new()
            .with_package("my_hexacopter", "/opt/hexa/share/my_hexacopter")
            .with_root("/opt/ros/humble/share");

        assert_eq!(
            resolver.share_directory("my_hexacopter").unwrap(),
            PathBuf::from("/opt/hexa/share/my_hexacopter")
        );
        assert_eq!(
            resolver.share_directory("gazebo_ros").unwrap(),
            PathBuf::from("/opt/ros/humble/share/gazebo_ros")
        );
        assert!(StaticResolver::new().share_directory("gazebo_ros").is_err());
    }

    #[test]
    fn test_chained_resolvers() {
        let chained = (
            StaticResolver::new().with_package("my_hexacopter", "/ws/share/my_hexacopter"),
            StaticResolver::new().with_root("/opt/ros/humble/share"),
        );

        assert_eq!(
            chained.share_directory("my_hexacopter").unwrap(),
            PathBuf::from("/ws/share/my_hexacopter")
        );
        assert_eq!(
            chained.share_directory("gazebo_ros").unwrap(),
            PathBuf::from("/opt/ros/humble/share/gazebo_ros")
        );
    }
}
