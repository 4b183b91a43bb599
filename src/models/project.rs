// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project state management.
//!
//! A project is a directory holding `classes.yaml` plus the per-folder
//! sidecar files (approval status, saved sessions, activity logs). The
//! images being labeled live in a separate folder whose labels go to a
//! sibling `labels/` directory.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the class list inside a project directory.
pub const CLASSES_FILE: &str = "classes.yaml";

/// Image file extensions picked up from an image folder.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("'names' in {0} must be a list or an index-to-name mapping")]
    InvalidNames(PathBuf),
    #[error("{0} does not define any classes")]
    NoClasses(PathBuf),
}

/// The two accepted shapes of the `names` entry.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassNames {
    List(Vec<String>),
    Indexed(BTreeMap<u32, String>),
}

#[derive(Debug, Deserialize)]
struct ClassesFile {
    names: Option<serde_yaml::Value>,
}

/// Parse the contents of a `classes.yaml` file.
pub fn parse_class_names(yaml: &str, path: &Path) -> Result<Vec<String>, ProjectError> {
    let file: ClassesFile = serde_yaml::from_str(yaml).map_err(|source| ProjectError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    let value = file
        .names
        .ok_or_else(|| ProjectError::InvalidNames(path.to_path_buf()))?;
    let names = match serde_yaml::from_value::<ClassNames>(value) {
        Ok(ClassNames::List(names)) => names,
        // BTreeMap iteration is already sorted by index.
        Ok(ClassNames::Indexed(map)) => map.into_values().collect(),
        Err(_) => return Err(ProjectError::InvalidNames(path.to_path_buf())),
    };
    if names.is_empty() {
        return Err(ProjectError::NoClasses(path.to_path_buf()));
    }
    Ok(names)
}

/// Load the class list of a project directory.
pub fn load_class_names(project_dir: &Path) -> Result<Vec<String>, ProjectError> {
    let path = project_dir.join(CLASSES_FILE);
    let yaml = std::fs::read_to_string(&path).map_err(|source| ProjectError::Io {
        path: path.clone(),
        source,
    })?;
    parse_class_names(&yaml, &path)
}

/// An opened project directory.
#[derive(Debug, Clone)]
pub struct Project {
    pub dir: PathBuf,
    pub class_names: Vec<String>,
}

impl Project {
    pub fn open(dir: &Path) -> Result<Self, ProjectError> {
        let class_names = load_class_names(dir)?;
        log::info!("Loaded {} classes from {}", class_names.len(), dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            class_names,
        })
    }

    pub fn class_name(&self, class_id: usize) -> &str {
        self.class_names
            .get(class_id)
            .map(String::as_str)
            .unwrap_or("?")
    }

    /// Approval sidecar for an image folder.
    pub fn approval_path(&self, folder: &ImageFolder) -> PathBuf {
        self.dir.join(format!(".{}_approval.json", folder.name))
    }

    /// Saved-session file for an image folder.
    pub fn session_path(&self, folder: &ImageFolder) -> PathBuf {
        self.dir.join(format!(".{}_session.json", folder.name))
    }
}

/// A folder of images plus its sibling `labels/` directory.
#[derive(Debug, Clone)]
pub struct ImageFolder {
    pub image_dir: PathBuf,
    pub labels_dir: PathBuf,
    /// Last path component of `image_dir`.
    pub name: String,
    /// Image file names, sorted.
    pub images: Vec<String>,
}

impl ImageFolder {
    /// Scan an image folder and make sure its labels directory exists.
    pub fn open(image_dir: &Path) -> anyhow::Result<Self> {
        let image_dir = std::path::absolute(image_dir)?;
        let name = image_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let labels_dir = image_dir
            .parent()
            .map(|parent| parent.join("labels"))
            .unwrap_or_else(|| image_dir.join("labels"));
        std::fs::create_dir_all(&labels_dir)?;

        let mut images: Vec<String> = std::fs::read_dir(&image_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| is_image_file(name))
            .collect();
        images.sort();

        log::info!("Found {} images in {}", images.len(), image_dir.display());
        Ok(Self {
            image_dir,
            labels_dir,
            name,
            images,
        })
    }

    pub fn image_path(&self, filename: &str) -> PathBuf {
        self.image_dir.join(filename)
    }

    pub fn label_path(&self, filename: &str) -> PathBuf {
        crate::io::labels::label_path(&self.labels_dir, filename)
    }

    pub fn has_label(&self, filename: &str) -> bool {
        self.label_path(filename).exists()
    }

    pub fn total_image_bytes(&self) -> u64 {
        self.images
            .iter()
            .filter_map(|name| std::fs::metadata(self.image_path(name)).ok())
            .map(|meta| meta.len())
            .sum()
    }

    pub fn total_label_bytes(&self) -> u64 {
        self.images
            .iter()
            .filter_map(|name| std::fs::metadata(self.label_path(name)).ok())
            .map(|meta| meta.len())
            .sum()
    }
}

fn is_image_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names_as_list() {
        let names = parse_class_names("names: [person, car]\n", Path::new("classes.yaml")).unwrap();
        assert_eq!(names, vec!["person", "car"]);
    }

    #[test]
    fn test_class_names_as_index_map_are_sorted() {
        let yaml = "names:\n  1: car\n  0: person\n  2: dog\n";
        let names = parse_class_names(yaml, Path::new("classes.yaml")).unwrap();
        assert_eq!(names, vec!["person", "car", "dog"]);
    }

    #[test]
    fn test_class_names_other_shape_fails() {
        let err = parse_class_names("names: 3\n", Path::new("classes.yaml")).unwrap_err();
        assert!(matches!(err, ProjectError::InvalidNames(_)));

        let err = parse_class_names("other: [a]\n", Path::new("classes.yaml")).unwrap_err();
        assert!(matches!(err, ProjectError::InvalidNames(_)));
    }

    #[test]
    fn test_missing_classes_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Project::open(dir.path()).unwrap_err();
        assert!(matches!(err, ProjectError::Io { .. }));
    }

    #[test]
    fn test_image_folder_layout() {
        let root = tempfile::tempdir().unwrap();
        let images = root.path().join("batch1");
        std::fs::create_dir(&images).unwrap();
        for name in ["b.JPG", "a.png", "notes.txt", "c.jpeg"] {
            std::fs::write(images.join(name), b"x").unwrap();
        }

        let folder = ImageFolder::open(&images).unwrap();
        assert_eq!(folder.name, "batch1");
        assert_eq!(folder.images, vec!["a.png", "b.JPG", "c.jpeg"]);
        assert!(folder.labels_dir.ends_with("labels"));
        assert!(folder.labels_dir.is_dir());
        assert_eq!(folder.label_path("b.JPG"), folder.labels_dir.join("b.txt"));
        assert_eq!(folder.total_image_bytes(), 3);
        assert!(!folder.has_label("a.png"));

        std::fs::write(folder.label_path("a.png"), b"0 0.5 0.5 0.1 0.1\n").unwrap();
        assert!(folder.has_label("a.png"));
        assert_eq!(folder.total_label_bytes(), 18);

        let project = Project {
            dir: root.path().to_path_buf(),
            class_names: vec!["x".into()],
        };
        assert_eq!(
            project.approval_path(&folder),
            root.path().join(".batch1_approval.json")
        );
        assert_eq!(
            project.session_path(&folder),
            root.path().join(".batch1_session.json")
        );
    }
}
