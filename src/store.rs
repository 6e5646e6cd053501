//! Multi-layout store.
//!
//! Holds an ordered list of named layouts and the index of the one mirrored
//! into the live editor. When opened from a path, every change is written
//! back to that JSON file, replacing it atomically.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::editor::LayoutManager;
use crate::model::{Bounds, Layout, Unit};
use crate::persistence::{ImportError, validate_units};

/// Errors raised by the layout store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not access layout file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("layout file is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("stored layout {index} is invalid: {source}")]
    InvalidLayout {
        index: usize,
        #[source]
        source: ImportError,
    },
    #[error("layout index {index} out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("the last remaining layout cannot be removed")]
    LastLayout,
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    layouts: Vec<Layout>,
    #[serde(default)]
    current: usize,
}

/// Ordered collection of layouts with a current-layout pointer.
#[derive(Clone, Debug)]
pub struct LayoutStore {
    layouts: Vec<Layout>,
    current: usize,
    path: Option<PathBuf>,
}

impl LayoutStore {
    /// A store holding only the starter layout, not backed by a file.
    pub fn in_memory() -> Self {
        Self {
            layouts: vec![Self::starter_layout()],
            current: 0,
            path: None,
        }
    }

    /// Opens the store at `path`.
    ///
    /// A missing file is not an error: the store starts with the starter
    /// layout and creates the file on first change. Stored layouts go
    /// through the same checks as an import, except that they may be empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut store = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let file: StoreFile = serde_json::from_str(&raw)?;
                let layouts = file
                    .layouts
                    .into_iter()
                    .enumerate()
                    .map(|(index, mut layout)| {
                        layout.cubes = validate_units(layout.cubes, &layout.bounds)
                            .map_err(|source| StoreError::InvalidLayout { index, source })?;
                        Ok(layout)
                    })
                    .collect::<Result<Vec<_>, StoreError>>()?;
                info!(path = %path.display(), layouts = layouts.len(), "layout store loaded");
                Self {
                    layouts,
                    current: file.current,
                    path: Some(path),
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no layout store yet, starting fresh");
                Self {
                    path: Some(path),
                    ..Self::in_memory()
                }
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        if store.layouts.is_empty() {
            store.layouts.push(Self::starter_layout());
        }
        if store.current >= store.layouts.len() {
            store.current = 0;
        }
        Ok(store)
    }

    fn starter_layout() -> Layout {
        Layout::new(
            Layout::default_name(0),
            vec![LayoutManager::seed_unit()],
            Bounds::default(),
        )
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &Layout {
        &self.layouts[self.current]
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn check_index(&self, index: usize) -> Result<(), StoreError> {
        if index >= self.layouts.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: self.layouts.len(),
            });
        }
        Ok(())
    }

    /// Appends a layout and makes it current.
    ///
    /// A blank name is replaced by `Layout <n>`.
    pub fn add_layout(
        &mut self,
        name: &str,
        units: Vec<Unit>,
        bounds: Bounds,
    ) -> Result<usize, StoreError> {
        let index = self.layouts.len();
        let name = match name.trim() {
            "" => Layout::default_name(index),
            trimmed => trimmed.to_string(),
        };
        self.layouts.push(Layout::new(name, units, bounds));
        self.current = index;
        self.persist()?;
        Ok(index)
    }

    /// Overwrites the current layout with the live collection.
    pub fn save_current(&mut self, units: Vec<Unit>, bounds: Bounds) -> Result<(), StoreError> {
        let layout = &mut self.layouts[self.current];
        layout.cubes = units;
        layout.bounds = bounds;
        self.persist()
    }

    /// Makes `index` the current layout.
    pub fn switch_to(&mut self, index: usize) -> Result<&Layout, StoreError> {
        self.check_index(index)?;
        self.current = index;
        self.persist()?;
        info!(index, name = %self.layouts[index].name, "switched layout");
        Ok(&self.layouts[index])
    }

    /// Renames the layout at `index`. A blank name resets it to `Layout <n>`.
    pub fn rename(&mut self, index: usize, name: &str) -> Result<(), StoreError> {
        self.check_index(index)?;
        self.layouts[index].name = match name.trim() {
            "" => Layout::default_name(index),
            trimmed => trimmed.to_string(),
        };
        self.persist()
    }

    /// Removes the layout at `index`.
    ///
    /// Removing the current layout falls back to the first one; removing one
    /// before it keeps the same layout current.
    ///
    /// # Returns
    /// The removed layout.
    pub fn remove(&mut self, index: usize) -> Result<Layout, StoreError> {
        self.check_index(index)?;
        if self.layouts.len() == 1 {
            return Err(StoreError::LastLayout);
        }
        let removed = self.layouts.remove(index);
        if index == self.current {
            self.current = 0;
        } else if index < self.current {
            self.current -= 1;
        }
        self.persist()?;
        Ok(removed)
    }

    /// Writes the store to its file, if it has one.
    pub fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = StoreFile {
            layouts: self.layouts.clone(),
            current: self.current,
        };
        let json = serde_json::to_string_pretty(&file)?;

        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.clone(),
            source,
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.persist(path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}
