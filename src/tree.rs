//! Build directory trees from an in-memory description
//!
//! A tree is a map from entry name to [`TreeNode`]: either a nested
//! directory or a file with its contents. Handy for test fixtures.
//!
//! ```text
//! {"top": Dir({"sub": Dir({"a": File("aaa")}), "b": File("bbb")})}
//! ```
//!
//! creates `top/sub/a` and `top/b`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A directory listing: entry name to node
pub type Tree = BTreeMap<String, TreeNode>;

/// One entry in a directory tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// A subdirectory and its entries
    Dir(Tree),
    /// A regular file and its contents
    File(String),
    /// A regular file written as the concatenation of its pieces
    Lines(Vec<String>),
}

impl From<&str> for TreeNode {
    fn from(contents: &str) -> Self {
        Self::File(contents.to_string())
    }
}

impl From<&[&str]> for TreeNode {
    fn from(pieces: &[&str]) -> Self {
        Self::Lines(pieces.iter().map(ToString::to_string).collect())
    }
}

impl From<Vec<String>> for TreeNode {
    fn from(pieces: Vec<String>) -> Self {
        Self::Lines(pieces)
    }
}

impl From<Tree> for TreeNode {
    fn from(tree: Tree) -> Self {
        Self::Dir(tree)
    }
}

/// Errors that can occur while creating or reading a tree
#[derive(Debug, Error)]
pub enum TreeError {
    /// The target exists and is not a directory
    #[error("{0} already exists and isn't a directory")]
    NotADirectory(PathBuf),

    /// An entry name contains a path separator
    #[error("tree key {0:?} contains a path separator")]
    BadKey(String),

    /// IO error during file operations
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Create `tree` under `directory`, creating `directory` itself if needed
pub fn make_directory_tree(directory: impl AsRef<Path>, tree: &Tree) -> Result<(), TreeError> {
    let directory = directory.as_ref();
    if directory.exists() {
        if !directory.is_dir() {
            return Err(TreeError::NotADirectory(directory.to_path_buf()));
        }
    } else {
        fs::create_dir(directory)?;
    }

    for (name, node) in tree {
        if name.contains(['/', std::path::MAIN_SEPARATOR]) {
            return Err(TreeError::BadKey(name.clone()));
        }
        let path = directory.join(name);
        match node {
            TreeNode::Dir(children) => make_directory_tree(&path, children)?,
            TreeNode::File(contents) => fs::write(&path, contents)?,
            TreeNode::Lines(pieces) => fs::write(&path, pieces.concat())?,
        }
    }
    Ok(())
}

/// Read a directory back into a tree, skipping entries that start with `.`
///
/// Files always come back as [`TreeNode::File`].
pub fn read_directory_tree(directory: impl AsRef<Path>) -> Result<Tree, TreeError> {
    let directory = directory.as_ref();
    if !directory.is_dir() {
        return Err(TreeError::NotADirectory(directory.to_path_buf()));
    }

    let mut tree = Tree::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let node = if entry.file_type()?.is_dir() {
            TreeNode::Dir(read_directory_tree(entry.path())?)
        } else {
            TreeNode::File(fs::read_to_string(entry.path())?)
        };
        tree.insert(name, node);
    }
    Ok(tree)
}
