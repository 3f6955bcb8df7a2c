//! C5 — Tree Merger (spec.md §4.5): grafts another independently parsed
//! tree onto this tree's resolved root.

mod merger;

pub use merger::merge_tree;
