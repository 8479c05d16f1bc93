//! Filesystem locations for configuration and data.

pub mod xdg_root;
