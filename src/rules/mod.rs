//! User-facing rule macros.
//!
//! Each macro is a façade over the primitive constructor: it validates
//! its own argument set, normalizes outputs, synthesizes a command
//! template where the rule kind calls for one, and hands the finished
//! spec to the graph through [`DefineContext`](crate::core::DefineContext).
//! Configuration errors raise synchronously out of the macro call;
//! sibling definitions are unaffected.

pub mod filegroup;
pub mod genrule;
pub mod gentest;
pub mod package;
pub mod remote;
pub mod tarball;

pub use filegroup::{export_file, filegroup, ExportFileArgs, FilegroupArgs};
pub use genrule::{genrule, GenruleArgs};
pub use gentest::{gentest, GentestArgs};
pub use package::{fpm_deb, fpm_package, FpmPackageArgs};
pub use remote::{remote_file, RemoteFileArgs};
pub use tarball::{tarball, Compression, CompressionMethod, TarballArgs};
