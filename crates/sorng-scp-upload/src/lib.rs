//! # SortOfRemote NG – SCP upload
//!
//! Pushes single files to a remote host through the SCP sink protocol:
//!   • Authenticated SSH session (key file / password) with known-hosts checks
//!   • `scp -t <dir>` exec channel driven byte-for-byte
//!   • Typed errors for every acknowledgement failure
//!   • Transfer statistics and a pluggable log listener
//!   • Blocking uploader plus a tokio service facade

pub mod scp;
