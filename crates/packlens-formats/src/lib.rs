//! DBPF package format parsing for mod collection analysis
//!
//! This crate provides the binary-format layer of the packlens analyzer:
//! defensive parsing of DBPF package headers and index tables, plus
//! per-resource decompression. Package files come from arbitrary third-party
//! mod authors and are frequently malformed or truncated, so every structural
//! claim a file makes about itself is re-validated before it is trusted.
//!
//! # Design Principles
//!
//! - **Untrusted Input**: header fields are attacker-influenced; bounds are
//!   checked both at header parse time and again wherever they are used
//! - **Fail Per Archive, Not Per Collection**: structural errors are typed
//!   and surfaced to the caller, which decides how to aggregate them
//! - **Recoverable Resource Failures**: a resource that cannot be
//!   decompressed does not invalidate the archive it lives in
//! - **No I/O**: the crate operates on in-memory byte buffers supplied by
//!   the caller; it never opens files

#![warn(missing_docs)]
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::uninlined_format_args)] // Backwards compatibility

pub mod dbpf;
