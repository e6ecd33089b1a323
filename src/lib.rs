#![warn(missing_docs)]

//! <div class="warning">
//!
//! Note: API is unstable, and may change in `0.x` versions.
//!
//! </div>
//!
//! # As a library
//!
//! As a library, usually you prefer to use [`crawler`] to walk a blog
//! page by page and [`fetch`] to build the shared session the crawl
//! runs on.
//!
//! See [`crawler::Crawler#example`] for example.
//!
//! # As a binary
//!
//! In addition to the above, you also need [`cli`] to build the command line.
//!
//! See `main.rs` to know how to assemble these modules as a binary.

pub mod crawler;
pub mod error;
pub mod fetch;
pub mod page;
pub mod post;

pub mod config;
pub mod save;

#[cfg(feature = "cli")]
pub mod cli;

mod extract;
mod photoset;
mod tool;
