//! The geoproxy library for resolving addresses through third-party
//! geocoding providers.
//!
//! Providers are described declaratively: a request URL prefix, a path to a
//! status field with its expected value, and a path to the coordinates. The
//! resolver tries them in configured order and returns the first location
//! found, or in debug mode queries all of them and reports each result.
//!
//! # Examples
//!
//! Resolving against canned responses:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use camino::Utf8Path;
//! use geoproxy::{FixtureSource, ProviderRegistry, ResolutionOutcome, Resolver};
//!
//! let registry = ProviderRegistry::from_path(Utf8Path::new("providers.json"))?;
//! let resolver = Resolver::new(Arc::new(registry), FixtureSource::new("."), false);
//!
//! match resolver.resolve("1600 Amphitheatre Pkwy, Mountain View, CA") {
//!     ResolutionOutcome::Resolved(location) => println!("{}", location),
//!     ResolutionOutcome::DebugTrace(entries) => println!("{:?}", entries),
//!     ResolutionOutcome::Failed => eprintln!("no provider could resolve the address"),
//! }
//! # Ok::<(), geoproxy::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod keypath;
pub mod provider;
pub mod resolver;
pub mod server;
pub mod source;

pub use crate::config::ServerConfig;
pub use crate::error::{Error, Result};
pub use crate::keypath::{extract, KeyPath, Segment};
pub use crate::provider::{ProviderRegistry, ProviderSpec};
pub use crate::resolver::{resolve, Location, ResolutionOutcome, Resolver};
pub use crate::source::{FixtureSource, HttpSource, ResponseSource};
