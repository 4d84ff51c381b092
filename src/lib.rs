//! # fileseed
//!
//! Populate a SQLite schema from a directory tree of flat files, so an
//! application can keep its content in version control and still query it
//! as relational data.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │   Resolver   │──▶│   Loader     │──▶│ Record parser│──▶│ Coercion │
//! │ (per table)  │   │ md / _all /  │   │ YAML / front-│   │ declared │
//! └──────▲───────┘   │ yml dir      │   │ matter       │   │ fields   │
//!        │           └──────────────┘   └──────────────┘   └────┬─────┘
//!        │                                                      ▼
//! ┌──────┴─────────────────────────────────────────────────────────────┐
//! │ Seeder: dependency order, one transaction, commit or roll back     │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data layout
//!
//! ```text
//! <data.dir>/<table>/_all.yml     # sequence of mappings
//! <data.dir>/<table>/<file>.yml   # one mapping per file
//! <data.dir>/<table>/<file>.md    # frontmatter mapping + body (→ `content`)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! fileseed init                 # create tables
//! fileseed check                # show which loader each table uses
//! fileseed load                 # load everything in one transaction
//! fileseed stats                # row counts
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`schema`] | Table and field descriptors, dependency order |
//! | [`models`] | Entity bindings and constructed records |
//! | [`parse`] | YAML and frontmatter file decoding |
//! | [`loaders`] | Loader strategies and resolution |
//! | [`coerce`] | Raw mappings onto declared fields |
//! | [`load`] | Transactional load orchestration |
//! | [`store`] | Record persistence |
//! | [`migrate`] | Table creation |
//! | [`progress`] | Progress reporting |
//! | [`error`] | Load error taxonomy |

pub mod check;
pub mod coerce;
pub mod config;
pub mod db;
pub mod error;
pub mod load;
pub mod loaders;
pub mod migrate;
pub mod models;
pub mod parse;
pub mod progress;
pub mod schema;
pub mod stats;
pub mod store;
