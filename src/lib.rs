/*!
# Sheet Summary

Upload summaries for spreadsheet files, built in Rust.

## Overview

Users upload a spreadsheet, the first sheet is parsed into rows keyed by the
header row, and a plain-text summary of the data is stored next to the rows in
the user's upload history. Summaries are produced by an external interpreter
script when one is available and by a built-in summarizer otherwise, and are
cached by a fingerprint of the parsed data so identical re-uploads are instant.

## Architecture

### Summary Pipeline
- **Fingerprint** - SHA-256 of the dataset's compact JSON, used as cache key
- **Summary Cache** - Process-wide concurrent map from fingerprint to summary
- **External Summarizer** - Writes the rows to a per-upload JSON artifact and
  tries each configured interpreter in order, with a time limit per attempt
- **Local Summarizer** - Dependency-free fallback that always succeeds
- **Orchestrator** - Cache lookup, external attempt, local fallback, cache fill

### Collaborators
- **Loader** - CSV via the `csv` crate, workbooks via `calamine` (`web` feature)
- **Upload Store** - JSON file of upload records per database directory
- **App** - axum routes for upload, history and deletion (`web` feature)

## Failure Handling

An interpreter that fails to start, exits non-zero, times out or prints
nothing is skipped in favour of the next one. Output containing a configured
dependency signature (for example `ModuleNotFoundError`) stops the chain and
goes straight to the local summary. The only error that leaves the pipeline
is a dataset that cannot be serialized.

## Modules

- **dataset**: Row and dataset types
- **fingerprint**: Dataset digest
- **cache**: Summary cache
- **local**: Built-in summarizer
- **external**: Interpreter commands and output classification
- **orchestrator**: Summary entry point
- **config**: Pipeline and server settings
- **error**: Error types
- **loader**: Upload parsing
- **store**: Upload history persistence
- **app**: HTTP routes (`web` feature)

## REST API Endpoints

- `POST /api/users/{user}/uploads` - Upload a file and get its summary
- `GET /api/users/{user}/uploads` - Upload history of a user
- `DELETE /api/users/{user}/uploads/{id}` - Delete an upload
- `GET /api/uploads` - All uploads
*/

// Re-export all modules so they appear in the documentation
#[cfg(feature = "web")]
pub mod app;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod external;
pub mod fingerprint;
pub mod loader;
pub mod local;
pub mod orchestrator;
pub mod store;

/// Re-export everything from these modules to make it easier to use
pub use cache::*;
pub use config::*;
pub use dataset::*;
pub use error::*;
pub use external::*;
pub use fingerprint::*;
pub use loader::*;
pub use local::*;
pub use orchestrator::*;
pub use store::*;
