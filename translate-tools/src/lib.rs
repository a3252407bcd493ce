//! Static translation passes and the `a2tc` command line tool: DOS 3.3
//! loading, reachable-code discovery, annotated asm listings and simple C
//! emission.

pub mod discover;
pub mod listing;
pub mod loader;
pub mod simplec;
