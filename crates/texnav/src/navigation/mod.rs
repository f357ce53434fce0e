//
// navigation/mod.rs
//
// File-reference navigation for LaTeX commands
//

pub mod contract;
pub mod inclusion;
pub mod lookup;
pub mod marker;
pub mod paths;
pub mod resolver;
pub mod roots;

pub use contract::{CommandTable, FileArgument};
pub use inclusion::{IdentityRoot, InclusionGraph, RootFinder};
pub use lookup::{DiskLookup, FileLookup};
pub use marker::{IconKey, NavigationMarker};
pub use resolver::{
    collect_navigation_markers, document_markers, resolve_reference, ResolveContext,
};
pub use roots::candidate_roots;
