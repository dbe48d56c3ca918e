//! Store gateway for Cadence
//!
//! The repositories are the only place in the core that issues storage
//! queries. Every query is parameterized; callers get a small typed surface
//! per aggregate and never see free-form SQL. All operations take the
//! request deadline and surface `ApiError` (store failures map to 503,
//! elapsed deadlines to 504); no retries happen at this layer.

pub mod interaction;
pub mod interest_graph;
pub mod profile;
pub mod track;
pub mod utils;

pub use interaction::InteractionRepository;
pub use interest_graph::InterestGraphRepository;
pub use profile::ProfileRepository;
pub use track::TrackRepository;
