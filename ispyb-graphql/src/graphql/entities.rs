mod auto_processing;
mod beamline;
mod data_collection;
mod proposal;
mod sample;
mod visit;

pub use auto_processing::{AutoProcessingResult, MergingStatistics, UnitCell};
pub use beamline::Beamline;
pub use data_collection::DataCollection;
pub use proposal::Proposal;
pub use sample::{Container, Sample};
pub use visit::Visit;
