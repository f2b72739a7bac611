pub mod correlator;
pub mod lambda;
pub mod loaders;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod plot;
