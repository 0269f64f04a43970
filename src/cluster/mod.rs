//! Markov clustering over sparse similarity graphs.

mod mcl;
mod service;

pub use mcl::{MclParams, MclReducer};
pub use service::{
    cluster_request, AcceleratedMclBackend, ClusterRequest, ClusterResponse, ClusterService,
};
