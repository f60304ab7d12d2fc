//! leakcheck: dispose/ownership dataflow analysis over host-supplied control flow graphs.

pub mod settings;

pub mod cli;

pub mod compiler_messages {
    pub mod compiler_dev_logging;
    pub mod compiler_errors;
    pub mod compiler_warnings;
    pub mod display_messages;
}

pub mod flow_graph {
    pub mod compilation;
    mod flow_display;
    pub mod flow_nodes;
    pub mod flow_validation;
    pub mod type_registry;
}

pub mod analysis {
    pub mod dispose_analysis;
}

pub mod analyzers;
