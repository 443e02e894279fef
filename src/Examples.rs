/// worked examples of the packed reaction buffer, run from main
pub mod rxn_examples;
