pub mod evaluator;
pub mod granter;
