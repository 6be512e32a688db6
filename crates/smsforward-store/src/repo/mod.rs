pub mod rules;

pub use rules::RulesRepo;
