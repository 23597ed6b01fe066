//! # agent-skills
//!
//! Demonstration skills used by the built-in agent definitions.
//!
//! | set        | tools                                                         |
//! |------------|---------------------------------------------------------------|
//! | `basic`    | `get_weather`, `calculate`, `search_info`                     |
//! | `advanced` | `get_current_time`, `create_reminder`, `format_data`, `save_to_file` |
//!
//! The constructors are pure: calling them again builds fresh, identical
//! sets.

pub mod advanced;
pub mod basic;
pub mod expr;

use agent_core::{Result, SkillSet};

pub use advanced::advanced_skills;
pub use basic::basic_skills;

/// `basic` followed by `advanced`
pub fn all_skills() -> Result<SkillSet> {
    SkillSet::union("all", [&basic_skills()?, &advanced_skills()?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::AgentError;

    #[test]
    fn test_all_skills_is_ordered_concatenation() {
        let basic = basic_skills().unwrap();
        let advanced = advanced_skills().unwrap();
        let all = all_skills().unwrap();

        assert_eq!(all.len(), basic.len() + advanced.len());

        let expected: Vec<String> = basic.names().into_iter().chain(advanced.names()).collect();
        assert_eq!(all.names(), expected);
    }

    #[test]
    fn test_composition_is_repeatable() {
        assert_eq!(all_skills().unwrap().names(), all_skills().unwrap().names());
        assert_eq!(all_skills().unwrap().len(), 7);
    }

    #[test]
    fn test_union_with_itself_is_rejected() {
        let basic = basic_skills().unwrap();
        let err = SkillSet::union("twice", [&basic, &basic]).unwrap_err();
        assert!(matches!(err, AgentError::DuplicateToolName(name) if name == "get_weather"));
    }
}
