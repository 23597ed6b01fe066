use agent_core::Result;

use crate::definition::{AgentConfig, AgentDefinition, AgentInfo};

const SYSTEM_PROMPT: &str = "你是一个智能助手，拥有以下基础技能：
1. 查询天气信息
2. 进行数学计算
3. 搜索信息

请根据用户的问题，选择合适的工具来回答。回答要简洁、准确、友好。";

pub(super) fn definition() -> Result<AgentDefinition> {
    let info = AgentInfo {
        id: "basic".into(),
        name: "基础 Agent".into(),
        description: "拥有基础技能：天气查询、计算器、搜索".into(),
        icon: "🔷".into(),
        version: "1.0.0".into(),
        author: "System".into(),
    };

    Ok(AgentDefinition::new(
        info,
        AgentConfig::new(agent_skills::basic_skills()?, SYSTEM_PROMPT),
    ))
}
