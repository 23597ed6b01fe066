use agent_core::Result;

use crate::definition::{AgentConfig, AgentDefinition, AgentInfo};

const SYSTEM_PROMPT: &str = "你是一个功能强大的智能助手，拥有多种技能：

📊 **基础功能**：天气查询、数学计算、信息搜索
⏰ **时间管理**：获取时间、创建提醒
💾 **数据处理**：格式化数据、文件操作

请根据用户需求，灵活运用这些技能，提供专业、高效的服务。";

pub(super) fn definition() -> Result<AgentDefinition> {
    let info = AgentInfo {
        id: "advanced".into(),
        name: "高级 Agent".into(),
        description: "拥有全部技能：基础功能 + 时间管理 + 数据处理".into(),
        icon: "💎".into(),
        version: "1.0.0".into(),
        author: "System".into(),
    };

    Ok(AgentDefinition::new(
        info,
        AgentConfig::new(agent_skills::all_skills()?, SYSTEM_PROMPT),
    ))
}
