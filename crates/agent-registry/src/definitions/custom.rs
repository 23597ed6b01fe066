use agent_core::Result;

use crate::definition::{AgentConfig, AgentDefinition, AgentInfo};

const SYSTEM_PROMPT: &str = "你是一个专注于天气查询和数学计算的助手。

你的专长领域：
🌤️  天气查询 - 提供准确的天气信息
🔢  数学计算 - 快速计算各种数学表达式

请专注于这两个领域，提供专业的服务。";

pub(super) fn definition() -> Result<AgentDefinition> {
    let info = AgentInfo {
        id: "custom".into(),
        name: "自定义 Agent".into(),
        description: "专注于天气和计算的精简助手".into(),
        icon: "⚙️".into(),
        version: "1.0.0".into(),
        author: "User".into(),
    };

    // Weather and calculator only
    let tools = agent_skills::basic_skills()?.take("custom", 2);

    Ok(AgentDefinition::new(info, AgentConfig::new(tools, SYSTEM_PROMPT)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_uses_first_two_basic_skills() {
        let def = definition().unwrap();
        assert_eq!(def.config().tools().names(), vec!["get_weather", "calculate"]);
        assert_eq!(def.info().author, "User");
    }
}
