//! Basic skills: weather lookup, calculator, search.

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{
    Result as CoreResult, SkillSet, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema,
};

use crate::expr;

/// Canned weather for the demo cities
const WEATHER: &[(&str, &str)] = &[
    ("北京", "多云，温度 15°C，空气质量良好"),
    ("上海", "晴朗，温度 20°C，适合外出"),
    ("深圳", "阴天，温度 25°C，湿度较高"),
    ("杭州", "小雨，温度 18°C，记得带伞"),
    ("成都", "多云转晴，温度 22°C，天气宜人"),
];

/// Weather lookup against a fixed table
pub struct WeatherTool;

impl WeatherTool {
    pub fn forecast(city: &str) -> String {
        WEATHER
            .iter()
            .find(|(name, _)| *name == city)
            .map_or_else(|| format!("{city} 天气晴朗，温度适宜！"), |(_, report)| (*report).to_string())
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_weather".into(),
            description: "获取指定城市的天气信息".into(),
            parameters: vec![ParameterSchema::required("city", "string", "城市名称，例如 '北京'")],
            category: Some("basic".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let city = call.str_arg("city").unwrap_or_default().trim();
        if city.is_empty() {
            return Ok(ToolResult::failure("get_weather", "城市名称不能为空"));
        }
        Ok(ToolResult::success("get_weather", Self::forecast(city)))
    }
}

/// Calculator over decimal arithmetic
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "calculate".into(),
            description: "计算数学表达式，支持 + - * / % ^ 和括号".into(),
            parameters: vec![ParameterSchema::required(
                "expression",
                "string",
                "数学表达式，例如 '(2 + 3) * 4'",
            )],
            category: Some("basic".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let expression = call.str_arg("expression").unwrap_or_default();

        match expr::evaluate(expression) {
            Ok(value) => Ok(ToolResult::success(
                "calculate",
                format!("计算结果: {expression} = {value}"),
            )
            .with_data(serde_json::json!({ "result": value.to_string() }))),
            Err(e) => {
                tracing::debug!(expression, error = %e, "calculation rejected");
                Ok(ToolResult::failure("calculate", format!("计算错误: {e}")))
            }
        }
    }
}

/// Simulated search
pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_info".into(),
            description: "搜索信息（模拟）".into(),
            parameters: vec![ParameterSchema::required("query", "string", "搜索关键词")],
            category: Some("basic".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let query = call.str_arg("query").unwrap_or_default();
        Ok(ToolResult::success(
            "search_info",
            format!("关于 '{query}' 的搜索结果：这是一个模拟的搜索结果。在实际应用中，这里会返回真实的搜索信息。"),
        ))
    }
}

/// `get_weather`, `calculate`, `search_info`, in that order
pub fn basic_skills() -> CoreResult<SkillSet> {
    SkillSet::from_tools(
        "basic",
        [
            Arc::new(WeatherTool) as Arc<dyn Tool>,
            Arc::new(CalculatorTool),
            Arc::new(SearchTool),
        ],
    )
}
