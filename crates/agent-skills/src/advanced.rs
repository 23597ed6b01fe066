//! Advanced skills: time, reminders, data formatting and file output.

use async_trait::async_trait;
use serde_json::json;

use agent_core::{
    Result as CoreResult, SkillSet, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema,
};

const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";

/// Current local time, labelled with the requested zone name
pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_current_time".into(),
            description: "获取当前时间".into(),
            parameters: vec![ParameterSchema::optional(
                "timezone",
                "string",
                "时区",
                json!(DEFAULT_TIMEZONE),
            )],
            category: Some("time".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let timezone = call.str_arg("timezone").unwrap_or(DEFAULT_TIMEZONE);
        let now = chrono::Local::now();

        Ok(ToolResult::success(
            "get_current_time",
            format!("当前时间（{timezone}）: {}", now.format("%Y-%m-%d %H:%M:%S")),
        )
        .with_data(json!({ "timestamp": now.to_rfc3339() })))
    }
}

/// Acknowledges a reminder. Nothing is scheduled.
pub struct ReminderTool;

#[async_trait]
impl Tool for ReminderTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_reminder".into(),
            description: "创建提醒事项".into(),
            parameters: vec![
                ParameterSchema::required("task", "string", "提醒内容"),
                ParameterSchema::required("time", "string", "提醒时间"),
            ],
            category: Some("time".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let task = call.str_arg("task").unwrap_or_default();
        let time = call.str_arg("time").unwrap_or_default();

        Ok(ToolResult::success(
            "create_reminder",
            format!("⏰ 提醒已创建\n任务: {task}\n时间: {time}\n将在指定时间通知您！"),
        ))
    }
}

pub struct FormatDataTool;

impl FormatDataTool {
    /// Render `data` as json, markdown or a list; unknown formats pass through
    pub fn render(data: &str, format_type: &str) -> String {
        match format_type {
            "json" => json!({ "data": data, "formatted": true }).to_string(),
            "markdown" => format!("### 数据\n\n- {data}"),
            "list" => format!("1. {data}"),
            _ => data.to_string(),
        }
    }
}

#[async_trait]
impl Tool for FormatDataTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "format_data".into(),
            description: "格式化数据".into(),
            parameters: vec![
                ParameterSchema::required("data", "string", "要格式化的数据"),
                ParameterSchema::optional("format_type", "string", "格式类型 (json/markdown/list)", json!("json"))
                    .one_of(&["json", "markdown", "list"]),
            ],
            category: Some("data".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let data = call.str_arg("data").unwrap_or_default();
        let format_type = call.str_arg("format_type").unwrap_or("json");
        Ok(ToolResult::success("format_data", Self::render(data, format_type)))
    }
}

/// Writes content to a file, overwriting it
pub struct SaveToFileTool;

#[async_trait]
impl Tool for SaveToFileTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "save_to_file".into(),
            description: "保存内容到文件".into(),
            parameters: vec![
                ParameterSchema::required("filename", "string", "文件名"),
                ParameterSchema::required("content", "string", "内容"),
            ],
            category: Some("data".into()),
            has_side_effects: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let filename = call.str_arg("filename").unwrap_or_default();
        let content = call.str_arg("content").unwrap_or_default();

        if filename.trim().is_empty() {
            return Ok(ToolResult::failure("save_to_file", "❌ 保存失败: 文件名为空"));
        }

        match tokio::fs::write(filename, content).await {
            Ok(()) => {
                tracing::info!(filename, bytes = content.len(), "skill wrote file");
                Ok(ToolResult::success("save_to_file", format!("💾 内容已保存到文件: {filename}")))
            }
            Err(e) => Ok(ToolResult::failure("save_to_file", format!("❌ 保存失败: {e}"))),
        }
    }
}

/// `get_current_time`, `create_reminder`, `format_data`, `save_to_file`
pub fn advanced_skills() -> CoreResult<SkillSet> {
    SkillSet::new("advanced")
        .with(CurrentTimeTool)?
        .with(ReminderTool)?
        .with(FormatDataTool)?
        .with(SaveToFileTool)
}
