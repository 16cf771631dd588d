// ==========================================
// 物资预测对账引擎 - 项目引用
// ==========================================
// 项目实体由外部项目目录持有,引擎只读取 project_id 与 status
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// ProjectStatus - 项目状态
// ==========================================
// 上游取值: "IN PROGRESS" / "COMPLETED" / "PLANNED"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[serde(rename = "IN PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "PLANNED")]
    Planned,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::InProgress => "IN PROGRESS",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Planned => "PLANNED",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    /// 容忍大小写与首尾空白; 下划线/连字符视同空格
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "IN PROGRESS" => Ok(ProjectStatus::InProgress),
            "COMPLETED" => Ok(ProjectStatus::Completed),
            "PLANNED" => Ok(ProjectStatus::Planned),
            other => Err(format!("未知项目状态: {}", other)),
        }
    }
}

// ==========================================
// ProjectRef - 项目目录条目
// ==========================================
// status 保留原始字符串,未识别的状态不视为错误
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub project_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl ProjectRef {
    pub fn new(project_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            status: status.into(),
            name: None,
        }
    }

    /// 解析状态 (未识别返回 None)
    pub fn parsed_status(&self) -> Option<ProjectStatus> {
        self.status.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_tolerates_drift() {
        assert_eq!("IN PROGRESS".parse(), Ok(ProjectStatus::InProgress));
        assert_eq!(" in_progress ".parse(), Ok(ProjectStatus::InProgress));
        assert_eq!("Completed".parse(), Ok(ProjectStatus::Completed));
        assert!("FOO".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn test_project_ref_deserialize_without_status() {
        let project: ProjectRef = serde_json::from_str(r#"{"project_id": "P0003"}"#).unwrap();
        assert_eq!(project.status, "");
        assert_eq!(project.parsed_status(), None);
    }
}
