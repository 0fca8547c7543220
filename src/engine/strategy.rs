// ==========================================
// 人员调配系统 - 调配策略定义
// ==========================================
// 策略只影响同一层级内的排序分（rank_score），不改变层级顺序
// ==========================================

use serde::{Deserialize, Serialize};

/// 调配策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStrategy {
    /// 直接按最终分排序
    Optimal,
    /// 专属班组在本工段的人员加分
    SameSectionFirst,
    /// 近期出勤少者优先
    Balanced,
}

impl FulfillmentStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStrategy::Optimal => "optimal",
            FulfillmentStrategy::SameSectionFirst => "same_section_first",
            FulfillmentStrategy::Balanced => "balanced",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            FulfillmentStrategy::Optimal => "综合最优",
            FulfillmentStrategy::SameSectionFirst => "本工段优先",
            FulfillmentStrategy::Balanced => "负荷均衡",
        }
    }
}

impl Default for FulfillmentStrategy {
    fn default() -> Self {
        FulfillmentStrategy::Optimal
    }
}

impl std::fmt::Display for FulfillmentStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FulfillmentStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "optimal" => Ok(FulfillmentStrategy::Optimal),
            "same_section_first" | "same-section-first" => {
                Ok(FulfillmentStrategy::SameSectionFirst)
            }
            "balanced" => Ok(FulfillmentStrategy::Balanced),
            other => Err(format!("未知策略类型: {}", other)),
        }
    }
}
