/*
 * @Author       : 老董
 * @Date         : 2026-08-13
 * @Description  : 格式化配置：分隔符、前后缀、类别标签解码、精度控制
 */

use super::WriteError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 单个数值的输出形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// 'f'：原始浮点
    Float,
    /// 'u'：类别下标（整数）
    CategoryIndex,
    /// 's'：经标签表查到的字符串
    CategoryLabel,
}

/// 序列感知格式化的全部可配置项。
///
/// 所有字符串项支持两种文本替换（每个节点应用一次，见`processed`）：
/// 字面的`\n`/`\t`两字符转义替换为真实控制字符，`%s`替换为节点显示名。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteFormattingOptions {
    /// 是否把每列归约为最大值下标（类别标签模式）
    pub is_category_label: bool,
    /// 标签表文件路径；类别标签模式下给定则按's'输出
    pub label_mapping_file: Option<String>,
    /// true：外层循环时间步（一行一个样本）；false：外层循环特征维
    pub transpose: bool,
    /// 整个输出流的前言/尾声（循环前后各写一次）
    pub prologue: String,
    pub epilogue: String,
    /// 序列级分隔与前后缀
    pub sequence_separator: String,
    pub sequence_prologue: String,
    pub sequence_epilogue: String,
    /// 同一行内值之间、行与行之间的分隔
    pub element_separator: String,
    pub sample_separator: String,
    /// printf 风格精度片段，如"8.4"表示宽度8、小数4位；仅作用于'f'格式
    pub precision_format: String,
}

impl Default for WriteFormattingOptions {
    fn default() -> Self {
        Self {
            is_category_label: false,
            label_mapping_file: None,
            transpose: true,
            prologue: String::new(),
            epilogue: String::new(),
            sequence_separator: String::new(),
            sequence_prologue: String::new(),
            sequence_epilogue: "\\n".to_string(),
            element_separator: " ".to_string(),
            sample_separator: "\\n".to_string(),
            precision_format: String::new(),
        }
    }
}

impl WriteFormattingOptions {
    /// 从 JSON 文件加载配置（缺省字段用默认值补齐）
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, WriteError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| WriteError::InvalidConfig(format!("JSON 解析失败: {e}")))
    }

    /// 按是否类别标签、有无标签表选择输出形态
    pub fn value_format(&self, has_mapping: bool) -> ValueFormat {
        if !self.is_category_label {
            ValueFormat::Float
        } else if has_mapping {
            ValueFormat::CategoryLabel
        } else {
            ValueFormat::CategoryIndex
        }
    }

    /// 返回对`node_name`应用过文本替换的配置副本
    pub fn processed(&self, node_name: &str) -> Self {
        let mut options = self.clone();
        for field in [
            &mut options.prologue,
            &mut options.epilogue,
            &mut options.sequence_separator,
            &mut options.sequence_prologue,
            &mut options.sequence_epilogue,
            &mut options.element_separator,
            &mut options.sample_separator,
        ] {
            *field = substitute(field, node_name);
        }
        options
    }
}

/// `\n`/`\t`转义 → 控制字符；`%s` → 节点显示名
fn substitute(template: &str, node_name: &str) -> String {
    template
        .replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("%s", node_name)
}

/// 按精度片段渲染一个浮点值。片段形如`[宽度][.小数位]`，
/// 空片段退化为 Rust 默认的`{}`渲染。
pub(super) fn format_float(value: f32, precision_format: &str) -> String {
    if precision_format.is_empty() {
        return format!("{value}");
    }
    let (width_part, precision_part) = match precision_format.split_once('.') {
        Some((w, p)) => (w, Some(p)),
        None => (precision_format, None),
    };
    let width = width_part.parse::<usize>().unwrap_or(0);
    match precision_part.and_then(|p| p.parse::<usize>().ok()) {
        Some(precision) => format!("{value:width$.precision$}"),
        None => format!("{value:width$}"),
    }
}
