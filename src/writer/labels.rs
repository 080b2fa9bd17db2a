/*
 * @Author       : 老董
 * @Date         : 2026-08-13
 * @Description  : 标签表：类别下标 → 字符串名，加载一次、写出期间只读
 */

use super::WriteError;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LabelMapping {
    labels: Vec<String>,
}

impl LabelMapping {
    /// 从文本文件加载：每个非空行一个标签，行号即类别下标
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WriteError> {
        let text = std::fs::read_to_string(path)?;
        let labels = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self { labels })
    }

    pub fn from_labels(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 取下标对应的标签；越界返回数据错误而非越界读
    pub fn label(&self, index: usize) -> Result<&str, WriteError> {
        self.labels
            .get(index)
            .map(String::as_str)
            .ok_or(WriteError::LabelIndexOutOfRange {
                index,
                mapping_len: self.labels.len(),
            })
    }
}
