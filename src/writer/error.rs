/*
 * @Author       : 老董
 * @Date         : 2026-08-13
 * @Description  : writer 模块的错误类型
 */

use crate::data::DataError;
use crate::nn::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    /// 配置错误（致命）：既无指定输出节点，图也未声明默认输出
    #[error("没有可解析的输出节点：未指定名称且图未声明默认输出")]
    NoOutputNodes,

    /// 配置错误（致命）：诊断模式要求至少一个输出节点
    #[error("诊断模式要求恰好一个输出节点，但一个都没有")]
    NoDiagnosticRoot,

    /// 配置错误（致命）：字符串解码要求标签表长度等于行维
    #[error("标签表长度({mapping_len})与节点'{node_name}'的行维({row_dim})不一致")]
    LabelMappingSizeMismatch {
        node_name: String,
        mapping_len: usize,
        row_dim: usize,
    },

    /// 数据错误（致命）：解码出的类别下标越过标签表边界
    #[error("类别下标{index}超出标签表范围(长度{mapping_len})")]
    LabelIndexOutOfRange { index: usize, mapping_len: usize },

    #[error("格式化配置无效: {0}")]
    InvalidConfig(String),

    /// I/O 失败一律致命，写失败绝不静默吞掉
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("图操作错误: {0}")]
    Graph(#[from] GraphError),

    #[error("数据源错误: {0}")]
    Data(#[from] DataError),
}
