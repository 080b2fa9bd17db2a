use crate::nn::GraphError;
use thiserror::Error;

/// 数据加载错误类型
#[derive(Error, Debug)]
pub enum DataError {
    #[error("数据源错误：{0}")]
    SourceError(String),
    #[error("小批量布局非法：{0}")]
    InvalidLayout(String),
    #[error("输入流'{0}'没有对应的绑定节点")]
    UnboundStream(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
}
