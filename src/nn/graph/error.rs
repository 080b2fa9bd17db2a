/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : Graph 模块的错误类型
 */

use crate::nn::NodeId;
use thiserror::Error;

/// Graph 操作错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("节点{0:?}不存在")]
    NodeNotFound(NodeId),
    #[error("图中不存在名为'{0}'的节点")]
    NodeNameNotFound(String),
    #[error("节点名'{0}'在图中重复")]
    DuplicateNodeName(String),
    #[error("无效操作：{0}")]
    InvalidOperation(String),
    #[error("计算错误：{0}")]
    ComputationError(String),
    #[error("形状不一致：期望{expected:?}，得到{got:?}。{message}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },
    #[error("图中存在环，无法确定求值顺序")]
    CycleDetected,
}
