//! # Only Eval
//!
//! `only_eval`是神经网络工具链中的“输出评估与序列化”引擎：给定一张（已训练或
//! 部分训练的）计算图和一个小批量（minibatch）数据源，按小批量驱动前向（可选反向）
//! 传播，并把各输出节点的张量按可配置的、序列感知的文本格式写入一个或多个目标。
//! 另提供一种诊断模式：通过在图中无损插入恒等“探针”节点来暴露内部梯度。
//!

pub mod data;
pub mod nn;
pub mod tensor;
pub mod writer;
