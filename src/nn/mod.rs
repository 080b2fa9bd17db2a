/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : 计算图（graph authority）：节点、边表、前向/反向传播
 */

mod graph;
mod nodes;

pub use graph::{Graph, GraphError};
pub use nodes::{NodeHandle, NodeId};
