/*
 * @Author       : 老董
 * @Date         : 2026-08-13
 * @Description  : 节点解析：输出节点集选取 + 输入节点依赖闭包
 */

use super::WriteError;
use crate::nn::{Graph, NodeId};

/// 解析输出节点集（有序、去重）。
///
/// `names`为空则用图声明的默认输出，默认输出也为空时是致命配置错误；
/// 否则逐名查找，查不到即致命错误。
pub fn resolve_output_nodes(graph: &Graph, names: &[String]) -> Result<Vec<NodeId>, WriteError> {
    if names.is_empty() {
        let defaults = graph.default_outputs();
        if defaults.is_empty() {
            return Err(WriteError::NoOutputNodes);
        }
        return Ok(defaults.to_vec());
    }

    let mut outputs = Vec::with_capacity(names.len());
    for name in names {
        let id = graph.get_node_by_name(name)?;
        if !outputs.contains(&id) {
            outputs.push(id);
        }
    }
    Ok(outputs)
}

/// 输出集的输入节点闭包：传递依赖中的全部输入节点，
/// 按首次遇见顺序去重（同一输入被多个输出共享时只出现一次）。
pub fn resolve_input_closure(graph: &Graph, outputs: &[NodeId]) -> Result<Vec<NodeId>, WriteError> {
    let mut inputs = Vec::new();
    for id in graph.dependency_closure(outputs)? {
        if graph.is_input_node(id)? && !inputs.contains(&id) {
            inputs.push(id);
        }
    }
    Ok(inputs)
}
